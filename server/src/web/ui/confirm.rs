//! Generic confirmation page for destructive admin actions.
//!
//! Every destructive action is a GET request rendering this page, which posts the confirmed form to
//! the actual action endpoint.
use crate::web::ui::base_template::BaseTemplateContext;
use askama::Template;

#[derive(Template)]
#[template(path = "confirm.html")]
pub struct ConfirmTemplate<'a> {
    pub base: BaseTemplateContext<'a>,
    pub question: &'a str,
    /// Description of the affected entity, one line each
    pub details: Vec<String>,
    pub warning: Option<&'a str>,
    pub action_url: url::Url,
    pub cancel_url: url::Url,
    pub confirm_label: &'a str,
    pub option: Option<ConfirmOption<'a>>,
}

/// Checkbox on the confirmation page for choosing a variant of the action
pub struct ConfirmOption<'a> {
    pub name: &'a str,
    pub label: &'a str,
}
