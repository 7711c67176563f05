use crate::web::ui::base_template::{AdminNavButton, BaseTemplateContext};
use crate::web::ui::confirm::ConfirmTemplate;
use crate::web::ui::endpoints::announcements::priority_entries;
use crate::web::ui::error::AppError;
use crate::web::ui::form_values::{BoolFormValue, FormValue, _FormValidSimpleValidate};
use crate::web::ui::sub_templates::form_inputs::{
    CheckboxTemplate, FormFieldTemplate, InputConfiguration, InputType, SelectEntry,
    SelectTemplate,
};
use crate::web::ui::util::{self, FormSubmitResult};
use crate::web::ui::validation::{DateTimeLocal, MaybeEmpty, NonEmptyString, PriorityFromList};
use crate::web::AppState;
use actix_web::web::{Form, Html};
use actix_web::{get, post, web, HttpRequest, Responder};
use askama::Template;
use ffw_checkin_api_types::content::{News, NewsData, Priority};
use ffw_checkin_api_types::NewsId;
use serde::Deserialize;

#[get("/admin/news")]
async fn news_list(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let mut news = state.backend().news(false).await?;
    news.sort_by_key(|n| std::cmp::Reverse(n.created_at));

    let tmpl = NewsListTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "News",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::News),
        },
        news: &news,
    };
    Ok(Html::new(tmpl.render()?))
}

#[get("/admin/news/new")]
async fn new_news_form(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let form_data = NewsFormData {
        is_active: true.into(),
        ..Default::default()
    };
    let tmpl = EditNewsFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Neue News",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::News),
        },
        form_data: &form_data,
        news_id: None,
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/admin/news/new")]
async fn new_news(
    state: web::Data<AppState>,
    data: Form<NewsFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let mut form_data = data.into_inner();
    let result: FormSubmitResult = match form_data.validate() {
        Some(news) => {
            let result = state.backend().create_news(&admin.token, &news).await;
            if result.is_ok() {
                state.hub.notify_admin_change().await;
            }
            result.into()
        }
        None => FormSubmitResult::ValidationError,
    };

    let tmpl = EditNewsFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Neue News",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::News),
        },
        form_data: &form_data,
        news_id: None,
    };
    util::create_form_response(
        result,
        tmpl,
        "News wurde erstellt.",
        req.url_for_static("news_list")?,
        &req,
    )
}

#[get("/admin/news/{news_id}/edit")]
async fn edit_news_form(
    path: web::Path<NewsId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let news_id = path.into_inner();
    let news = state.backend().news_item(news_id).await?;
    let form_data: NewsFormData = news.into();

    let tmpl = EditNewsFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "News bearbeiten",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::News),
        },
        form_data: &form_data,
        news_id: Some(news_id),
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/admin/news/{news_id}/edit")]
async fn edit_news(
    path: web::Path<NewsId>,
    state: web::Data<AppState>,
    data: Form<NewsFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let news_id = path.into_inner();
    let mut form_data = data.into_inner();
    let result: FormSubmitResult = match form_data.validate() {
        Some(news) => {
            let result = state
                .backend()
                .update_news(&admin.token, news_id, &news)
                .await;
            if result.is_ok() {
                state.hub.notify_admin_change().await;
            }
            result.into()
        }
        None => FormSubmitResult::ValidationError,
    };

    let tmpl = EditNewsFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "News bearbeiten",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::News),
        },
        form_data: &form_data,
        news_id: Some(news_id),
    };
    util::create_form_response(
        result,
        tmpl,
        "Änderung wurde gespeichert.",
        req.url_for_static("news_list")?,
        &req,
    )
}

#[get("/admin/news/{news_id}/delete")]
async fn delete_news_form(
    path: web::Path<NewsId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let news = state.backend().news_item(path.into_inner()).await?;
    let id = news.id.to_string();

    let tmpl = ConfirmTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "News löschen",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::News),
        },
        question: "Soll diese News gelöscht werden?",
        details: vec![news.title.clone()],
        warning: None,
        action_url: req.url_for("delete_news", [&id])?,
        cancel_url: req.url_for_static("news_list")?,
        confirm_label: "Löschen",
        option: None,
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/admin/news/{news_id}/delete")]
async fn delete_news(
    path: web::Path<NewsId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let result = state
        .backend()
        .delete_news(&admin.token, path.into_inner())
        .await;
    if result.is_ok() {
        state.hub.notify_admin_change().await;
    }
    util::create_action_response(
        result.into(),
        "News wurde gelöscht.",
        req.url_for_static("news_list")?,
        &req,
    )
}

#[derive(Template)]
#[template(path = "admin_news_list.html")]
struct NewsListTemplate<'a> {
    base: BaseTemplateContext<'a>,
    news: &'a [News],
}

impl NewsListTemplate<'_> {
    fn url_for_news(&self, name: &str, news: &News) -> Result<String, AppError> {
        Ok(self
            .base
            .request
            .url_for(name, [news.id.to_string()])?
            .to_string())
    }
}

#[derive(Default, Deserialize)]
struct NewsFormData {
    title: FormValue<NonEmptyString>,
    content: FormValue<NonEmptyString>,
    priority: FormValue<PriorityFromList>,
    is_active: BoolFormValue,
    expires_at: FormValue<MaybeEmpty<DateTimeLocal>>,
}

impl NewsFormData {
    fn validate(&mut self) -> Option<NewsData> {
        let title = self.title.validate();
        let content = self.content.validate();
        let priority = self.priority.validate_with(&Priority::FOR_NEWS[..]);
        let expires_at = self.expires_at.validate();
        Some(NewsData {
            title: title?.into_inner(),
            content: content?.into_inner(),
            priority: priority?.0,
            is_active: self.is_active.get_value(),
            expires_at: expires_at?.into_inner().map(|v| v.0),
        })
    }
}

impl From<News> for NewsFormData {
    fn from(value: News) -> Self {
        Self {
            title: NonEmptyString(value.title).into(),
            content: NonEmptyString(value.content).into(),
            priority: PriorityFromList(value.priority).into(),
            is_active: value.is_active.into(),
            expires_at: MaybeEmpty(value.expires_at.map(DateTimeLocal)).into(),
        }
    }
}

#[derive(Template)]
#[template(path = "admin_edit_news.html")]
struct EditNewsFormTemplate<'a> {
    base: BaseTemplateContext<'a>,
    form_data: &'a NewsFormData,
    /// None for new news items
    news_id: Option<NewsId>,
}

impl EditNewsFormTemplate<'_> {
    fn priority_entries(&self) -> Vec<SelectEntry<'static>> {
        priority_entries(&Priority::FOR_NEWS)
    }

    fn action_url(&self) -> Result<String, AppError> {
        Ok(match self.news_id {
            Some(id) => self.base.request.url_for("edit_news", [id.to_string()])?,
            None => self.base.request.url_for_static("new_news")?,
        }
        .to_string())
    }
}
