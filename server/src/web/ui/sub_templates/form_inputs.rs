use crate::web::ui::form_values::{BoolFormValue, FormValue, FormValueRepresentation};
use askama::Template;
use std::borrow::Cow;

#[derive(Debug, PartialEq)]
pub enum InputType {
    Text,
    Number,
    Time,
    DateTimeLocal,
    Url,
    Textarea,
}

impl InputType {
    fn as_html_type_attr(&self) -> &'static str {
        match self {
            InputType::Text | InputType::Textarea => "text",
            InputType::Number => "number",
            InputType::Time => "time",
            InputType::DateTimeLocal => "datetime-local",
            InputType::Url => "url",
        }
    }
}

pub struct InputConfiguration<'a> {
    input_type: InputType,
    info: Option<&'a str>,
    /// Mark the field as `required` for the browser's own validation
    required: bool,
}

impl Default for InputConfiguration<'_> {
    fn default() -> Self {
        Self {
            input_type: InputType::Text,
            info: None,
            required: false,
        }
    }
}

impl<'a> InputConfiguration<'a> {
    pub fn builder() -> InputConfigurationBuilder<'a> {
        InputConfigurationBuilder::default()
    }
}

#[derive(Default)]
pub struct InputConfigurationBuilder<'a> {
    value: InputConfiguration<'a>,
}

impl<'a> InputConfigurationBuilder<'a> {
    pub fn input_type(mut self, input_type: InputType) -> Self {
        self.value.input_type = input_type;
        self
    }
    pub fn info(mut self, info: &'a str) -> Self {
        self.value.info = Some(info);
        self
    }
    pub fn required(mut self) -> Self {
        self.value.required = true;
        self
    }
    pub fn build(self) -> InputConfiguration<'a> {
        self.value
    }
}

#[derive(Template)]
#[template(path = "sub_templates/form_inputs/form_field.html")]
pub struct FormFieldTemplate<'a, T: FormValueRepresentation> {
    name: &'a str,
    label: &'a str,
    config: InputConfiguration<'a>,
    data: &'a FormValue<T>,
}

impl<'a, T: FormValueRepresentation> FormFieldTemplate<'a, T> {
    pub fn new(
        data: &'a FormValue<T>,
        name: &'a str,
        label: &'a str,
        config: InputConfiguration<'a>,
    ) -> Self {
        Self {
            name,
            label,
            config,
            data,
        }
    }

    fn is_textarea(&self) -> bool {
        self.config.input_type == InputType::Textarea
    }
}

pub struct SelectEntry<'a> {
    pub value: Cow<'a, str>,
    pub text: Cow<'a, str>,
}

#[derive(Template)]
#[template(path = "sub_templates/form_inputs/select.html")]
pub struct SelectTemplate<'a, T: FormValueRepresentation> {
    name: &'a str,
    entries: Vec<SelectEntry<'a>>,
    label: &'a str,
    data: &'a FormValue<T>,
}

impl<'a, T: FormValueRepresentation> SelectTemplate<'a, T> {
    pub fn new(
        data: &'a FormValue<T>,
        name: &'a str,
        entries: Vec<SelectEntry<'a>>,
        label: &'a str,
    ) -> Self {
        Self {
            name,
            entries,
            label,
            data,
        }
    }
}

#[derive(Template)]
#[template(path = "sub_templates/form_inputs/checkbox.html")]
pub struct CheckboxTemplate<'a> {
    name: &'a str,
    label: &'a str,
    info: Option<&'a str>,
    data: &'a BoolFormValue,
}

impl<'a> CheckboxTemplate<'a> {
    pub fn new(
        data: &'a BoolFormValue,
        name: &'a str,
        label: &'a str,
        info: Option<&'a str>,
    ) -> Self {
        Self {
            name,
            label,
            info,
            data,
        }
    }
}
