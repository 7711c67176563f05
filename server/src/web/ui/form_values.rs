//! Form field values of the admin forms: the submitted (or prefilled) string together with the
//! validation errors to show next to the input.

use serde::de::Error;
use serde::{Deserialize, Deserializer};
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct FormValue<T: FormValueRepresentation> {
    value: Option<String>,
    #[serde(skip)]
    errors: Vec<String>,
    #[serde(skip)]
    _phantom: PhantomData<T>,
}

/// A typed value which is prefilled into a form input as a string. Parsing it back is done by
/// [ValidateFromFormInput] or, when context is needed (e.g. the allowed priorities), by
/// [ValidationDataForFormValue].
pub trait FormValueRepresentation: Debug {
    fn into_form_value_string(self) -> String;
}

/// Parsing of a submitted input string without further context, used by
/// [_FormValidSimpleValidate::validate]
pub trait ValidateFromFormInput: FormValueRepresentation + Sized {
    fn from_form_value(value: &'_ str) -> Result<Self, String>;
}

/// Context data for parsing a submitted input string into `R`, see [FormValue::validate_with]
pub trait ValidationDataForFormValue<R: FormValueRepresentation> {
    fn validate_form_value(self, value: &'_ str) -> Result<R, String>;
}

impl FormValueRepresentation for String {
    fn into_form_value_string(self) -> String {
        self
    }
}

impl ValidateFromFormInput for String {
    fn from_form_value(value: &'_ str) -> Result<Self, String> {
        Ok(value.to_owned())
    }
}

impl<T: FormValueRepresentation> FormValue<T> {
    /// A field that was not part of the submitted form. Validating it fails.
    pub fn empty() -> Self {
        Self {
            value: None,
            errors: vec![],
            _phantom: Default::default(),
        }
    }

    pub fn validate_with<'d, D: ValidationDataForFormValue<T> + 'd>(
        &'_ mut self,
        data: D,
    ) -> Option<T> {
        if let Some(value) = &self.value {
            match data.validate_form_value(value) {
                Ok(v) => Some(v),
                Err(e) => {
                    self.errors.push(e);
                    None
                }
            }
        } else {
            self.errors.push("Wert fehlt in Formular-Daten".to_owned());
            None
        }
    }

    /// Attach an error found by a cross-field check (e.g. a date range) or by the backend
    pub fn add_error(&mut self, error: String) {
        self.errors.push(error)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &Vec<String> {
        &self.errors
    }

    /// The `value` attribute of the rendered input
    pub fn string_value(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}

impl FormValue<String> {
    /// The trimmed value of an optional text field, or None if the field is blank
    pub fn optional_text(&self) -> Option<String> {
        self.value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    }
}

impl<T: FormValueRepresentation> Default for FormValue<T>
where
    T: Default,
{
    fn default() -> Self {
        FormValue {
            value: Some(T::default().into_form_value_string()),
            errors: vec![],
            _phantom: Default::default(),
        }
    }
}

impl<T: FormValueRepresentation> From<T> for FormValue<T> {
    fn from(value: T) -> Self {
        FormValue {
            value: Some(value.into_form_value_string()),
            errors: vec![],
            _phantom: Default::default(),
        }
    }
}

/// `validate()` for [FormValue]s of types that need no context for parsing
pub trait _FormValidSimpleValidate<T> {
    fn validate(&mut self) -> Option<T>;
}

impl<T: ValidateFromFormInput> _FormValidSimpleValidate<T> for FormValue<T> {
    fn validate(&mut self) -> Option<T> {
        if let Some(value) = &self.value {
            match T::from_form_value(value) {
                Ok(v) => Some(v),
                Err(e) => {
                    self.errors.push(e);
                    None
                }
            }
        } else {
            self.errors.push("Wert fehlt in Formular-Daten".to_owned());
            None
        }
    }
}

#[derive(Debug, Default)]
pub struct BoolFormValue {
    value: bool,
    errors: Vec<String>,
}

impl BoolFormValue {
    pub fn get_value(&self) -> bool {
        self.value
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &Vec<String> {
        &self.errors
    }
}

impl From<bool> for BoolFormValue {
    fn from(value: bool) -> Self {
        Self {
            value,
            errors: vec![],
        }
    }
}

/// A checkbox is only submitted when checked, so any value means `true` and a missing field `false`
impl<'de> serde::Deserialize<'de> for BoolFormValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_option(BoolFormValueVisitor {})
    }
}

struct BoolFormValueVisitor;

impl<'de> serde::de::Visitor<'de> for BoolFormValueVisitor {
    type Value = BoolFormValue;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a checkbox value or no field")
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(BoolFormValue {
            value: false,
            errors: vec![],
        })
    }

    fn visit_some<D>(self, _deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(BoolFormValue {
            value: true,
            errors: vec![],
        })
    }
}
