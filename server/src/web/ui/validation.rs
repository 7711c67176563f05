use crate::kiosk::toggle::PersonnelNumber;
use crate::web::ui::form_values::{
    FormValueRepresentation, ValidateFromFormInput, ValidationDataForFormValue,
};
use ffw_checkin_api_types::content::Priority;
use ffw_checkin_api_types::personnel::Rank;
use ffw_checkin_api_types::sessions::EventType;
use ffw_checkin_api_types::Timestamp;
use lazy_static::lazy_static;
use std::fmt::Debug;
use std::ops::RangeInclusive;

#[derive(Default, Debug)]
pub struct NonEmptyString(pub String);

impl NonEmptyString {
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FormValueRepresentation for NonEmptyString {
    fn into_form_value_string(self) -> String {
        self.0
    }
}
impl ValidateFromFormInput for NonEmptyString {
    fn from_form_value(value: &str) -> Result<Self, String> {
        let value = value.trim();
        if value.is_empty() {
            Err("Darf nicht leer sein".to_owned())
        } else {
            Ok(NonEmptyString(value.to_owned()))
        }
    }
}

/// A Stammrollennummer, see [PersonnelNumber]
#[derive(Debug)]
pub struct PersonnelNumberInput(pub PersonnelNumber);

impl PersonnelNumberInput {
    pub fn into_inner(self) -> String {
        self.0.as_str().to_owned()
    }
}

impl FormValueRepresentation for PersonnelNumberInput {
    fn into_form_value_string(self) -> String {
        self.into_inner()
    }
}
impl ValidateFromFormInput for PersonnelNumberInput {
    fn from_form_value(value: &str) -> Result<Self, String> {
        PersonnelNumber::parse(value)
            .map(Self)
            .map_err(|e| e.to_string())
    }
}

#[derive(Debug, PartialEq)]
pub struct RankCode(pub Rank);

impl Default for RankCode {
    fn default() -> Self {
        Self(Rank::FM)
    }
}

impl FormValueRepresentation for RankCode {
    fn into_form_value_string(self) -> String {
        self.0.code().to_owned()
    }
}
impl ValidateFromFormInput for RankCode {
    fn from_form_value(value: &str) -> Result<Self, String> {
        Rank::from_code(value)
            .map(Self)
            .ok_or_else(|| "Unbekannter Dienstgrad".to_owned())
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct PriorityFromList(pub Priority);

impl FormValueRepresentation for PriorityFromList {
    fn into_form_value_string(self) -> String {
        self.0.code().to_owned()
    }
}

/// Only the given priorities are accepted (news and announcements support different sets)
impl ValidationDataForFormValue<PriorityFromList> for &[Priority] {
    fn validate_form_value(self, value: &'_ str) -> Result<PriorityFromList, String> {
        match Priority::from_code(value) {
            Some(priority) if self.contains(&priority) => Ok(PriorityFromList(priority)),
            _ => Err("Ungültige Priorität".to_owned()),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct EventTypeName(pub EventType);

impl FormValueRepresentation for EventTypeName {
    fn into_form_value_string(self) -> String {
        self.0.name().to_owned()
    }
}
impl ValidateFromFormInput for EventTypeName {
    fn from_form_value(value: &str) -> Result<Self, String> {
        EventType::from_name(value)
            .map(Self)
            .ok_or_else(|| "Unbekannte Einsatzart".to_owned())
    }
}

/// Value of a `datetime-local` input
#[derive(Debug, PartialEq)]
pub struct DateTimeLocal(pub Timestamp);

impl FormValueRepresentation for DateTimeLocal {
    fn into_form_value_string(self) -> String {
        self.0.to_input_value()
    }
}

impl ValidateFromFormInput for DateTimeLocal {
    fn from_form_value(value: &'_ str) -> Result<Self, String> {
        chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
            .map(|v| Self(Timestamp(v)))
            .map_err(|_| "Kein gültiger Zeitpunkt".to_owned())
    }
}

/// Time of day in "HH:MM" format, as used for the backup schedule
#[derive(Default, Debug, PartialEq)]
pub struct TimeOfDay(pub chrono::NaiveTime);

impl TimeOfDay {
    pub fn into_inner(self) -> chrono::NaiveTime {
        self.0
    }
}

impl FormValueRepresentation for TimeOfDay {
    fn into_form_value_string(self) -> String {
        self.0.format("%H:%M").to_string()
    }
}
impl ValidateFromFormInput for TimeOfDay {
    fn from_form_value(value: &str) -> Result<Self, String> {
        chrono::NaiveTime::parse_from_str(value, "%H:%M")
            .or_else(|_| chrono::NaiveTime::parse_from_str(value, "%H:%M:%S"))
            .map(Self)
            .map_err(|_| "Keine gültige Uhrzeit".to_owned())
    }
}

#[derive(Debug, PartialEq, Default)]
pub struct BoundedU32(pub u32);

impl FormValueRepresentation for BoundedU32 {
    fn into_form_value_string(self) -> String {
        self.0.to_string()
    }
}

impl ValidationDataForFormValue<BoundedU32> for RangeInclusive<u32> {
    fn validate_form_value(self, value: &'_ str) -> Result<BoundedU32, String> {
        let number = value
            .trim()
            .parse::<u32>()
            .map_err(|_| "Keine gültige Zahl".to_owned())?;
        if self.contains(&number) {
            Ok(BoundedU32(number))
        } else {
            Err(format!(
                "Muss zwischen {} und {} liegen",
                self.start(),
                self.end()
            ))
        }
    }
}

/// An absolute http(s) URL, e.g. the kiosk base URL
#[derive(Debug, PartialEq, Default)]
pub struct HttpUrl(pub String);

impl HttpUrl {
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FormValueRepresentation for HttpUrl {
    fn into_form_value_string(self) -> String {
        self.0
    }
}

impl ValidateFromFormInput for HttpUrl {
    fn from_form_value(value: &'_ str) -> Result<Self, String> {
        lazy_static! {
            static ref RE: regex::Regex = regex::Regex::new(r"^https?://").unwrap();
        }
        let value = value.trim();
        if !RE.is_match(value) {
            return Err("URL muss mit http:// oder https:// beginnen".to_owned());
        }
        match url::Url::parse(value) {
            Ok(url) if url.host().is_some() => Ok(Self(value.trim_end_matches('/').to_owned())),
            _ => Err("Keine gültige URL".to_owned()),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct MaybeEmpty<T>(pub Option<T>);

impl<T> Default for MaybeEmpty<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> MaybeEmpty<T> {
    pub fn into_inner(self) -> Option<T> {
        self.0
    }
}

impl<T: FormValueRepresentation + PartialEq> FormValueRepresentation for MaybeEmpty<T> {
    fn into_form_value_string(self) -> String {
        match self.0 {
            None => "".to_owned(),
            Some(t) => t.into_form_value_string(),
        }
    }
}

impl<T: ValidateFromFormInput + PartialEq> ValidateFromFormInput for MaybeEmpty<T> {
    fn from_form_value(value: &'_ str) -> Result<Self, String> {
        if value.trim().is_empty() {
            Ok(Self(None))
        } else {
            Ok(Self(Some(T::from_form_value(value)?)))
        }
    }
}
