use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Point in time as used by the backend
///
/// The backend stores naive date-times in station-local wall time. Some endpoints append an
/// explicit offset; in that case, the offset is dropped and the wall time is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub NaiveDateTime);

const ACCEPTED_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

impl Timestamp {
    pub fn naive(&self) -> NaiveDateTime {
        self.0
    }

    /// Date and time for display, e.g. "03.05.2025 14:07"
    pub fn display_long(&self) -> String {
        self.0.format("%d.%m.%Y %H:%M").to_string()
    }

    pub fn display_time(&self) -> String {
        self.0.format("%H:%M").to_string()
    }

    pub fn display_date(&self) -> String {
        self.0.format("%d.%m.%Y").to_string()
    }

    /// Value for an HTML `datetime-local` input
    pub fn to_input_value(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M").to_string()
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(value: NaiveDateTime) -> Self {
        Self(value)
    }
}

impl FromStr for Timestamp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for format in ACCEPTED_FORMATS {
            if let Ok(value) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(Self(value));
            }
        }
        DateTime::parse_from_rfc3339(s)
            .map(|value| Self(value.naive_local()))
            .map_err(|e| format!("invalid timestamp '{}': {}", s, e))
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%S"))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::Timestamp;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_backend_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(18, 30, 5)
            .unwrap();
        let plain: Timestamp = "2025-03-14T18:30:05".parse().unwrap();
        assert_eq!(plain.naive(), expected);
        let fractional: Timestamp = "2025-03-14T18:30:05.123456".parse().unwrap();
        assert_eq!(fractional.naive().and_utc().timestamp(), expected.and_utc().timestamp());
        let with_offset: Timestamp = "2025-03-14T18:30:05+01:00".parse().unwrap();
        assert_eq!(with_offset.naive(), expected);
        let from_input: Timestamp = "2025-03-14T18:30".parse().unwrap();
        assert_eq!(from_input.display_long(), "14.03.2025 18:30");
        assert!("14.03.2025".parse::<Timestamp>().is_err());
    }

    #[test]
    fn test_json_representation() {
        let ts: Timestamp = serde_json::from_str("\"2025-01-02T03:04:05.5\"").unwrap();
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"2025-01-02T03:04:05\"");
    }
}
