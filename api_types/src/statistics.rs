use crate::PersonnelId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSummary {
    pub total_sessions: u32,
    pub total_attendances: u32,
    pub average_attendance_per_session: f64,
    #[serde(default)]
    pub event_types: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopPersonnel {
    pub id: PersonnelId,
    pub stammrollennummer: String,
    pub name: String,
    pub dienstgrad: String,
    pub attendance_count: u32,
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankCount {
    pub dienstgrad: String,
    pub attendance_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitMonth {
    pub month: u32,
    pub month_name: String,
    #[serde(default)]
    pub sessions_by_type: BTreeMap<String, u32>,
    pub total_sessions: u32,
}

/// Response of `GET /statistics/unit/yearly`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitYearly {
    pub year: i32,
    pub summary: UnitSummary,
    #[serde(default)]
    pub top_personnel: Vec<TopPersonnel>,
    #[serde(default)]
    pub by_rank: Vec<RankCount>,
    #[serde(default)]
    pub monthly: Vec<UnitMonth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonnelRef {
    pub id: PersonnelId,
    pub stammrollennummer: String,
    pub vorname: String,
    pub nachname: String,
    pub dienstgrad: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonnelSummary {
    pub total_sessions: u32,
    pub total_hours: f64,
    pub attendance_rate: f64,
    #[serde(default)]
    pub event_types: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonnelMonth {
    pub month: u32,
    pub month_name: String,
    pub count: u32,
    pub hours: f64,
}

/// Response of `GET /statistics/personnel/{id}/yearly`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonnelYearly {
    pub personnel: PersonnelRef,
    pub year: i32,
    pub summary: PersonnelSummary,
    #[serde(default)]
    pub monthly: Vec<PersonnelMonth>,
}
