use crate::{PersonnelId, Timestamp};
use serde::{Deserialize, Serialize};

/// Fire brigade ranks (Dienstgrade) known to the backend, in ascending order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    FM,
    OFM,
    HFM,
    UBM,
    BM,
    OBM,
    HBM,
    BI,
}

/// Minimum rank level for ending an "Einsatz" session
pub const MIN_RANK_LEVEL_END_EMERGENCY: u8 = 4;

impl Rank {
    pub const ALL: [Rank; 8] = [
        Rank::FM,
        Rank::OFM,
        Rank::HFM,
        Rank::UBM,
        Rank::BM,
        Rank::OBM,
        Rank::HBM,
        Rank::BI,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Rank::FM => "FM",
            Rank::OFM => "OFM",
            Rank::HFM => "HFM",
            Rank::UBM => "UBM",
            Rank::BM => "BM",
            Rank::OBM => "OBM",
            Rank::HBM => "HBM",
            Rank::BI => "BI",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Rank::FM => "Feuerwehrmann",
            Rank::OFM => "Oberfeuerwehrmann",
            Rank::HFM => "Hauptfeuerwehrmann",
            Rank::UBM => "Unterbrandmeister",
            Rank::BM => "Brandmeister",
            Rank::OBM => "Oberbrandmeister",
            Rank::HBM => "Hauptbrandmeister",
            Rank::BI => "Brandinspektor",
        }
    }

    pub fn level(&self) -> u8 {
        *self as u8 + 1
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.code() == code)
    }

    pub fn may_end_emergency(&self) -> bool {
        self.level() >= MIN_RANK_LEVEL_END_EMERGENCY
    }
}

/// Entry of `GET /personnel`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Personnel {
    pub id: PersonnelId,
    pub stammrollennummer: String,
    pub vorname: String,
    pub nachname: String,
    pub dienstgrad: String,
    #[serde(default)]
    pub dienstgrad_name: String,
    #[serde(default)]
    pub dienstgrad_level: u8,
    #[serde(default)]
    pub group_id: Option<i32>,
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl Personnel {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.vorname, self.nachname)
    }
}

/// Body of `POST /personnel` and `PUT /personnel/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonnelData {
    pub stammrollennummer: String,
    pub vorname: String,
    pub nachname: String,
    pub dienstgrad: String,
    pub is_active: bool,
}

impl From<&Personnel> for PersonnelData {
    fn from(value: &Personnel) -> Self {
        Self {
            stammrollennummer: value.stammrollennummer.clone(),
            vorname: value.vorname.clone(),
            nachname: value.nachname.clone(),
            dienstgrad: value.dienstgrad.clone(),
            is_active: value.is_active,
        }
    }
}
