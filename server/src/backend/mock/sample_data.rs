use super::{BackendMock, MockAttendance, MockSession};
use chrono::{NaiveDate, NaiveDateTime};
use ffw_checkin_api_types::content::{Announcement, News, Priority};
use ffw_checkin_api_types::personnel::{Personnel, PersonnelData, Rank};
use ffw_checkin_api_types::sessions::EventType;
use ffw_checkin_api_types::settings::StationSettings;
use ffw_checkin_api_types::PersonnelId;

pub const SESSION_UEBUNG: i32 = 1;
pub const SESSION_EINSATZ: i32 = 2;
pub const SESSION_ENDED: i32 = 3;
pub const QR_TOKEN: &str = "f3b1c7e2d9a04c8e";

pub(crate) fn date_time(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .unwrap_or_default()
}

pub(crate) fn personnel_from_data(
    id: PersonnelId,
    data: &PersonnelData,
    created_at: NaiveDateTime,
) -> Personnel {
    let rank = Rank::from_code(&data.dienstgrad);
    Personnel {
        id,
        stammrollennummer: data.stammrollennummer.clone(),
        vorname: data.vorname.clone(),
        nachname: data.nachname.clone(),
        dienstgrad: data.dienstgrad.clone(),
        dienstgrad_name: rank.map(|r| r.name()).unwrap_or_default().to_owned(),
        dienstgrad_level: rank.map(|r| r.level()).unwrap_or(0),
        group_id: None,
        is_active: data.is_active,
        created_at: Some(created_at.into()),
    }
}

fn person(id: PersonnelId, number: &str, vorname: &str, nachname: &str, rank: Rank) -> Personnel {
    personnel_from_data(
        id,
        &PersonnelData {
            stammrollennummer: number.to_owned(),
            vorname: vorname.to_owned(),
            nachname: nachname.to_owned(),
            dienstgrad: rank.code().to_owned(),
            is_active: true,
        },
        date_time(2024, 1, 10, 12, 0),
    )
}

/// Create a [BackendMock] with a small fire station: two running sessions (one "Übungsdienst",
/// one "Einsatz"), an ended session, a handful of personnel and some kiosk content.
pub fn backend_with_sample_data() -> BackendMock {
    let mock = BackendMock::default();
    fill_sample_data(&mock);
    mock
}

pub fn fill_sample_data(mock: &BackendMock) {
    let mut data = mock.data.lock().expect("Error while locking mutex.");
    data.station = StationSettings {
        name: "Freiwillige Feuerwehr Musterstadt".to_owned(),
        street: Some("Hauptstraße 112".to_owned()),
        city: Some("Musterstadt".to_owned()),
        postal_code: Some("12345".to_owned()),
        logo_path: None,
    };
    data.personnel = vec![
        person(11, "1042", "Anna", "Schmidt", Rank::OFM),
        person(12, "2001", "Bernd", "Keller", Rank::BM),
        person(13, "3077", "Carla", "Neumann", Rank::FM),
        person(14, "4100", "Dieter", "Wagner", Rank::HBM),
    ];
    data.sessions = vec![
        MockSession {
            id: SESSION_UEBUNG,
            event_type: EventType::Uebungsdienst,
            started_at: date_time(2025, 5, 1, 18, 30),
            ended_at: None,
            is_active: true,
        },
        MockSession {
            id: SESSION_EINSATZ,
            event_type: EventType::Einsatz,
            started_at: date_time(2025, 5, 1, 18, 45),
            ended_at: None,
            is_active: true,
        },
        MockSession {
            id: SESSION_ENDED,
            event_type: EventType::ArbeitsdienstA,
            started_at: date_time(2025, 4, 12, 9, 0),
            ended_at: Some(date_time(2025, 4, 12, 13, 0)),
            is_active: false,
        },
    ];
    data.attendances = vec![
        MockAttendance {
            id: 51,
            session_id: SESSION_UEBUNG,
            personnel_id: 13,
            checked_in_at: date_time(2025, 5, 1, 18, 35),
            checked_out_at: None,
        },
        MockAttendance {
            id: 52,
            session_id: SESSION_EINSATZ,
            personnel_id: 14,
            checked_in_at: date_time(2025, 5, 1, 18, 50),
            checked_out_at: None,
        },
        MockAttendance {
            id: 53,
            session_id: SESSION_ENDED,
            personnel_id: 11,
            checked_in_at: date_time(2025, 4, 12, 9, 5),
            checked_out_at: Some(date_time(2025, 4, 12, 12, 35)),
        },
    ];
    data.announcements = vec![
        Announcement {
            id: 21,
            title: "Fahrzeugpflege".to_owned(),
            content: "Nach dem Übungsdienst bitte HLF 20 betanken.".to_owned(),
            priority: Priority::Normal,
            valid_from: Some(date_time(2025, 4, 28, 0, 0).into()),
            valid_until: Some(date_time(2025, 5, 31, 0, 0).into()),
            created_at: Some(date_time(2025, 4, 28, 8, 0).into()),
        },
        Announcement {
            id: 22,
            title: "Atemschutz-Untersuchung".to_owned(),
            content: "G26.3 Termine bis Ende Mai wahrnehmen!".to_owned(),
            priority: Priority::Urgent,
            valid_from: Some(date_time(2025, 4, 20, 0, 0).into()),
            valid_until: None,
            created_at: Some(date_time(2025, 4, 20, 8, 0).into()),
        },
        Announcement {
            id: 23,
            title: "Jahreshauptversammlung".to_owned(),
            content: "Einladung folgt.".to_owned(),
            priority: Priority::High,
            valid_from: Some(date_time(2025, 6, 1, 0, 0).into()),
            valid_until: None,
            created_at: Some(date_time(2025, 4, 20, 9, 0).into()),
        },
    ];
    data.news = vec![
        News {
            id: 31,
            title: "Neues Löschfahrzeug".to_owned(),
            content: "Das neue LF 10 wird im Juni ausgeliefert.".to_owned(),
            priority: Priority::High,
            is_active: true,
            created_at: Some(date_time(2025, 4, 1, 10, 0).into()),
            expires_at: None,
        },
        News {
            id: 32,
            title: "Sommerfest".to_owned(),
            content: "Helfer gesucht.".to_owned(),
            priority: Priority::Low,
            is_active: false,
            created_at: Some(date_time(2025, 3, 1, 10, 0).into()),
            expires_at: None,
        },
    ];
    data.qr_tokens = vec![(QR_TOKEN.to_owned(), SESSION_UEBUNG)];
}
