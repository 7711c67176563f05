use crate::auth_session::AdminSession;
use crate::web::ui::flash::{FlashMessage, FlashesInterface};
use crate::web::ui::Resources;
use actix_web::error::UrlGenerationError;
use actix_web::HttpRequest;
use std::fmt::Write;

/// Common template data for all ui templates extending the `base.html` template
///
/// This struct must be a part of the template data structure, as the field `base`.
/// The contained data and functions can be used by the individual template's code, as well.
#[derive(Debug)]
pub struct BaseTemplateContext<'a> {
    /// The HTTP request the template is used to respond to. Used for creating ressource urls and
    /// extracting the flash messages
    pub request: &'a HttpRequest,
    /// HTML title
    pub page_title: &'a str,
    /// The logged-in admin, if any. The admin navigation is only rendered when present.
    pub admin: Option<&'a AdminSession>,
    pub active_nav_button: Option<AdminNavButton>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminNavButton {
    Dashboard,
    Sessions,
    Personnel,
    Announcements,
    News,
    Statistics,
    AuditLog,
    Settings,
    Backups,
    System,
}

impl AdminNavButton {
    pub const ALL: [AdminNavButton; 10] = [
        AdminNavButton::Dashboard,
        AdminNavButton::Sessions,
        AdminNavButton::Personnel,
        AdminNavButton::Announcements,
        AdminNavButton::News,
        AdminNavButton::Statistics,
        AdminNavButton::AuditLog,
        AdminNavButton::Settings,
        AdminNavButton::Backups,
        AdminNavButton::System,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            AdminNavButton::Dashboard => "Übersicht",
            AdminNavButton::Sessions => "Sessions",
            AdminNavButton::Personnel => "Personal",
            AdminNavButton::Announcements => "Ankündigungen",
            AdminNavButton::News => "News",
            AdminNavButton::Statistics => "Statistik",
            AdminNavButton::AuditLog => "Audit-Log",
            AdminNavButton::Settings => "Einstellungen",
            AdminNavButton::Backups => "Backups",
            AdminNavButton::System => "System",
        }
    }

    fn endpoint_name(&self) -> &'static str {
        match self {
            AdminNavButton::Dashboard => "admin_dashboard",
            AdminNavButton::Sessions => "sessions_list",
            AdminNavButton::Personnel => "personnel_list",
            AdminNavButton::Announcements => "announcements_list",
            AdminNavButton::News => "news_list",
            AdminNavButton::Statistics => "unit_statistics",
            AdminNavButton::AuditLog => "audit_log",
            AdminNavButton::Settings => "station_settings_form",
            AdminNavButton::Backups => "backups_list",
            AdminNavButton::System => "system_info",
        }
    }
}

impl BaseTemplateContext<'_> {
    pub fn url_for_static(&self, file: &str) -> Result<String, UrlGenerationError> {
        let mut url = self.request.url_for("static_resources", [file])?;
        url.query_pairs_mut().append_pair(
            "hash",
            &Resources::get(file)
                .map(|f| bytes_to_hex(&f.metadata.sha256_hash()))
                .unwrap_or("unknown".to_string()),
        );
        Ok(url.to_string())
    }

    pub fn url_for_nav_button(&self, button: &AdminNavButton) -> Result<String, UrlGenerationError> {
        Ok(self
            .request
            .url_for_static(button.endpoint_name())?
            .to_string())
    }

    pub fn url_for_logout(&self) -> Result<String, UrlGenerationError> {
        Ok(self.request.url_for_static("logout")?.to_string())
    }

    pub fn nav_buttons(&self) -> &'static [AdminNavButton] {
        &AdminNavButton::ALL
    }

    pub fn is_active(&self, button: &AdminNavButton) -> bool {
        self.active_nav_button.as_ref() == Some(button)
    }

    pub fn get_flashes(&self) -> Vec<FlashMessage> {
        self.request.get_and_clear_flashes()
    }

    pub fn version(&self) -> &'static str {
        crate::get_version()
    }
}

fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::new(), |mut output, b| {
        let _ = write!(output, "{:02x}", b);
        output
    })
}
