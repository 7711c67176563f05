use crate::web::ui::base_template::{AdminNavButton, BaseTemplateContext};
use crate::web::ui::error::AppError;
use crate::web::ui::flash::FlashType;
use crate::web::ui::form_values::{BoolFormValue, FormValue, _FormValidSimpleValidate};
use crate::web::ui::sub_templates::form_inputs::{
    CheckboxTemplate, FormFieldTemplate, InputConfiguration, InputType,
};
use crate::web::ui::util::{self, FormSubmitResult};
use crate::web::ui::validation::{BoundedU32, HttpUrl, MaybeEmpty, NonEmptyString, TimeOfDay};
use crate::web::AppState;
use actix_web::web::{Form, Html, Query};
use actix_web::{get, post, web, HttpRequest, Responder};
use askama::Template;
use ffw_checkin_api_types::settings::{BackupSettings, StationSettings, SystemSettings};
use serde::Deserialize;
use std::ops::RangeInclusive;

const SCREENSAVER_TIMEOUT_RANGE: RangeInclusive<u32> = 30..=3600;
const BACKUP_RETENTION_RANGE: RangeInclusive<u32> = 1..=365;

#[get("/admin/settings/station")]
async fn station_settings_form(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let settings = state.backend().station_settings().await?;
    let form_data: StationSettingsFormData = (&settings).into();

    let tmpl = StationSettingsFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Einstellungen",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Settings),
        },
        form_data: &form_data,
        has_logo: settings.has_logo(),
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/admin/settings/station")]
async fn station_settings(
    state: web::Data<AppState>,
    data: Form<StationSettingsFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let mut form_data = data.into_inner();
    let result: FormSubmitResult = match form_data.validate() {
        Some(settings) => {
            let result = state
                .backend()
                .update_station_settings(&admin.token, &settings)
                .await;
            if result.is_ok() {
                state.hub.notify_admin_change().await;
            }
            result.into()
        }
        None => FormSubmitResult::ValidationError,
    };

    // The logo is kept by the backend on updates
    let has_logo = state
        .backend()
        .station_settings()
        .await
        .map(|s| s.has_logo())
        .unwrap_or(false);
    let tmpl = StationSettingsFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Einstellungen",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Settings),
        },
        form_data: &form_data,
        has_logo,
    };
    util::create_form_response(
        result,
        tmpl,
        "Einstellungen wurden gespeichert.",
        req.url_for_static("station_settings_form")?,
        &req,
    )
}

#[get("/admin/settings/system")]
async fn system_settings_form(
    state: web::Data<AppState>,
    query: Query<SystemSettingsQuery>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let settings = state.backend().system_settings().await?;
    let mut form_data: SystemSettingsFormData = (&settings).into();
    if query.detect_url {
        let detected = detect_base_url(&req);
        if is_local_host(&detected) {
            util::add_flash(
                &req,
                FlashType::Warning,
                "Die erkannte Adresse zeigt auf diesen Rechner (localhost). Mobilgeräte können \
                sie nicht erreichen. Bitte die Adresse im lokalen Netzwerk eintragen.",
            );
        } else {
            util::add_flash(
                &req,
                FlashType::Info,
                "Adresse wurde erkannt. Bitte prüfen und speichern.",
            );
        }
        form_data.kiosk_base_url = MaybeEmpty(Some(HttpUrl(detected))).into();
    }

    let tmpl = SystemSettingsFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Einstellungen",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Settings),
        },
        form_data: &form_data,
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/admin/settings/system")]
async fn system_settings(
    state: web::Data<AppState>,
    data: Form<SystemSettingsFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let mut form_data = data.into_inner();
    let result: FormSubmitResult = match form_data.validate() {
        Some(settings) => {
            let result = state
                .backend()
                .update_system_settings(&admin.token, &settings)
                .await;
            if result.is_ok() {
                state.hub.notify_admin_change().await;
            }
            result.into()
        }
        None => FormSubmitResult::ValidationError,
    };

    let tmpl = SystemSettingsFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Einstellungen",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Settings),
        },
        form_data: &form_data,
    };
    util::create_form_response(
        result,
        tmpl,
        "Einstellungen wurden gespeichert.",
        req.url_for_static("system_settings_form")?,
        &req,
    )
}

/// Origin of the current request, as seen by the browser
fn detect_base_url(req: &HttpRequest) -> String {
    let connection_info = req.connection_info();
    format!("{}://{}", connection_info.scheme(), connection_info.host())
}

fn is_local_host(base_url: &str) -> bool {
    url::Url::parse(base_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_owned))
        .is_some_and(|host| host == "localhost" || host == "127.0.0.1" || host == "[::1]")
}

#[get("/admin/settings/backup")]
async fn backup_settings_form(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let settings = state.backend().backup_settings(&admin.token).await?;
    let form_data: BackupSettingsFormData = (&settings).into();

    let tmpl = BackupSettingsFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Einstellungen",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Settings),
        },
        form_data: &form_data,
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/admin/settings/backup")]
async fn backup_settings(
    state: web::Data<AppState>,
    data: Form<BackupSettingsFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let mut form_data = data.into_inner();
    let result: FormSubmitResult = match form_data.validate() {
        Some(settings) => {
            match state
                .backend()
                .validate_backup_path(&admin.token, &settings.backup_path)
                .await
            {
                Ok(validation) if !validation.valid => {
                    form_data.backup_path.add_error(validation.message);
                    FormSubmitResult::ValidationError
                }
                Ok(_) => {
                    let result = state
                        .backend()
                        .update_backup_settings(&admin.token, &settings)
                        .await;
                    if result.is_ok() {
                        state.hub.notify_admin_change().await;
                    }
                    result.into()
                }
                Err(e) => Err::<(), _>(e).into(),
            }
        }
        None => FormSubmitResult::ValidationError,
    };

    let tmpl = BackupSettingsFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Einstellungen",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Settings),
        },
        form_data: &form_data,
    };
    util::create_form_response(
        result,
        tmpl,
        "Einstellungen wurden gespeichert.",
        req.url_for_static("backup_settings_form")?,
        &req,
    )
}

/// Tabs on top of every settings page
#[derive(Clone, Copy, PartialEq)]
enum SettingsTab {
    Station,
    System,
    Backup,
}

impl SettingsTab {
    const ALL: [SettingsTab; 3] = [SettingsTab::Station, SettingsTab::System, SettingsTab::Backup];

    fn title(&self) -> &'static str {
        match self {
            SettingsTab::Station => "Feuerwehr",
            SettingsTab::System => "Kiosk & Bildschirmschoner",
            SettingsTab::Backup => "Backup",
        }
    }

    fn endpoint_name(&self) -> &'static str {
        match self {
            SettingsTab::Station => "station_settings_form",
            SettingsTab::System => "system_settings_form",
            SettingsTab::Backup => "backup_settings_form",
        }
    }
}

/// Context for the settings tab navigation sub-template
struct SettingsTabs<'a> {
    request: &'a HttpRequest,
    active: SettingsTab,
}

impl SettingsTabs<'_> {
    fn all(&self) -> &'static [SettingsTab] {
        &SettingsTab::ALL
    }

    fn url_for_tab(&self, tab: &SettingsTab) -> Result<String, AppError> {
        Ok(self.request.url_for_static(tab.endpoint_name())?.to_string())
    }

    fn is_active(&self, tab: &SettingsTab) -> bool {
        self.active == *tab
    }
}

#[derive(Deserialize)]
struct StationSettingsFormData {
    name: FormValue<NonEmptyString>,
    street: FormValue<String>,
    postal_code: FormValue<String>,
    city: FormValue<String>,
}

impl StationSettingsFormData {
    fn validate(&mut self) -> Option<StationSettings> {
        let name = self.name.validate()?;
        Some(StationSettings {
            name: name.into_inner(),
            street: self.street.optional_text(),
            city: self.city.optional_text(),
            postal_code: self.postal_code.optional_text(),
            logo_path: None,
        })
    }
}

impl From<&StationSettings> for StationSettingsFormData {
    fn from(value: &StationSettings) -> Self {
        let text = |v: &Option<String>| FormValue::from(v.clone().unwrap_or_default());
        Self {
            name: NonEmptyString(value.name.clone()).into(),
            street: text(&value.street),
            postal_code: text(&value.postal_code),
            city: text(&value.city),
        }
    }
}

#[derive(Template)]
#[template(path = "admin_station_settings.html")]
struct StationSettingsFormTemplate<'a> {
    base: BaseTemplateContext<'a>,
    form_data: &'a StationSettingsFormData,
    has_logo: bool,
}

impl StationSettingsFormTemplate<'_> {
    fn tabs(&self) -> SettingsTabs<'_> {
        SettingsTabs {
            request: self.base.request,
            active: SettingsTab::Station,
        }
    }

    fn logo_url(&self) -> Result<String, AppError> {
        Ok(self.base.request.url_for_static("kiosk_logo")?.to_string())
    }
}

#[derive(Deserialize)]
struct SystemSettingsQuery {
    #[serde(default)]
    detect_url: bool,
}

#[derive(Deserialize)]
struct SystemSettingsFormData {
    kiosk_base_url: FormValue<MaybeEmpty<HttpUrl>>,
    kiosk_show_attendance_list: BoolFormValue,
    screensaver_enabled: BoolFormValue,
    screensaver_timeout: FormValue<BoundedU32>,
    screensaver_show_logo: BoolFormValue,
    screensaver_show_clock: BoolFormValue,
}

impl SystemSettingsFormData {
    fn validate(&mut self) -> Option<SystemSettings> {
        let kiosk_base_url = self.kiosk_base_url.validate();
        let screensaver_timeout = self
            .screensaver_timeout
            .validate_with(SCREENSAVER_TIMEOUT_RANGE);
        Some(SystemSettings {
            kiosk_base_url: kiosk_base_url?
                .into_inner()
                .map(HttpUrl::into_inner)
                .unwrap_or_default(),
            kiosk_show_attendance_list: self.kiosk_show_attendance_list.get_value(),
            screensaver_enabled: self.screensaver_enabled.get_value(),
            screensaver_timeout: screensaver_timeout?.0,
            screensaver_show_logo: self.screensaver_show_logo.get_value(),
            screensaver_show_clock: self.screensaver_show_clock.get_value(),
        })
    }
}

impl From<&SystemSettings> for SystemSettingsFormData {
    fn from(value: &SystemSettings) -> Self {
        let base_url = Some(value.kiosk_base_url.clone())
            .filter(|url| !url.is_empty())
            .map(HttpUrl);
        Self {
            kiosk_base_url: MaybeEmpty(base_url).into(),
            kiosk_show_attendance_list: value.kiosk_show_attendance_list.into(),
            screensaver_enabled: value.screensaver_enabled.into(),
            screensaver_timeout: BoundedU32(value.screensaver_timeout).into(),
            screensaver_show_logo: value.screensaver_show_logo.into(),
            screensaver_show_clock: value.screensaver_show_clock.into(),
        }
    }
}

#[derive(Template)]
#[template(path = "admin_system_settings.html")]
struct SystemSettingsFormTemplate<'a> {
    base: BaseTemplateContext<'a>,
    form_data: &'a SystemSettingsFormData,
}

impl SystemSettingsFormTemplate<'_> {
    fn tabs(&self) -> SettingsTabs<'_> {
        SettingsTabs {
            request: self.base.request,
            active: SettingsTab::System,
        }
    }

    fn detect_url(&self) -> Result<String, AppError> {
        let mut url = self.base.request.url_for_static("system_settings_form")?;
        url.set_query(Some("detect_url=true"));
        Ok(url.to_string())
    }

    fn timeout_info(&self) -> String {
        format!(
            "Sekunden ohne Eingabe bis zum Bildschirmschoner ({} bis {})",
            SCREENSAVER_TIMEOUT_RANGE.start(),
            SCREENSAVER_TIMEOUT_RANGE.end()
        )
    }
}

#[derive(Deserialize)]
struct BackupSettingsFormData {
    backup_enabled: BoolFormValue,
    backup_path: FormValue<NonEmptyString>,
    backup_schedule_time: FormValue<TimeOfDay>,
    backup_retention_days: FormValue<BoundedU32>,
}

impl BackupSettingsFormData {
    fn validate(&mut self) -> Option<BackupSettings> {
        let backup_path = self.backup_path.validate();
        let backup_schedule_time = self.backup_schedule_time.validate();
        let backup_retention_days = self
            .backup_retention_days
            .validate_with(BACKUP_RETENTION_RANGE);
        Some(BackupSettings {
            backup_enabled: self.backup_enabled.get_value(),
            backup_path: backup_path?.into_inner(),
            backup_schedule_time: backup_schedule_time?
                .into_inner()
                .format("%H:%M")
                .to_string(),
            backup_retention_days: backup_retention_days?.0,
        })
    }
}

impl From<&BackupSettings> for BackupSettingsFormData {
    fn from(value: &BackupSettings) -> Self {
        let schedule_time = chrono::NaiveTime::parse_from_str(&value.backup_schedule_time, "%H:%M")
            .or_else(|_| {
                chrono::NaiveTime::parse_from_str(&value.backup_schedule_time, "%H:%M:%S")
            })
            .map(|t| TimeOfDay(t).into())
            .unwrap_or_default();
        Self {
            backup_enabled: value.backup_enabled.into(),
            backup_path: NonEmptyString(value.backup_path.clone()).into(),
            backup_schedule_time: schedule_time,
            backup_retention_days: BoundedU32(value.backup_retention_days).into(),
        }
    }
}

#[derive(Template)]
#[template(path = "admin_backup_settings.html")]
struct BackupSettingsFormTemplate<'a> {
    base: BaseTemplateContext<'a>,
    form_data: &'a BackupSettingsFormData,
}

impl BackupSettingsFormTemplate<'_> {
    fn tabs(&self) -> SettingsTabs<'_> {
        SettingsTabs {
            request: self.base.request,
            active: SettingsTab::Backup,
        }
    }
}
