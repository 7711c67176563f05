use crate::web::ui::base_template::{AdminNavButton, BaseTemplateContext};
use crate::web::ui::confirm::ConfirmTemplate;
use crate::web::ui::error::AppError;
use crate::web::ui::form_values::{FormValue, _FormValidSimpleValidate};
use crate::web::ui::sub_templates::form_inputs::{
    FormFieldTemplate, InputConfiguration, InputType, SelectEntry, SelectTemplate,
};
use crate::web::ui::util::{self, FormSubmitResult};
use crate::web::ui::validation::{DateTimeLocal, MaybeEmpty, NonEmptyString, PriorityFromList};
use crate::web::AppState;
use actix_web::web::{Form, Html};
use actix_web::{get, post, web, HttpRequest, Responder};
use askama::Template;
use ffw_checkin_api_types::content::{Announcement, AnnouncementData, Priority};
use ffw_checkin_api_types::{AnnouncementId, Timestamp};
use serde::Deserialize;
use std::borrow::Cow;

#[get("/admin/announcements")]
async fn announcements_list(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let mut announcements = state.backend().announcements(&admin.token).await?;
    announcements.sort_by_key(|a| (a.priority, std::cmp::Reverse(a.valid_from)));
    let now = Timestamp(chrono::Local::now().naive_local());

    let tmpl = AnnouncementsListTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Ankündigungen",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Announcements),
        },
        announcements: &announcements,
        now,
    };
    Ok(Html::new(tmpl.render()?))
}

#[get("/admin/announcements/new")]
async fn new_announcement_form(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let form_data = AnnouncementFormData::default();
    let tmpl = EditAnnouncementFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Neue Ankündigung",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Announcements),
        },
        form_data: &form_data,
        announcement_id: None,
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/admin/announcements/new")]
async fn new_announcement(
    state: web::Data<AppState>,
    data: Form<AnnouncementFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let mut form_data = data.into_inner();
    let result: FormSubmitResult = match form_data.validate() {
        Some(announcement) => {
            let result = state
                .backend()
                .create_announcement(&admin.token, &announcement)
                .await;
            if result.is_ok() {
                state.hub.notify_admin_change().await;
            }
            result.into()
        }
        None => FormSubmitResult::ValidationError,
    };

    let tmpl = EditAnnouncementFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Neue Ankündigung",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Announcements),
        },
        form_data: &form_data,
        announcement_id: None,
    };
    util::create_form_response(
        result,
        tmpl,
        "Ankündigung wurde erstellt.",
        req.url_for_static("announcements_list")?,
        &req,
    )
}

#[get("/admin/announcements/{announcement_id}/edit")]
async fn edit_announcement_form(
    path: web::Path<AnnouncementId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let announcement_id = path.into_inner();
    let announcement = state
        .backend()
        .announcement(&admin.token, announcement_id)
        .await?;
    let form_data: AnnouncementFormData = announcement.into();

    let tmpl = EditAnnouncementFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Ankündigung bearbeiten",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Announcements),
        },
        form_data: &form_data,
        announcement_id: Some(announcement_id),
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/admin/announcements/{announcement_id}/edit")]
async fn edit_announcement(
    path: web::Path<AnnouncementId>,
    state: web::Data<AppState>,
    data: Form<AnnouncementFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let announcement_id = path.into_inner();
    let mut form_data = data.into_inner();
    let result: FormSubmitResult = match form_data.validate() {
        Some(announcement) => {
            let result = state
                .backend()
                .update_announcement(&admin.token, announcement_id, &announcement)
                .await;
            if result.is_ok() {
                state.hub.notify_admin_change().await;
            }
            result.into()
        }
        None => FormSubmitResult::ValidationError,
    };

    let tmpl = EditAnnouncementFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Ankündigung bearbeiten",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Announcements),
        },
        form_data: &form_data,
        announcement_id: Some(announcement_id),
    };
    util::create_form_response(
        result,
        tmpl,
        "Änderung wurde gespeichert.",
        req.url_for_static("announcements_list")?,
        &req,
    )
}

#[get("/admin/announcements/{announcement_id}/delete")]
async fn delete_announcement_form(
    path: web::Path<AnnouncementId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let announcement = state
        .backend()
        .announcement(&admin.token, path.into_inner())
        .await?;
    let id = announcement.id.to_string();

    let tmpl = ConfirmTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Ankündigung löschen",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Announcements),
        },
        question: "Soll diese Ankündigung gelöscht werden?",
        details: vec![
            announcement.title.clone(),
            format!("Priorität: {}", announcement.priority.name()),
        ],
        warning: None,
        action_url: req.url_for("delete_announcement", [&id])?,
        cancel_url: req.url_for_static("announcements_list")?,
        confirm_label: "Löschen",
        option: None,
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/admin/announcements/{announcement_id}/delete")]
async fn delete_announcement(
    path: web::Path<AnnouncementId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let result = state
        .backend()
        .delete_announcement(&admin.token, path.into_inner())
        .await;
    if result.is_ok() {
        state.hub.notify_admin_change().await;
    }
    util::create_action_response(
        result.into(),
        "Ankündigung wurde gelöscht.",
        req.url_for_static("announcements_list")?,
        &req,
    )
}

#[derive(Template)]
#[template(path = "admin_announcements_list.html")]
struct AnnouncementsListTemplate<'a> {
    base: BaseTemplateContext<'a>,
    announcements: &'a [Announcement],
    now: Timestamp,
}

impl AnnouncementsListTemplate<'_> {
    fn is_current(&self, announcement: &Announcement) -> bool {
        announcement.valid_from.map_or(true, |from| from <= self.now)
            && announcement.valid_until.map_or(true, |until| until >= self.now)
    }

    fn url_for_announcement(
        &self,
        name: &str,
        announcement: &Announcement,
    ) -> Result<String, AppError> {
        Ok(self
            .base
            .request
            .url_for(name, [announcement.id.to_string()])?
            .to_string())
    }
}

#[derive(Default, Deserialize)]
struct AnnouncementFormData {
    title: FormValue<NonEmptyString>,
    content: FormValue<NonEmptyString>,
    priority: FormValue<PriorityFromList>,
    valid_from: FormValue<MaybeEmpty<DateTimeLocal>>,
    valid_until: FormValue<MaybeEmpty<DateTimeLocal>>,
}

impl AnnouncementFormData {
    fn validate(&mut self) -> Option<AnnouncementData> {
        let title = self.title.validate();
        let content = self.content.validate();
        let priority = self
            .priority
            .validate_with(&Priority::FOR_ANNOUNCEMENTS[..]);
        let valid_from = self.valid_from.validate();
        let valid_until = self.valid_until.validate();

        let valid_from = valid_from?.into_inner().map(|v| v.0);
        let valid_until = valid_until?.into_inner().map(|v| v.0);
        if let (Some(from), Some(until)) = (valid_from, valid_until) {
            if until <= from {
                self.valid_until
                    .add_error("Muss nach dem Beginn der Gültigkeit liegen".to_owned());
                return None;
            }
        }
        Some(AnnouncementData {
            title: title?.into_inner(),
            content: content?.into_inner(),
            priority: priority?.0,
            valid_from,
            valid_until,
        })
    }
}

impl From<Announcement> for AnnouncementFormData {
    fn from(value: Announcement) -> Self {
        Self {
            title: NonEmptyString(value.title).into(),
            content: NonEmptyString(value.content).into(),
            priority: PriorityFromList(value.priority).into(),
            valid_from: MaybeEmpty(value.valid_from.map(DateTimeLocal)).into(),
            valid_until: MaybeEmpty(value.valid_until.map(DateTimeLocal)).into(),
        }
    }
}

#[derive(Template)]
#[template(path = "admin_edit_announcement.html")]
struct EditAnnouncementFormTemplate<'a> {
    base: BaseTemplateContext<'a>,
    form_data: &'a AnnouncementFormData,
    /// None for new announcements
    announcement_id: Option<AnnouncementId>,
}

impl EditAnnouncementFormTemplate<'_> {
    fn priority_entries(&self) -> Vec<SelectEntry<'static>> {
        priority_entries(&Priority::FOR_ANNOUNCEMENTS)
    }

    fn action_url(&self) -> Result<String, AppError> {
        Ok(match self.announcement_id {
            Some(id) => self
                .base
                .request
                .url_for("edit_announcement", [id.to_string()])?,
            None => self.base.request.url_for_static("new_announcement")?,
        }
        .to_string())
    }
}

pub(super) fn priority_entries(priorities: &[Priority]) -> Vec<SelectEntry<'static>> {
    priorities
        .iter()
        .map(|p| SelectEntry {
            value: Cow::Borrowed(p.code()),
            text: Cow::Borrowed(p.name()),
        })
        .collect()
}
