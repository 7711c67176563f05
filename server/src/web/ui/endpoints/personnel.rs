use crate::kiosk::toggle::PersonnelNumber;
use crate::web::ui::base_template::{AdminNavButton, BaseTemplateContext};
use crate::web::ui::confirm::{ConfirmOption, ConfirmTemplate};
use crate::web::ui::error::AppError;
use crate::web::ui::form_values::{BoolFormValue, FormValue, _FormValidSimpleValidate};
use crate::web::ui::sub_templates::form_inputs::{
    CheckboxTemplate, FormFieldTemplate, InputConfiguration, SelectEntry, SelectTemplate,
};
use crate::web::ui::util::{self, FormSubmitResult};
use crate::web::ui::validation::{NonEmptyString, PersonnelNumberInput, RankCode};
use crate::web::AppState;
use actix_web::web::{Form, Html, Query};
use actix_web::{get, post, web, HttpRequest, Responder};
use askama::Template;
use ffw_checkin_api_types::personnel::{Personnel, PersonnelData, Rank};
use ffw_checkin_api_types::PersonnelId;
use serde::Deserialize;
use std::borrow::Cow;

#[get("/admin/personnel")]
async fn personnel_list(
    state: web::Data<AppState>,
    query: Query<PersonnelListQuery>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let mut personnel = state
        .backend()
        .personnel(&admin.token, !query.all)
        .await?;
    personnel.sort_by(|a, b| {
        (&a.nachname, &a.vorname).cmp(&(&b.nachname, &b.vorname))
    });

    let tmpl = PersonnelListTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Personal",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Personnel),
        },
        personnel: &personnel,
        shows_all: query.all,
    };
    Ok(Html::new(tmpl.render()?))
}

#[get("/admin/personnel/new")]
async fn new_personnel_form(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let form_data = PersonnelFormData::for_new_personnel();
    let tmpl = EditPersonnelFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Neue Person",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Personnel),
        },
        form_data: &form_data,
        personnel_id: None,
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/admin/personnel/new")]
async fn new_personnel(
    state: web::Data<AppState>,
    data: Form<PersonnelFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let mut form_data = data.into_inner();
    let result: FormSubmitResult = match form_data.validate() {
        Some(personnel) => {
            let result = state
                .backend()
                .create_personnel(&admin.token, &personnel)
                .await;
            if result.is_ok() {
                state.hub.notify_admin_change().await;
            }
            result.into()
        }
        None => FormSubmitResult::ValidationError,
    };

    let tmpl = EditPersonnelFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Neue Person",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Personnel),
        },
        form_data: &form_data,
        personnel_id: None,
    };
    util::create_form_response(
        result,
        tmpl,
        "Person wurde angelegt.",
        req.url_for_static("personnel_list")?,
        &req,
    )
}

#[get("/admin/personnel/{personnel_id}/edit")]
async fn edit_personnel_form(
    path: web::Path<PersonnelId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let personnel_id = path.into_inner();
    let personnel = state
        .backend()
        .personnel_by_id(&admin.token, personnel_id)
        .await?;
    let form_data: PersonnelFormData = (&personnel).into();

    let tmpl = EditPersonnelFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Person bearbeiten",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Personnel),
        },
        form_data: &form_data,
        personnel_id: Some(personnel_id),
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/admin/personnel/{personnel_id}/edit")]
async fn edit_personnel(
    path: web::Path<PersonnelId>,
    state: web::Data<AppState>,
    data: Form<PersonnelFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let personnel_id = path.into_inner();
    let mut form_data = data.into_inner();
    let result: FormSubmitResult = match form_data.validate() {
        Some(personnel) => {
            let result = state
                .backend()
                .update_personnel(&admin.token, personnel_id, &personnel)
                .await;
            if result.is_ok() {
                state.hub.notify_admin_change().await;
            }
            result.into()
        }
        None => FormSubmitResult::ValidationError,
    };

    let tmpl = EditPersonnelFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Person bearbeiten",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Personnel),
        },
        form_data: &form_data,
        personnel_id: Some(personnel_id),
    };
    util::create_form_response(
        result,
        tmpl,
        "Änderung wurde gespeichert.",
        req.url_for_static("personnel_list")?,
        &req,
    )
}

#[get("/admin/personnel/{personnel_id}/delete")]
async fn delete_personnel_form(
    path: web::Path<PersonnelId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let personnel = state
        .backend()
        .personnel_by_id(&admin.token, path.into_inner())
        .await?;
    let id = personnel.id.to_string();

    let tmpl = ConfirmTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Person deaktivieren",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Personnel),
        },
        question: "Soll diese Person deaktiviert werden?",
        details: vec![
            format!("{} {}", personnel.dienstgrad, personnel.full_name()),
            format!("Stammrollennummer: {}", personnel.stammrollennummer),
        ],
        warning: Some(
            "Deaktivierte Personen können nicht mehr einchecken. Beim endgültigen Löschen werden \
            auch alle Anwesenheiten der Person gelöscht.",
        ),
        action_url: req.url_for("delete_personnel", [&id])?,
        cancel_url: req.url_for_static("personnel_list")?,
        confirm_label: "Bestätigen",
        option: Some(ConfirmOption {
            name: "permanent",
            label: "Endgültig löschen",
        }),
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/admin/personnel/{personnel_id}/delete")]
async fn delete_personnel(
    path: web::Path<PersonnelId>,
    state: web::Data<AppState>,
    data: Form<DeletePersonnelFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let permanent = data.permanent.get_value();
    let result = state
        .backend()
        .delete_personnel(&admin.token, path.into_inner(), permanent)
        .await;
    if result.is_ok() {
        state.hub.notify_admin_change().await;
    }
    util::create_action_response(
        result.into(),
        if permanent {
            "Person wurde gelöscht."
        } else {
            "Person wurde deaktiviert."
        },
        req.url_for_static("personnel_list")?,
        &req,
    )
}

#[derive(Deserialize)]
struct PersonnelListQuery {
    #[serde(default)]
    all: bool,
}

#[derive(Template)]
#[template(path = "admin_personnel_list.html")]
struct PersonnelListTemplate<'a> {
    base: BaseTemplateContext<'a>,
    personnel: &'a [Personnel],
    shows_all: bool,
}

impl PersonnelListTemplate<'_> {
    fn url_for_personnel(&self, name: &str, personnel: &Personnel) -> Result<String, AppError> {
        Ok(self
            .base
            .request
            .url_for(name, [personnel.id.to_string()])?
            .to_string())
    }
}

#[derive(Deserialize)]
struct PersonnelFormData {
    stammrollennummer: FormValue<PersonnelNumberInput>,
    vorname: FormValue<NonEmptyString>,
    nachname: FormValue<NonEmptyString>,
    dienstgrad: FormValue<RankCode>,
    is_active: BoolFormValue,
}

impl PersonnelFormData {
    fn for_new_personnel() -> Self {
        Self {
            stammrollennummer: FormValue::empty(),
            vorname: FormValue::default(),
            nachname: FormValue::default(),
            dienstgrad: FormValue::default(),
            is_active: true.into(),
        }
    }

    fn validate(&mut self) -> Option<PersonnelData> {
        let stammrollennummer = self.stammrollennummer.validate();
        let vorname = self.vorname.validate();
        let nachname = self.nachname.validate();
        let dienstgrad = self.dienstgrad.validate();
        Some(PersonnelData {
            stammrollennummer: stammrollennummer?.into_inner(),
            vorname: vorname?.into_inner(),
            nachname: nachname?.into_inner(),
            dienstgrad: dienstgrad?.0.code().to_owned(),
            is_active: self.is_active.get_value(),
        })
    }
}

impl From<&Personnel> for PersonnelFormData {
    fn from(value: &Personnel) -> Self {
        Self {
            stammrollennummer: PersonnelNumber::parse(&value.stammrollennummer)
                .map(|n| PersonnelNumberInput(n).into())
                .unwrap_or_else(|_| FormValue::empty()),
            vorname: NonEmptyString(value.vorname.clone()).into(),
            nachname: NonEmptyString(value.nachname.clone()).into(),
            dienstgrad: Rank::from_code(&value.dienstgrad)
                .map(|rank| RankCode(rank).into())
                .unwrap_or_default(),
            is_active: value.is_active.into(),
        }
    }
}

#[derive(Template)]
#[template(path = "admin_edit_personnel.html")]
struct EditPersonnelFormTemplate<'a> {
    base: BaseTemplateContext<'a>,
    form_data: &'a PersonnelFormData,
    /// None for new persons
    personnel_id: Option<PersonnelId>,
}

impl EditPersonnelFormTemplate<'_> {
    fn rank_entries(&self) -> Vec<SelectEntry<'static>> {
        Rank::ALL
            .iter()
            .map(|rank| SelectEntry {
                value: Cow::Borrowed(rank.code()),
                text: Cow::Owned(format!("{} ({})", rank.name(), rank.code())),
            })
            .collect()
    }

    fn action_url(&self) -> Result<String, AppError> {
        Ok(match self.personnel_id {
            Some(id) => self
                .base
                .request
                .url_for("edit_personnel", [id.to_string()])?,
            None => self.base.request.url_for_static("new_personnel")?,
        }
        .to_string())
    }
}

#[derive(Deserialize)]
struct DeletePersonnelFormData {
    permanent: BoolFormValue,
}
