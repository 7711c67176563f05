use crate::web::ui::base_template::{AdminNavButton, BaseTemplateContext};
use crate::web::ui::error::AppError;
use crate::web::ui::util;
use crate::web::AppState;
use actix_web::web::{Html, Query};
use actix_web::{get, web, HttpRequest, Responder};
use askama::Template;
use ffw_checkin_api_types::audit::{AuditEntry, AuditFilter, AuditPage, AUDIT_PAGE_SIZE};
use serde::{Deserialize, Serialize};

#[get("/admin/audit")]
async fn audit_log(
    state: web::Data<AppState>,
    query: Query<AuditLogQuery>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let query = query.into_inner().normalized();
    let filter = AuditFilter {
        action: query.action.clone(),
        entity_type: query.entity_type.clone(),
        start_date: query.start_date.clone(),
        end_date: query.end_date.clone(),
        offset: query.page * AUDIT_PAGE_SIZE,
        limit: AUDIT_PAGE_SIZE,
    };
    let backend = state.backend();
    let (page, actions, entity_types) = futures::try_join!(
        backend.audit_log(&admin.token, &filter),
        backend.audit_actions(&admin.token),
        backend.audit_entity_types(&admin.token),
    )?;

    let tmpl = AuditLogTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Audit-Log",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::AuditLog),
        },
        previous_page_url: match query.page {
            0 => None,
            page => Some(page_url(&req, &query, page - 1)?),
        },
        next_page_url: if (query.page + 1) * AUDIT_PAGE_SIZE < page.total {
            Some(page_url(&req, &query, query.page + 1)?)
        } else {
            None
        },
        page: &page,
        query: &query,
        actions: &actions,
        entity_types: &entity_types,
    };
    Ok(Html::new(tmpl.render()?))
}

fn page_url(req: &HttpRequest, query: &AuditLogQuery, page: u64) -> Result<String, AppError> {
    let mut url = req.url_for_static("audit_log")?;
    url.set_query(Some(&serde_urlencoded::to_string(AuditLogQuery {
        page,
        ..query.clone()
    })?));
    Ok(url.to_string())
}

#[derive(Clone, Default, Serialize, Deserialize)]
struct AuditLogQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_date: Option<String>,
    #[serde(default)]
    page: u64,
}

impl AuditLogQuery {
    /// Drop empty filter fields (as submitted by the filter form) and dates not in ISO format
    fn normalized(self) -> Self {
        let non_empty = |v: Option<String>| v.filter(|v| !v.trim().is_empty());
        let date = |v: Option<String>| {
            non_empty(v).filter(|v| chrono::NaiveDate::parse_from_str(v, "%Y-%m-%d").is_ok())
        };
        Self {
            action: non_empty(self.action),
            entity_type: non_empty(self.entity_type),
            start_date: date(self.start_date),
            end_date: date(self.end_date),
            page: self.page,
        }
    }
}

#[derive(Template)]
#[template(path = "admin_audit_log.html")]
struct AuditLogTemplate<'a> {
    base: BaseTemplateContext<'a>,
    page: &'a AuditPage,
    query: &'a AuditLogQuery,
    actions: &'a [String],
    entity_types: &'a [String],
    previous_page_url: Option<String>,
    next_page_url: Option<String>,
}

impl AuditLogTemplate<'_> {
    fn is_selected_action(&self, action: &str) -> bool {
        self.query.action.as_deref() == Some(action)
    }

    fn is_selected_entity_type(&self, entity_type: &str) -> bool {
        self.query.entity_type.as_deref() == Some(entity_type)
    }

    fn start_date(&self) -> &str {
        self.query.start_date.as_deref().unwrap_or("")
    }

    fn end_date(&self) -> &str {
        self.query.end_date.as_deref().unwrap_or("")
    }

    fn entity_text(&self, entry: &AuditEntry) -> String {
        match entry.entity_id {
            Some(id) => format!("{} #{}", entry.entity_type, id),
            None => entry.entity_type.clone(),
        }
    }

    /// "51–100 von 230"
    fn range_text(&self) -> String {
        if self.page.logs.is_empty() {
            return "Keine Einträge".to_owned();
        }
        format!(
            "{}–{} von {}",
            self.page.offset + 1,
            self.page.offset + self.page.logs.len() as u64,
            self.page.total
        )
    }
}
