use crate::web::ui::base_template::{AdminNavButton, BaseTemplateContext};
use crate::web::ui::error::AppError;
use crate::web::ui::util;
use crate::web::AppState;
use actix_web::web::{Html, Query};
use actix_web::{get, web, HttpRequest, Responder};
use askama::Template;
use chrono::Datelike;
use ffw_checkin_api_types::personnel::Personnel;
use ffw_checkin_api_types::statistics::{PersonnelYearly, UnitYearly};
use ffw_checkin_api_types::PersonnelId;
use serde::{Deserialize, Serialize};

/// Number of past years offered in the year selection
const SELECTABLE_YEARS: i32 = 5;

#[get("/admin/statistics")]
async fn unit_statistics(
    state: web::Data<AppState>,
    query: Query<YearQuery>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let year = query.year_or_current();
    let backend = state.backend();
    let (statistics, mut personnel) = futures::try_join!(
        backend.unit_yearly(&admin.token, year),
        backend.personnel(&admin.token, false),
    )?;
    personnel.sort_by(|a, b| (&a.nachname, &a.vorname).cmp(&(&b.nachname, &b.vorname)));

    let tmpl = UnitStatisticsTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Statistik",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Statistics),
        },
        statistics: &statistics,
        personnel: &personnel,
    };
    Ok(Html::new(tmpl.render()?))
}

#[get("/admin/statistics/pdf")]
async fn unit_statistics_pdf(
    state: web::Data<AppState>,
    query: Query<YearQuery>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let file = state
        .backend()
        .unit_yearly_pdf(&admin.token, query.year_or_current())
        .await?;
    Ok(util::binary_file_response(file, true))
}

#[get("/admin/statistics/personnel/{personnel_id}")]
async fn personnel_statistics(
    path: web::Path<PersonnelId>,
    state: web::Data<AppState>,
    query: Query<YearQuery>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let statistics = state
        .backend()
        .personnel_yearly(&admin.token, path.into_inner(), query.year_or_current())
        .await?;

    let tmpl = PersonnelStatisticsTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Statistik",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Statistics),
        },
        statistics: &statistics,
    };
    Ok(Html::new(tmpl.render()?))
}

#[get("/admin/statistics/personnel/{personnel_id}/pdf")]
async fn personnel_statistics_pdf(
    path: web::Path<PersonnelId>,
    state: web::Data<AppState>,
    query: Query<YearQuery>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let file = state
        .backend()
        .personnel_yearly_pdf(&admin.token, path.into_inner(), query.year_or_current())
        .await?;
    Ok(util::binary_file_response(file, true))
}

#[derive(Default, Serialize, Deserialize)]
struct YearQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    year: Option<i32>,
}

impl YearQuery {
    fn year_or_current(&self) -> i32 {
        self.year.unwrap_or_else(current_year)
    }
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

fn selectable_years(selected: i32) -> Vec<i32> {
    let current = current_year();
    let mut years: Vec<i32> = (current - SELECTABLE_YEARS..=current).rev().collect();
    if !years.contains(&selected) {
        years.push(selected);
        years.sort_unstable_by(|a, b| b.cmp(a));
    }
    years
}

fn url_with_year(
    req: &HttpRequest,
    name: &str,
    elements: &[String],
    year: i32,
) -> Result<String, AppError> {
    let mut url = req.url_for(name, elements)?;
    url.set_query(Some(&serde_urlencoded::to_string(YearQuery {
        year: Some(year),
    })?));
    Ok(url.to_string())
}

/// Width of a bar in a bar chart row, in percent of the largest value
fn bar_width(value: f64, max: f64) -> u32 {
    if max <= 0.0 {
        0
    } else {
        (value / max * 100.0).round().clamp(0.0, 100.0) as u32
    }
}

#[derive(Template)]
#[template(path = "admin_unit_statistics.html")]
struct UnitStatisticsTemplate<'a> {
    base: BaseTemplateContext<'a>,
    statistics: &'a UnitYearly,
    personnel: &'a [Personnel],
}

impl UnitStatisticsTemplate<'_> {
    fn years(&self) -> Vec<i32> {
        selectable_years(self.statistics.year)
    }

    fn pdf_url(&self) -> Result<String, AppError> {
        url_with_year(
            self.base.request,
            "unit_statistics_pdf",
            &[],
            self.statistics.year,
        )
    }

    fn personnel_url(&self, personnel_id: &PersonnelId) -> Result<String, AppError> {
        url_with_year(
            self.base.request,
            "personnel_statistics",
            &[personnel_id.to_string()],
            self.statistics.year,
        )
    }

    fn average_text(&self) -> String {
        format!("{:.1}", self.statistics.summary.average_attendance_per_session)
    }

    fn month_bar_width(&self, total_sessions: &u32) -> u32 {
        let max = self
            .statistics
            .monthly
            .iter()
            .map(|m| m.total_sessions)
            .max()
            .unwrap_or(0);
        bar_width(*total_sessions as f64, max as f64)
    }
}

#[derive(Template)]
#[template(path = "admin_personnel_statistics.html")]
struct PersonnelStatisticsTemplate<'a> {
    base: BaseTemplateContext<'a>,
    statistics: &'a PersonnelYearly,
}

impl PersonnelStatisticsTemplate<'_> {
    fn years(&self) -> Vec<i32> {
        selectable_years(self.statistics.year)
    }

    fn pdf_url(&self) -> Result<String, AppError> {
        url_with_year(
            self.base.request,
            "personnel_statistics_pdf",
            &[self.statistics.personnel.id.to_string()],
            self.statistics.year,
        )
    }

    fn unit_url(&self) -> Result<String, AppError> {
        url_with_year(
            self.base.request,
            "unit_statistics",
            &[],
            self.statistics.year,
        )
    }

    fn hours_text(&self, hours: &f64) -> String {
        format!("{:.1}", hours)
    }

    fn rate_text(&self) -> String {
        format!("{:.0} %", self.statistics.summary.attendance_rate)
    }

    fn month_bar_width(&self, count: &u32) -> u32 {
        let max = self
            .statistics
            .monthly
            .iter()
            .map(|m| m.count)
            .max()
            .unwrap_or(0);
        bar_width(*count as f64, max as f64)
    }
}
