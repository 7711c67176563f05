use crate::backend::{get_backend_from_env, AttendanceBackend};
use crate::cli_error::CliError;
use ffw_checkin_api_types::sessions::SessionsQuery;

pub fn print_session_list(include_ended: bool) -> Result<(), CliError> {
    let backend = get_backend_from_env()?;
    let sessions = super::block_on(backend.sessions(&SessionsQuery {
        active_only: !include_ended,
        ..SessionsQuery::default()
    }))??;

    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED)
        .set_header(vec!["id", "type", "begin", "end", "present", "total"])
        .add_rows(sessions.into_iter().map(|session| {
            [
                session.id.to_string(),
                session.event_type.name().to_string(),
                session.started_at.display_long(),
                session
                    .ended_at
                    .map(|t| t.display_long())
                    .unwrap_or_else(|| "aktiv".to_string()),
                session.active_attendees.to_string(),
                session.total_attendees.to_string(),
            ]
        }));

    println!("{table}");
    Ok(())
}
