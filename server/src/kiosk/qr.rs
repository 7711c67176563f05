//! Mobile check-in via the session's QR code.
//!
//! The QR code shown on the kiosk is rendered by the backend and points to
//! `<kiosk_base_url>/checkin?token=<token>`. A phone opening this URL gets a reduced kiosk (keypad
//! only) bound to the token's session.
use crate::backend::AttendanceBackend;
use ffw_checkin_api_types::sessions::ActiveSession;
use log::{info, warn};

pub const INVALID_QR_CODE_MESSAGE: &str = "Ungültiger QR-Code";

#[derive(Debug, Clone)]
pub enum MobileCheckin {
    Ready {
        token: String,
        session: ActiveSession,
    },
    Invalid,
}

impl MobileCheckin {
    /// Validate the QR token at the backend and look up the bound session among the active ones.
    ///
    /// Any failure, including an unreachable backend, results in [MobileCheckin::Invalid]. There is
    /// no retry.
    pub async fn resolve(backend: &dyn AttendanceBackend, token: Option<&str>) -> Self {
        let token = match token.map(str::trim) {
            Some(token) if !token.is_empty() => token,
            _ => return MobileCheckin::Invalid,
        };
        let session_id = match backend.validate_qr_token(token).await {
            Ok(validation) if validation.valid => match validation.session_id {
                Some(session_id) => session_id,
                None => return MobileCheckin::Invalid,
            },
            Ok(_) => {
                info!("QR token rejected by backend");
                return MobileCheckin::Invalid;
            }
            Err(e) => {
                if e.is_business_error() {
                    info!("QR token rejected by backend: {}", e);
                } else {
                    warn!("Could not validate QR token: {}", e);
                }
                return MobileCheckin::Invalid;
            }
        };
        match backend.active_sessions().await {
            Ok(sessions) => sessions
                .into_iter()
                .find(|s| s.id == session_id)
                .map(|session| MobileCheckin::Ready {
                    token: token.to_owned(),
                    session,
                })
                .unwrap_or(MobileCheckin::Invalid),
            Err(e) => {
                warn!("Could not fetch active sessions for QR check-in: {}", e);
                MobileCheckin::Invalid
            }
        }
    }
}
