pub mod announcements;
pub mod audit;
pub mod auth;
pub mod backups;
pub mod dashboard;
pub mod kiosk;
pub mod mobile_checkin;
pub mod news;
pub mod personnel;
pub mod sessions;
pub mod settings;
pub mod statistics;
pub mod system;
