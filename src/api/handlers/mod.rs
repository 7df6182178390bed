pub mod auth;
pub mod courses;
pub mod enrollments;
pub mod lessons;
pub mod notifications;
pub mod profile;
pub mod progress;
pub mod root;
pub mod uploads;
pub mod users;
pub mod vouchers;
