pub mod models;
pub mod services;

pub use models::StatusNotification;
pub use services::mailer::EmailNotifier;
