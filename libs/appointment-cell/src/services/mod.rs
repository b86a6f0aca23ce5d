pub mod booking;
pub mod conflict;
pub mod validation;
