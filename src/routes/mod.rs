pub mod assessment;
pub mod auth;
pub mod course;
pub mod health;
pub mod tutor;
