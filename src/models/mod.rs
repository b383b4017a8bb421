pub mod assessment;
pub mod course;
pub mod user;
