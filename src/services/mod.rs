pub mod ai_service;
pub mod assessment_service;
pub mod course_service;
pub mod curriculum_service;
pub mod grading_service;
pub mod tutor_service;
pub mod user_service;
