pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    ai_service::GeminiService, assessment_service::AssessmentService,
    course_service::CourseService, curriculum_service::CurriculumService,
    tutor_service::TutorService, user_service::UserService,
};
use reqwest::Client;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub user_service: UserService,
    pub assessment_service: AssessmentService<GeminiService>,
    pub curriculum_service: CurriculumService<GeminiService>,
    pub course_service: CourseService,
    pub tutor_service: TutorService<GeminiService>,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(90))
            .build()
            .unwrap();

        let oracle = GeminiService::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            http_client,
        );

        let user_service = UserService::new(pool.clone());
        let assessment_service = AssessmentService::new(pool.clone(), oracle.clone());
        let curriculum_service = CurriculumService::new(pool.clone(), oracle.clone());
        let course_service = CourseService::new(pool.clone());
        let tutor_service = TutorService::new(pool.clone(), oracle);

        Self {
            pool,
            user_service,
            assessment_service,
            curriculum_service,
            course_service,
            tutor_service,
        }
    }
}
