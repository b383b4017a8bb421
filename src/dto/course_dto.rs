use crate::models::course::{Course, Module, ModuleStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Roadmap entry with its derived status. Content is omitted here; it is
/// served by the module-selection and content endpoints.
#[derive(Debug, Serialize)]
pub struct ModuleView {
    pub id: i32,
    pub order: i32,
    pub title: String,
    pub description: String,
    pub status: ModuleStatus,
    pub has_content: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ModuleView {
    pub fn from_module(module: &Module, status: ModuleStatus) -> Self {
        Self {
            id: module.id,
            order: module.order,
            title: module.title.clone(),
            description: module.description.clone(),
            status,
            has_content: !module.content.is_empty(),
            completed_at: module.completed_at,
        }
    }
}

pub fn roadmap_views(course: &Course) -> Vec<ModuleView> {
    course
        .modules()
        .iter()
        .map(|m| ModuleView::from_module(m, course.status_of(m)))
        .collect()
}

#[derive(Debug, Serialize)]
pub struct CourseSummary {
    pub id: Uuid,
    pub topic: String,
    pub level: String,
    pub progress: i32,
    pub module_count: i32,
    pub current_module_index: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&Course> for CourseSummary {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id,
            topic: course.topic.clone(),
            level: course.level.clone(),
            progress: course.progress,
            module_count: course.module_count(),
            current_module_index: course.current_module_index,
            created_at: course.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CourseDetail {
    pub id: Uuid,
    pub topic: String,
    pub level: String,
    pub progress: i32,
    pub weaknesses: Vec<String>,
    pub assessment_score: i32,
    pub current_module_index: i32,
    pub roadmap: Vec<ModuleView>,
    pub created_at: DateTime<Utc>,
}

impl From<&Course> for CourseDetail {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id,
            topic: course.topic.clone(),
            level: course.level.clone(),
            progress: course.progress,
            weaknesses: course.weakness_labels(),
            assessment_score: course.assessment_score,
            current_module_index: course.current_module_index,
            roadmap: roadmap_views(course),
            created_at: course.created_at,
        }
    }
}

/// Full module payload for the selection interface.
#[derive(Debug, Serialize)]
pub struct ModuleDetail {
    pub id: i32,
    pub order: i32,
    pub title: String,
    pub description: String,
    pub status: ModuleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ModuleDetail {
    pub fn from_module(module: &Module, status: ModuleStatus) -> Self {
        Self {
            id: module.id,
            order: module.order,
            title: module.title.clone(),
            description: module.description.clone(),
            status,
            content: (!module.content.is_empty()).then(|| module.content.clone()),
            completed_at: module.completed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompleteModuleResponse {
    pub course_id: Uuid,
    pub progress: i32,
    pub current_module_index: i32,
    pub finished: bool,
}
