use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

pub const MODULES_PER_COURSE: usize = 6;

pub const LEVEL_BEGINNER: &str = "beginner";
pub const LEVEL_INTERMEDIATE: &str = "intermediate";
pub const LEVEL_ADVANCED: &str = "advanced";

/// Gated curriculum instance. `current_module_index` is the single
/// authoritative progression field: per-module status is derived from it and
/// never stored, so two modules can never drift into being active at once.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub user_id: Uuid,
    pub assessment_id: Option<Uuid>,
    pub topic: String,
    pub level: String,
    pub roadmap: JsonValue,
    pub progress: i32,
    pub weaknesses: JsonValue,
    pub assessment_score: i32,
    pub current_module_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn modules(&self) -> Vec<Module> {
        serde_json::from_value(self.roadmap.clone()).unwrap_or_default()
    }

    pub fn weakness_labels(&self) -> Vec<String> {
        serde_json::from_value(self.weaknesses.clone()).unwrap_or_default()
    }

    pub fn module_count(&self) -> i32 {
        self.modules().len() as i32
    }

    /// All modules completed; no module is active.
    pub fn is_finished(&self) -> bool {
        self.current_module_index >= self.module_count()
    }

    pub fn status_of(&self, module: &Module) -> ModuleStatus {
        ModuleStatus::derive(module.order, self.current_module_index)
    }
}

/// One roadmap entry. Content is filled in at most once, on first request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: i32,
    pub order: i32,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    Locked,
    Active,
    Completed,
}

impl ModuleStatus {
    /// Pure mapping from (1-based order, authoritative index) to status.
    /// When the index has run past the roadmap every module is completed.
    pub fn derive(order: i32, current_module_index: i32) -> ModuleStatus {
        let position = order - 1;
        if position < current_module_index {
            ModuleStatus::Completed
        } else if position == current_module_index {
            ModuleStatus::Active
        } else {
            ModuleStatus::Locked
        }
    }
}

/// `progress == round(100 * current_module_index / module_count)`.
pub fn progress_percent(current_module_index: i32, module_count: i32) -> i32 {
    if module_count <= 0 {
        return 0;
    }
    ((current_module_index as f64 / module_count as f64) * 100.0).round() as i32
}

pub fn level_for_score(score: i32) -> &'static str {
    if score >= 70 {
        LEVEL_ADVANCED
    } else if score >= 40 {
        LEVEL_INTERMEDIATE
    } else {
        LEVEL_BEGINNER
    }
}
