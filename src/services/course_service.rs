use crate::error::{Error, Result};
use crate::models::course::{progress_percent, Course, Module, ModuleStatus};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Outcome of the pure completion transition, applied to the store with a
/// compare-and-swap on the observed index.
#[derive(Debug)]
pub struct CompletionPlan {
    pub modules: Vec<Module>,
    pub observed_index: i32,
    pub new_index: i32,
    pub progress: i32,
}

/// Pure half of the progression state machine: validate that `module_id` is
/// the active module and produce the advanced roadmap. The persistence half
/// lives in [`CourseService::complete_module`].
pub fn plan_completion(
    course: &Course,
    module_id: i32,
    now: DateTime<Utc>,
) -> Result<CompletionPlan> {
    let mut modules = course.modules();
    let module_count = modules.len() as i32;

    let target = modules
        .iter()
        .position(|m| m.id == module_id)
        .ok_or_else(|| Error::NotFound("Module not found".to_string()))?;

    if course.is_finished() {
        return Err(Error::InvalidState(
            "Course is already completed".to_string(),
        ));
    }
    if target as i32 != course.current_module_index {
        return Err(Error::InvalidState(
            "Module must be active to complete".to_string(),
        ));
    }

    modules[target].completed_at = Some(now);
    let new_index = course.current_module_index + 1;

    Ok(CompletionPlan {
        modules,
        observed_index: course.current_module_index,
        new_index,
        progress: progress_percent(new_index, module_count),
    })
}

#[derive(Clone)]
pub struct CourseService {
    pool: PgPool,
}

impl CourseService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Course>> {
        let courses = sqlx::query_as::<_, Course>(
            r#"SELECT * FROM courses WHERE user_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    /// Ownership-scoped fetch; another user's course resolves as missing.
    pub async fn find_owned(&self, course_id: Uuid, user_id: Uuid) -> Result<Course> {
        sqlx::query_as::<_, Course>(r#"SELECT * FROM courses WHERE id = $1 AND user_id = $2"#)
            .bind(course_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Course not found".to_string()))
    }

    /// The only deletion path for courses: explicit user action.
    pub async fn delete_owned(&self, course_id: Uuid, user_id: Uuid) -> Result<()> {
        let result = sqlx::query(r#"DELETE FROM courses WHERE id = $1 AND user_id = $2"#)
            .bind(course_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Course not found".to_string()));
        }
        Ok(())
    }

    /// Resolve a module for the UI-facing selection interface. Locked
    /// modules are rejected here, before any state-changing call is made.
    pub fn select_module(course: &Course, module_id: i32) -> Result<(Module, ModuleStatus)> {
        let module = course
            .modules()
            .into_iter()
            .find(|m| m.id == module_id)
            .ok_or_else(|| Error::NotFound("Module not found".to_string()))?;

        let status = course.status_of(&module);
        if status == ModuleStatus::Locked {
            return Err(Error::InvalidState(
                "Module is locked; complete the earlier modules first".to_string(),
            ));
        }
        Ok((module, status))
    }

    /// Advance the progression state machine by one module. The UPDATE is
    /// guarded on the observed index, so two concurrent completions cannot
    /// both advance from the same starting state.
    pub async fn complete_module(
        &self,
        course_id: Uuid,
        module_id: i32,
        user_id: Uuid,
    ) -> Result<Course> {
        let course = self.find_owned(course_id, user_id).await?;
        let plan = plan_completion(&course, module_id, Utc::now())?;

        let updated = sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET roadmap = $1, current_module_index = $2, progress = $3, updated_at = NOW()
            WHERE id = $4 AND current_module_index = $5
            RETURNING *
            "#,
        )
        .bind(serde_json::to_value(&plan.modules)?)
        .bind(plan.new_index)
        .bind(plan.progress)
        .bind(course.id)
        .bind(plan.observed_index)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            Error::InvalidState(
                "Course progression changed concurrently; reload and retry".to_string(),
            )
        })?;

        tracing::info!(
            course_id = %updated.id,
            module_id,
            progress = updated.progress,
            current_module_index = updated.current_module_index,
            "module completed"
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn course_at_index(index: i32) -> Course {
        let modules: Vec<Module> = (1..=6)
            .map(|order| Module {
                id: order,
                order,
                title: format!("Module {}", order),
                description: "desc".into(),
                content: String::new(),
                completed_at: None,
            })
            .collect();
        Course {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            assessment_id: None,
            topic: "Linear Algebra".into(),
            level: "advanced".into(),
            roadmap: serde_json::to_value(&modules).unwrap(),
            progress: progress_percent(index, 6),
            weaknesses: json!([]),
            assessment_score: 80,
            current_module_index: index,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn selecting_the_active_module_succeeds() {
        let course = course_at_index(2);
        let (module, status) = CourseService::select_module(&course, 3).unwrap();
        assert_eq!(module.order, 3);
        assert_eq!(status, ModuleStatus::Active);
    }

    #[test]
    fn selecting_a_completed_module_succeeds() {
        let course = course_at_index(2);
        let (_, status) = CourseService::select_module(&course, 1).unwrap();
        assert_eq!(status, ModuleStatus::Completed);
    }

    #[test]
    fn selecting_a_locked_module_is_rejected() {
        let course = course_at_index(2);
        let err = CourseService::select_module(&course, 5).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn selecting_an_unknown_module_is_not_found() {
        let course = course_at_index(0);
        let err = CourseService::select_module(&course, 42).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn completing_the_active_module_advances_the_index() {
        let course = course_at_index(0);
        let now = Utc::now();
        let plan = plan_completion(&course, 1, now).unwrap();

        assert_eq!(plan.observed_index, 0);
        assert_eq!(plan.new_index, 1);
        assert_eq!(plan.progress, 17);
        assert_eq!(plan.modules[0].completed_at, Some(now));
        assert!(plan.modules[1..].iter().all(|m| m.completed_at.is_none()));
    }

    #[test]
    fn completing_a_locked_module_is_an_invalid_state() {
        let course = course_at_index(0);
        let err = plan_completion(&course, 3, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn completing_an_already_completed_module_is_an_invalid_state() {
        let course = course_at_index(2);
        let err = plan_completion(&course, 1, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn completing_on_a_finished_course_is_an_invalid_state() {
        let course = course_at_index(6);
        let err = plan_completion(&course, 6, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }
}
