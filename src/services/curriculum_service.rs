use crate::error::{Error, Result};
use crate::models::assessment::Assessment;
use crate::models::course::{level_for_score, Course, Module, MODULES_PER_COURSE};
use crate::services::ai_service::{parse_json_payload, Oracle};
use serde_json::Value as JsonValue;
use sqlx::PgPool;

#[derive(Clone)]
pub struct CurriculumService<O> {
    pool: PgPool,
    oracle: O,
}

impl<O: Oracle + Clone> CurriculumService<O> {
    pub fn new(pool: PgPool, oracle: O) -> Self {
        Self { pool, oracle }
    }

    /// Materialize a gated 6-module course from a graded assessment. A
    /// roadmap of any other length is rejected outright; a partially valid
    /// roadmap is never persisted.
    pub async fn plan_roadmap(&self, assessment: &Assessment) -> Result<Course> {
        let score = assessment.score.ok_or_else(|| {
            Error::InvalidState("Assessment must be graded before planning a course".to_string())
        })?;
        let weaknesses = assessment.weakness_labels();
        let questions = assessment.questions();
        let wrong_count = questions
            .iter()
            .filter(|q| q.is_correct == Some(false))
            .count();

        let prompt = roadmap_prompt(
            &assessment.topic,
            score,
            &weaknesses,
            wrong_count,
            questions.len(),
        );
        let raw = self.oracle.complete(&prompt).await?;
        let payload = parse_json_payload(&raw).map_err(|e| match e {
            Error::AiFormat(msg) => Error::AiCurriculum(msg),
            other => other,
        })?;
        let modules = parse_roadmap(&payload)?;
        let level = level_for_score(score);

        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses
                (user_id, assessment_id, topic, level, roadmap, weaknesses, assessment_score)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(assessment.user_id)
        .bind(assessment.id)
        .bind(&assessment.topic)
        .bind(level)
        .bind(serde_json::to_value(&modules)?)
        .bind(serde_json::to_value(&weaknesses)?)
        .bind(score)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            course_id = %course.id,
            topic = %course.topic,
            level,
            score,
            "course roadmap created"
        );
        Ok(course)
    }

    /// The course a graded assessment already produced, if any. Used to
    /// resume planning when a roadmap call failed after grading committed.
    pub async fn find_by_assessment(
        &self,
        assessment_id: uuid::Uuid,
        user_id: uuid::Uuid,
    ) -> Result<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(
            r#"SELECT * FROM courses WHERE assessment_id = $1 AND user_id = $2"#,
        )
        .bind(assessment_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }
}

fn roadmap_prompt(
    topic: &str,
    score: i32,
    weaknesses: &[String],
    wrong_count: usize,
    question_count: usize,
) -> String {
    let weakness_list = if weaknesses.is_empty() {
        "none identified".to_string()
    } else {
        weaknesses.join(", ")
    };

    format!(
        r#"Generate a personalized learning syllabus for "{topic}".

Assessment Results:
- Score: {score}%
- Identified Weaknesses: {weakness_list}
- Wrong answers: {wrong_count} out of {question_count}

CRITICAL REQUIREMENT:
Create exactly {module_count} learning modules. The first 2 modules MUST specifically target and address the identified weaknesses: {weakness_list}.

Modules 3-{module_count} should build upon this foundation and cover the broader topic comprehensively.

Return STRICT JSON with this structure:
{{
  "modules": [
    {{
      "title": "Module title",
      "description": "What this module covers (2-3 sentences)",
      "order": 1
    }}
  ]
}}

Return ONLY valid JSON, no markdown or additional text."#,
        module_count = MODULES_PER_COURSE,
    )
}

/// Validate the oracle's roadmap payload. A module-count mismatch is fatal:
/// no silent truncation or padding.
pub fn parse_roadmap(payload: &JsonValue) -> Result<Vec<Module>> {
    let items = payload
        .get("modules")
        .and_then(|m| m.as_array())
        .or_else(|| payload.as_array())
        .ok_or_else(|| Error::AiCurriculum("roadmap payload lacks a modules array".to_string()))?;

    if items.len() != MODULES_PER_COURSE {
        return Err(Error::AiCurriculum(format!(
            "expected exactly {} modules, got {}",
            MODULES_PER_COURSE,
            items.len()
        )));
    }

    let mut modules = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let title = item
            .get("title")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::AiCurriculum(format!("module {} has no title", idx + 1)))?;
        let description = item
            .get("description")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::AiCurriculum(format!("module {} has no description", idx + 1))
            })?;

        let order = (idx as i32) + 1;
        modules.push(Module {
            id: order,
            order,
            title: title.to_string(),
            description: description.to_string(),
            content: String::new(),
            completed_at: None,
        });
    }

    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roadmap_payload(count: usize) -> JsonValue {
        let modules: Vec<JsonValue> = (0..count)
            .map(|i| {
                json!({
                    "title": format!("Module {}", i + 1),
                    "description": "Covers a slice of the topic in depth.",
                    "order": i + 1
                })
            })
            .collect();
        json!({ "modules": modules })
    }

    #[test]
    fn accepts_exactly_six_modules() {
        let modules = parse_roadmap(&roadmap_payload(6)).unwrap();
        assert_eq!(modules.len(), 6);
        assert_eq!(modules[0].order, 1);
        assert_eq!(modules[5].order, 6);
        assert!(modules.iter().all(|m| m.content.is_empty()));
        assert!(modules.iter().all(|m| m.completed_at.is_none()));
    }

    #[test]
    fn five_modules_is_a_fatal_curriculum_error() {
        let err = parse_roadmap(&roadmap_payload(5)).unwrap_err();
        assert!(matches!(err, Error::AiCurriculum(_)));
    }

    #[test]
    fn seven_modules_is_rejected_not_truncated() {
        let err = parse_roadmap(&roadmap_payload(7)).unwrap_err();
        assert!(matches!(err, Error::AiCurriculum(_)));
    }

    #[test]
    fn missing_description_is_rejected() {
        let mut payload = roadmap_payload(6);
        payload["modules"][3]["description"] = json!("");
        assert!(matches!(
            parse_roadmap(&payload),
            Err(Error::AiCurriculum(_))
        ));
    }

    #[test]
    fn module_ids_follow_order() {
        let modules = parse_roadmap(&roadmap_payload(6)).unwrap();
        for (idx, module) in modules.iter().enumerate() {
            assert_eq!(module.id, (idx as i32) + 1);
            assert_eq!(module.id, module.order);
        }
    }
}
