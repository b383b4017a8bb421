use crate::error::{Error, Result};
use crate::models::course::{Course, Module};
use crate::services::ai_service::Oracle;
use sqlx::PgPool;

/// Decision for a content request: serve the cache or generate once.
#[derive(Debug)]
pub enum ContentPlan {
    Cached(String),
    Generate(String),
}

#[derive(Clone)]
pub struct TutorService<O> {
    pool: PgPool,
    oracle: O,
}

/// Pure cache-or-generate decision. Non-empty content is always served
/// verbatim, so the oracle is consulted at most once per module.
pub fn content_plan(course: &Course, module: &Module) -> ContentPlan {
    if !module.content.is_empty() {
        return ContentPlan::Cached(module.content.clone());
    }
    ContentPlan::Generate(content_prompt(course, module))
}

impl<O: Oracle + Clone> TutorService<O> {
    pub fn new(pool: PgPool, oracle: O) -> Self {
        Self { pool, oracle }
    }

    /// Fill the module's content field, generating it on first request.
    /// The write touches only this module's content path in the roadmap
    /// document, so it cannot clobber concurrent progression updates.
    pub async fn ensure_module_content(&self, course: &Course, module_id: i32) -> Result<String> {
        let modules = course.modules();
        let position = modules
            .iter()
            .position(|m| m.id == module_id)
            .ok_or_else(|| Error::NotFound("Module not found".to_string()))?;

        match content_plan(course, &modules[position]) {
            ContentPlan::Cached(content) => Ok(content),
            ContentPlan::Generate(prompt) => {
                let content = self.oracle.complete(&prompt).await?;

                let path: Vec<String> = vec![position.to_string(), "content".to_string()];
                sqlx::query(
                    r#"
                    UPDATE courses
                    SET roadmap = jsonb_set(roadmap, $1, to_jsonb($2::text)), updated_at = NOW()
                    WHERE id = $3
                    "#,
                )
                .bind(&path)
                .bind(&content)
                .bind(course.id)
                .execute(&self.pool)
                .await?;

                tracing::info!(course_id = %course.id, module_id, "module content generated");
                Ok(content)
            }
        }
    }

    /// Stateless tutor Q&A scoped to one module. No history is stored and
    /// concurrent questions do not contend on anything.
    pub async fn ask(&self, course: &Course, module: &Module, question: &str) -> Result<String> {
        let prompt = tutor_prompt(course, module, question);
        self.oracle.complete(&prompt).await
    }
}

fn content_prompt(course: &Course, module: &Module) -> String {
    format!(
        r#"Create comprehensive learning content for this module:

Course Topic: {topic}
Module Title: {title}
Module Description: {description}
Student's Weaknesses: {weaknesses}
Student Level: {level}

Generate detailed learning content that includes:
1. Introduction to the concept
2. Key concepts and definitions
3. Detailed explanations with examples
4. Practical applications
5. Common pitfalls to avoid
6. Summary of key takeaways

Format the content in clear sections with headers. Use markdown formatting.
Make it engaging and easy to understand for a {level} learner.

Content should be 400-600 words."#,
        topic = course.topic,
        title = module.title,
        description = module.description,
        weaknesses = weaknesses_line(course),
        level = course.level,
    )
}

fn tutor_prompt(course: &Course, module: &Module, question: &str) -> String {
    format!(
        r#"You are an AI tutor helping a student learn about "{topic}".

Current Module: {title}
Module Description: {description}
Student's Known Weaknesses: {weaknesses}

Student Question: {question}

Provide a clear, educational response that:
1. Directly answers their question
2. Relates to the module content
3. Uses simple language and examples
4. Encourages deeper understanding

Keep your response concise (3-4 paragraphs maximum)."#,
        topic = course.topic,
        title = module.title,
        description = module.description,
        weaknesses = weaknesses_line(course),
    )
}

fn weaknesses_line(course: &Course) -> String {
    let labels = course.weakness_labels();
    if labels.is_empty() {
        "none identified".to_string()
    } else {
        labels.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn sample_course() -> (Course, Module) {
        let module = Module {
            id: 1,
            order: 1,
            title: "Vectors".into(),
            description: "Vector spaces and operations".into(),
            content: String::new(),
            completed_at: None,
        };
        let course = Course {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            assessment_id: None,
            topic: "Linear Algebra".into(),
            level: "advanced".into(),
            roadmap: serde_json::to_value(vec![module.clone()]).unwrap(),
            progress: 0,
            weaknesses: json!(["eigenvalues"]),
            assessment_score: 80,
            current_module_index: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        (course, module)
    }

    #[test]
    fn empty_content_plans_a_generation() {
        let (course, module) = sample_course();
        match content_plan(&course, &module) {
            ContentPlan::Generate(prompt) => {
                assert!(prompt.contains("Linear Algebra"));
                assert!(prompt.contains("Vectors"));
                assert!(prompt.contains("eigenvalues"));
            }
            ContentPlan::Cached(_) => panic!("expected a generation plan"),
        }
    }

    #[test]
    fn cached_content_is_served_verbatim() {
        let (course, mut module) = sample_course();
        module.content = "# Vectors\nAlready generated.".into();
        match content_plan(&course, &module) {
            ContentPlan::Cached(content) => {
                assert_eq!(content, "# Vectors\nAlready generated.")
            }
            ContentPlan::Generate(_) => panic!("cache should be served"),
        }
    }

    #[test]
    fn tutor_prompt_carries_module_context() {
        let (course, module) = sample_course();
        let prompt = tutor_prompt(&course, &module, "What is a basis?");
        assert!(prompt.contains("What is a basis?"));
        assert!(prompt.contains("Vector spaces and operations"));
    }
}
