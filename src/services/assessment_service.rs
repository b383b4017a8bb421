use crate::error::{Error, Result};
use crate::models::assessment::{Assessment, Question, OPTIONS_PER_QUESTION, QUESTIONS_PER_QUIZ};
use crate::services::ai_service::{parse_json_payload, Oracle};
use crate::services::grading_service::{GradingService, WrongAnswer};
use chrono::{Duration, Utc};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct AssessmentService<O> {
    pool: PgPool,
    oracle: O,
}

impl<O: Oracle + Clone> AssessmentService<O> {
    pub fn new(pool: PgPool, oracle: O) -> Self {
        Self { pool, oracle }
    }

    /// Generate a diagnostic quiz for the topic and persist it with a TTL.
    /// The returned record still carries the correct answers; the route layer
    /// projects them away before anything leaves the server.
    pub async fn generate_quiz(&self, topic: &str, user_id: Uuid) -> Result<Assessment> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(Error::BadRequest("Topic is required".to_string()));
        }

        let prompt = quiz_prompt(topic);
        let raw = self.oracle.complete(&prompt).await?;
        let payload = parse_json_payload(&raw)?;
        let questions = parse_questions(&payload)?;

        let ttl = crate::config::get_config().assessment_ttl_minutes;
        let expires_at = Utc::now() + Duration::minutes(ttl);

        let assessment = sqlx::query_as::<_, Assessment>(
            r#"
            INSERT INTO assessments (user_id, topic, questions, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(topic)
        .bind(serde_json::to_value(&questions)?)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(assessment_id = %assessment.id, topic, "diagnostic quiz generated");
        Ok(assessment)
    }

    /// Ownership-scoped fetch. A record owned by someone else resolves the
    /// same as a missing one.
    pub async fn find_owned(&self, assessment_id: Uuid, user_id: Uuid) -> Result<Assessment> {
        sqlx::query_as::<_, Assessment>(
            r#"SELECT * FROM assessments WHERE id = $1 AND user_id = $2"#,
        )
        .bind(assessment_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Assessment not found".to_string()))
    }

    /// Grade the quiz exactly once. The numeric result is computed locally;
    /// the weakness analysis is an oracle sub-step that degrades to an empty
    /// label list instead of failing the grade.
    pub async fn grade_quiz(
        &self,
        assessment_id: Uuid,
        user_id: Uuid,
        answers: &[String],
    ) -> Result<Assessment> {
        let assessment = self.find_owned(assessment_id, user_id).await?;

        if assessment.is_graded() {
            return Err(Error::InvalidState(
                "Assessment has already been graded".to_string(),
            ));
        }
        let now = Utc::now();
        if assessment.is_expired(now) {
            return Err(Error::InvalidState(
                "Assessment session has expired".to_string(),
            ));
        }

        let mut questions = assessment.questions();
        if answers.len() != questions.len() {
            return Err(Error::BadRequest(format!(
                "Expected {} answers, got {}",
                questions.len(),
                answers.len()
            )));
        }

        let outcome = GradingService::grade(&mut questions, answers);
        let (analysis, weaknesses) = self
            .analyze_weaknesses(&assessment.topic, outcome.score, &outcome.wrong_answers)
            .await;

        // Conditional write: a raced second grading finds no ungraded row.
        let updated = sqlx::query_as::<_, Assessment>(
            r#"
            UPDATE assessments
            SET questions = $1, score = $2, analysis = $3, weaknesses = $4, completed_at = $5
            WHERE id = $6 AND completed_at IS NULL
            RETURNING *
            "#,
        )
        .bind(serde_json::to_value(&questions)?)
        .bind(outcome.score)
        .bind(&analysis)
        .bind(serde_json::to_value(&weaknesses)?)
        .bind(now)
        .bind(assessment.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::InvalidState("Assessment has already been graded".to_string()))?;

        tracing::info!(
            assessment_id = %updated.id,
            score = outcome.score,
            wrong = outcome.wrong_answers.len(),
            "assessment graded"
        );
        Ok(updated)
    }

    async fn analyze_weaknesses(
        &self,
        topic: &str,
        score: i32,
        wrong_answers: &[WrongAnswer],
    ) -> (String, Vec<String>) {
        if wrong_answers.is_empty() {
            return (
                format!(
                    "Perfect score on the {} diagnostic. No weak areas were identified.",
                    topic
                ),
                Vec::new(),
            );
        }

        let prompt = analysis_prompt(topic, score, wrong_answers);
        let parsed = match self.oracle.complete(&prompt).await {
            Ok(raw) => parse_json_payload(&raw),
            Err(e) => Err(e),
        };

        match parsed {
            Ok(value) => {
                let analysis = value
                    .get("analysis")
                    .and_then(|v| v.as_str())
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| fallback_analysis(score, wrong_answers.len()));
                let weaknesses = value
                    .get("weaknesses")
                    .and_then(|v| v.as_array())
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|w| w.as_str())
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .take(4)
                            .collect()
                    })
                    .unwrap_or_default();
                (analysis, weaknesses)
            }
            Err(e) => {
                tracing::warn!(error = %e, "weakness analysis degraded to local summary");
                (fallback_analysis(score, wrong_answers.len()), Vec::new())
            }
        }
    }

    /// Sweep ungraded assessments past their TTL. Graded rows are durable.
    pub async fn cleanup_expired(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"DELETE FROM assessments WHERE completed_at IS NULL AND expires_at <= NOW()"#,
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

fn fallback_analysis(score: i32, wrong_count: usize) -> String {
    format!(
        "You scored {}% with {} incorrect answer(s). Review the questions you missed before starting the course.",
        score, wrong_count
    )
}

fn quiz_prompt(topic: &str) -> String {
    format!(
        r#"Create a diagnostic assessment for the topic: "{topic}".

Generate exactly {count} multiple-choice questions that will help identify the learner's current knowledge level and weaknesses.

Requirements:
- Questions should range from basic to advanced
- Each question must have exactly {options} options
- Include diverse difficulty levels to accurately assess understanding
- Cover different subtopics within {topic}

Return a JSON object with this EXACT structure:
{{
  "questions": [
    {{
      "question": "Question text here?",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "correct_answer": "The exact text of the correct option"
    }}
  ]
}}

IMPORTANT: Return ONLY valid JSON, no markdown or additional text."#,
        topic = topic,
        count = QUESTIONS_PER_QUIZ,
        options = OPTIONS_PER_QUESTION,
    )
}

fn analysis_prompt(topic: &str, score: i32, wrong_answers: &[WrongAnswer]) -> String {
    let wrong_summary = wrong_answers
        .iter()
        .enumerate()
        .map(|(i, wa)| {
            format!(
                "{}. Q: {}\n   User answered: {}\n   Correct answer: {}",
                i + 1,
                wa.question,
                wa.user_answer,
                wa.correct_answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"Analyze these quiz results for the topic "{topic}":

Score: {score}%
Wrong Answers:
{wrong_summary}

Provide:
1. A brief analysis of what concepts the learner struggles with
2. List 2-4 specific weakness areas/subtopics they need to focus on

Return JSON:
{{
  "analysis": "Brief analysis paragraph",
  "weaknesses": ["weakness 1", "weakness 2", "weakness 3"]
}}"#,
    )
}

/// Validate the oracle's quiz payload into the fixed question schema.
/// Accepts either a bare array or an object with a `questions` array.
pub fn parse_questions(payload: &JsonValue) -> Result<Vec<Question>> {
    let items = payload
        .get("questions")
        .and_then(|q| q.as_array())
        .or_else(|| payload.as_array())
        .ok_or_else(|| Error::AiFormat("quiz payload lacks a questions array".to_string()))?;

    if items.len() != QUESTIONS_PER_QUIZ {
        return Err(Error::AiFormat(format!(
            "expected exactly {} questions, got {}",
            QUESTIONS_PER_QUIZ,
            items.len()
        )));
    }

    let mut questions = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let question = item
            .get("question")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::AiFormat(format!("question {} has no text", idx + 1)))?;

        let options: Vec<String> = item
            .get("options")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|o| o.as_str())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();

        if options.len() != OPTIONS_PER_QUESTION || options.iter().any(|o| o.trim().is_empty()) {
            return Err(Error::AiFormat(format!(
                "question {} must have exactly {} non-empty options",
                idx + 1,
                OPTIONS_PER_QUESTION
            )));
        }

        let correct_answer = item
            .get("correct_answer")
            .or_else(|| item.get("correctAnswer"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                Error::AiFormat(format!("question {} has no correct answer", idx + 1))
            })?;

        // The stored answer must be byte-equal to one of the options.
        if !options.iter().any(|o| o == correct_answer) {
            return Err(Error::AiFormat(format!(
                "question {}: correct answer does not match any option",
                idx + 1
            )));
        }

        questions.push(Question {
            id: (idx as i32) + 1,
            question: question.to_string(),
            options,
            correct_answer: correct_answer.to_string(),
            user_answer: None,
            is_correct: None,
        });
    }

    Ok(questions)
}
