use crate::dto::course_dto::ModuleView;
use crate::models::assessment::{Assessment, Question};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct StartAssessmentPayload {
    #[validate(length(min = 1, max = 100, message = "Topic must be 1-100 characters"))]
    pub topic: String,
}

/// Client-facing projection of a question. Deliberately has no field for the
/// correct answer; answers stay server-side until grading.
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub id: i32,
    pub question: String,
    pub options: Vec<String>,
}

impl From<&Question> for QuestionView {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            question: q.question.clone(),
            options: q.options.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StartAssessmentResponse {
    pub assessment_id: Uuid,
    pub topic: String,
    pub questions: Vec<QuestionView>,
    pub expires_at: DateTime<Utc>,
}

impl StartAssessmentResponse {
    pub fn from_assessment(assessment: &Assessment) -> Self {
        Self {
            assessment_id: assessment.id,
            topic: assessment.topic.clone(),
            questions: assessment.questions().iter().map(QuestionView::from).collect(),
            expires_at: assessment.expires_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAssessmentPayload {
    /// Exact option text per question, in question order.
    #[validate(length(min = 1, message = "Answers are required"))]
    pub answers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitAssessmentResponse {
    pub score: i32,
    pub analysis: String,
    pub weaknesses: Vec<String>,
    pub course_id: Uuid,
    pub level: String,
    pub roadmap: Vec<ModuleView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_view_never_exposes_the_correct_answer() {
        let question = Question {
            id: 1,
            question: "What is a determinant?".into(),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_answer: "B".into(),
            user_answer: None,
            is_correct: None,
        };

        let value = serde_json::to_value(QuestionView::from(&question)).unwrap();
        let object = value.as_object().unwrap();
        assert!(object.get("correct_answer").is_none());
        assert!(object.get("correctAnswer").is_none());
        assert!(object.get("user_answer").is_none());
        assert_eq!(object.len(), 3);
    }
}
