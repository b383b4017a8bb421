use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::assessment_dto::{
    StartAssessmentPayload, StartAssessmentResponse, SubmitAssessmentPayload,
    SubmitAssessmentResponse,
};
use crate::dto::course_dto::roadmap_views;
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/learn/assessments",
    request_body = StartAssessmentPayload,
    responses(
        (status = 201, description = "Diagnostic quiz generated", body = Json<StartAssessmentResponse>),
        (status = 502, description = "AI output failed validation")
    )
)]
#[axum::debug_handler]
pub async fn start_assessment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StartAssessmentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let assessment = state
        .assessment_service
        .generate_quiz(payload.topic.trim(), user_id)
        .await?;

    let response = StartAssessmentResponse::from_assessment(&assessment);
    Ok((StatusCode::CREATED, Json(response)))
}

/// Grade the quiz, then immediately plan the course from the graded result.
/// Grading is locally computable and commits first; the roadmap call can
/// still fail on its own terms without corrupting the graded assessment.
#[utoipa::path(
    post,
    path = "/api/learn/assessments/{id}/submit",
    request_body = SubmitAssessmentPayload,
    responses(
        (status = 200, description = "Quiz graded and course created", body = Json<SubmitAssessmentResponse>),
        (status = 409, description = "Assessment already graded or expired"),
        (status = 502, description = "AI curriculum failed validation")
    )
)]
#[axum::debug_handler]
pub async fn submit_assessment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(assessment_id): Path<Uuid>,
    Json(payload): Json<SubmitAssessmentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let graded = match state
        .assessment_service
        .grade_quiz(assessment_id, user_id, &payload.answers)
        .await
    {
        Ok(graded) => graded,
        // A graded assessment whose roadmap call failed earlier has no
        // course yet; resume planning instead of dead-ending. An assessment
        // that already has its course stays rejected.
        Err(Error::InvalidState(msg)) => {
            let existing = state
                .assessment_service
                .find_owned(assessment_id, user_id)
                .await?;
            if !existing.is_graded() {
                return Err(Error::InvalidState(msg));
            }
            if state
                .curriculum_service
                .find_by_assessment(assessment_id, user_id)
                .await?
                .is_some()
            {
                return Err(Error::InvalidState(msg));
            }
            existing
        }
        Err(e) => return Err(e),
    };

    let course = state.curriculum_service.plan_roadmap(&graded).await?;

    let response = SubmitAssessmentResponse {
        score: graded.score.unwrap_or_default(),
        weaknesses: graded.weakness_labels(),
        analysis: graded.analysis.unwrap_or_default(),
        course_id: course.id,
        level: course.level.clone(),
        roadmap: roadmap_views(&course),
    };
    Ok(Json(response))
}
