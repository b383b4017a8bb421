use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::tutor_dto::{AskTutorPayload, ModuleContentResponse, TutorReply};
use crate::error::Result;
use crate::middleware::auth::Claims;
use crate::services::course_service::CourseService;
use crate::AppState;

/// First request generates and caches the module content; every later
/// request serves the cache without touching the oracle.
#[axum::debug_handler]
pub async fn module_content(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((course_id, module_id)): Path<(Uuid, i32)>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let course = state.course_service.find_owned(course_id, user_id).await?;

    // Gate on accessibility: locked modules never get content generated.
    CourseService::select_module(&course, module_id)?;

    let content = state
        .tutor_service
        .ensure_module_content(&course, module_id)
        .await?;
    Ok(Json(ModuleContentResponse { module_id, content }))
}

#[axum::debug_handler]
pub async fn ask_tutor(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((course_id, module_id)): Path<(Uuid, i32)>,
    Json(payload): Json<AskTutorPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user_id = claims.user_id()?;
    let course = state.course_service.find_owned(course_id, user_id).await?;
    let (module, _status) = CourseService::select_module(&course, module_id)?;

    let response = state
        .tutor_service
        .ask(&course, &module, payload.question.trim())
        .await?;

    Ok(Json(TutorReply {
        response,
        module_title: module.title,
    }))
}
