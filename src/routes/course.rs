use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::dto::course_dto::{
    CompleteModuleResponse, CourseDetail, CourseSummary, ModuleDetail,
};
use crate::error::Result;
use crate::middleware::auth::Claims;
use crate::services::course_service::CourseService;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_courses(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let courses = state.course_service.list_for_user(user_id).await?;
    let summaries: Vec<CourseSummary> = courses.iter().map(CourseSummary::from).collect();
    Ok(Json(summaries))
}

#[axum::debug_handler]
pub async fn get_course(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let course = state.course_service.find_owned(course_id, user_id).await?;
    Ok(Json(CourseDetail::from(&course)))
}

#[axum::debug_handler]
pub async fn delete_course(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    state.course_service.delete_owned(course_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Module selection for the UI. Locked modules are rejected here with a
/// conflict, before any state-changing endpoint can be reached.
#[axum::debug_handler]
pub async fn select_module(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((course_id, module_id)): Path<(Uuid, i32)>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let course = state.course_service.find_owned(course_id, user_id).await?;
    let (module, status) = CourseService::select_module(&course, module_id)?;
    Ok(Json(ModuleDetail::from_module(&module, status)))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/modules/{module_id}/complete",
    responses(
        (status = 200, description = "Module completed", body = Json<CompleteModuleResponse>),
        (status = 409, description = "Module is not the active one")
    )
)]
#[axum::debug_handler]
pub async fn complete_module(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((course_id, module_id)): Path<(Uuid, i32)>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let course = state
        .course_service
        .complete_module(course_id, module_id, user_id)
        .await?;

    let response = CompleteModuleResponse {
        course_id: course.id,
        progress: course.progress,
        current_module_index: course.current_module_index,
        finished: course.is_finished(),
    };
    Ok(Json(response))
}
