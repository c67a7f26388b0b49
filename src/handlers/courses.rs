use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::entities::course;
use crate::errors::ServiceError;
use crate::services::courses::{CreateCourseRequest, UpdateCourseRequest};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CourseResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub detailed_description: String,
    /// Major-unit list price, e.g. "500.00".
    pub price: String,
    pub thumbnail_link: String,
    pub video_link: Option<String>,
    pub resource_link: Option<String>,
    pub created_at: String,
}

impl From<course::Model> for CourseResponse {
    fn from(model: course::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            detailed_description: model.detailed_description,
            price: model.price.to_string(),
            thumbnail_link: model.thumbnail_link,
            video_link: model.video_link,
            resource_link: model.resource_link,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/courses",
    responses((status = 200, description = "All courses, newest first", body = [CourseResponse])),
    tag = "courses"
)]
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CourseResponse>>, ServiceError> {
    let courses = state.courses.list().await?;
    Ok(Json(courses.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course detail", body = CourseResponse),
        (status = 404, description = "Course not found", body = crate::errors::ErrorResponse)
    ),
    tag = "courses"
)]
pub async fn get_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CourseResponse>, ServiceError> {
    let course = state.courses.get(id).await?;
    Ok(Json(course.into()))
}

#[utoipa::path(
    post,
    path = "/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Validation failure", body = crate::errors::ErrorResponse),
        (status = 403, description = "Admin only", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "courses"
)]
pub async fn create_course(
    State(state): State<Arc<AppState>>,
    AdminUser(_claims): AdminUser,
    Json(request): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), ServiceError> {
    let course = state.courses.create(request).await?;
    Ok((StatusCode::CREATED, Json(course.into())))
}

#[utoipa::path(
    put,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 404, description = "Course not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "courses"
)]
pub async fn update_course(
    State(state): State<Arc<AppState>>,
    AdminUser(_claims): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCourseRequest>,
) -> Result<Json<CourseResponse>, ServiceError> {
    let course = state.courses.update(id, request).await?;
    Ok(Json(course.into()))
}

#[utoipa::path(
    delete,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 404, description = "Course not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "courses"
)]
pub async fn delete_course(
    State(state): State<Arc<AppState>>,
    AdminUser(_claims): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.courses.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/courses", get(list_courses))
        .route("/courses", post(create_course))
        .route("/courses/{id}", get(get_course))
        .route("/courses/{id}", put(update_course))
        .route("/courses/{id}", delete(delete_course))
}
