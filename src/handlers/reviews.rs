use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::review;
use crate::errors::ServiceError;
use crate::services::reviews::CreateReviewRequest;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub course_id: Option<Uuid>,
    pub user_name: String,
    pub rating: i16,
    pub comment: String,
    pub created_at: String,
}

impl From<review::Model> for ReviewResponse {
    fn from(model: review::Model) -> Self {
        Self {
            id: model.id,
            course_id: model.course_id,
            user_name: model.user_name,
            rating: model.rating,
            comment: model.comment,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListReviewsQuery {
    /// Restrict the listing to one course.
    pub course_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/reviews",
    params(ListReviewsQuery),
    responses((status = 200, description = "Recent approved reviews", body = [ReviewResponse])),
    tag = "reviews"
)]
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListReviewsQuery>,
) -> Result<Json<Vec<ReviewResponse>>, ServiceError> {
    let reviews = state.reviews.list(query.course_id).await?;
    Ok(Json(reviews.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review submitted", body = ReviewResponse),
        (status = 400, description = "Validation failure", body = crate::errors::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reviews"
)]
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Json(request): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), ServiceError> {
    let review = state.reviews.create(&claims.email, request).await?;
    Ok((StatusCode::CREATED, Json(review.into())))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reviews", get(list_reviews))
        .route("/reviews", post(create_review))
}
