use std::sync::Arc;

use axum::{extract::Query, extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::MaybeAuthUser;
use crate::errors::ServiceError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub course_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessResponse {
    #[serde(rename = "hasAccess")]
    pub has_access: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Entitlement check for the signed-in user. Anonymous callers get a
/// definitive "no" with a reason instead of a 401, so the frontend can
/// render a login prompt rather than an error page.
#[utoipa::path(
    get,
    path = "/access",
    params(("course_id" = Uuid, Query, description = "Course to check")),
    responses(
        (status = 200, description = "Entitlement state", body = AccessResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "access"
)]
pub async fn check_access(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(claims): MaybeAuthUser,
    Query(query): Query<AccessQuery>,
) -> Result<Json<AccessResponse>, ServiceError> {
    let Some(claims) = claims else {
        return Ok(Json(AccessResponse {
            has_access: false,
            reason: Some("unauthenticated".to_string()),
        }));
    };

    let has_access = state
        .entitlements
        .has_access(&claims.email, query.course_id)
        .await?;
    Ok(Json(AccessResponse {
        has_access,
        reason: None,
    }))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/access", get(check_access))
}
