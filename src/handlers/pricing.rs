use std::sync::Arc;

use axum::{extract::Query, extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PricingQuery {
    pub course_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PricingResponse {
    /// List price in minor currency units.
    pub base_price_cents: i64,
    /// Price charged while the discount quota has headroom.
    pub discounted_price_cents: i64,
    pub discount_quota: u64,
    pub remaining_discounted: u64,
    pub is_discount_active: bool,
    pub currency: String,
}

/// Quote a course's current price and discount state.
#[utoipa::path(
    get,
    path = "/pricing",
    params(("course_id" = Uuid, Query, description = "Course to quote")),
    responses(
        (status = 200, description = "Current pricing", body = PricingResponse),
        (status = 404, description = "Course not found", body = crate::errors::ErrorResponse)
    ),
    tag = "pricing"
)]
pub async fn get_pricing(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PricingQuery>,
) -> Result<Json<PricingResponse>, ServiceError> {
    let quote = state.pricing.quote(query.course_id).await?;
    Ok(Json(PricingResponse {
        base_price_cents: quote.base_minor,
        discounted_price_cents: quote.discounted_minor,
        discount_quota: quote.discount_quota,
        remaining_discounted: quote.remaining_discounted,
        is_discount_active: quote.is_discount_active,
        currency: quote.currency,
    }))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/pricing", get(get_pricing))
}
