use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use tracing::instrument;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{purchase, Course, Purchase};
use crate::errors::ServiceError;

/// First N paid seats of a course sell at the discounted rate.
pub const DISCOUNT_QUOTA: u64 = 10;

/// Multiplier applied to the base price while the quota has headroom.
pub const DISCOUNT_RATE: Decimal = dec!(0.9);

/// A priced view of one course at one instant. `effective_minor` is the
/// amount a checkout opened right now would charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingQuote {
    pub course_id: Uuid,
    pub base_minor: i64,
    pub discounted_minor: i64,
    pub discount_quota: u64,
    pub paid_count: u64,
    pub remaining_discounted: u64,
    pub is_discount_active: bool,
    pub currency: String,
}

impl PricingQuote {
    pub fn effective_minor(&self) -> i64 {
        if self.is_discount_active {
            self.discounted_minor
        } else {
            self.base_minor
        }
    }
}

/// Converts a major-unit price to minor units, rounding halves away from
/// zero. Rejects non-positive prices.
pub fn price_to_minor_units(price: Decimal) -> Result<i64, ServiceError> {
    if price <= Decimal::ZERO {
        return Err(ServiceError::InvalidPrice);
    }
    (price * dec!(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(ServiceError::InvalidPrice)
}

/// Applies the discount rate to a minor-unit amount, rounding halves away
/// from zero.
pub fn discounted_minor_units(base_minor: i64) -> Result<i64, ServiceError> {
    (Decimal::from(base_minor) * DISCOUNT_RATE)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(ServiceError::InvalidPrice)
}

#[derive(Clone)]
pub struct PricingService {
    db: DbPool,
    currency: String,
}

impl PricingService {
    pub fn new(db: DbPool, currency: String) -> Self {
        Self { db, currency }
    }

    /// Counts rows that have actually been paid for; pending checkout
    /// sessions never consume quota.
    pub async fn paid_count(&self, course_id: Uuid) -> Result<u64, ServiceError> {
        let count = Purchase::find()
            .filter(purchase::Column::CourseId.eq(course_id))
            .filter(purchase::Column::Status.eq(purchase::PurchaseStatus::Paid))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    /// Quotes the course identified by `course_id`, or `NotFound` if it
    /// does not exist.
    #[instrument(skip(self))]
    pub async fn quote(&self, course_id: Uuid) -> Result<PricingQuote, ServiceError> {
        let course = Course::find_by_id(course_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Course not found".to_string()))?;
        self.quote_course(&course).await
    }

    /// Quotes an already-loaded course row.
    pub async fn quote_course(
        &self,
        course: &crate::entities::course::Model,
    ) -> Result<PricingQuote, ServiceError> {
        let base_minor = price_to_minor_units(course.price)?;
        let discounted_minor = discounted_minor_units(base_minor)?;
        let paid_count = self.paid_count(course.id).await?;
        let remaining = DISCOUNT_QUOTA.saturating_sub(paid_count);
        Ok(PricingQuote {
            course_id: course.id,
            base_minor,
            discounted_minor,
            discount_quota: DISCOUNT_QUOTA,
            paid_count,
            remaining_discounted: remaining,
            is_discount_active: remaining > 0,
            currency: self.currency.clone(),
        })
    }
}
