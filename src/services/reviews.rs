use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Deserialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{review, Review};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Most recent reviews returned by the public listing.
const REVIEW_LIST_LIMIT: u64 = 50;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReviewRequest {
    pub course_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Name is required"))]
    pub user_name: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,
    #[validate(length(min = 1, message = "Comment is required"))]
    pub comment: String,
}

#[derive(Clone)]
pub struct ReviewService {
    db: DbPool,
    event_sender: EventSender,
}

impl ReviewService {
    pub fn new(db: DbPool, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request), fields(user_email = %user_email))]
    pub async fn create(
        &self,
        user_email: &str,
        request: CreateReviewRequest,
    ) -> Result<review::Model, ServiceError> {
        request.validate()?;

        let review = review::ActiveModel {
            id: Set(Uuid::new_v4()),
            course_id: Set(request.course_id),
            user_email: Set(user_email.to_owned()),
            user_name: Set(request.user_name),
            rating: Set(request.rating),
            comment: Set(request.comment),
            approved: Set(true),
            created_at: Set(Utc::now()),
        };
        let review = review.insert(&self.db).await?;

        self.event_sender
            .send(Event::ReviewSubmitted {
                review_id: review.id,
            })
            .await;
        Ok(review)
    }

    /// Newest approved reviews first, capped. A course id narrows the
    /// listing to that course.
    pub async fn list(&self, course_id: Option<Uuid>) -> Result<Vec<review::Model>, ServiceError> {
        let mut query = Review::find()
            .filter(review::Column::Approved.eq(true))
            .order_by_desc(review::Column::CreatedAt)
            .limit(REVIEW_LIST_LIMIT);
        if let Some(course_id) = course_id {
            query = query.filter(review::Column::CourseId.eq(course_id));
        }
        Ok(query.all(&self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_must_be_one_to_five() {
        let base = CreateReviewRequest {
            course_id: None,
            user_name: "Alice".to_string(),
            rating: 5,
            comment: "Great course".to_string(),
        };
        assert!(base.validate().is_ok());

        let zero = CreateReviewRequest { rating: 0, ..request() };
        assert!(zero.validate().is_err());

        let six = CreateReviewRequest { rating: 6, ..request() };
        assert!(six.validate().is_err());
    }

    fn request() -> CreateReviewRequest {
        CreateReviewRequest {
            course_id: None,
            user_name: "Alice".to_string(),
            rating: 5,
            comment: "Great course".to_string(),
        }
    }
}
