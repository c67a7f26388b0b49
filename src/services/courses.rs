use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait, QueryOrder};
use serde::Deserialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{course, Course};
use crate::errors::ServiceError;
use crate::services::pricing::price_to_minor_units;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCourseRequest {
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: String,
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: String,
    #[validate(length(
        min = 20,
        message = "Detailed description must be at least 20 characters"
    ))]
    pub detailed_description: String,
    pub price: Decimal,
    #[validate(url(message = "Thumbnail link must be a valid URL"))]
    pub thumbnail_link: String,
    pub video_link: Option<String>,
    pub resource_link: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: Option<String>,
    #[validate(length(
        min = 20,
        message = "Detailed description must be at least 20 characters"
    ))]
    pub detailed_description: Option<String>,
    pub price: Option<Decimal>,
    pub thumbnail_link: Option<String>,
    pub video_link: Option<String>,
    pub resource_link: Option<String>,
}

#[derive(Clone)]
pub struct CourseService {
    db: DbPool,
}

impl CourseService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<course::Model>, ServiceError> {
        let courses = Course::find()
            .order_by_desc(course::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(courses)
    }

    pub async fn get(&self, id: Uuid) -> Result<course::Model, ServiceError> {
        Course::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Course not found".to_string()))
    }

    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn create(&self, request: CreateCourseRequest) -> Result<course::Model, ServiceError> {
        request.validate()?;
        // Reject prices that cannot be charged before the row exists.
        price_to_minor_units(request.price)?;

        let course = course::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(request.title),
            description: Set(request.description),
            detailed_description: Set(request.detailed_description),
            price: Set(request.price),
            thumbnail_link: Set(request.thumbnail_link),
            video_link: Set(request.video_link),
            resource_link: Set(request.resource_link),
            created_at: Set(Utc::now()),
        };
        Ok(course.insert(&self.db).await?)
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateCourseRequest,
    ) -> Result<course::Model, ServiceError> {
        request.validate()?;
        if let Some(price) = request.price {
            price_to_minor_units(price)?;
        }

        let existing = self.get(id).await?;
        let mut active: course::ActiveModel = existing.into();
        if let Some(title) = request.title {
            active.title = Set(title);
        }
        if let Some(description) = request.description {
            active.description = Set(description);
        }
        if let Some(detailed) = request.detailed_description {
            active.detailed_description = Set(detailed);
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if let Some(thumbnail) = request.thumbnail_link {
            active.thumbnail_link = Set(thumbnail);
        }
        if let Some(video) = request.video_link {
            active.video_link = Set(Some(video));
        }
        if let Some(resource) = request.resource_link {
            active.resource_link = Set(Some(resource));
        }
        Ok(active.update(&self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = Course::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Course not found".to_string()));
        }
        Ok(())
    }
}
