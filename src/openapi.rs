use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::errors::ErrorResponse;
use crate::handlers;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::pricing::get_pricing,
        handlers::checkout::create_checkout,
        handlers::checkout::confirm_checkout,
        handlers::webhooks::handle_webhook,
        handlers::access::check_access,
        handlers::courses::list_courses,
        handlers::courses::get_course,
        handlers::courses::create_course,
        handlers::courses::update_course,
        handlers::courses::delete_course,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::me,
        handlers::reviews::list_reviews,
        handlers::reviews::create_review,
        handlers::messages::submit_contact,
        handlers::messages::list_messages,
        handlers::messages::mark_message_read,
        handlers::messages::reply_to_message,
    ),
    components(schemas(
        ErrorResponse,
        handlers::pricing::PricingResponse,
        handlers::checkout::CheckoutRequest,
        handlers::checkout::CheckoutResponse,
        handlers::checkout::ConfirmResponse,
        handlers::webhooks::WebhookAck,
        handlers::access::AccessResponse,
        handlers::courses::CourseResponse,
        handlers::auth::UserResponse,
        handlers::auth::AuthResponse,
        handlers::reviews::ReviewResponse,
        handlers::messages::ContactMessageResponse,
        services::courses::CreateCourseRequest,
        services::courses::UpdateCourseRequest,
        services::accounts::RegisterRequest,
        services::accounts::LoginRequest,
        services::reviews::CreateReviewRequest,
        services::messages::ContactRequest,
        services::messages::ReplyRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "pricing", description = "Discount-aware course pricing"),
        (name = "checkout", description = "Hosted checkout and payment confirmation"),
        (name = "webhooks", description = "Payment gateway event delivery"),
        (name = "access", description = "Course entitlement checks"),
        (name = "courses", description = "Course catalog"),
        (name = "auth", description = "Accounts and sessions"),
        (name = "reviews", description = "Course reviews"),
        (name = "messages", description = "Contact form and admin replies"),
    ),
    info(
        title = "CourseHub API",
        description = "Course marketplace backend: catalog, discount pricing, checkout and entitlements."
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
