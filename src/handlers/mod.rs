pub mod access;
pub mod auth;
pub mod checkout;
pub mod courses;
pub mod messages;
pub mod pricing;
pub mod reviews;
pub mod webhooks;
