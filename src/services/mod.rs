pub mod accounts;
pub mod checkout;
pub mod courses;
pub mod entitlements;
pub mod messages;
pub mod pricing;
pub mod reviews;
