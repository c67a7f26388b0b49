pub mod contact_message;
pub mod course;
pub mod purchase;
pub mod review;
pub mod user;

pub use contact_message::Entity as ContactMessage;
pub use course::Entity as Course;
pub use purchase::Entity as Purchase;
pub use review::Entity as Review;
pub use user::Entity as User;
