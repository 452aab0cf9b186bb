pub mod auth_service;
pub mod avatar;
pub mod birthdays;
pub mod contact_service;
pub mod context;
pub mod user_service;

pub use auth_service::{AuthService, ConfirmOutcome, SignupRequest, TokenPair};
pub use contact_service::ContactService;
pub use context::ServiceContext;
pub use user_service::UserService;
