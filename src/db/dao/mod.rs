pub mod base;
pub mod base_traits;
mod context;
pub mod contact_dao;
pub mod error;
pub mod user_dao;

pub use base::DaoBase;
pub use base_traits::{HasCreatedAtColumn, HasIdActiveModel, TimestampedActiveModel};
pub use contact_dao::{ContactDao, ContactFields};
pub use context::DaoContext;
pub use error::{DaoLayerError, DaoResult};
pub use user_dao::{NewUser, UserDao};
