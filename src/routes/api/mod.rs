pub mod auth;
pub mod contacts;
mod router;
pub mod users;

pub use router::router;
