pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod mail;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
#[doc(hidden)]
pub mod test_helpers;
