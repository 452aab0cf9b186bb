pub mod password;
pub mod tokens;

pub use tokens::{Claims, TokenError, TokenScope, TokenService, TokenTtls};
