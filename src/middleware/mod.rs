mod extract;
mod guards;
mod json_error;
mod panic;
mod rate_limit;

pub use extract::{ValidatedJson, ValidatedQuery};
pub use guards::{BearerToken, CurrentUser};
pub use json_error::json_error_middleware;
pub use panic::catch_panic_layer;
pub use rate_limit::{RateLimit, RateLimitLayer, RateLimiter, RouteClass};
