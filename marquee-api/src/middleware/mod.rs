pub mod auth;

pub use auth::{require_caller, require_internal_token, Claims, INTERNAL_TOKEN_HEADER};
