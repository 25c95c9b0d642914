pub mod core;
pub mod locator;
pub mod options;
pub mod secret;

pub use self::core::Verified;
pub use locator::{Located, QueryParam, TokenSource};
pub use options::{JwtAuth, JwtAuthBuilder};
