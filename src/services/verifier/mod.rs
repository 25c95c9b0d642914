pub mod jwt;
pub mod key;

pub use jwt::{JsonWebTokenVerifier, TokenVerifier, VerifyError, VerifyOptions};
pub use key::{Secret, SecretError};
