pub mod cache;
pub mod revocation;
pub mod verifier;
