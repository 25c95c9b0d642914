pub mod denylist;
pub mod store;

pub use denylist::CacheDenylist;
pub use store::{RevocationCheck, RevocationError};
