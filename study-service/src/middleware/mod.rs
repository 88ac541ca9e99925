pub mod identity;

pub use identity::{CallerIdentity, USER_EMAIL_HEADER};
