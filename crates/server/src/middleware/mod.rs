mod identity;

pub use identity::{Identity, require_identity};
