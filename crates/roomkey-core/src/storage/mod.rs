pub mod schema;
pub mod store;

pub use store::{ClaimOutcome, Store};
