//! Pool membership model.
//!
//! A pool document maps pool names to three hostname lists: available,
//! leased and garbage. The lists of one pool are always pairwise disjoint.

pub mod document;
pub mod state;

pub use document::DocumentError;
pub use state::{InvariantViolation, Pool, PoolCollection, PoolMember};
