//! Storage traits and implementations
//!
//! Rows live in a hosted database service. The [`TriageStore`] trait is the
//! seam between the domain logic and that service; [`RestStore`] talks to the
//! real thing and [`InMemoryStore`] stands in for it offline and in tests.

mod filter;
mod memory;
mod rest;
mod traits;

pub use filter::{EmailPatch, Filter};
pub use memory::InMemoryStore;
pub use rest::RestStore;
pub use traits::{StorageError, TriageStore};
