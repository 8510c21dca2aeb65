//! Relationship state machine and visibility-scoped pin queries.
//!
//! Both engines are stateless handles over a shared [`ember_db::Database`];
//! every invariant is enforced by the store through single-statement
//! conditional writes or transactions. Calls block on SQLite, so async
//! callers should run them on a blocking thread.

pub mod error;
pub mod geo;
pub mod pins;
pub mod relationships;

pub use error::{CoreError, CoreResult};
pub use pins::{NewPin, Pins};
pub use relationships::Relationships;
