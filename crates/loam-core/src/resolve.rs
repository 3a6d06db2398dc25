//! Coordination primitives for concurrent schema resolution.
//!
//! Mapping an entity requires facts owned by other entities (referenced
//! column types, parent links) that may not be available yet, so resolution
//! runs as one task per entity. Tasks publish facts through [`Published`] and
//! [`Slot`] and block on facts they need; [`Session`] tracks task completion
//! and bounds every task with a deadline so an unsatisfiable configuration
//! surfaces as an error instead of hanging.

mod published;
pub use published::Published;

mod session;
pub use session::Session;

mod slot;
pub use slot::Slot;
