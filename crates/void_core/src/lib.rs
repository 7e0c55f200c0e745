//! # void_core - Void Engine Core
//!
//! Zero-dependency primitives shared by the scene graph and the project
//! overlay tooling:
//! - **Handles**: typed generational indices into slot storage
//! - **Ids**: editor-assigned string identifiers that survive serialization
//!
//! Handles never leave the process; anything written to a document is
//! addressed by id or by name instead.

pub mod handle;
pub mod id;

pub use handle::*;
pub use id::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::handle::{Handle, HandleMap};
    pub use crate::id::IdGenerator;
}
