//! The catalog integrity and identification engine.
//!
//! Each manager borrows its storage collaborators, validates against the
//! current persisted state and then issues a single write. None of them hold
//! state between calls.

pub mod checksum;
pub mod fitment;
pub mod hierarchy;
pub mod identity;
pub mod vehicles;

pub use checksum::{checksum, CatalogCode, ChecksumCodec};
pub use fitment::FitmentMatrix;
pub use hierarchy::{HierarchyManager, HierarchyReport};
pub use identity::IdentityRegistry;
pub use vehicles::VehicleRegistry;
