//! # Partsguard
//!
//! Catalog integrity and identification engine for a parts catalog, running on
//! PostgreSQL through `may_postgres` and the `may` coroutine runtime.
//!
//! - [`HierarchyManager`]: acyclic category tree, parent checks, nested view
//! - [`FitmentMatrix`]: item ↔ vehicle submodel compatibility links
//! - [`ChecksumCodec`]: check-digit catalog codes
//! - [`IdentityRegistry`]: catalog-wide uniqueness of part numbers and barcodes
//! - [`VehicleRegistry`]: make → model → submodel records fitment points at
//!
//! Managers borrow a storage collaborator: [`MemoryStore`] in process, or
//! [`PgCatalogStore`] over a [`LifeExecutor`].

pub mod catalog;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod model;
pub mod store;

pub use catalog::{
    CatalogCode, ChecksumCodec, FitmentMatrix, HierarchyManager, HierarchyReport,
    IdentityRegistry, VehicleRegistry,
};
pub use config::{DatabaseConfig, IdentityConfig, PartsguardConfig};
pub use connection::{connect, connect_with, ConnectionError};
pub use error::{CatalogError, Entity, ErrorKind};
pub use executor::{LifeError, LifeExecutor, MayPostgresExecutor};
pub use model::{
    Category, CategoryTreeNode, FitmentLink, FitmentView, Item, ItemFilter, Make, Model,
    NewCategory, NewFitment, NewItem, NewMake, NewModel, NewSubmodel, Submodel,
};
pub use store::{
    CategoryStore, FitmentStore, ItemStore, MemoryStore, PgCatalogStore, VehicleStore,
};
