//! Storage collaborators the catalog engine reads and writes through.
//!
//! The engine never talks to a database directly. Every operation performs
//! its validation reads and its single write through these traits, so the same
//! engine runs over [`MemoryStore`] in tests and over [`PgCatalogStore`] in
//! production.
//!
//! Implementations are expected to enforce the catalog's uniqueness rules as
//! hard constraints at the write boundary (unique `(item_id, submodel_id)`,
//! unique part number, unique barcode) and report a breach as
//! [`LifeError::UniqueViolation`]. The engine's own look-then-write checks are
//! not atomic with respect to concurrent callers; the constraint is what keeps
//! two racing writers from both committing.

pub mod memory;
pub mod postgres;
pub mod schema;

pub use memory::MemoryStore;
pub use postgres::PgCatalogStore;

use crate::model::{
    Category, FitmentView, Item, ItemFilter, Make, Model, NewCategory, NewFitment, NewItem,
    NewMake, NewModel, NewSubmodel, Submodel,
};
use crate::LifeError;

/// Constraint names shared by the PostgreSQL schema and [`MemoryStore`]
pub mod constraints {
    pub const FITMENT_PAIR: &str = "uq_compatibility_item_submodel";
    pub const PART_NUMBER: &str = "uq_items_part_number";
    pub const BARCODE: &str = "uq_items_barcode";
}

/// Persistence of the category relation
pub trait CategoryStore {
    fn list_categories(&self) -> Result<Vec<Category>, LifeError>;
    fn get_category(&self, id: i32) -> Result<Option<Category>, LifeError>;
    fn insert_category(&self, category: &NewCategory) -> Result<i32, LifeError>;
    fn update_category(&self, category: &Category) -> Result<(), LifeError>;
    fn delete_category(&self, id: i32) -> Result<(), LifeError>;
}

/// Persistence of the item ↔ submodel compatibility relation
pub trait FitmentStore {
    /// Links of one item, joined with make/model/submodel names.
    fn list_links_by_item(&self, item_id: i32) -> Result<Vec<FitmentView>, LifeError>;
    fn insert_link(&self, link: &NewFitment) -> Result<i32, LifeError>;
    /// Returns the number of rows removed.
    fn delete_link_by_pair(&self, item_id: i32, submodel_id: i32) -> Result<u64, LifeError>;
    /// Items linked to a submodel.
    fn list_items_by_submodel(&self, submodel_id: i32) -> Result<Vec<Item>, LifeError>;
}

/// Item lookups and writes owned by the inventory collaborator
pub trait ItemStore {
    fn get_item(&self, id: i32) -> Result<Option<Item>, LifeError>;
    fn find_by_part_number(&self, part_number: &str) -> Result<Option<Item>, LifeError>;
    fn find_by_barcode(&self, barcode: &str) -> Result<Option<Item>, LifeError>;
    /// Items matching `filter`, ordered by part number.
    fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, LifeError>;
    fn insert_item(&self, item: &NewItem) -> Result<i32, LifeError>;
    fn update_item(&self, item: &Item) -> Result<(), LifeError>;
    fn delete_item(&self, id: i32) -> Result<(), LifeError>;
}

/// Make → model → submodel persistence owned by the vehicle collaborator
pub trait VehicleStore {
    fn list_makes(&self) -> Result<Vec<Make>, LifeError>;
    fn get_make(&self, id: i32) -> Result<Option<Make>, LifeError>;
    fn insert_make(&self, make: &NewMake) -> Result<i32, LifeError>;
    fn update_make(&self, make: &Make) -> Result<(), LifeError>;
    fn delete_make(&self, id: i32) -> Result<(), LifeError>;

    /// All models, or only those of `make_id`.
    fn list_models(&self, make_id: Option<i32>) -> Result<Vec<Model>, LifeError>;
    fn get_model(&self, id: i32) -> Result<Option<Model>, LifeError>;
    fn insert_model(&self, model: &NewModel) -> Result<i32, LifeError>;
    fn update_model(&self, model: &Model) -> Result<(), LifeError>;
    fn delete_model(&self, id: i32) -> Result<(), LifeError>;

    /// All submodels, or only those of `model_id`.
    fn list_submodels(&self, model_id: Option<i32>) -> Result<Vec<Submodel>, LifeError>;
    fn get_submodel(&self, id: i32) -> Result<Option<Submodel>, LifeError>;
    fn insert_submodel(&self, submodel: &NewSubmodel) -> Result<i32, LifeError>;
    fn update_submodel(&self, submodel: &Submodel) -> Result<(), LifeError>;
    fn delete_submodel(&self, id: i32) -> Result<(), LifeError>;
}
