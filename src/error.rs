//! Catalog engine error types

use crate::LifeError;
use std::fmt;

/// Catalog entity named in an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Category,
    ParentCategory,
    Item,
    Make,
    Model,
    Submodel,
    Fitment,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Category => "category",
            Entity::ParentCategory => "parent category",
            Entity::Item => "item",
            Entity::Make => "vehicle make",
            Entity::Model => "vehicle model",
            Entity::Submodel => "vehicle submodel",
            Entity::Fitment => "fitment link",
        };
        f.write_str(name)
    }
}

/// Coarse classification callers switch on
///
/// The HTTP layer maps the first four to 4xx responses and `Storage` to a server error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidReference,
    IntegrityViolation,
    MalformedInput,
    Storage,
}

/// Errors returned by every catalog engine operation
#[derive(Debug)]
pub enum CatalogError {
    /// The entity addressed by the operation does not exist
    NotFound { entity: Entity, id: i32 },
    /// A referenced entity (parent, item, submodel, make, model) does not exist
    InvalidReference { entity: Entity, id: i32 },
    /// Re-parenting would make a category its own ancestor
    CircularReference { category_id: i32, parent_id: i32 },
    /// Category still has children
    HasSubcategories { category_id: i32, children: usize },
    /// Make or model still has dependent rows
    HasDependents {
        entity: Entity,
        id: i32,
        dependents: usize,
    },
    /// The (item, submodel) pair is already linked
    LinkExists { item_id: i32, submodel_id: i32 },
    /// No link joins the (item, submodel) pair
    LinkNotFound { item_id: i32, submodel_id: i32 },
    /// Part number already belongs to another item
    DuplicatePartNumber(String),
    /// Scanned barcode already belongs to another item
    DuplicateBarcode(String),
    /// Category name has fewer than two characters
    CategoryNameTooShort(String),
    /// Category name does not start with two letters
    InvalidPrefix(String),
    /// Sequence number does not fit in six digits
    SequenceOutOfRange(u32),
    /// Catalog code has the wrong shape or check digit
    MalformedIdentifier(String),
    /// Required field missing or out of range
    Validation(String),
    /// Storage collaborator failure
    Storage(LifeError),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::NotFound { .. } | CatalogError::LinkNotFound { .. } => {
                ErrorKind::NotFound
            }
            CatalogError::InvalidReference { .. } => ErrorKind::InvalidReference,
            CatalogError::CircularReference { .. }
            | CatalogError::HasSubcategories { .. }
            | CatalogError::HasDependents { .. }
            | CatalogError::LinkExists { .. }
            | CatalogError::DuplicatePartNumber(_)
            | CatalogError::DuplicateBarcode(_) => ErrorKind::IntegrityViolation,
            CatalogError::CategoryNameTooShort(_)
            | CatalogError::InvalidPrefix(_)
            | CatalogError::SequenceOutOfRange(_)
            | CatalogError::MalformedIdentifier(_)
            | CatalogError::Validation(_) => ErrorKind::MalformedInput,
            CatalogError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Stable variant label used as a metrics attribute
    pub fn variant_name(&self) -> &'static str {
        match self {
            CatalogError::NotFound { .. } => "NotFound",
            CatalogError::InvalidReference { .. } => "InvalidReference",
            CatalogError::CircularReference { .. } => "CircularReference",
            CatalogError::HasSubcategories { .. } => "HasSubcategories",
            CatalogError::HasDependents { .. } => "HasDependents",
            CatalogError::LinkExists { .. } => "LinkExists",
            CatalogError::LinkNotFound { .. } => "LinkNotFound",
            CatalogError::DuplicatePartNumber(_) => "DuplicatePartNumber",
            CatalogError::DuplicateBarcode(_) => "DuplicateBarcode",
            CatalogError::CategoryNameTooShort(_) => "CategoryNameTooShort",
            CatalogError::InvalidPrefix(_) => "InvalidPrefix",
            CatalogError::SequenceOutOfRange(_) => "SequenceOutOfRange",
            CatalogError::MalformedIdentifier(_) => "MalformedIdentifier",
            CatalogError::Validation(_) => "Validation",
            CatalogError::Storage(_) => "Storage",
        }
    }

    pub(crate) fn not_found(entity: Entity, id: i32) -> Self {
        CatalogError::NotFound { entity, id }
    }

    pub(crate) fn invalid_reference(entity: Entity, id: i32) -> Self {
        CatalogError::InvalidReference { entity, id }
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::NotFound { entity, id } => write!(f, "{} {} not found", entity, id),
            CatalogError::InvalidReference { entity, id } => {
                write!(f, "{} {} does not exist", entity, id)
            }
            CatalogError::CircularReference {
                category_id,
                parent_id,
            } => write!(
                f,
                "category {} cannot be placed under {}: circular reference",
                category_id, parent_id
            ),
            CatalogError::HasSubcategories {
                category_id,
                children,
            } => write!(
                f,
                "category {} has {} subcategories and cannot be deleted",
                category_id, children
            ),
            CatalogError::HasDependents {
                entity,
                id,
                dependents,
            } => write!(
                f,
                "{} {} has {} dependent records and cannot be deleted",
                entity, id, dependents
            ),
            CatalogError::LinkExists {
                item_id,
                submodel_id,
            } => write!(
                f,
                "item {} is already linked to submodel {}",
                item_id, submodel_id
            ),
            CatalogError::LinkNotFound {
                item_id,
                submodel_id,
            } => write!(
                f,
                "item {} is not linked to submodel {}",
                item_id, submodel_id
            ),
            CatalogError::DuplicatePartNumber(code) => {
                write!(f, "part number already exists: {}", code)
            }
            CatalogError::DuplicateBarcode(code) => write!(f, "barcode already exists: {}", code),
            CatalogError::CategoryNameTooShort(name) => {
                write!(f, "category name too short for a catalog code: {:?}", name)
            }
            CatalogError::InvalidPrefix(name) => write!(
                f,
                "category name must start with two letters to form a catalog code: {:?}",
                name
            ),
            CatalogError::SequenceOutOfRange(n) => {
                write!(f, "sequence number {} does not fit in six digits", n)
            }
            CatalogError::MalformedIdentifier(code) => {
                write!(f, "malformed catalog code: {:?}", code)
            }
            CatalogError::Validation(msg) => write!(f, "validation failed: {}", msg),
            CatalogError::Storage(e) => write!(f, "storage error: {}", e),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LifeError> for CatalogError {
    fn from(error: LifeError) -> Self {
        CatalogError::Storage(error)
    }
}
