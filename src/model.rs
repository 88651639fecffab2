//! Catalog records exchanged with the storage collaborators.

mod category;
mod fitment;
mod item;
mod vehicle;

pub use category::{Category, CategoryTreeNode, NewCategory};
pub use fitment::{FitmentLink, FitmentView, NewFitment};
pub use item::{Item, ItemFilter, NewItem};
pub use vehicle::{Make, Model, NewMake, NewModel, NewSubmodel, Submodel};
