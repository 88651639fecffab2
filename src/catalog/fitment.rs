//! Vehicle fitment matrix
//!
//! The item ↔ submodel compatibility relation. Both endpoints must exist when
//! a link is made and each pair may be linked once.

use crate::error::Entity;
use crate::metrics::observed;
use crate::model::{FitmentView, Item, NewFitment};
use crate::store::{constraints, FitmentStore, ItemStore, VehicleStore};
use crate::{CatalogError, LifeError};

/// Owns the fitment relation
///
/// The duplicate check reads the item's links before inserting. It is not
/// atomic: two callers can both pass it, and the store's unique
/// `(item_id, submodel_id)` constraint decides. A rejection there is reported
/// as the same [`CatalogError::LinkExists`].
///
/// # Examples
///
/// ```
/// # use partsguard::*;
/// # use rust_decimal::Decimal;
/// let store = MemoryStore::new();
/// # let vehicles = VehicleRegistry::new(&store);
/// # let make = vehicles.create_make(&NewMake { name: "Audi".into(), country: None }).unwrap();
/// # let model = vehicles.create_model(&NewModel { make_id: make, name: "A3".into() }).unwrap();
/// # let submodel = vehicles.create_submodel(&NewSubmodel {
/// #     model_id: model, name: "1.6 TDI".into(), year_from: 2012, year_to: Some(2020),
/// #     engine_type: "I4".into(), engine_displacement: 1.6, fuel_type: "Diesel".into(),
/// #     transmission_type: "Manual".into(), body_type: "Hatchback".into(),
/// # }).unwrap();
/// # let item = IdentityRegistry::new(&store).create_item(&NewItem {
/// #     part_number: "BR000042248".into(), description: "Front pads".into(), category_id: None,
/// #     buy_price: Decimal::new(1000, 2), sell_price: Decimal::new(2500, 2), current_stock: 4,
/// #     minimum_stock: 1, barcode: None, supplier_id: None, is_active: true, notes: None,
/// # }).unwrap();
/// let fitment = FitmentMatrix::over(&store);
/// fitment.link(item, submodel, Some("front axle")).unwrap();
/// assert!(matches!(
///     fitment.link(item, submodel, None),
///     Err(CatalogError::LinkExists { .. })
/// ));
/// ```
pub struct FitmentMatrix<'a> {
    links: &'a dyn FitmentStore,
    items: &'a dyn ItemStore,
    vehicles: &'a dyn VehicleStore,
}

impl<'a> FitmentMatrix<'a> {
    pub fn new(
        links: &'a dyn FitmentStore,
        items: &'a dyn ItemStore,
        vehicles: &'a dyn VehicleStore,
    ) -> Self {
        Self {
            links,
            items,
            vehicles,
        }
    }

    /// Matrix over a single store implementing every collaborator.
    pub fn over<S>(store: &'a S) -> Self
    where
        S: FitmentStore + ItemStore + VehicleStore,
    {
        Self::new(store, store, store)
    }

    /// Link `item_id` to `submodel_id`, returning the new link id.
    ///
    /// # Errors
    ///
    /// - `InvalidReference` when either endpoint does not exist
    /// - `LinkExists` when the pair is already linked
    pub fn link(
        &self,
        item_id: i32,
        submodel_id: i32,
        notes: Option<&str>,
    ) -> Result<i32, CatalogError> {
        observed("fitment.link", || {
            self.require_item(item_id)?;
            self.require_submodel(submodel_id)?;

            let existing = self.links.list_links_by_item(item_id)?;
            if existing.iter().any(|v| v.link.submodel_id == submodel_id) {
                return Err(CatalogError::LinkExists {
                    item_id,
                    submodel_id,
                });
            }

            let link = NewFitment {
                item_id,
                submodel_id,
                notes: notes.map(str::to_string),
            };
            let id = self
                .links
                .insert_link(&link)
                .map_err(|e| translate_pair_conflict(e, item_id, submodel_id))?;
            log::debug!("linked item {} to submodel {} as {}", item_id, submodel_id, id);
            Ok(id)
        })
    }

    /// Remove the link between `item_id` and `submodel_id`.
    ///
    /// # Errors
    ///
    /// `LinkNotFound` when the pair is not linked.
    pub fn unlink(&self, item_id: i32, submodel_id: i32) -> Result<(), CatalogError> {
        observed("fitment.unlink", || {
            check_id(Entity::Item, item_id)?;
            check_id(Entity::Submodel, submodel_id)?;
            match self.links.delete_link_by_pair(item_id, submodel_id)? {
                0 => Err(CatalogError::LinkNotFound {
                    item_id,
                    submodel_id,
                }),
                removed => {
                    if removed > 1 {
                        log::warn!(
                            "removed {} links for item {} / submodel {}",
                            removed,
                            item_id,
                            submodel_id
                        );
                    }
                    log::debug!("unlinked item {} from submodel {}", item_id, submodel_id);
                    Ok(())
                }
            }
        })
    }

    /// Vehicles an item fits, ordered by make, model and submodel name.
    pub fn links_for_item(&self, item_id: i32) -> Result<Vec<FitmentView>, CatalogError> {
        observed("fitment.links_for_item", || {
            check_id(Entity::Item, item_id)?;
            if self.items.get_item(item_id)?.is_none() {
                return Err(CatalogError::not_found(Entity::Item, item_id));
            }
            let mut views = self.links.list_links_by_item(item_id)?;
            views.sort_by(|a, b| {
                a.make_name
                    .cmp(&b.make_name)
                    .then_with(|| a.model_name.cmp(&b.model_name))
                    .then_with(|| a.submodel_name.cmp(&b.submodel_name))
            });
            Ok(views)
        })
    }

    /// Active items that fit a submodel, ordered by catalog code.
    pub fn items_for_submodel(&self, submodel_id: i32) -> Result<Vec<Item>, CatalogError> {
        observed("fitment.items_for_submodel", || {
            check_id(Entity::Submodel, submodel_id)?;
            let mut items: Vec<Item> = self
                .links
                .list_items_by_submodel(submodel_id)?
                .into_iter()
                .filter(|item| item.is_active)
                .collect();
            items.sort_by(|a, b| a.part_number.cmp(&b.part_number));
            Ok(items)
        })
    }

    fn require_item(&self, item_id: i32) -> Result<(), CatalogError> {
        check_id(Entity::Item, item_id)?;
        match self.items.get_item(item_id)? {
            Some(_) => Ok(()),
            None => Err(CatalogError::invalid_reference(Entity::Item, item_id)),
        }
    }

    fn require_submodel(&self, submodel_id: i32) -> Result<(), CatalogError> {
        check_id(Entity::Submodel, submodel_id)?;
        match self.vehicles.get_submodel(submodel_id)? {
            Some(_) => Ok(()),
            None => Err(CatalogError::invalid_reference(
                Entity::Submodel,
                submodel_id,
            )),
        }
    }
}

/// Ids are `SERIAL`; nothing at or below zero can exist.
fn check_id(entity: Entity, id: i32) -> Result<(), CatalogError> {
    if id <= 0 {
        return Err(CatalogError::invalid_reference(entity, id));
    }
    Ok(())
}

fn translate_pair_conflict(error: LifeError, item_id: i32, submodel_id: i32) -> CatalogError {
    if error.is_unique_violation() && error.constraint() == Some(constraints::FITMENT_PAIR) {
        log::debug!("link insert lost a race for item {} / submodel {}", item_id, submodel_id);
        CatalogError::LinkExists {
            item_id,
            submodel_id,
        }
    } else {
        CatalogError::Storage(error)
    }
}
