//! In-process catalog store.
//!
//! Backs every storage trait with ordered maps behind one `RwLock`. Unique
//! constraints mirror the PostgreSQL schema and can be switched off with
//! [`MemoryStore::without_constraints`] to observe what the engine's
//! look-then-write checks alone guarantee. Foreign keys are not enforced, so
//! inconsistent states (dangling parents, cycles) can be seeded on purpose.

use super::constraints;
use super::{CategoryStore, FitmentStore, ItemStore, VehicleStore};
use crate::model::{
    Category, FitmentLink, FitmentView, Item, ItemFilter, Make, Model, NewCategory, NewFitment,
    NewItem, NewMake, NewModel, NewSubmodel, Submodel,
};
use crate::LifeError;
use chrono::{NaiveDateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Tables {
    next_id: i32,
    categories: BTreeMap<i32, Category>,
    items: BTreeMap<i32, Item>,
    links: BTreeMap<i32, FitmentLink>,
    makes: BTreeMap<i32, Make>,
    models: BTreeMap<i32, Model>,
    submodels: BTreeMap<i32, Submodel>,
}

impl Tables {
    fn allocate_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
    enforce_unique: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn missing(table: &str, id: i32) -> LifeError {
    LifeError::QueryError(format!("no row in {table} with id {id}"))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            enforce_unique: true,
        }
    }

    /// A store with no write-boundary uniqueness constraints.
    pub fn without_constraints() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            enforce_unique: false,
        }
    }

    /// Write a category row verbatim, bypassing every check. Used to inject
    /// states the engine itself refuses to produce.
    pub fn seed_category(&self, category: Category) -> Result<(), LifeError> {
        let mut tables = self.write()?;
        tables.next_id = tables.next_id.max(category.id);
        tables.categories.insert(category.id, category);
        Ok(())
    }

    /// Number of stored fitment links, across all items.
    pub fn link_count(&self) -> Result<usize, LifeError> {
        Ok(self.read()?.links.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, LifeError> {
        self.tables
            .read()
            .map_err(|_| LifeError::Other("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, LifeError> {
        self.tables
            .write()
            .map_err(|_| LifeError::Other("memory store lock poisoned".to_string()))
    }

    fn check_item_unique(
        &self,
        tables: &Tables,
        id: Option<i32>,
        part_number: &str,
        barcode: Option<&str>,
    ) -> Result<(), LifeError> {
        if !self.enforce_unique {
            return Ok(());
        }
        let others = tables.items.values().filter(|i| Some(i.id) != id);
        for other in others {
            if other.part_number == part_number {
                return Err(LifeError::UniqueViolation(
                    constraints::PART_NUMBER.to_string(),
                ));
            }
            if barcode.is_some() && other.barcode.as_deref() == barcode {
                return Err(LifeError::UniqueViolation(constraints::BARCODE.to_string()));
            }
        }
        Ok(())
    }
}

impl CategoryStore for MemoryStore {
    fn list_categories(&self) -> Result<Vec<Category>, LifeError> {
        Ok(self.read()?.categories.values().cloned().collect())
    }

    fn get_category(&self, id: i32) -> Result<Option<Category>, LifeError> {
        Ok(self.read()?.categories.get(&id).cloned())
    }

    fn insert_category(&self, category: &NewCategory) -> Result<i32, LifeError> {
        let mut tables = self.write()?;
        let id = tables.allocate_id();
        let stamp = now();
        tables.categories.insert(
            id,
            Category {
                id,
                name: category.name.clone(),
                description: category.description.clone(),
                parent_id: category.parent_id,
                created_at: stamp,
                updated_at: stamp,
            },
        );
        Ok(id)
    }

    fn update_category(&self, category: &Category) -> Result<(), LifeError> {
        let mut tables = self.write()?;
        let row = tables
            .categories
            .get_mut(&category.id)
            .ok_or_else(|| missing("categories", category.id))?;
        *row = Category {
            updated_at: now(),
            created_at: row.created_at,
            ..category.clone()
        };
        Ok(())
    }

    fn delete_category(&self, id: i32) -> Result<(), LifeError> {
        self.write()?.categories.remove(&id);
        Ok(())
    }
}

impl FitmentStore for MemoryStore {
    fn list_links_by_item(&self, item_id: i32) -> Result<Vec<FitmentView>, LifeError> {
        let tables = self.read()?;
        // inner join: links whose vehicle rows are gone drop out
        let views = tables
            .links
            .values()
            .filter(|link| link.item_id == item_id)
            .filter_map(|link| {
                let submodel = tables.submodels.get(&link.submodel_id)?;
                let model = tables.models.get(&submodel.model_id)?;
                let make = tables.makes.get(&model.make_id)?;
                Some(FitmentView {
                    link: link.clone(),
                    make_name: make.name.clone(),
                    model_name: model.name.clone(),
                    submodel_name: submodel.name.clone(),
                })
            })
            .collect();
        Ok(views)
    }

    fn insert_link(&self, link: &NewFitment) -> Result<i32, LifeError> {
        let mut tables = self.write()?;
        if self.enforce_unique
            && tables
                .links
                .values()
                .any(|l| l.item_id == link.item_id && l.submodel_id == link.submodel_id)
        {
            return Err(LifeError::UniqueViolation(
                constraints::FITMENT_PAIR.to_string(),
            ));
        }
        let id = tables.allocate_id();
        tables.links.insert(
            id,
            FitmentLink {
                id,
                item_id: link.item_id,
                submodel_id: link.submodel_id,
                notes: link.notes.clone(),
                created_at: now(),
            },
        );
        Ok(id)
    }

    fn delete_link_by_pair(&self, item_id: i32, submodel_id: i32) -> Result<u64, LifeError> {
        let mut tables = self.write()?;
        let before = tables.links.len();
        tables
            .links
            .retain(|_, l| !(l.item_id == item_id && l.submodel_id == submodel_id));
        Ok((before - tables.links.len()) as u64)
    }

    fn list_items_by_submodel(&self, submodel_id: i32) -> Result<Vec<Item>, LifeError> {
        let tables = self.read()?;
        let items = tables
            .links
            .values()
            .filter(|l| l.submodel_id == submodel_id)
            .filter_map(|l| tables.items.get(&l.item_id).cloned())
            .collect();
        Ok(items)
    }
}

impl ItemStore for MemoryStore {
    fn get_item(&self, id: i32) -> Result<Option<Item>, LifeError> {
        Ok(self.read()?.items.get(&id).cloned())
    }

    fn find_by_part_number(&self, part_number: &str) -> Result<Option<Item>, LifeError> {
        Ok(self
            .read()?
            .items
            .values()
            .find(|i| i.part_number == part_number)
            .cloned())
    }

    fn find_by_barcode(&self, barcode: &str) -> Result<Option<Item>, LifeError> {
        Ok(self
            .read()?
            .items
            .values()
            .find(|i| i.barcode.as_deref() == Some(barcode))
            .cloned())
    }

    fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, LifeError> {
        let mut items: Vec<Item> = self
            .read()?
            .items
            .values()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.part_number.cmp(&b.part_number));
        Ok(items)
    }

    fn insert_item(&self, item: &NewItem) -> Result<i32, LifeError> {
        let mut tables = self.write()?;
        self.check_item_unique(&tables, None, &item.part_number, item.barcode.as_deref())?;
        let id = tables.allocate_id();
        let stamp = now();
        tables.items.insert(
            id,
            Item {
                id,
                part_number: item.part_number.clone(),
                description: item.description.clone(),
                category_id: item.category_id,
                buy_price: item.buy_price,
                sell_price: item.sell_price,
                current_stock: item.current_stock,
                minimum_stock: item.minimum_stock,
                barcode: item.barcode.clone(),
                supplier_id: item.supplier_id,
                is_active: item.is_active,
                notes: item.notes.clone(),
                created_at: stamp,
                updated_at: stamp,
            },
        );
        Ok(id)
    }

    fn update_item(&self, item: &Item) -> Result<(), LifeError> {
        let mut tables = self.write()?;
        self.check_item_unique(
            &tables,
            Some(item.id),
            &item.part_number,
            item.barcode.as_deref(),
        )?;
        let row = tables
            .items
            .get_mut(&item.id)
            .ok_or_else(|| missing("items", item.id))?;
        *row = Item {
            updated_at: now(),
            created_at: row.created_at,
            ..item.clone()
        };
        Ok(())
    }

    fn delete_item(&self, id: i32) -> Result<(), LifeError> {
        let mut tables = self.write()?;
        tables.items.remove(&id);
        // compatibility rows cascade with the item
        tables.links.retain(|_, l| l.item_id != id);
        Ok(())
    }
}

impl VehicleStore for MemoryStore {
    fn list_makes(&self) -> Result<Vec<Make>, LifeError> {
        Ok(self.read()?.makes.values().cloned().collect())
    }

    fn get_make(&self, id: i32) -> Result<Option<Make>, LifeError> {
        Ok(self.read()?.makes.get(&id).cloned())
    }

    fn insert_make(&self, make: &NewMake) -> Result<i32, LifeError> {
        let mut tables = self.write()?;
        let id = tables.allocate_id();
        let stamp = now();
        tables.makes.insert(
            id,
            Make {
                id,
                name: make.name.clone(),
                country: make.country.clone(),
                created_at: stamp,
                updated_at: stamp,
            },
        );
        Ok(id)
    }

    fn update_make(&self, make: &Make) -> Result<(), LifeError> {
        let mut tables = self.write()?;
        let row = tables
            .makes
            .get_mut(&make.id)
            .ok_or_else(|| missing("vehicle_makes", make.id))?;
        *row = Make {
            updated_at: now(),
            created_at: row.created_at,
            ..make.clone()
        };
        Ok(())
    }

    fn delete_make(&self, id: i32) -> Result<(), LifeError> {
        self.write()?.makes.remove(&id);
        Ok(())
    }

    fn list_models(&self, make_id: Option<i32>) -> Result<Vec<Model>, LifeError> {
        Ok(self
            .read()?
            .models
            .values()
            .filter(|m| make_id.map_or(true, |id| m.make_id == id))
            .cloned()
            .collect())
    }

    fn get_model(&self, id: i32) -> Result<Option<Model>, LifeError> {
        Ok(self.read()?.models.get(&id).cloned())
    }

    fn insert_model(&self, model: &NewModel) -> Result<i32, LifeError> {
        let mut tables = self.write()?;
        let id = tables.allocate_id();
        let stamp = now();
        tables.models.insert(
            id,
            Model {
                id,
                make_id: model.make_id,
                name: model.name.clone(),
                created_at: stamp,
                updated_at: stamp,
            },
        );
        Ok(id)
    }

    fn update_model(&self, model: &Model) -> Result<(), LifeError> {
        let mut tables = self.write()?;
        let row = tables
            .models
            .get_mut(&model.id)
            .ok_or_else(|| missing("vehicle_models", model.id))?;
        *row = Model {
            updated_at: now(),
            created_at: row.created_at,
            ..model.clone()
        };
        Ok(())
    }

    fn delete_model(&self, id: i32) -> Result<(), LifeError> {
        self.write()?.models.remove(&id);
        Ok(())
    }

    fn list_submodels(&self, model_id: Option<i32>) -> Result<Vec<Submodel>, LifeError> {
        Ok(self
            .read()?
            .submodels
            .values()
            .filter(|s| model_id.map_or(true, |id| s.model_id == id))
            .cloned()
            .collect())
    }

    fn get_submodel(&self, id: i32) -> Result<Option<Submodel>, LifeError> {
        Ok(self.read()?.submodels.get(&id).cloned())
    }

    fn insert_submodel(&self, submodel: &NewSubmodel) -> Result<i32, LifeError> {
        let mut tables = self.write()?;
        let id = tables.allocate_id();
        let stamp = now();
        tables.submodels.insert(
            id,
            Submodel {
                id,
                model_id: submodel.model_id,
                name: submodel.name.clone(),
                year_from: submodel.year_from,
                year_to: submodel.year_to,
                engine_type: submodel.engine_type.clone(),
                engine_displacement: submodel.engine_displacement,
                fuel_type: submodel.fuel_type.clone(),
                transmission_type: submodel.transmission_type.clone(),
                body_type: submodel.body_type.clone(),
                created_at: stamp,
                updated_at: stamp,
            },
        );
        Ok(id)
    }

    fn update_submodel(&self, submodel: &Submodel) -> Result<(), LifeError> {
        let mut tables = self.write()?;
        let row = tables
            .submodels
            .get_mut(&submodel.id)
            .ok_or_else(|| missing("vehicle_submodels", submodel.id))?;
        *row = Submodel {
            updated_at: now(),
            created_at: row.created_at,
            ..submodel.clone()
        };
        Ok(())
    }

    fn delete_submodel(&self, id: i32) -> Result<(), LifeError> {
        let mut tables = self.write()?;
        tables.submodels.remove(&id);
        tables.links.retain(|_, l| l.submodel_id != id);
        Ok(())
    }
}
