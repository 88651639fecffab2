//! Make → model → submodel registry
//!
//! Fitment links point at submodels; this registry keeps the vehicle side of
//! the relation consistent.

use crate::error::Entity;
use crate::metrics::observed;
use crate::model::{Make, Model, NewMake, NewModel, NewSubmodel, Submodel};
use crate::store::VehicleStore;
use crate::CatalogError;

pub struct VehicleRegistry<'a> {
    store: &'a dyn VehicleStore,
}

impl<'a> VehicleRegistry<'a> {
    pub fn new(store: &'a dyn VehicleStore) -> Self {
        Self { store }
    }

    pub fn create_make(&self, make: &NewMake) -> Result<i32, CatalogError> {
        observed("vehicle.create_make", || {
            require("make name", &make.name)?;
            let id = self.store.insert_make(make)?;
            log::debug!("created make {} ({})", id, make.name);
            Ok(id)
        })
    }

    pub fn update_make(&self, make: &Make) -> Result<(), CatalogError> {
        observed("vehicle.update_make", || {
            require("make name", &make.name)?;
            self.get_make_row(make.id)?;
            self.store.update_make(make)?;
            Ok(())
        })
    }

    /// Delete a make that has no models.
    pub fn delete_make(&self, id: i32) -> Result<(), CatalogError> {
        observed("vehicle.delete_make", || {
            self.get_make_row(id)?;
            let models = self.store.list_models(Some(id))?.len();
            if models > 0 {
                return Err(CatalogError::HasDependents {
                    entity: Entity::Make,
                    id,
                    dependents: models,
                });
            }
            self.store.delete_make(id)?;
            log::debug!("deleted make {}", id);
            Ok(())
        })
    }

    pub fn get_make(&self, id: i32) -> Result<Make, CatalogError> {
        observed("vehicle.get_make", || self.get_make_row(id))
    }

    /// Makes ordered by name.
    pub fn list_makes(&self) -> Result<Vec<Make>, CatalogError> {
        observed("vehicle.list_makes", || {
            let mut makes = self.store.list_makes()?;
            makes.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(makes)
        })
    }

    pub fn create_model(&self, model: &NewModel) -> Result<i32, CatalogError> {
        observed("vehicle.create_model", || {
            require("model name", &model.name)?;
            self.require_make(model.make_id)?;
            let id = self.store.insert_model(model)?;
            log::debug!("created model {} ({}) under make {}", id, model.name, model.make_id);
            Ok(id)
        })
    }

    pub fn update_model(&self, model: &Model) -> Result<(), CatalogError> {
        observed("vehicle.update_model", || {
            require("model name", &model.name)?;
            self.get_model_row(model.id)?;
            self.require_make(model.make_id)?;
            self.store.update_model(model)?;
            Ok(())
        })
    }

    /// Delete a model that has no submodels.
    pub fn delete_model(&self, id: i32) -> Result<(), CatalogError> {
        observed("vehicle.delete_model", || {
            self.get_model_row(id)?;
            let submodels = self.store.list_submodels(Some(id))?.len();
            if submodels > 0 {
                return Err(CatalogError::HasDependents {
                    entity: Entity::Model,
                    id,
                    dependents: submodels,
                });
            }
            self.store.delete_model(id)?;
            log::debug!("deleted model {}", id);
            Ok(())
        })
    }

    pub fn get_model(&self, id: i32) -> Result<Model, CatalogError> {
        observed("vehicle.get_model", || self.get_model_row(id))
    }

    /// Models ordered by name, optionally only those of one make.
    pub fn list_models(&self, make_id: Option<i32>) -> Result<Vec<Model>, CatalogError> {
        observed("vehicle.list_models", || {
            let mut models = self.store.list_models(make_id)?;
            models.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(models)
        })
    }

    pub fn create_submodel(&self, submodel: &NewSubmodel) -> Result<i32, CatalogError> {
        observed("vehicle.create_submodel", || {
            validate_submodel(
                &submodel.name,
                submodel.year_from,
                submodel.year_to,
                submodel.engine_displacement,
                [
                    &submodel.engine_type,
                    &submodel.fuel_type,
                    &submodel.transmission_type,
                    &submodel.body_type,
                ],
            )?;
            self.require_model(submodel.model_id)?;
            let id = self.store.insert_submodel(submodel)?;
            log::debug!("created submodel {} ({})", id, submodel.name);
            Ok(id)
        })
    }

    pub fn update_submodel(&self, submodel: &Submodel) -> Result<(), CatalogError> {
        observed("vehicle.update_submodel", || {
            validate_submodel(
                &submodel.name,
                submodel.year_from,
                submodel.year_to,
                submodel.engine_displacement,
                [
                    &submodel.engine_type,
                    &submodel.fuel_type,
                    &submodel.transmission_type,
                    &submodel.body_type,
                ],
            )?;
            self.get_submodel_row(submodel.id)?;
            self.require_model(submodel.model_id)?;
            self.store.update_submodel(submodel)?;
            Ok(())
        })
    }

    /// Delete a submodel. Its fitment links go with it.
    pub fn delete_submodel(&self, id: i32) -> Result<(), CatalogError> {
        observed("vehicle.delete_submodel", || {
            self.get_submodel_row(id)?;
            self.store.delete_submodel(id)?;
            log::debug!("deleted submodel {}", id);
            Ok(())
        })
    }

    pub fn get_submodel(&self, id: i32) -> Result<Submodel, CatalogError> {
        observed("vehicle.get_submodel", || self.get_submodel_row(id))
    }

    /// Submodels ordered by name, optionally only those of one model.
    pub fn list_submodels(&self, model_id: Option<i32>) -> Result<Vec<Submodel>, CatalogError> {
        observed("vehicle.list_submodels", || {
            let mut submodels = self.store.list_submodels(model_id)?;
            submodels.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(submodels)
        })
    }

    /// Submodels of `model_id` in production during `year`.
    pub fn submodels_for_year(
        &self,
        model_id: i32,
        year: i32,
    ) -> Result<Vec<Submodel>, CatalogError> {
        let submodels = self.list_submodels(Some(model_id))?;
        Ok(submodels
            .into_iter()
            .filter(|s| s.covers_year(year))
            .collect())
    }

    fn get_make_row(&self, id: i32) -> Result<Make, CatalogError> {
        self.store
            .get_make(id)?
            .ok_or_else(|| CatalogError::not_found(Entity::Make, id))
    }

    fn get_model_row(&self, id: i32) -> Result<Model, CatalogError> {
        self.store
            .get_model(id)?
            .ok_or_else(|| CatalogError::not_found(Entity::Model, id))
    }

    fn get_submodel_row(&self, id: i32) -> Result<Submodel, CatalogError> {
        self.store
            .get_submodel(id)?
            .ok_or_else(|| CatalogError::not_found(Entity::Submodel, id))
    }

    fn require_make(&self, id: i32) -> Result<(), CatalogError> {
        match self.store.get_make(id)? {
            Some(_) => Ok(()),
            None => Err(CatalogError::invalid_reference(Entity::Make, id)),
        }
    }

    fn require_model(&self, id: i32) -> Result<(), CatalogError> {
        match self.store.get_model(id)? {
            Some(_) => Ok(()),
            None => Err(CatalogError::invalid_reference(Entity::Model, id)),
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn validate_submodel(
    name: &str,
    year_from: i32,
    year_to: Option<i32>,
    engine_displacement: f64,
    attributes: [&String; 4],
) -> Result<(), CatalogError> {
    require("submodel name", name)?;
    let [engine, fuel, transmission, body] = attributes;
    require("engine type", engine)?;
    require("fuel type", fuel)?;
    require("transmission type", transmission)?;
    require("body type", body)?;
    if year_from <= 0 {
        return Err(CatalogError::Validation(format!(
            "invalid start year {year_from}"
        )));
    }
    if let Some(year_to) = year_to {
        if year_to < year_from {
            return Err(CatalogError::Validation(format!(
                "end year {year_to} precedes start year {year_from}"
            )));
        }
    }
    if engine_displacement.is_nan() || engine_displacement <= 0.0 {
        return Err(CatalogError::Validation(
            "engine displacement must be positive".into(),
        ));
    }
    Ok(())
}
