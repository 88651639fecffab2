//! Item identity: catalog codes and scanned barcodes
//!
//! Part numbers are unique catalog-wide, and so are barcodes when present.
//! [`IdentityRegistry`] checks both before an item write and translates a
//! constraint rejection from the store into the same errors.

use super::checksum::{CatalogCode, ChecksumCodec};
use crate::error::Entity;
use crate::metrics::observed;
use crate::model::{Item, ItemFilter, NewItem};
use crate::store::{constraints, ItemStore};
use crate::{CatalogError, LifeError};
use rust_decimal::Decimal;

/// Item lifecycle with identifier uniqueness enforced on every write
pub struct IdentityRegistry<'a> {
    items: &'a dyn ItemStore,
    codec: ChecksumCodec,
}

impl<'a> IdentityRegistry<'a> {
    pub fn new(items: &'a dyn ItemStore) -> Self {
        Self {
            items,
            codec: ChecksumCodec::new(),
        }
    }

    /// Use `codec` for [`issue_part_number`](Self::issue_part_number).
    pub fn with_codec(mut self, codec: ChecksumCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Generate a fresh catalog code for `category_name` / `sequence`.
    ///
    /// # Errors
    ///
    /// The codec's errors, or `DuplicatePartNumber` when an item already carries the code.
    pub fn issue_part_number(
        &self,
        category_name: &str,
        sequence: u32,
    ) -> Result<CatalogCode, CatalogError> {
        observed("item.issue_part_number", || {
            let code = self.codec.generate(category_name, sequence)?;
            if self.items.find_by_part_number(code.as_str())?.is_some() {
                return Err(CatalogError::DuplicatePartNumber(code.to_string()));
            }
            Ok(code)
        })
    }

    /// Validate and insert an item.
    ///
    /// # Errors
    ///
    /// - `Validation` for missing or out-of-range fields
    /// - `DuplicatePartNumber` / `DuplicateBarcode` when another item holds either identifier
    pub fn create_item(&self, item: &NewItem) -> Result<i32, CatalogError> {
        observed("item.create", || {
            validate_fields(
                &item.part_number,
                &item.description,
                item.buy_price,
                item.sell_price,
                item.current_stock,
                item.minimum_stock,
            )?;

            if self.items.find_by_part_number(&item.part_number)?.is_some() {
                return Err(CatalogError::DuplicatePartNumber(item.part_number.clone()));
            }
            if let Some(barcode) = item.scanned_barcode() {
                if self.items.find_by_barcode(barcode)?.is_some() {
                    return Err(CatalogError::DuplicateBarcode(barcode.to_string()));
                }
            }

            let normalised = NewItem {
                barcode: item.scanned_barcode().map(str::to_string),
                ..item.clone()
            };
            let id = self
                .items
                .insert_item(&normalised)
                .map_err(|e| {
                    translate_identity_conflict(e, &item.part_number, item.scanned_barcode())
                })?;
            log::debug!("created item {} ({})", id, item.part_number);
            Ok(id)
        })
    }

    /// Persist `item`. Identifiers are re-checked only when they change.
    ///
    /// # Errors
    ///
    /// `NotFound` when `item.id` does not exist, otherwise as [`create_item`](Self::create_item).
    pub fn update_item(&self, item: &Item) -> Result<(), CatalogError> {
        observed("item.update", || {
            validate_fields(
                &item.part_number,
                &item.description,
                item.buy_price,
                item.sell_price,
                item.current_stock,
                item.minimum_stock,
            )?;
            let current = self.get_existing(item.id)?;

            if item.part_number != current.part_number {
                if let Some(other) = self.items.find_by_part_number(&item.part_number)? {
                    if other.id != item.id {
                        return Err(CatalogError::DuplicatePartNumber(item.part_number.clone()));
                    }
                }
            }
            if let Some(barcode) = item.scanned_barcode() {
                if Some(barcode) != current.scanned_barcode() {
                    if let Some(other) = self.items.find_by_barcode(barcode)? {
                        if other.id != item.id {
                            return Err(CatalogError::DuplicateBarcode(barcode.to_string()));
                        }
                    }
                }
            }

            let normalised = Item {
                barcode: item.scanned_barcode().map(str::to_string),
                ..item.clone()
            };
            self.items
                .update_item(&normalised)
                .map_err(|e| {
                    translate_identity_conflict(e, &item.part_number, item.scanned_barcode())
                })?;
            log::debug!("updated item {}", item.id);
            Ok(())
        })
    }

    pub fn delete_item(&self, id: i32) -> Result<(), CatalogError> {
        observed("item.delete", || {
            self.get_existing(id)?;
            self.items.delete_item(id)?;
            log::debug!("deleted item {}", id);
            Ok(())
        })
    }

    pub fn get_item(&self, id: i32) -> Result<Item, CatalogError> {
        observed("item.get", || self.get_existing(id))
    }

    pub fn find_by_part_number(&self, part_number: &str) -> Result<Option<Item>, CatalogError> {
        observed("item.find_by_part_number", || {
            Ok(self.items.find_by_part_number(part_number)?)
        })
    }

    /// Item carrying `barcode`; a blank barcode matches nothing.
    pub fn find_by_barcode(&self, barcode: &str) -> Result<Option<Item>, CatalogError> {
        observed("item.find_by_barcode", || {
            if barcode.is_empty() {
                return Ok(None);
            }
            Ok(self.items.find_by_barcode(barcode)?)
        })
    }

    /// Items matching `filter`, ordered by part number.
    pub fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, CatalogError> {
        observed("item.list", || Ok(self.items.list_items(filter)?))
    }

    /// Active items at or below their minimum stock, ordered by part number.
    pub fn low_stock_items(&self) -> Result<Vec<Item>, CatalogError> {
        let filter = ItemFilter {
            low_stock: true,
            is_active: Some(true),
            ..ItemFilter::default()
        };
        observed("item.low_stock", || Ok(self.items.list_items(&filter)?))
    }

    fn get_existing(&self, id: i32) -> Result<Item, CatalogError> {
        self.items
            .get_item(id)?
            .ok_or_else(|| CatalogError::not_found(Entity::Item, id))
    }
}

fn validate_fields(
    part_number: &str,
    description: &str,
    buy_price: Decimal,
    sell_price: Decimal,
    current_stock: i32,
    minimum_stock: i32,
) -> Result<(), CatalogError> {
    if part_number.trim().is_empty() {
        return Err(CatalogError::Validation("part number is required".into()));
    }
    if description.trim().is_empty() {
        return Err(CatalogError::Validation("description is required".into()));
    }
    if buy_price <= Decimal::ZERO || sell_price <= Decimal::ZERO {
        return Err(CatalogError::Validation(
            "buy and sell prices must be greater than zero".into(),
        ));
    }
    if current_stock < 0 || minimum_stock < 0 {
        return Err(CatalogError::Validation(
            "stock levels cannot be negative".into(),
        ));
    }
    Ok(())
}

fn translate_identity_conflict(
    error: LifeError,
    part_number: &str,
    barcode: Option<&str>,
) -> CatalogError {
    if !error.is_unique_violation() {
        return CatalogError::Storage(error);
    }
    match (error.constraint(), barcode) {
        (Some(constraints::PART_NUMBER), _) => {
            CatalogError::DuplicatePartNumber(part_number.to_string())
        }
        (Some(constraints::BARCODE), Some(barcode)) => {
            CatalogError::DuplicateBarcode(barcode.to_string())
        }
        _ => CatalogError::Storage(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::ErrorKind;

    fn new_item(part_number: &str, barcode: Option<&str>) -> NewItem {
        NewItem {
            part_number: part_number.to_string(),
            description: "Oil filter".to_string(),
            category_id: None,
            buy_price: Decimal::new(450, 2),
            sell_price: Decimal::new(990, 2),
            current_stock: 10,
            minimum_stock: 2,
            barcode: barcode.map(str::to_string),
            supplier_id: None,
            is_active: true,
            notes: None,
        }
    }

    #[test]
    fn duplicate_part_number_on_create() {
        let store = MemoryStore::new();
        let registry = IdentityRegistry::new(&store);
        registry.create_item(&new_item("FI000007248", None)).unwrap();

        let err = registry
            .create_item(&new_item("FI000007248", None))
            .unwrap_err();
        assert!(
            matches!(err, CatalogError::DuplicatePartNumber(ref code) if code == "FI000007248")
        );
        assert_eq!(err.kind(), ErrorKind::IntegrityViolation);
    }

    #[test]
    fn duplicate_barcode_on_create() {
        let store = MemoryStore::new();
        let registry = IdentityRegistry::new(&store);
        registry
            .create_item(&new_item("FI000007248", Some("4006381333931")))
            .unwrap();
        assert!(matches!(
            registry.create_item(&new_item("FI000008248", Some("4006381333931"))),
            Err(CatalogError::DuplicateBarcode(_))
        ));
    }

    #[test]
    fn empty_barcodes_never_conflict() {
        let store = MemoryStore::new();
        let registry = IdentityRegistry::new(&store);
        let first = registry.create_item(&new_item("FI000007248", Some(""))).unwrap();
        registry.create_item(&new_item("FI000008248", Some(""))).unwrap();
        registry.create_item(&new_item("FI000009248", None)).unwrap();

        assert_eq!(registry.get_item(first).unwrap().barcode, None);
        assert_eq!(registry.find_by_barcode("").unwrap(), None);
    }

    #[test]
    fn keeping_own_identifiers_on_update() {
        let store = MemoryStore::new();
        let registry = IdentityRegistry::new(&store);
        let id = registry
            .create_item(&new_item("FI000007248", Some("4006381333931")))
            .unwrap();

        let mut item = registry.get_item(id).unwrap();
        item.current_stock = 1;
        registry.update_item(&item).unwrap();
        assert_eq!(registry.get_item(id).unwrap().current_stock, 1);
    }

    #[test]
    fn taking_another_items_code_on_update() {
        let store = MemoryStore::new();
        let registry = IdentityRegistry::new(&store);
        registry.create_item(&new_item("FI000007248", None)).unwrap();
        let id = registry
            .create_item(&new_item("FI000008248", Some("123")))
            .unwrap();
        registry
            .create_item(&new_item("FI000009248", Some("456")))
            .unwrap();

        let mut item = registry.get_item(id).unwrap();
        item.part_number = "FI000007248".to_string();
        assert!(matches!(
            registry.update_item(&item),
            Err(CatalogError::DuplicatePartNumber(_))
        ));

        let mut item = registry.get_item(id).unwrap();
        item.barcode = Some("456".to_string());
        assert!(matches!(
            registry.update_item(&item),
            Err(CatalogError::DuplicateBarcode(_))
        ));
    }

    #[test]
    fn field_validation() {
        let store = MemoryStore::new();
        let registry = IdentityRegistry::new(&store);

        let mut item = new_item("FI000007248", None);
        item.buy_price = Decimal::ZERO;
        assert!(matches!(
            registry.create_item(&item),
            Err(CatalogError::Validation(_))
        ));

        let mut item = new_item(" ", None);
        item.description = "x".into();
        assert_eq!(
            registry.create_item(&item).unwrap_err().kind(),
            ErrorKind::MalformedInput
        );

        let mut item = new_item("FI000007248", None);
        item.minimum_stock = -1;
        assert!(registry.create_item(&item).is_err());
    }

    #[test]
    fn issued_codes_are_checked_against_the_catalog() {
        let store = MemoryStore::new();
        let registry = IdentityRegistry::new(&store).with_codec(ChecksumCodec::with_year(2024));

        let code = registry.issue_part_number("Brakes", 42).unwrap();
        assert_eq!(code.as_str(), "BR000042248");
        registry.create_item(&new_item(code.as_str(), None)).unwrap();

        assert!(matches!(
            registry.issue_part_number("Brakes", 42),
            Err(CatalogError::DuplicatePartNumber(_))
        ));
        assert!(registry.issue_part_number("Brakes", 43).is_ok());
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn issuing_is_counted_but_bare_generation_is_not() {
        use crate::metrics::METRICS;

        ChecksumCodec::generate_for_year("Lighting", 7, 2024).unwrap();
        let store = MemoryStore::new();
        let registry = IdentityRegistry::new(&store).with_codec(ChecksumCodec::with_year(2024));
        registry.issue_part_number("Lighting", 8).unwrap();

        let exposition = METRICS.render();
        assert!(exposition.contains("item.issue_part_number"), "{exposition}");
        assert!(!exposition.contains("code.generate"), "{exposition}");
    }

    #[test]
    fn low_stock_lists_active_items_at_or_below_minimum() {
        let store = MemoryStore::new();
        let registry = IdentityRegistry::new(&store);
        let mut low = new_item("FI000009248", None);
        low.current_stock = 2;
        let mut retired = new_item("FI000008248", None);
        retired.current_stock = 0;
        retired.is_active = false;
        registry.create_item(&low).unwrap();
        registry.create_item(&retired).unwrap();
        registry.create_item(&new_item("FI000007248", None)).unwrap();

        let codes: Vec<_> = registry
            .low_stock_items()
            .unwrap()
            .into_iter()
            .map(|i| i.part_number)
            .collect();
        assert_eq!(codes, ["FI000009248"]);
    }

    #[test]
    fn filtered_listing() {
        let store = MemoryStore::new();
        let registry = IdentityRegistry::new(&store);
        let mut pads = new_item("BR000042248", None);
        pads.description = "Front brake pads".into();
        pads.category_id = Some(3);
        pads.supplier_id = Some(8);
        let mut discs = new_item("BR000041248", None);
        discs.description = "Vented brake discs".into();
        discs.category_id = Some(3);
        registry.create_item(&pads).unwrap();
        registry.create_item(&discs).unwrap();
        registry.create_item(&new_item("FI000007248", None)).unwrap();

        let codes = |filter: ItemFilter| -> Vec<String> {
            registry
                .list_items(&filter)
                .unwrap()
                .into_iter()
                .map(|i| i.part_number)
                .collect()
        };

        assert_eq!(
            codes(ItemFilter::default()),
            ["BR000041248", "BR000042248", "FI000007248"]
        );
        assert_eq!(
            codes(ItemFilter {
                category_id: Some(3),
                ..Default::default()
            }),
            ["BR000041248", "BR000042248"]
        );
        assert_eq!(
            codes(ItemFilter {
                supplier_id: Some(8),
                ..Default::default()
            }),
            ["BR000042248"]
        );
        assert_eq!(
            codes(ItemFilter {
                search: Some("DISC".into()),
                ..Default::default()
            }),
            ["BR000041248"]
        );
        assert_eq!(
            codes(ItemFilter {
                part_number: Some("fi0".into()),
                ..Default::default()
            }),
            ["FI000007248"]
        );
    }

    #[test]
    fn delete_missing_item() {
        let store = MemoryStore::new();
        let registry = IdentityRegistry::new(&store);
        assert_eq!(
            registry.delete_item(3).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn constraint_names_pick_the_error() {
        let err = translate_identity_conflict(
            LifeError::UniqueViolation(constraints::BARCODE.to_string()),
            "FI000007248",
            Some("123"),
        );
        assert!(matches!(err, CatalogError::DuplicateBarcode(ref b) if b == "123"));

        let err = translate_identity_conflict(
            LifeError::UniqueViolation(constraints::PART_NUMBER.to_string()),
            "FI000007248",
            None,
        );
        assert!(matches!(err, CatalogError::DuplicatePartNumber(_)));
    }
}
