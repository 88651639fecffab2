use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog item as stored by the inventory collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i32,
    /// Catalog code; unique across the catalog
    pub part_number: String,
    pub description: String,
    pub category_id: Option<i32>,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub current_stock: i32,
    pub minimum_stock: i32,
    /// Externally scanned barcode; unique when present
    pub barcode: Option<String>,
    pub supplier_id: Option<i32>,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub part_number: String,
    pub description: String,
    pub category_id: Option<i32>,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub current_stock: i32,
    pub minimum_stock: i32,
    pub barcode: Option<String>,
    pub supplier_id: Option<i32>,
    pub is_active: bool,
    pub notes: Option<String>,
}

impl Item {
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.minimum_stock
    }

    /// Barcode, treating an empty string as absent.
    pub fn scanned_barcode(&self) -> Option<&str> {
        self.barcode.as_deref().filter(|b| !b.is_empty())
    }
}

impl NewItem {
    pub fn scanned_barcode(&self) -> Option<&str> {
        self.barcode.as_deref().filter(|b| !b.is_empty())
    }
}

/// Item listing criteria; unset fields match everything.
///
/// `part_number` and `search` are case-insensitive substring matches, the
/// latter against part number or description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFilter {
    pub category_id: Option<i32>,
    pub supplier_id: Option<i32>,
    pub part_number: Option<String>,
    pub search: Option<String>,
    /// Only items at or below their minimum stock
    #[serde(default)]
    pub low_stock: bool,
    pub is_active: Option<bool>,
}

impl ItemFilter {
    pub fn matches(&self, item: &Item) -> bool {
        let contains = |haystack: &str, needle: &str| {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        };

        self.category_id.map_or(true, |id| item.category_id == Some(id))
            && self.supplier_id.map_or(true, |id| item.supplier_id == Some(id))
            && self
                .part_number
                .as_deref()
                .map_or(true, |p| contains(&item.part_number, p))
            && self.search.as_deref().map_or(true, |term| {
                contains(&item.part_number, term) || contains(&item.description, term)
            })
            && (!self.low_stock || item.is_low_stock())
            && self.is_active.map_or(true, |active| item.is_active == active)
    }

    /// `%term%` pattern for `ILIKE`.
    pub(crate) fn like_pattern(term: Option<&str>) -> Option<String> {
        term.map(|t| format!("%{t}%"))
    }
}
