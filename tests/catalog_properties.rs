//! Catalog engine properties, end to end over the in-memory store.
//!
//! Also shows the look-then-write window: with the write-boundary
//! constraints switched off, two callers that both pass the read-side check
//! both commit.

use partsguard::{
    CatalogError, Category, ChecksumCodec, ErrorKind, FitmentMatrix, FitmentStore, FitmentView,
    HierarchyManager, IdentityRegistry, Item, ItemFilter, ItemStore, LifeError, MemoryStore,
    NewCategory, NewFitment, NewItem, NewMake, NewModel, NewSubmodel, VehicleRegistry,
};
use rust_decimal::Decimal;
use std::sync::Arc;

fn seed_vehicle(store: &MemoryStore) -> i32 {
    let vehicles = VehicleRegistry::new(store);
    let make = vehicles
        .create_make(&NewMake {
            name: "Volkswagen".into(),
            country: Some("Germany".into()),
        })
        .unwrap();
    let model = vehicles
        .create_model(&NewModel {
            make_id: make,
            name: "Golf".into(),
        })
        .unwrap();
    vehicles
        .create_submodel(&NewSubmodel {
            model_id: model,
            name: "1.9 TDI".into(),
            year_from: 1997,
            year_to: Some(2003),
            engine_type: "I4".into(),
            engine_displacement: 1.9,
            fuel_type: "Diesel".into(),
            transmission_type: "Manual".into(),
            body_type: "Hatchback".into(),
        })
        .unwrap()
}

fn new_item(part_number: &str) -> NewItem {
    NewItem {
        part_number: part_number.into(),
        description: "Timing belt kit".into(),
        category_id: None,
        buy_price: Decimal::new(4200, 2),
        sell_price: Decimal::new(7900, 2),
        current_stock: 5,
        minimum_stock: 2,
        barcode: None,
        supplier_id: None,
        is_active: true,
        notes: None,
    }
}

fn seed_item(store: &MemoryStore, part_number: &str) -> i32 {
    IdentityRegistry::new(store)
        .create_item(&new_item(part_number))
        .unwrap()
}

#[test]
fn every_category_refuses_itself_as_parent() {
    let store = MemoryStore::new();
    let hierarchy = HierarchyManager::new(&store);
    let root = hierarchy.create(&NewCategory::new("Engine")).unwrap();
    let child = hierarchy.create(&NewCategory::under("Belts", root)).unwrap();
    let leaf = hierarchy.create(&NewCategory::under("Kits", child)).unwrap();

    for id in [root, child, leaf] {
        let mut category = hierarchy.get(id).unwrap();
        category.parent_id = Some(id);
        let err = hierarchy.update(&category).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IntegrityViolation, "category {id}");
    }
}

#[test]
fn chain_root_cannot_move_under_its_descendants() {
    let store = MemoryStore::new();
    let hierarchy = HierarchyManager::new(&store);
    let a = hierarchy.create(&NewCategory::new("A")).unwrap();
    let b = hierarchy.create(&NewCategory::under("B", a)).unwrap();
    let c = hierarchy.create(&NewCategory::under("C", b)).unwrap();
    let d = hierarchy.create(&NewCategory::new("D")).unwrap();

    for descendant in [b, c] {
        let mut root = hierarchy.get(a).unwrap();
        root.parent_id = Some(descendant);
        assert_eq!(
            hierarchy.update(&root).unwrap_err().kind(),
            ErrorKind::IntegrityViolation
        );
    }

    let mut root = hierarchy.get(a).unwrap();
    root.parent_id = Some(d);
    hierarchy.update(&root).unwrap();

    let tree = hierarchy.tree().unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].category.id, d);
    assert_eq!(tree[0].size(), 4);
}

#[test]
fn tree_of_a_chain_and_of_a_corrupted_self_cycle() {
    let store = MemoryStore::new();
    let hierarchy = HierarchyManager::new(&store);
    let a = hierarchy.create(&NewCategory::new("A")).unwrap();
    let b = hierarchy.create(&NewCategory::under("B", a)).unwrap();
    let c = hierarchy.create(&NewCategory::under("C", b)).unwrap();

    let tree = hierarchy.tree().unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].category.id, a);
    assert_eq!(tree[0].children.len(), 1);
    assert_eq!(tree[0].children[0].category.id, b);
    assert_eq!(tree[0].children[0].children.len(), 1);
    assert_eq!(tree[0].children[0].children[0].category.id, c);
    assert!(tree[0].children[0].children[0].children.is_empty());

    let corrupted = MemoryStore::new();
    let stamp = chrono::Utc::now().naive_utc();
    corrupted
        .seed_category(Category {
            id: 1,
            name: "A".into(),
            description: None,
            parent_id: Some(1),
            created_at: stamp,
            updated_at: stamp,
        })
        .unwrap();
    assert!(HierarchyManager::new(&corrupted).tree().unwrap().is_empty());
}

#[test]
fn deleting_any_parent_fails_whatever_lies_below() {
    let store = MemoryStore::new();
    let hierarchy = HierarchyManager::new(&store);
    let root = hierarchy.create(&NewCategory::new("Body")).unwrap();
    let shallow = hierarchy.create(&NewCategory::new("Lighting")).unwrap();
    hierarchy.create(&NewCategory::under("Bulbs", shallow)).unwrap();
    let mut parent = root;
    for depth in 0..5 {
        parent = hierarchy
            .create(&NewCategory::under(format!("Level {depth}"), parent))
            .unwrap();
    }

    for id in [root, shallow] {
        let err = hierarchy.delete(id).unwrap_err();
        assert!(matches!(err, CatalogError::HasSubcategories { .. }));
        assert_eq!(err.kind(), ErrorKind::IntegrityViolation);
    }
}

#[test]
fn linking_the_same_pair_twice() {
    let store = MemoryStore::new();
    let item = seed_item(&store, "TI000007248");
    let submodel = seed_vehicle(&store);
    let fitment = FitmentMatrix::over(&store);

    fitment.link(item, submodel, Some("with water pump")).unwrap();
    assert_eq!(
        fitment.link(item, submodel, None).unwrap_err().kind(),
        ErrorKind::IntegrityViolation
    );

    let links = fitment.links_for_item(item).unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].make_name, "Volkswagen");
    assert_eq!(links[0].link.notes.as_deref(), Some("with water pump"));
}

#[test]
fn brakes_42_in_2024() {
    let code = ChecksumCodec::with_year(2024).generate("Brakes", 42).unwrap();
    assert_eq!(&code.as_str()[..10], "BR00004224");
    assert_eq!(code.as_str().len(), 11);
    assert!(ChecksumCodec::validate(code.as_str()));

    let mut undetected = 0;
    let mut mutations = 0;
    for (pos, original) in code.as_str().char_indices() {
        let alphabet: Vec<char> = if pos < 2 {
            ('A'..='Z').collect()
        } else {
            ('0'..='9').collect()
        };
        for replacement in alphabet.into_iter().filter(|c| *c != original) {
            let mut mutated = code.as_str().to_string();
            mutated.replace_range(pos..pos + 1, &replacement.to_string());
            mutations += 1;
            if ChecksumCodec::validate(&mutated) {
                undetected += 1;
            }
        }
    }
    // Only letters ten character codes apart collide; digits never do
    assert!(undetected * 10 < mutations, "{undetected} of {mutations}");
}

#[test]
fn own_code_never_conflicts_but_anothers_does() {
    let store = MemoryStore::new();
    let registry = IdentityRegistry::new(&store);
    let first = registry.create_item(&new_item("TI000007248")).unwrap();
    let second = registry.create_item(&new_item("TI000008248")).unwrap();

    let mut item = registry.get_item(first).unwrap();
    item.description = "Timing belt kit with tensioner".into();
    registry.update_item(&item).unwrap();

    let err = registry.create_item(&new_item("TI000007248")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IntegrityViolation);

    let mut item = registry.get_item(second).unwrap();
    item.part_number = "TI000007248".into();
    assert_eq!(
        registry.update_item(&item).unwrap_err().kind(),
        ErrorKind::IntegrityViolation
    );
}

/// Fitment store whose reads were taken before any concurrent write landed.
struct StaleLinks<'a>(&'a MemoryStore);

impl FitmentStore for StaleLinks<'_> {
    fn list_links_by_item(&self, _item_id: i32) -> Result<Vec<FitmentView>, LifeError> {
        Ok(Vec::new())
    }

    fn insert_link(&self, link: &NewFitment) -> Result<i32, LifeError> {
        self.0.insert_link(link)
    }

    fn delete_link_by_pair(&self, item_id: i32, submodel_id: i32) -> Result<u64, LifeError> {
        self.0.delete_link_by_pair(item_id, submodel_id)
    }

    fn list_items_by_submodel(&self, submodel_id: i32) -> Result<Vec<Item>, LifeError> {
        self.0.list_items_by_submodel(submodel_id)
    }
}

/// Item store whose identifier lookups miss rows written by a concurrent caller.
struct StaleItems<'a>(&'a MemoryStore);

impl ItemStore for StaleItems<'_> {
    fn get_item(&self, id: i32) -> Result<Option<Item>, LifeError> {
        self.0.get_item(id)
    }

    fn find_by_part_number(&self, _part_number: &str) -> Result<Option<Item>, LifeError> {
        Ok(None)
    }

    fn find_by_barcode(&self, _barcode: &str) -> Result<Option<Item>, LifeError> {
        Ok(None)
    }

    fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, LifeError> {
        self.0.list_items(filter)
    }

    fn insert_item(&self, item: &NewItem) -> Result<i32, LifeError> {
        self.0.insert_item(item)
    }

    fn update_item(&self, item: &Item) -> Result<(), LifeError> {
        self.0.update_item(item)
    }

    fn delete_item(&self, id: i32) -> Result<(), LifeError> {
        self.0.delete_item(id)
    }
}

#[test]
fn racing_links_duplicate_without_a_constraint() {
    let store = MemoryStore::without_constraints();
    let item = seed_item(&store, "TI000007248");
    let submodel = seed_vehicle(&store);
    let stale = StaleLinks(&store);
    let fitment = FitmentMatrix::new(&stale, &store, &store);

    fitment.link(item, submodel, None).unwrap();
    fitment.link(item, submodel, None).unwrap();
    assert_eq!(store.link_count().unwrap(), 2);
}

#[test]
fn racing_links_are_caught_by_the_constraint() {
    let store = MemoryStore::new();
    let item = seed_item(&store, "TI000007248");
    let submodel = seed_vehicle(&store);
    let stale = StaleLinks(&store);
    let fitment = FitmentMatrix::new(&stale, &store, &store);

    fitment.link(item, submodel, None).unwrap();
    let err = fitment.link(item, submodel, None).unwrap_err();
    assert!(matches!(
        err,
        CatalogError::LinkExists { item_id, submodel_id }
            if item_id == item && submodel_id == submodel
    ));
    assert_eq!(store.link_count().unwrap(), 1);
}

#[test]
fn racing_part_numbers() {
    let loose = MemoryStore::without_constraints();
    let stale = StaleItems(&loose);
    let registry = IdentityRegistry::new(&stale);
    registry.create_item(&new_item("TI000007248")).unwrap();
    registry.create_item(&new_item("TI000007248")).unwrap();
    assert_eq!(loose.list_items(&ItemFilter::default()).unwrap().len(), 2);

    let strict = MemoryStore::new();
    let stale = StaleItems(&strict);
    let registry = IdentityRegistry::new(&stale);
    registry.create_item(&new_item("TI000007248")).unwrap();
    assert!(matches!(
        registry.create_item(&new_item("TI000007248")),
        Err(CatalogError::DuplicatePartNumber(_))
    ));
}

#[test]
fn concurrent_links_from_coroutines_commit_once() {
    let store = Arc::new(MemoryStore::new());
    let item = seed_item(&store, "TI000007248");
    let submodel = seed_vehicle(&store);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            may::go!(move || FitmentMatrix::over(&*store).link(item, submodel, None))
        })
        .collect();

    let mut committed = 0;
    for handle in handles {
        match handle.join().expect("coroutine panicked") {
            Ok(_) => committed += 1,
            Err(err) => assert!(matches!(err, CatalogError::LinkExists { .. }), "{err}"),
        }
    }
    assert_eq!(committed, 1);
    assert_eq!(store.link_count().unwrap(), 1);
}
