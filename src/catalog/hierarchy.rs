//! Category hierarchy management
//!
//! Categories form a forest through `parent_id`. [`HierarchyManager`] keeps it
//! acyclic on every write and materialises the nested view from the flat
//! relation in one pass.

use crate::error::Entity;
use crate::metrics::observed;
use crate::model::{Category, CategoryTreeNode, NewCategory};
use crate::store::CategoryStore;
use crate::CatalogError;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Integrity report over the persisted category relation
///
/// Every category [`HierarchyManager::tree`] leaves out appears in exactly one
/// of `orphans` or `cyclic`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HierarchyReport {
    pub total: usize,
    pub roots: Vec<i32>,
    /// Categories whose ancestor chain ends at a parent id that does not exist
    pub orphans: Vec<i32>,
    /// Categories on, or underneath, a parent cycle
    pub cyclic: Vec<i32>,
}

impl HierarchyReport {
    pub fn is_consistent(&self) -> bool {
        self.orphans.is_empty() && self.cyclic.is_empty()
    }
}

/// Flat category set indexed once for tree assembly and ancestor walks
struct CategoryIndex {
    parents: HashMap<i32, Option<i32>>,
    children: HashMap<Option<i32>, Vec<Category>>,
    len: usize,
}

impl CategoryIndex {
    fn build(mut categories: Vec<Category>) -> Self {
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        let len = categories.len();
        let parents = categories.iter().map(|c| (c.id, c.parent_id)).collect();
        let mut children: HashMap<Option<i32>, Vec<Category>> = HashMap::new();
        for category in categories {
            children.entry(category.parent_id).or_default().push(category);
        }
        Self {
            parents,
            children,
            len,
        }
    }

    /// Roots with their descendants attached, and the ids that were reached.
    fn forest(&self) -> (Vec<CategoryTreeNode>, HashSet<i32>) {
        let mut reached = HashSet::with_capacity(self.len);
        let roots = self
            .children
            .get(&None)
            .map(|roots| {
                roots
                    .iter()
                    .filter_map(|root| self.attach(root, &mut reached))
                    .collect()
            })
            .unwrap_or_default();
        (roots, reached)
    }

    fn attach(&self, category: &Category, reached: &mut HashSet<i32>) -> Option<CategoryTreeNode> {
        if !reached.insert(category.id) {
            return None;
        }
        let children = self
            .children
            .get(&Some(category.id))
            .map(|kids| {
                kids.iter()
                    .filter_map(|kid| self.attach(kid, reached))
                    .collect()
            })
            .unwrap_or_default();
        Some(CategoryTreeNode {
            category: category.clone(),
            children,
        })
    }

    /// Walks up from `start`. `Some(true)` when `target` is met, `Some(false)`
    /// when the chain ends (at a root or a missing parent), `None` when it is
    /// longer than the node count.
    fn ancestors_reach(&self, start: i32, target: i32) -> Option<bool> {
        let mut current = Some(start);
        for _ in 0..=self.len {
            match current {
                None => return Some(false),
                Some(id) if id == target => return Some(true),
                Some(id) => match self.parents.get(&id) {
                    Some(parent) => current = *parent,
                    None => return Some(false),
                },
            }
        }
        None
    }
}

/// Owns the category tree invariants
///
/// # Examples
///
/// ```
/// use partsguard::{HierarchyManager, MemoryStore, NewCategory};
///
/// let store = MemoryStore::new();
/// let hierarchy = HierarchyManager::new(&store);
/// let engine = hierarchy.create(&NewCategory::new("Engine")).unwrap();
/// hierarchy.create(&NewCategory::under("Filters", engine)).unwrap();
///
/// let tree = hierarchy.tree().unwrap();
/// assert_eq!(tree.len(), 1);
/// assert_eq!(tree[0].children[0].category.name, "Filters");
/// ```
pub struct HierarchyManager<'a> {
    store: &'a dyn CategoryStore,
}

impl<'a> HierarchyManager<'a> {
    pub fn new(store: &'a dyn CategoryStore) -> Self {
        Self { store }
    }

    /// Create a category, optionally under an existing parent.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank name, `InvalidReference` when the parent does not exist.
    pub fn create(&self, category: &NewCategory) -> Result<i32, CatalogError> {
        observed("category.create", || {
            require_name(&category.name)?;
            if let Some(parent_id) = category.parent_id {
                self.require_parent(parent_id)?;
            }
            let id = self.store.insert_category(category)?;
            log::debug!("created category {} ({:?})", id, category.name);
            Ok(id)
        })
    }

    /// Persist `category`, re-validating acyclicity when its parent changes.
    ///
    /// # Errors
    ///
    /// - `NotFound` when `category.id` does not exist
    /// - `CircularReference` when the new parent is the category itself or one of its descendants
    /// - `InvalidReference` when the new parent does not exist
    pub fn update(&self, category: &Category) -> Result<(), CatalogError> {
        observed("category.update", || {
            require_name(&category.name)?;
            let current = self
                .store
                .get_category(category.id)?
                .ok_or_else(|| CatalogError::not_found(Entity::Category, category.id))?;

            if let Some(parent_id) = category.parent_id {
                if parent_id == category.id {
                    return Err(CatalogError::CircularReference {
                        category_id: category.id,
                        parent_id,
                    });
                }
                if current.parent_id != Some(parent_id) {
                    self.require_parent(parent_id)?;
                    self.check_not_descendant(category.id, parent_id)?;
                }
            }

            self.store.update_category(category)?;
            log::debug!("updated category {}", category.id);
            Ok(())
        })
    }

    /// Delete a leaf category.
    ///
    /// # Errors
    ///
    /// `NotFound` when absent, `HasSubcategories` while any category names it as parent.
    pub fn delete(&self, id: i32) -> Result<(), CatalogError> {
        observed("category.delete", || {
            self.get_existing(id)?;
            let children = self
                .store
                .list_categories()?
                .iter()
                .filter(|c| c.parent_id == Some(id))
                .count();
            if children > 0 {
                return Err(CatalogError::HasSubcategories {
                    category_id: id,
                    children,
                });
            }
            self.store.delete_category(id)?;
            log::debug!("deleted category {}", id);
            Ok(())
        })
    }

    pub fn get(&self, id: i32) -> Result<Category, CatalogError> {
        observed("category.get", || self.get_existing(id))
    }

    /// Every category, ordered by name.
    pub fn list(&self) -> Result<Vec<Category>, CatalogError> {
        observed("category.list", || {
            let mut categories = self.store.list_categories()?;
            categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            Ok(categories)
        })
    }

    /// Direct children of `id`, ordered by name.
    pub fn subcategories(&self, id: i32) -> Result<Vec<Category>, CatalogError> {
        observed("category.subcategories", || {
            self.get_existing(id)?;
            let index = CategoryIndex::build(self.store.list_categories()?);
            Ok(index.children.get(&Some(id)).cloned().unwrap_or_default())
        })
    }

    /// The category forest, siblings ordered by name.
    ///
    /// Categories that cannot be reached from a root (dangling parent, or a
    /// cycle written around the engine) are left out; see [`audit`](Self::audit).
    pub fn tree(&self) -> Result<Vec<CategoryTreeNode>, CatalogError> {
        observed("category.tree", || {
            let index = CategoryIndex::build(self.store.list_categories()?);
            let (forest, reached) = index.forest();
            if reached.len() < index.len {
                log::warn!(
                    "category tree omits {} unreachable categories",
                    index.len - reached.len()
                );
            }
            Ok(forest)
        })
    }

    /// Classify every category `tree` would leave out.
    pub fn audit(&self) -> Result<HierarchyReport, CatalogError> {
        observed("category.audit", || {
            let index = CategoryIndex::build(self.store.list_categories()?);
            let (forest, reached) = index.forest();

            let mut report = HierarchyReport {
                total: index.len,
                roots: forest.iter().map(|node| node.category.id).collect(),
                ..HierarchyReport::default()
            };
            let mut unreachable: Vec<i32> = index
                .parents
                .keys()
                .copied()
                .filter(|id| !reached.contains(id))
                .collect();
            unreachable.sort_unstable();

            for id in unreachable {
                // A chain that walks off the relation ends at a missing parent;
                // one that never ends is caught in a cycle.
                if dangles(&index, id) {
                    report.orphans.push(id);
                } else {
                    report.cyclic.push(id);
                }
            }
            Ok(report)
        })
    }

    fn get_existing(&self, id: i32) -> Result<Category, CatalogError> {
        self.store
            .get_category(id)?
            .ok_or_else(|| CatalogError::not_found(Entity::Category, id))
    }

    fn require_parent(&self, parent_id: i32) -> Result<(), CatalogError> {
        match self.store.get_category(parent_id)? {
            Some(_) => Ok(()),
            None => Err(CatalogError::invalid_reference(
                Entity::ParentCategory,
                parent_id,
            )),
        }
    }

    /// Rejects `parent_id` when walking up from it meets `category_id`.
    fn check_not_descendant(&self, category_id: i32, parent_id: i32) -> Result<(), CatalogError> {
        let index = CategoryIndex::build(self.store.list_categories()?);
        match index.ancestors_reach(parent_id, category_id) {
            Some(false) => Ok(()),
            Some(true) => Err(CatalogError::CircularReference {
                category_id,
                parent_id,
            }),
            None => {
                log::warn!(
                    "ancestor chain of category {} never reaches a root; refusing to attach {}",
                    parent_id,
                    category_id
                );
                Err(CatalogError::CircularReference {
                    category_id,
                    parent_id,
                })
            }
        }
    }
}

fn require_name(name: &str) -> Result<(), CatalogError> {
    if name.trim().is_empty() {
        return Err(CatalogError::Validation(
            "category name is required".to_string(),
        ));
    }
    Ok(())
}

fn dangles(index: &CategoryIndex, id: i32) -> bool {
    let mut current = id;
    for _ in 0..=index.len {
        match index.parents.get(&current) {
            None => return true,
            Some(None) => return false,
            Some(Some(parent)) => current = *parent,
        }
    }
    false
}
