use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A node of the category forest; `parent_id == None` marks a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insert payload for a category
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i32>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn under(name: impl Into<String>, parent_id: i32) -> Self {
        Self {
            name: name.into(),
            description: None,
            parent_id: Some(parent_id),
        }
    }
}

/// Query-scoped view of a category with its children attached, siblings ordered by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTreeNode {
    pub category: Category,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<CategoryTreeNode>,
}

impl CategoryTreeNode {
    /// Number of nodes in this subtree, the node itself included.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(CategoryTreeNode::size).sum::<usize>()
    }
}
