// 🗂️ Category Reference Table
//
// Categories are keyed by (name, semantic type): the same name may exist once as
// income, once as expense and once as transfer.
//
// Resolution tries each strategy in CATEGORY_STRATEGIES order and stops at the
// first hit.

use crate::model::{CategoryKey, CategoryType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub category_type: CategoryType,
}

impl Category {
    pub fn new(id: i64, name: impl Into<String>, category_type: CategoryType) -> Self {
        Category {
            id,
            name: name.into(),
            category_type,
        }
    }
}

// ============================================================================
// LOOKUP STRATEGIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryStrategy {
    /// Same name, type implied by the row's classification
    ImpliedType,
    /// Same name, any type, tried Income → Expense → Transfer
    AnyType,
}

pub const CATEGORY_STRATEGIES: [CategoryStrategy; 2] =
    [CategoryStrategy::ImpliedType, CategoryStrategy::AnyType];

impl CategoryStrategy {
    pub fn lookup(&self, registry: &CategoryRegistry, key: &CategoryKey) -> Option<i64> {
        match self {
            CategoryStrategy::ImpliedType => registry.get_id(&key.name, key.category_type),
            CategoryStrategy::AnyType => CategoryType::FALLBACK_ORDER
                .iter()
                .find_map(|t| registry.get_id(&key.name, *t)),
        }
    }
}

// ============================================================================
// CATEGORY REGISTRY
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct CategoryRegistry {
    by_key: HashMap<(String, CategoryType), i64>,
}

impl CategoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, category: Category) {
        self.by_key
            .insert((category.name, category.category_type), category.id);
    }

    pub fn get_id(&self, name: &str, category_type: CategoryType) -> Option<i64> {
        self.by_key.get(&(name.to_string(), category_type)).copied()
    }

    /// Category id and the strategy that found it
    pub fn resolve(&self, key: &CategoryKey) -> Option<(i64, CategoryStrategy)> {
        CATEGORY_STRATEGIES
            .iter()
            .find_map(|strategy| strategy.lookup(self, key).map(|id| (id, *strategy)))
    }

    pub fn count(&self) -> usize {
        self.by_key.len()
    }
}

impl FromIterator<Category> for CategoryRegistry {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        let mut registry = CategoryRegistry::new();
        for category in iter {
            registry.register(category);
        }
        registry
    }
}
