// 🔖 Tag Reference Table

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub group_id: i64,
}

impl Tag {
    pub fn new(id: i64, name: impl Into<String>, group_id: i64) -> Self {
        Tag {
            id,
            name: name.into(),
            group_id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    by_name: HashMap<String, Tag>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tag: Tag) {
        self.by_name.insert(tag.name.clone(), tag);
    }

    pub fn get_id(&self, name: &str) -> Option<i64> {
        self.by_name.get(name).map(|t| t.id)
    }

    /// Ids of the names that exist, in input order; unknown names are dropped
    pub fn resolve_all<'a, I>(&self, names: I) -> Vec<i64>
    where
        I: IntoIterator<Item = &'a String>,
    {
        names.into_iter().filter_map(|name| self.get_id(name)).collect()
    }

    pub fn count(&self) -> usize {
        self.by_name.len()
    }
}

impl FromIterator<Tag> for TagRegistry {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        let mut registry = TagRegistry::new();
        for tag in iter {
            registry.register(tag);
        }
        registry
    }
}
