// 🏦 Account Reference Table
//
// Active (non-deleted) accounts of one owner, keyed by exact name.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub currency: String,
}

impl Account {
    pub fn new(id: i64, name: impl Into<String>, currency: impl Into<String>) -> Self {
        Account {
            id,
            name: name.into(),
            currency: currency.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccountRegistry {
    by_name: HashMap<String, Account>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later registrations with the same name replace earlier ones
    pub fn register(&mut self, account: Account) {
        self.by_name.insert(account.name.clone(), account);
    }

    /// Exact, case-sensitive name match
    pub fn find_by_name(&self, name: &str) -> Option<&Account> {
        self.by_name.get(name)
    }

    pub fn get_id(&self, name: &str) -> Option<i64> {
        self.find_by_name(name).map(|a| a.id)
    }

    pub fn count(&self) -> usize {
        self.by_name.len()
    }
}

impl FromIterator<Account> for AccountRegistry {
    fn from_iter<I: IntoIterator<Item = Account>>(iter: I) -> Self {
        let mut registry = AccountRegistry::new();
        for account in iter {
            registry.register(account);
        }
        registry
    }
}
