// Reference tables loaded from the ledger store for one owner.
//
// Accounts and categories are mandatory for a row; tags and counterparties are
// best-effort and default when missing.

pub mod account;
pub mod category;
pub mod counterparty;
pub mod tag;

pub use account::{Account, AccountRegistry};
pub use category::{Category, CategoryRegistry, CategoryStrategy, CATEGORY_STRATEGIES};
pub use counterparty::{
    normalize_newlines, Counterparty, CounterpartyRegistry, CounterpartyStrategy,
    COUNTERPARTY_STRATEGIES, NO_COUNTERPARTY,
};
pub use tag::{Tag, TagRegistry};

use crate::error::RowError;
use crate::model::ParsedRow;

/// Numeric foreign keys of one row
#[derive(Debug, Clone, PartialEq)]
pub struct RowReferences {
    pub account_id: i64,
    pub category_id: i64,
    pub counterparty_id: i64,
    pub tag_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub accounts: AccountRegistry,
    pub categories: CategoryRegistry,
    pub tags: TagRegistry,
    pub counterparties: CounterpartyRegistry,
}

impl ReferenceTables {
    /// Category first, then account; either missing skips the row
    pub fn resolve(&self, row: &ParsedRow) -> Result<RowReferences, RowError> {
        let (category_id, _) = self
            .categories
            .resolve(&row.category_key)
            .ok_or_else(|| RowError::UnknownCategory {
                line: row.line,
                name: row.category_key.name.clone(),
            })?;

        let account_id = self
            .accounts
            .get_id(&row.account_ref)
            .ok_or_else(|| RowError::UnknownAccount {
                line: row.line,
                name: row.account_ref.clone(),
            })?;

        Ok(RowReferences {
            account_id,
            category_id,
            counterparty_id: self.counterparties.resolve(row.counterparty_ref.as_deref()),
            tag_ids: self.tags.resolve_all(&row.tag_refs),
        })
    }

    pub fn summary(&self) -> String {
        format!(
            "{} accounts, {} categories, {} tags, {} counterparties",
            self.accounts.count(),
            self.categories.count(),
            self.tags.count(),
            self.counterparties.count()
        )
    }
}
