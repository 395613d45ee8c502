// 🏷️ Classification Rules
//
// A row is a transfer leg when its category is one of the configured transfer
// categories, whatever its sign. Otherwise the sign decides.

use crate::model::Classification;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct Classifier {
    transfer_categories: BTreeSet<String>,
}

impl Classifier {
    pub fn new<I, S>(transfer_categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Classifier {
            transfer_categories: transfer_categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn classify(&self, category_name: &str, signed: bool) -> Classification {
        if self.transfer_categories.contains(category_name) {
            Classification::TransferOut
        } else if signed {
            Classification::Expense
        } else {
            Classification::Income
        }
    }

    pub fn transfer_categories(&self) -> impl Iterator<Item = &str> {
        self.transfer_categories.iter().map(String::as_str)
    }
}
