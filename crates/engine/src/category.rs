//! Expense and budget categories.
//!
//! The set is closed for aggregation purposes, but the store keeps whatever
//! text it was given: anything outside the known variants round-trips as
//! [`Category::Uncategorized`].

use std::fmt;

use serde::{Serialize, Serializer};

use crate::store::Value;

/// Category of an expense or budget line.
///
/// Variant order is the lexicographic order of the names, so `Ord` and the
/// known-category listing agree.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Cloth,
    Food,
    Miscellaneous,
    Online,
    Other,
    Uncategorized(String),
}

impl Category {
    /// The closed category set, sorted.
    pub const KNOWN: [Category; 5] = [
        Category::Cloth,
        Category::Food,
        Category::Miscellaneous,
        Category::Online,
        Category::Other,
    ];

    /// Maps free text to a category. Known names match case-insensitively.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        Self::KNOWN
            .into_iter()
            .find(|known| known.as_str().eq_ignore_ascii_case(trimmed))
            .unwrap_or_else(|| Category::Uncategorized(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Cloth => "Cloth",
            Self::Food => "Food",
            Self::Miscellaneous => "Miscellaneous",
            Self::Online => "Online",
            Self::Other => "Other",
            Self::Uncategorized(text) => text,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl From<&Category> for Value {
    fn from(value: &Category) -> Self {
        Value::Text(value.as_str().to_string())
    }
}
