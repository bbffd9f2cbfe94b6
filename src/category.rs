//! This file defines the `Category` type and the types needed to create one.
//! A category groups transactions, and every transaction references exactly
//! one category by ID.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Error;

/// The server-assigned identifier of a category.
pub type CategoryId = i64;

/// The name of a category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is
    /// an empty string.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`,
    /// because if the non-empty invariant is violated it will cause incorrect
    /// behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A category for expenses and income, e.g., 'Groceries', 'Eating Out',
/// 'Wages', as the server reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The name of the category.
    pub category_name: CategoryName,
}

/// A candidate category that has not been sent to the server yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    /// The name of the category to create.
    pub category_name: CategoryName,
}

/// The display name of the category with `id`, looked up in `categories`.
///
/// A transaction may briefly reference a category that is no longer cached,
/// e.g. right after the category was deleted but before the transactions have
/// been refetched. Rather than failing, a dangling reference renders as the
/// placeholder `"Unknown"`.
pub fn category_label(id: CategoryId, categories: &[Category]) -> &str {
    categories
        .iter()
        .find(|category| category.id == id)
        .map(|category| category.category_name.as_ref())
        .unwrap_or("Unknown")
}
