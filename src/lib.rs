//! Finsync keeps a local, in-memory view of a personal-finance ledger in sync
//! with a remote REST API.
//!
//! The remote server owns the authoritative transaction and category lists.
//! This crate caches the last-known server state, applies user edits to the
//! cache immediately so they appear instantaneous, and reconciles the cache
//! against the server once each network call settles:
//!
//! - [`QueryCache`] holds a keyed snapshot of server state.
//! - [`RemoteStore`] (implemented by [`RestClient`]) issues exactly one
//!   request per mutation and classifies the response.
//! - [`Syncer`] orchestrates the optimistic write, the remote call, and the
//!   rollback or refetch that follows.

#![warn(missing_docs)]

mod cache;
mod category;
mod client;
pub mod endpoints;
mod notification;
mod sync;
mod transaction;
mod validation;

pub use cache::{CacheKey, QueryCache, Snapshot, CATEGORIES_KEY, TRANSACTIONS_KEY};
pub use category::{category_label, Category, CategoryId, CategoryName, NewCategory};
pub use client::{RemoteStore, RestClient};
pub use notification::{Notification, NotificationLevel, Notifier};
pub use sync::Syncer;
pub use transaction::{
    NewTransaction, Transaction, TransactionDraft, TransactionId, TransactionType,
};
pub use validation::ValidationErrors;

/// The errors that may occur while synchronizing with the remote API.
///
/// None of these are fatal: every failure is scoped to a single mutation
/// attempt and the user may recover by retrying the action.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The input failed the pre-mutation validation gate.
    ///
    /// Validation failures are resolved locally and never reach the network.
    #[error("validation failed: {0}")]
    InvalidInput(#[from] ValidationErrors),

    /// An empty string was used to create a category name.
    #[error("a category name cannot be empty")]
    EmptyCategoryName,

    /// The server answered with a status outside the 200-299 range.
    ///
    /// The message is extracted from a JSON `message` field in the response
    /// body when one is present, otherwise it is the HTTP reason phrase.
    #[error("the server rejected the request ({status}): {message}")]
    Rejected {
        /// The HTTP status code of the response.
        status: u16,
        /// A human-readable description of what went wrong.
        message: String,
    },

    /// The request never produced a response, e.g. connection refused or
    /// timed out.
    #[error("could not reach the server: {0}")]
    Unreachable(String),

    /// The server answered with a success status but the body could not be
    /// parsed where a body was required, e.g. a malformed transaction list.
    ///
    /// Mutation endpoints that may legitimately return an empty or non-JSON
    /// body do not produce this error; their bodies are ignored.
    #[error("could not parse the server response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Error::InvalidResponse(error.to_string())
        } else {
            Error::Unreachable(error.to_string())
        }
    }
}
