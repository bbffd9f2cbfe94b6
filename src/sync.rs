//! The optimistic synchronizer: applies every user mutation to the local
//! cache before the network call resolves, then reconciles the cache with
//! server truth once the call settles.
//!
//! All mutation kinds go through one code path, [optimistic]:
//!
//! 1. Cancel any in-flight refetch against the cache, so it cannot land later
//!    and overwrite the optimistic write with stale data.
//! 2. Snapshot the cache, then apply the local edit.
//! 3. Await the remote call. On success the cache is invalidated and
//!    refetched, adopting server truth (including server-assigned IDs). On
//!    failure the snapshot is restored verbatim.
//!
//! A refetch that fails after a successful mutation is logged and the cache
//! stays marked stale; the mutation itself still succeeded.

use std::future::Future;

use crate::{
    cache::{QueryCache, CATEGORIES_KEY, TRANSACTIONS_KEY},
    category::{Category, CategoryId, NewCategory},
    client::RemoteStore,
    notification::{Notification, Notifier},
    transaction::{NewTransaction, Transaction, TransactionId},
    Error,
};

/// Run one mutation against the remote store with an optimistic local write.
///
/// `apply` edits the cache immediately; `execute` is a lazy future, so the
/// request is only sent after the local edit is visible.
async fn optimistic<T, F>(
    cache: &QueryCache<T>,
    apply: impl FnOnce(&mut Vec<T>),
    execute: F,
) -> Result<(), Error>
where
    T: Clone,
    F: Future<Output = Result<(), Error>>,
{
    cache.cancel_pending();
    let snapshot = cache.snapshot();
    cache.mutate(apply);

    match execute.await {
        Ok(()) => {
            cache.invalidate();
            Ok(())
        }
        Err(error) => {
            cache.restore(snapshot);
            Err(error)
        }
    }
}

/// Keeps the local caches in sync with the remote store.
///
/// The synchronizer owns the caches and the store handle. Success and error
/// signals for deletions are surfaced through the [Notifier] passed to
/// [Syncer::new]; create and update failures are only logged, and are
/// reported to the caller through the returned `Result` either way.
#[derive(Debug)]
pub struct Syncer<S> {
    store: S,
    transactions: QueryCache<Transaction>,
    categories: QueryCache<Category>,
    notifier: Notifier,
}

impl<S: RemoteStore> Syncer<S> {
    /// Create a synchronizer with empty caches.
    pub fn new(store: S, notifier: Notifier) -> Self {
        Self {
            store,
            transactions: QueryCache::new(TRANSACTIONS_KEY),
            categories: QueryCache::new(CATEGORIES_KEY),
            notifier,
        }
    }

    /// The cached transaction list.
    pub fn transactions(&self) -> &QueryCache<Transaction> {
        &self.transactions
    }

    /// The cached category list.
    pub fn categories(&self) -> &QueryCache<Category> {
        &self.categories
    }

    /// Fetch the transaction list from the server and store it in the cache.
    ///
    /// The fetched value is discarded if a mutation began while the fetch was
    /// in flight; the mutation's own reconciliation will refetch.
    pub async fn refresh_transactions(&self) -> Result<Vec<Transaction>, Error> {
        let epoch = self.transactions.begin_refetch();
        let fetched = self.store.transactions().await?;
        self.transactions.complete_refetch(epoch, fetched.clone());

        Ok(fetched)
    }

    /// Fetch the category list from the server and store it in the cache.
    pub async fn refresh_categories(&self) -> Result<Vec<Category>, Error> {
        let epoch = self.categories.begin_refetch();
        let fetched = self.store.categories().await?;
        self.categories.complete_refetch(epoch, fetched.clone());

        Ok(fetched)
    }

    /// Create a transaction.
    ///
    /// A provisional copy without an ID is appended to the cache before the
    /// request is sent; the refetch after a successful response replaces it
    /// with the server's copy, which carries the server-assigned ID.
    ///
    /// # Errors
    ///
    /// Returns the transport error and rolls the cache back if the server
    /// rejects the transaction or cannot be reached.
    pub async fn create_transaction(&self, new_transaction: NewTransaction) -> Result<(), Error> {
        let provisional = new_transaction.clone().into_provisional();
        let outcome = optimistic(
            &self.transactions,
            move |cached| cached.push(provisional),
            self.store.create_transaction(&new_transaction),
        )
        .await;

        match outcome {
            Ok(()) => {
                self.refetch_transactions_after_mutation().await;
                Ok(())
            }
            Err(error) => {
                tracing::warn!("failed to create transaction: {error}");
                Err(error)
            }
        }
    }

    /// Replace the transaction with `id` by `update`.
    ///
    /// The cached entity matching `id` is replaced before the request is
    /// sent. A failed request restores the previous value.
    pub async fn update_transaction(
        &self,
        id: TransactionId,
        update: NewTransaction,
    ) -> Result<(), Error> {
        let replacement = update.clone().with_id(id);
        let outcome = optimistic(
            &self.transactions,
            move |cached| {
                if let Some(slot) = cached
                    .iter_mut()
                    .find(|transaction| transaction.id == Some(id))
                {
                    *slot = replacement;
                }
            },
            self.store.update_transaction(id, &update),
        )
        .await;

        match outcome {
            Ok(()) => {
                self.refetch_transactions_after_mutation().await;
                Ok(())
            }
            Err(error) => {
                tracing::warn!("failed to update transaction {id}: {error}");
                Err(error)
            }
        }
    }

    /// Delete the transaction with `id`.
    ///
    /// The entity is removed from the cache before the request is sent. A
    /// success or failure notification is emitted; failure also restores the
    /// cache to its pre-mutation snapshot.
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<(), Error> {
        let outcome = optimistic(
            &self.transactions,
            move |cached| cached.retain(|transaction| transaction.id != Some(id)),
            self.store.delete_transaction(id),
        )
        .await;

        match outcome {
            Ok(()) => {
                self.notifier.notify(Notification::success(
                    "Success",
                    "Transaction deleted successfully",
                ));
                self.refetch_transactions_after_mutation().await;
                Ok(())
            }
            Err(error) => {
                tracing::warn!("failed to delete transaction {id}: {error}");
                self.notifier
                    .notify(Notification::error("Error", error.to_string()));
                Err(error)
            }
        }
    }

    /// Delete every transaction whose ID is in `ids`.
    ///
    /// On success, returns the number of deleted transactions and emits a
    /// notification reporting it. On failure, the full pre-mutation snapshot
    /// is restored.
    pub async fn delete_transactions(&self, ids: &[TransactionId]) -> Result<usize, Error> {
        let to_remove = ids.to_vec();
        let outcome = optimistic(
            &self.transactions,
            move |cached| {
                cached.retain(|transaction| {
                    !transaction.id.is_some_and(|id| to_remove.contains(&id))
                })
            },
            self.store.delete_transactions(ids),
        )
        .await;

        match outcome {
            Ok(()) => {
                let count = ids.len();
                let plural = if count == 1 { "" } else { "s" };
                self.notifier.notify(Notification::success(
                    "Success",
                    format!("{count} transaction{plural} deleted"),
                ));
                self.refetch_transactions_after_mutation().await;
                Ok(count)
            }
            Err(error) => {
                tracing::warn!("failed to delete {} transactions: {error}", ids.len());
                self.notifier
                    .notify(Notification::error("Error", error.to_string()));
                Err(error)
            }
        }
    }

    /// Create a category and return the server's copy of it.
    ///
    /// There is no optimistic append here: a category has no provisional
    /// identity until the server assigns an ID, so the cache is only
    /// invalidated and refetched once the server has answered.
    pub async fn create_category(&self, new_category: NewCategory) -> Result<Category, Error> {
        let created = match self.store.create_category(&new_category).await {
            Ok(created) => created,
            Err(error) => {
                tracing::warn!("failed to create category: {error}");
                return Err(error);
            }
        };

        self.categories.invalidate();
        self.refetch_categories_after_mutation().await;

        Ok(created)
    }

    /// Delete the category with `id`.
    ///
    /// The entity is removed from the cache before the request is sent; a
    /// failed request restores it. Transactions referencing the deleted
    /// category render as "Unknown" until they are edited.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), Error> {
        let outcome = optimistic(
            &self.categories,
            move |cached| cached.retain(|category| category.id != id),
            self.store.delete_category(id),
        )
        .await;

        match outcome {
            Ok(()) => {
                self.refetch_categories_after_mutation().await;
                Ok(())
            }
            Err(error) => {
                tracing::warn!("failed to delete category {id}: {error}");
                Err(error)
            }
        }
    }

    async fn refetch_transactions_after_mutation(&self) {
        if let Err(error) = self.refresh_transactions().await {
            tracing::warn!("could not refresh transactions after mutation: {error}");
        }
    }

    async fn refetch_categories_after_mutation(&self) {
        if let Err(error) = self.refresh_categories().await {
            tracing::warn!("could not refresh categories after mutation: {error}");
        }
    }
}
