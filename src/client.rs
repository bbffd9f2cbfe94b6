//! The mutation executor: one outbound HTTP request per user-initiated
//! change, plus response classification.
//!
//! [RemoteStore] is the seam between the synchronizer and the network, so
//! tests can substitute an in-memory store. [RestClient] is the production
//! implementation, speaking the remote API's REST contract.

use serde::Deserialize;

use crate::{
    category::{Category, CategoryId, NewCategory},
    endpoints,
    transaction::{NewTransaction, Transaction, TransactionId},
    Error,
};

/// The remote HTTP API that owns the authoritative transaction and category
/// lists.
///
/// Each method issues exactly one request. Methods return [Error::Rejected]
/// for any response status outside the 200-299 range, [Error::Unreachable]
/// when no response arrives at all, and [Error::InvalidResponse] when a
/// required response body cannot be parsed.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Fetch the full transaction list.
    async fn transactions(&self) -> Result<Vec<Transaction>, Error>;

    /// Create a transaction. The response body is ignored; callers refetch
    /// the transaction list to pick up the server-assigned ID.
    async fn create_transaction(&self, new_transaction: &NewTransaction) -> Result<(), Error>;

    /// Replace the transaction with `id` by `update`.
    async fn update_transaction(
        &self,
        id: TransactionId,
        update: &NewTransaction,
    ) -> Result<(), Error>;

    /// Delete the transaction with `id`.
    async fn delete_transaction(&self, id: TransactionId) -> Result<(), Error>;

    /// Delete every transaction whose ID is in `ids`.
    async fn delete_transactions(&self, ids: &[TransactionId]) -> Result<(), Error>;

    /// Fetch the full category list.
    async fn categories(&self) -> Result<Vec<Category>, Error>;

    /// Create a category and return the server's copy of it.
    async fn create_category(&self, new_category: &NewCategory) -> Result<Category, Error>;

    /// Delete the category with `id`.
    async fn delete_category(&self, id: CategoryId) -> Result<(), Error>;
}

/// A [RemoteStore] backed by the remote REST API.
#[derive(Debug, Clone)]
pub struct RestClient {
    base_url: String,
    http: reqwest::Client,
}

impl RestClient {
    /// Create a client for the API served at `base_url`,
    /// e.g. `http://localhost:8080`.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Classify `response`, turning any non-2xx status into [Error::Rejected].
    ///
    /// The error message is taken from a JSON `message` field in the body
    /// when one is present, falling back to the HTTP reason phrase when the
    /// body is empty or not JSON.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let fallback = status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
        let message = match response.bytes().await {
            Ok(body) => extract_error_message(&body).unwrap_or(fallback),
            Err(_) => fallback,
        };

        Err(Error::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

impl RemoteStore for RestClient {
    async fn transactions(&self) -> Result<Vec<Transaction>, Error> {
        let response = self.http.get(self.url(endpoints::TRANSACTIONS)).send().await?;
        let response = Self::ensure_success(response).await?;

        response
            .json()
            .await
            .map_err(|error| Error::InvalidResponse(error.to_string()))
    }

    async fn create_transaction(&self, new_transaction: &NewTransaction) -> Result<(), Error> {
        let response = self
            .http
            .post(self.url(endpoints::POST_TRANSACTION))
            .json(new_transaction)
            .send()
            .await?;
        Self::ensure_success(response).await?;

        // The server may answer with plain text or with the created
        // transaction. Either way the list is refetched, so the body is not
        // needed here.
        Ok(())
    }

    async fn update_transaction(
        &self,
        id: TransactionId,
        update: &NewTransaction,
    ) -> Result<(), Error> {
        let body = update.clone().with_id(id);
        let response = self
            .http
            .put(self.url(&endpoints::format_endpoint(endpoints::PUT_TRANSACTION, id)))
            .json(&body)
            .send()
            .await?;
        Self::ensure_success(response).await?;

        Ok(())
    }

    async fn delete_transaction(&self, id: TransactionId) -> Result<(), Error> {
        let response = self
            .http
            .delete(self.url(&endpoints::format_endpoint(
                endpoints::DELETE_TRANSACTION,
                id,
            )))
            .send()
            .await?;
        Self::ensure_success(response).await?;

        // An empty body is a valid empty result here, not a parse error.
        Ok(())
    }

    async fn delete_transactions(&self, ids: &[TransactionId]) -> Result<(), Error> {
        let query: Vec<(&str, TransactionId)> = ids.iter().map(|id| ("ids", *id)).collect();
        let response = self
            .http
            .delete(self.url(endpoints::DELETE_TRANSACTIONS))
            .query(&query)
            .send()
            .await?;
        Self::ensure_success(response).await?;

        Ok(())
    }

    async fn categories(&self) -> Result<Vec<Category>, Error> {
        let response = self.http.get(self.url(endpoints::CATEGORIES)).send().await?;
        let response = Self::ensure_success(response).await?;

        response
            .json()
            .await
            .map_err(|error| Error::InvalidResponse(error.to_string()))
    }

    async fn create_category(&self, new_category: &NewCategory) -> Result<Category, Error> {
        let response = self
            .http
            .post(self.url(endpoints::CATEGORIES))
            .json(new_category)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        response
            .json()
            .await
            .map_err(|error| Error::InvalidResponse(error.to_string()))
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), Error> {
        let response = self
            .http
            .delete(self.url(&endpoints::format_endpoint(endpoints::DELETE_CATEGORY, id)))
            .send()
            .await?;
        Self::ensure_success(response).await?;

        Ok(())
    }
}

/// Pull a human-readable message out of a JSON error body, if there is one.
fn extract_error_message(body: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message)
}
