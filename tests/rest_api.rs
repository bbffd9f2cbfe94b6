//! Integration tests that run the synchronizer against a real HTTP server.
//!
//! The server is a small in-process axum app implementing the collaborator
//! contract: the same paths, bodies and quirks as the remote API, including
//! plain-text create responses, empty delete bodies and JSON error bodies
//! with a `message` field.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, put},
    Json, Router,
};
use axum_extra::extract::Query;
use serde::Deserialize;
use serde_json::json;
use time::macros::date;

use finsync::{
    Category, CategoryName, Error, NewCategory, NewTransaction, NotificationLevel, Notifier,
    RestClient, Syncer, Transaction, TransactionType,
};

#[derive(Default)]
struct ServerState {
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
    next_id: i64,
    fail_deletes: bool,
}

impl ServerState {
    fn seeded(transactions: Vec<Transaction>) -> Self {
        let next_id = transactions
            .iter()
            .filter_map(|transaction| transaction.id)
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            transactions,
            next_id,
            ..Default::default()
        }
    }
}

type SharedState = Arc<Mutex<ServerState>>;

async fn list_transactions(State(state): State<SharedState>) -> Json<Vec<Transaction>> {
    Json(state.lock().unwrap().transactions.clone())
}

async fn create_transaction(
    State(state): State<SharedState>,
    Json(new_transaction): Json<NewTransaction>,
) -> Response {
    if new_transaction.amount <= 0.0 {
        // Plain-text error body, to exercise the reason-phrase fallback.
        return (StatusCode::BAD_REQUEST, "amount must be positive").into_response();
    }

    let mut state = state.lock().unwrap();
    let id = state.next_id;
    state.next_id += 1;
    state.transactions.push(new_transaction.with_id(id));

    (StatusCode::CREATED, "created").into_response()
}

async fn update_transaction(
    Path(id): Path<i64>,
    State(state): State<SharedState>,
    Json(update): Json<Transaction>,
) -> Response {
    let mut state = state.lock().unwrap();

    match state
        .transactions
        .iter_mut()
        .find(|transaction| transaction.id == Some(id))
    {
        Some(slot) => {
            *slot = Transaction {
                id: Some(id),
                ..update
            };
            "updated".into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "transaction not found"})),
        )
            .into_response(),
    }
}

async fn delete_transaction(Path(id): Path<i64>, State(state): State<SharedState>) -> Response {
    let mut state = state.lock().unwrap();

    if state.fail_deletes {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "database unavailable"})),
        )
            .into_response();
    }

    state
        .transactions
        .retain(|transaction| transaction.id != Some(id));

    // Success with an empty body; the client must not treat this as a parse
    // error.
    StatusCode::OK.into_response()
}

#[derive(Deserialize)]
struct IdsQuery {
    #[serde(default)]
    ids: Vec<i64>,
}

async fn delete_transactions(
    Query(query): Query<IdsQuery>,
    State(state): State<SharedState>,
) -> Response {
    let mut state = state.lock().unwrap();

    if state.fail_deletes {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "database unavailable"})),
        )
            .into_response();
    }

    let before = state.transactions.len();
    state
        .transactions
        .retain(|transaction| !transaction.id.is_some_and(|id| query.ids.contains(&id)));
    let deleted = before - state.transactions.len();

    Json(json!({"deleted": deleted})).into_response()
}

async fn list_categories(State(state): State<SharedState>) -> Json<Vec<Category>> {
    Json(state.lock().unwrap().categories.clone())
}

async fn create_category(
    State(state): State<SharedState>,
    Json(new_category): Json<NewCategory>,
) -> Json<Category> {
    let mut state = state.lock().unwrap();
    let category = Category {
        id: state.next_id,
        category_name: new_category.category_name,
    };
    state.next_id += 1;
    state.categories.push(category.clone());

    Json(category)
}

async fn delete_category(Path(id): Path<i64>, State(state): State<SharedState>) -> StatusCode {
    state
        .lock()
        .unwrap()
        .categories
        .retain(|category| category.id != id);

    StatusCode::NO_CONTENT
}

/// Serve the stub API on an ephemeral port and return its base URL.
async fn spawn_server(state: SharedState) -> String {
    let app = Router::new()
        .route("/transactions", get(list_transactions))
        .route("/transaction", axum::routing::post(create_transaction))
        .route("/transaction/{id}", delete(delete_transaction))
        .route("/api/transactions", delete(delete_transactions))
        .route("/api/transactions/{id}", put(update_transaction))
        .route(
            "/api/categories",
            get(list_categories).post(create_category),
        )
        .route("/api/categories/{id}", delete(delete_category))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{address}")
}

fn transaction(id: i64, amount: f64) -> Transaction {
    Transaction {
        id: Some(id),
        transaction_date: date!(2025 - 01 - 15),
        transaction_type: TransactionType::Expense,
        category_id: 1,
        amount,
        description: None,
    }
}

fn new_transaction(amount: f64) -> NewTransaction {
    NewTransaction {
        transaction_date: date!(2025 - 02 - 01),
        transaction_type: TransactionType::Income,
        category_id: 1,
        amount,
        description: Some("pay day".to_string()),
    }
}

#[tokio::test]
async fn create_adopts_server_assigned_id() {
    let state = Arc::new(Mutex::new(ServerState::seeded(vec![transaction(1, 10.0)])));
    let base_url = spawn_server(state).await;
    let (notifier, _notifications) = Notifier::channel();
    let syncer = Syncer::new(RestClient::new(&base_url), notifier);
    syncer.refresh_transactions().await.unwrap();

    syncer.create_transaction(new_transaction(42.50)).await.unwrap();

    let cached = syncer.transactions().get().unwrap();
    assert_eq!(cached.len(), 2);
    assert_eq!(cached[1].id, Some(2));
    assert_eq!(cached[1].amount, 42.50);
    assert_eq!(cached[1].description.as_deref(), Some("pay day"));
}

#[tokio::test]
async fn rejected_create_falls_back_to_reason_phrase_and_rolls_back() {
    let state = Arc::new(Mutex::new(ServerState::seeded(vec![transaction(1, 10.0)])));
    let base_url = spawn_server(state).await;
    let (notifier, _notifications) = Notifier::channel();
    let syncer = Syncer::new(RestClient::new(&base_url), notifier);
    syncer.refresh_transactions().await.unwrap();

    // The server rejects this with a plain-text body, which carries no JSON
    // `message` field to extract.
    let error = syncer
        .create_transaction(new_transaction(-1.0))
        .await
        .unwrap_err();

    assert_eq!(
        error,
        Error::Rejected {
            status: 400,
            message: "Bad Request".to_string(),
        }
    );
    assert_eq!(syncer.transactions().get(), Some(vec![transaction(1, 10.0)]));
}

#[tokio::test]
async fn update_changes_server_state() {
    let state = Arc::new(Mutex::new(ServerState::seeded(vec![
        transaction(1, 10.0),
        transaction(2, 20.0),
    ])));
    let base_url = spawn_server(Arc::clone(&state)).await;
    let (notifier, _notifications) = Notifier::channel();
    let syncer = Syncer::new(RestClient::new(&base_url), notifier);
    syncer.refresh_transactions().await.unwrap();

    syncer
        .update_transaction(2, new_transaction(99.0))
        .await
        .unwrap();

    let on_server = state.lock().unwrap().transactions.clone();
    assert_eq!(on_server[1].id, Some(2));
    assert_eq!(on_server[1].amount, 99.0);
    assert_eq!(syncer.transactions().get(), Some(on_server));
}

#[tokio::test]
async fn update_of_missing_transaction_extracts_error_message() {
    let state = Arc::new(Mutex::new(ServerState::seeded(vec![transaction(1, 10.0)])));
    let base_url = spawn_server(state).await;
    let (notifier, _notifications) = Notifier::channel();
    let syncer = Syncer::new(RestClient::new(&base_url), notifier);
    syncer.refresh_transactions().await.unwrap();

    let error = syncer
        .update_transaction(99, new_transaction(5.0))
        .await
        .unwrap_err();

    assert_eq!(
        error,
        Error::Rejected {
            status: 404,
            message: "transaction not found".to_string(),
        }
    );
}

#[tokio::test]
async fn delete_accepts_empty_success_body() {
    let state = Arc::new(Mutex::new(ServerState::seeded(vec![
        transaction(1, 10.0),
        transaction(2, 20.0),
    ])));
    let base_url = spawn_server(state).await;
    let (notifier, mut notifications) = Notifier::channel();
    let syncer = Syncer::new(RestClient::new(&base_url), notifier);
    syncer.refresh_transactions().await.unwrap();

    syncer.delete_transaction(1).await.unwrap();

    assert_eq!(syncer.transactions().get(), Some(vec![transaction(2, 20.0)]));
    let notification = notifications.try_recv().unwrap();
    assert_eq!(notification.level, NotificationLevel::Success);
}

#[tokio::test]
async fn failed_delete_rolls_back_and_extracts_message() {
    let original = vec![transaction(1, 10.0), transaction(2, 20.0), transaction(3, 30.0)];
    let state = Arc::new(Mutex::new(ServerState::seeded(original.clone())));
    state.lock().unwrap().fail_deletes = true;
    let base_url = spawn_server(state).await;
    let (notifier, mut notifications) = Notifier::channel();
    let syncer = Syncer::new(RestClient::new(&base_url), notifier);
    syncer.refresh_transactions().await.unwrap();

    let error = syncer.delete_transaction(2).await.unwrap_err();

    assert_eq!(
        error,
        Error::Rejected {
            status: 500,
            message: "database unavailable".to_string(),
        }
    );
    assert_eq!(syncer.transactions().get(), Some(original));
    assert_eq!(
        notifications.try_recv().unwrap().level,
        NotificationLevel::Error
    );
}

#[tokio::test]
async fn bulk_delete_sends_repeated_ids_parameters() {
    let state = Arc::new(Mutex::new(ServerState::seeded(
        (1..=5).map(|id| transaction(id, id as f64)).collect(),
    )));
    let base_url = spawn_server(Arc::clone(&state)).await;
    let (notifier, mut notifications) = Notifier::channel();
    let syncer = Syncer::new(RestClient::new(&base_url), notifier);
    syncer.refresh_transactions().await.unwrap();

    let count = syncer.delete_transactions(&[2, 3]).await.unwrap();

    assert_eq!(count, 2);
    // Both IDs made it through the query string.
    let remaining: Vec<_> = state
        .lock()
        .unwrap()
        .transactions
        .iter()
        .map(|transaction| transaction.id)
        .collect();
    assert_eq!(remaining, vec![Some(1), Some(4), Some(5)]);
    assert_eq!(
        notifications.try_recv().unwrap().message,
        "2 transactions deleted"
    );
}

#[tokio::test]
async fn category_lifecycle_round_trips() {
    let state = Arc::new(Mutex::new(ServerState::default()));
    let base_url = spawn_server(state).await;
    let (notifier, _notifications) = Notifier::channel();
    let syncer = Syncer::new(RestClient::new(&base_url), notifier);

    let groceries = syncer
        .create_category(NewCategory {
            category_name: CategoryName::new("Groceries").unwrap(),
        })
        .await
        .unwrap();
    let wages = syncer
        .create_category(NewCategory {
            category_name: CategoryName::new("Wages").unwrap(),
        })
        .await
        .unwrap();

    assert_eq!(
        syncer.categories().get(),
        Some(vec![groceries.clone(), wages.clone()])
    );

    syncer.delete_category(groceries.id).await.unwrap();

    assert_eq!(syncer.categories().get(), Some(vec![wages]));
}
