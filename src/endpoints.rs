//! Paths of the remote personal-finance API.
//!
//! The paths are a collaborator contract owned by the server, which is why
//! they are not uniform: transactions are listed at `/transactions` but bulk
//! deleted at `/api/transactions`, while categories live entirely under
//! `/api`. For endpoints that take a parameter, e.g.,
//! '/transaction/{transaction_id}', use [format_endpoint].

/// The route to list all transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route to create a transaction.
pub const POST_TRANSACTION: &str = "/transaction";
/// The route to delete a single transaction.
pub const DELETE_TRANSACTION: &str = "/transaction/{transaction_id}";
/// The route to update a transaction.
pub const PUT_TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to delete multiple transactions, selected by repeated `ids`
/// query parameters.
pub const DELETE_TRANSACTIONS: &str = "/api/transactions";
/// The route to list or create categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to delete a category.
pub const DELETE_CATEGORY: &str = "/api/categories/{category_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/transaction/{transaction_id}',
/// '{transaction_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
