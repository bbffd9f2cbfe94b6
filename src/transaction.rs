//! This file defines the `Transaction` read model, the `NewTransaction` write
//! model and the `TransactionDraft` form input that is validated into one.
//!
//! The read and write models are kept as two distinct wire contracts joined
//! by explicit mapping functions ([NewTransaction::into_provisional] and
//! [NewTransaction::with_id]), so a change to what the server sends cannot
//! silently change what the client submits.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{format_description::BorrowedFormatItem, macros::format_description, Date};

use crate::validation::ValidationErrors;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// The format the remote API uses for transaction dates, e.g. `2025-01-15`.
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// The server-assigned identifier of a transaction.
pub type TransactionId = i64;

/// Whether a transaction records money earned or money spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Money flowing in, e.g. wages.
    Income,
    /// Money flowing out, e.g. groceries.
    Expense,
}

impl FromStr for TransactionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INCOME" => Ok(TransactionType::Income),
            "EXPENSE" => Ok(TransactionType::Expense),
            _ => Err(()),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Income => write!(f, "INCOME"),
            TransactionType::Expense => write!(f, "EXPENSE"),
        }
    }
}

/// An expense or income as the server reports it.
///
/// This is the element type of the transactions cache. The `id` is `None`
/// only for provisional copies appended by an optimistic create; every
/// transaction fetched from the server carries one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The server-assigned ID, absent before creation completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TransactionId>,
    /// When the transaction happened.
    #[serde(with = "iso_date")]
    pub transaction_date: Date,
    /// Whether money was earned or spent.
    pub transaction_type: TransactionType,
    /// The ID of the category the transaction belongs to.
    pub category_id: crate::category::CategoryId,
    /// The amount of money involved. Always greater than zero; the sign is
    /// carried by [Transaction::transaction_type].
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
}

/// A candidate transaction that has not been sent to the server yet.
///
/// This is the body of a create request. It has no ID because only the
/// server assigns those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    /// When the transaction happened.
    #[serde(with = "iso_date")]
    pub transaction_date: Date,
    /// Whether money was earned or spent.
    pub transaction_type: TransactionType,
    /// The ID of the category the transaction belongs to.
    pub category_id: crate::category::CategoryId,
    /// The amount of money involved, greater than zero.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
}

impl NewTransaction {
    /// Convert into a provisional [Transaction] with no ID, suitable for
    /// appending to the cache before the server has answered.
    pub fn into_provisional(self) -> Transaction {
        Transaction {
            id: None,
            transaction_date: self.transaction_date,
            transaction_type: self.transaction_type,
            category_id: self.category_id,
            amount: self.amount,
            description: self.description,
        }
    }

    /// Convert into a [Transaction] with a known ID, e.g. for the body of an
    /// update request or for replacing a cached entity.
    pub fn with_id(self, id: TransactionId) -> Transaction {
        Transaction {
            id: Some(id),
            ..self.into_provisional()
        }
    }
}

/// Raw, string-typed form input for a transaction.
///
/// Values coming from plain-text input controls arrive as strings, so the
/// numeric fields (`categoryId`, `amount`) are coerced to numbers during
/// validation rather than rejected for being strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionDraft {
    /// The transaction date as typed, expected as `YYYY-MM-DD`.
    pub transaction_date: String,
    /// The transaction type as typed, expected as `INCOME` or `EXPENSE`.
    pub transaction_type: String,
    /// The category ID as typed.
    pub category_id: String,
    /// The amount as typed.
    pub amount: String,
    /// An optional free-text description.
    pub description: String,
}

impl TransactionDraft {
    /// Validate the draft into a [NewTransaction].
    ///
    /// Validation is pure: the same draft always produces the same result.
    ///
    /// # Errors
    ///
    /// Returns [ValidationErrors] with one message per invalid field, keyed
    /// by the field's wire name. Rules:
    ///
    /// - `transactionDate`, `transactionType` and `categoryId` are required.
    /// - `transactionDate` must parse as `YYYY-MM-DD`.
    /// - `amount` must coerce to a number greater than zero.
    /// - `description` is optional; an empty string becomes `None`.
    pub fn validate(&self) -> Result<NewTransaction, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let date = self.transaction_date.trim();
        let transaction_date = if date.is_empty() {
            errors.add("transactionDate", "Transaction date is required");
            None
        } else {
            match Date::parse(date, DATE_FORMAT) {
                Ok(parsed) => Some(parsed),
                Err(_) => {
                    errors.add(
                        "transactionDate",
                        "Transaction date must be a date in the format YYYY-MM-DD",
                    );
                    None
                }
            }
        };

        let kind = self.transaction_type.trim();
        let transaction_type = if kind.is_empty() {
            errors.add("transactionType", "Transaction type is required");
            None
        } else {
            match TransactionType::from_str(kind) {
                Ok(parsed) => Some(parsed),
                Err(()) => {
                    errors.add(
                        "transactionType",
                        "Transaction type must be INCOME or EXPENSE",
                    );
                    None
                }
            }
        };

        let category = self.category_id.trim();
        let category_id = if category.is_empty() {
            errors.add("categoryId", "Category is required");
            None
        } else {
            match category.parse::<crate::category::CategoryId>() {
                Ok(parsed) => Some(parsed),
                Err(_) => {
                    errors.add("categoryId", "Category must refer to a category ID");
                    None
                }
            }
        };

        let amount_text = self.amount.trim();
        let amount = if amount_text.is_empty() {
            errors.add("amount", "Amount is required");
            None
        } else {
            match amount_text.parse::<f64>() {
                Ok(parsed) if parsed > 0.0 => Some(parsed),
                Ok(_) => {
                    errors.add("amount", "Amount must be greater than zero");
                    None
                }
                Err(_) => {
                    errors.add("amount", "Amount must be a number");
                    None
                }
            }
        };

        let description = self.description.trim();
        let description = if description.is_empty() {
            None
        } else {
            Some(description.to_string())
        };

        // A field is only `None` when an error was recorded for it.
        match (transaction_date, transaction_type, category_id, amount) {
            (Some(transaction_date), Some(transaction_type), Some(category_id), Some(amount)) => {
                Ok(NewTransaction {
                    transaction_date,
                    transaction_type,
                    category_id,
                    amount,
                    description,
                })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::{NewTransaction, Transaction, TransactionDraft, TransactionType};

    fn valid_draft() -> TransactionDraft {
        TransactionDraft {
            transaction_date: "2025-01-15".to_string(),
            transaction_type: "EXPENSE".to_string(),
            category_id: "3".to_string(),
            amount: "42.50".to_string(),
            description: "Coffee shop".to_string(),
        }
    }

    #[test]
    fn validate_accepts_valid_draft() {
        let new_transaction = valid_draft().validate().unwrap();

        assert_eq!(
            new_transaction,
            NewTransaction {
                transaction_date: date!(2025 - 01 - 15),
                transaction_type: TransactionType::Expense,
                category_id: 3,
                amount: 42.50,
                description: Some("Coffee shop".to_string()),
            }
        );
    }

    #[test]
    fn validate_is_idempotent() {
        let draft = TransactionDraft {
            amount: "-5".to_string(),
            ..valid_draft()
        };

        assert_eq!(draft.validate(), draft.validate());
    }

    #[test]
    fn validate_treats_empty_description_as_none() {
        let draft = TransactionDraft {
            description: "  ".to_string(),
            ..valid_draft()
        };

        assert_eq!(draft.validate().unwrap().description, None);
    }

    #[test]
    fn validate_coerces_numeric_strings() {
        let new_transaction = valid_draft().validate().unwrap();

        assert_eq!(new_transaction.category_id, 3);
        assert_eq!(new_transaction.amount, 42.50);
    }

    #[test]
    fn validate_rejects_missing_required_fields() {
        let draft = TransactionDraft {
            transaction_date: String::new(),
            transaction_type: String::new(),
            category_id: String::new(),
            ..valid_draft()
        };

        let errors = draft.validate().unwrap_err();

        assert_eq!(
            errors.get("transactionDate"),
            Some("Transaction date is required")
        );
        assert_eq!(
            errors.get("transactionType"),
            Some("Transaction type is required")
        );
        assert_eq!(errors.get("categoryId"), Some("Category is required"));
        assert_eq!(errors.get("amount"), None);
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn validate_rejects_non_positive_amount() {
        for amount in ["0", "-42.50"] {
            let draft = TransactionDraft {
                amount: amount.to_string(),
                ..valid_draft()
            };

            let errors = draft.validate().unwrap_err();

            assert_eq!(errors.get("amount"), Some("Amount must be greater than zero"));
            assert_eq!(errors.len(), 1);
        }
    }

    #[test]
    fn validate_rejects_non_numeric_amount() {
        let draft = TransactionDraft {
            amount: "lots".to_string(),
            ..valid_draft()
        };

        let errors = draft.validate().unwrap_err();

        assert_eq!(errors.get("amount"), Some("Amount must be a number"));
    }

    #[test]
    fn validate_rejects_malformed_date() {
        let draft = TransactionDraft {
            transaction_date: "15/01/2025".to_string(),
            ..valid_draft()
        };

        let errors = draft.validate().unwrap_err();

        assert_eq!(
            errors.get("transactionDate"),
            Some("Transaction date must be a date in the format YYYY-MM-DD")
        );
    }

    #[test]
    fn deserializes_server_response() {
        let json = r#"{
            "id": 12,
            "transactionDate": "2025-01-15",
            "transactionType": "INCOME",
            "categoryId": 3,
            "amount": 1250.0,
            "description": null
        }"#;

        let transaction: Transaction = serde_json::from_str(json).unwrap();

        assert_eq!(
            transaction,
            Transaction {
                id: Some(12),
                transaction_date: date!(2025 - 01 - 15),
                transaction_type: TransactionType::Income,
                category_id: 3,
                amount: 1250.0,
                description: None,
            }
        );
    }

    #[test]
    fn round_trip_preserves_every_field() {
        let transaction = valid_draft().validate().unwrap().with_id(7);

        let echoed: Transaction =
            serde_json::from_str(&serde_json::to_string(&transaction).unwrap()).unwrap();

        assert_eq!(echoed, transaction);
    }

    #[test]
    fn provisional_transaction_has_no_id() {
        let new_transaction = valid_draft().validate().unwrap();
        let provisional = new_transaction.clone().into_provisional();

        assert_eq!(provisional.id, None);
        assert_eq!(provisional.amount, new_transaction.amount);

        let json = serde_json::to_string(&provisional).unwrap();
        assert!(!json.contains("\"id\""));
    }
}
