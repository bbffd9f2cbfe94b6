//! A small terminal front-end for driving the synchronizer against a live
//! instance of the personal-finance API.

use clap::{Parser, Subcommand};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use finsync::{
    category_label, CategoryName, NewCategory, Notifier, RestClient, Syncer, TransactionDraft,
};

/// Synchronize and edit transactions against a personal-finance REST API.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Base URL of the API server.
    #[arg(long, default_value = "http://localhost:8080")]
    api_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all transactions with their category names.
    List,
    /// Add a transaction.
    Add {
        /// The transaction date as YYYY-MM-DD.
        #[arg(long)]
        date: String,
        /// INCOME or EXPENSE.
        #[arg(long)]
        kind: String,
        /// The ID of the category the transaction belongs to.
        #[arg(long)]
        category: String,
        /// The amount of money involved, greater than zero.
        #[arg(long)]
        amount: String,
        /// An optional description.
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete one or more transactions by ID.
    Delete {
        /// The IDs of the transactions to delete.
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// List all categories.
    Categories,
    /// Add a category.
    AddCategory {
        /// The name of the category to create.
        name: String,
    },
    /// Delete a category by ID.
    DeleteCategory {
        /// The ID of the category to delete.
        id: i64,
    },
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    setup_logging();

    let args = Args::parse();
    let (notifier, mut notifications) = Notifier::channel();
    let syncer = Syncer::new(RestClient::new(&args.api_url), notifier);

    let outcome = run(&args.command, &syncer).await;

    while let Ok(notification) = notifications.try_recv() {
        println!("{}: {}", notification.title, notification.message);
    }

    match outcome {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(command: &Command, syncer: &Syncer<RestClient>) -> Result<(), String> {
    match command {
        Command::List => {
            let categories = syncer
                .refresh_categories()
                .await
                .map_err(|error| error.to_string())?;
            let transactions = syncer
                .refresh_transactions()
                .await
                .map_err(|error| error.to_string())?;

            for transaction in transactions {
                println!(
                    "{:>6}  {}  {:<7}  {:<20}  {:>10.2}  {}",
                    transaction
                        .id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    transaction.transaction_date,
                    transaction.transaction_type.to_string(),
                    category_label(transaction.category_id, &categories),
                    transaction.amount,
                    transaction.description.as_deref().unwrap_or(""),
                );
            }

            Ok(())
        }
        Command::Add {
            date,
            kind,
            category,
            amount,
            description,
        } => {
            let draft = TransactionDraft {
                transaction_date: date.clone(),
                transaction_type: kind.clone(),
                category_id: category.clone(),
                amount: amount.clone(),
                description: description.clone(),
            };

            let new_transaction = draft.validate().map_err(|errors| {
                errors
                    .iter()
                    .map(|(field, message)| format!("{field}: {message}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;

            syncer
                .create_transaction(new_transaction)
                .await
                .map_err(|error| error.to_string())?;
            println!("transaction created");

            Ok(())
        }
        Command::Delete { ids } => {
            if let [id] = ids.as_slice() {
                syncer
                    .delete_transaction(*id)
                    .await
                    .map_err(|error| error.to_string())?;
            } else {
                syncer
                    .delete_transactions(ids)
                    .await
                    .map_err(|error| error.to_string())?;
            }

            Ok(())
        }
        Command::Categories => {
            let categories = syncer
                .refresh_categories()
                .await
                .map_err(|error| error.to_string())?;

            for category in categories {
                println!("{:>6}  {}", category.id, category.category_name);
            }

            Ok(())
        }
        Command::AddCategory { name } => {
            let category_name = CategoryName::new(name).map_err(|error| error.to_string())?;
            let created = syncer
                .create_category(NewCategory { category_name })
                .await
                .map_err(|error| error.to_string())?;
            println!("category {} created with ID {}", created.category_name, created.id);

            Ok(())
        }
        Command::DeleteCategory { id } => {
            syncer
                .delete_category(*id)
                .await
                .map_err(|error| error.to_string())?;
            println!("category {id} deleted");

            Ok(())
        }
    }
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    tracing_subscriber::registry()
        .with(stdout_log.with_filter(
            filter::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter::EnvFilter::new("finsync=warn")),
        ))
        .init();
}
