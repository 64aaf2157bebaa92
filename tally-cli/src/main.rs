//! `tally`: list, inspect and mutate purchases and rentals.

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tally_cli::{init_logging, TallyConfig};
use tally_core::{
    CreatePayload, NewPurchase, NewRental, PriceText, QueryScope, RecordId, ResourceKind,
    TallyError, TransactionKind,
};
use tally_engine::{Mutation, MutationOutcome, QueryData, TransactionService};
use tally_remote::RestClient;

#[derive(Debug, Parser)]
#[command(name = "tally", version, about = "Enriched purchase and rental records")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, env = "TALLY_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every record of a kind, enriched with its product
    List {
        /// purchases | rentals
        kind: TransactionKind,
    },
    /// Print one enriched record
    Show {
        /// purchase | rental
        kind: TransactionKind,
        id: String,
    },
    /// Delete a record, then print the refreshed list
    Delete {
        /// purchase | rental
        kind: TransactionKind,
        id: String,
    },
    CreatePurchase(CreatePurchaseArgs),
    CreateRental(CreateRentalArgs),
}

#[derive(Debug, Args)]
struct CreatePurchaseArgs {
    #[arg(long)]
    product_id: String,
    #[arg(long)]
    buyer_id: String,
    #[arg(long)]
    seller_id: String,
    #[arg(long)]
    purchase_date: Option<String>,
}

#[derive(Debug, Args)]
struct CreateRentalArgs {
    #[arg(long)]
    product_id: String,
    #[arg(long)]
    renter_id: String,
    #[arg(long)]
    seller_id: String,
    /// e.g. DAILY, WEEKLY
    #[arg(long)]
    rent_option: String,
    #[arg(long)]
    start: String,
    #[arg(long)]
    end: String,
    #[arg(long)]
    total_price: String,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Tally(#[from] TallyError),
    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    fn label(&self) -> String {
        match self {
            CliError::Tally(err) => err.kind().to_string(),
            CliError::Output(_) => "Output".to_string(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match TallyConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error [Config]: {}", err);
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = init_logging(config.logging.format) {
        eprintln!("warning: logging not installed: {}", err);
    }

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "Command failed");
            eprintln!("error [{}]: {}", err.label(), err);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &TallyConfig) -> Result<(), CliError> {
    let client = Arc::new(RestClient::new(&config.remote_config())?);
    let service = TransactionService::new(client.clone(), client, config.freshness_policy());

    match command {
        Command::List { kind } => {
            let transactions = service.list(kind).await.into_result()?.unwrap_or_default();
            print_json(&transactions)
        }
        Command::Show { kind, id } => {
            let id = RecordId::from(id);
            match service.detail(kind, &id).await.into_result()? {
                Some(transaction) => print_json(&transaction),
                None => Err(TallyError::not_found(resource_of(kind), id).into()),
            }
        }
        Command::Delete { kind, id } => {
            service.mutate(kind, Mutation::Delete(id.into())).await?;
            let refreshed = service
                .refetch(kind, QueryScope::List, None)
                .await
                .filter_map(QueryData::into_list);
            print_json(&refreshed.into_result()?.unwrap_or_default())
        }
        Command::CreatePurchase(args) => {
            let payload = CreatePayload::Purchase(NewPurchase {
                product_id: args.product_id.into(),
                buyer_id: args.buyer_id.into(),
                seller_id: args.seller_id.into(),
                purchase_date: args.purchase_date,
            });
            create(&service, TransactionKind::Purchase, payload).await
        }
        Command::CreateRental(args) => {
            let payload = CreatePayload::Rental(NewRental {
                product_id: args.product_id.into(),
                renter_id: args.renter_id.into(),
                seller_id: args.seller_id.into(),
                rent_option: args.rent_option,
                rent_period_start: args.start,
                rent_period_end: args.end,
                total_price: PriceText::new(args.total_price),
            });
            create(&service, TransactionKind::Rental, payload).await
        }
    }
}

async fn create(
    service: &TransactionService,
    kind: TransactionKind,
    payload: CreatePayload,
) -> Result<(), CliError> {
    match service.mutate(kind, Mutation::Create(payload)).await? {
        MutationOutcome::Created(record) => print_json(&record),
        MutationOutcome::Deleted { id, .. } => print_json(&id),
    }
}

fn resource_of(kind: TransactionKind) -> ResourceKind {
    match kind {
        TransactionKind::Purchase => ResourceKind::Purchase,
        TransactionKind::Rental => ResourceKind::Rental,
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
