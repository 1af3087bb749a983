use std::{error::Error, path::PathBuf};

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use engine::{
    CurrencyAmount, CurrencyCode, Engine, ExchangeCmd, GroupingStrategy, NewAccountCmd,
    OperationKind, OperationMeta, RecordOperationCmd, SortPolicy, TransferCmd,
};
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use uuid::Uuid;

mod report;
mod settings;

#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Multi-currency account ledger and sales reports")]
struct Cli {
    /// Database connection string, overrides the configured database.
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate an order export into grouped metrics.
    Report(ReportArgs),
    Account(Account),
    Op(Op),
    /// Move money between two accounts.
    Transfer(TransferArgs),
    /// Swap one currency for another inside an account.
    Exchange(ExchangeArgs),
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// JSON file with an array of orders (or `{ "items": [...] }`).
    #[arg(long)]
    orders: PathBuf,
    #[arg(long, default_value = "none")]
    group_by: GroupingStrategy,
    /// `created-asc`, `paid-desc`, `total-desc`, `propina:CUP-asc`, ...
    #[arg(long)]
    sort: Option<SortPolicy>,
    /// Client name or coupon text, or `#<order id>`.
    #[arg(long)]
    search: Option<String>,
    #[arg(long, value_enum, default_value_t = report::Format::Json)]
    format: report::Format,
}

#[derive(Args, Debug)]
struct Account {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Create(AccountCreateArgs),
    Show(AccountIdArgs),
    List(AccountListArgs),
    Archive(AccountIdArgs),
    /// Operations newest first, one page at a time.
    History(AccountHistoryArgs),
    /// Chronological operations with running balances.
    Statement(AccountIdArgs),
    /// Rebuild stored balances from the journal.
    Recompute(AccountIdArgs),
}

#[derive(Args, Debug)]
struct AccountCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    owner: String,
    #[arg(long)]
    private: bool,
    /// Restrict the account to these currencies; repeat for more than one.
    #[arg(long = "currency")]
    currencies: Vec<CurrencyCode>,
}

#[derive(Args, Debug)]
struct AccountIdArgs {
    id: Uuid,
}

#[derive(Args, Debug)]
struct AccountListArgs {
    #[arg(long)]
    owner: String,
}

#[derive(Args, Debug)]
struct AccountHistoryArgs {
    id: Uuid,
    #[arg(long, default_value_t = 20)]
    limit: u64,
    #[arg(long)]
    cursor: Option<String>,
}

#[derive(Args, Debug)]
struct Op {
    #[command(subcommand)]
    command: OpCommand,
}

#[derive(Subcommand, Debug)]
enum OpCommand {
    /// Record a credit, debit or balance seed.
    Record(OpRecordArgs),
    Delete(OpIdArgs),
    Edit(OpEditArgs),
}

#[derive(Args, Debug)]
struct MetaArgs {
    #[arg(long)]
    tag: Option<String>,
    #[arg(long, env = "USER", default_value = "tally")]
    by: String,
    /// RFC 3339 timestamp, defaults to now.
    #[arg(long)]
    at: Option<DateTime<Utc>>,
}

impl MetaArgs {
    fn into_meta(self) -> OperationMeta {
        let meta = OperationMeta::new(self.by, self.at.unwrap_or_else(Utc::now));
        match self.tag {
            Some(tag) => meta.tag(tag),
            None => meta,
        }
    }
}

#[derive(Args, Debug)]
struct OpRecordArgs {
    #[arg(long)]
    account: Uuid,
    /// `credit`, `debit` or `balance`.
    #[arg(long)]
    kind: OperationKind,
    /// Amount and currency, e.g. `"12.50 USD"`.
    #[arg(long, allow_hyphen_values = true)]
    amount: CurrencyAmount,
    #[command(flatten)]
    meta: MetaArgs,
}

#[derive(Args, Debug)]
struct OpIdArgs {
    id: Uuid,
}

#[derive(Args, Debug)]
struct OpEditArgs {
    id: Uuid,
    #[arg(long, allow_hyphen_values = true)]
    amount: CurrencyAmount,
}

#[derive(Args, Debug)]
struct TransferArgs {
    #[arg(long)]
    from: Uuid,
    #[arg(long)]
    to: Uuid,
    #[arg(long)]
    amount: CurrencyAmount,
    #[command(flatten)]
    meta: MetaArgs,
}

#[derive(Args, Debug)]
struct ExchangeArgs {
    #[arg(long)]
    account: Uuid,
    /// Amount leaving the account.
    #[arg(long)]
    out: CurrencyAmount,
    /// Amount entering the account.
    #[arg(long = "in")]
    inn: CurrencyAmount,
    #[command(flatten)]
    meta: MetaArgs,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryPage {
    operations: Vec<engine::Operation>,
    next_cursor: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatementLine<'a> {
    operation: &'a engine::Operation,
    balances_after: &'a engine::CurrencyBucket,
    marker: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tally={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    if let Command::Report(args) = cli.command {
        let out = report::run(report::ReportRequest {
            orders: &args.orders,
            grouping: args.group_by,
            sort: args.sort,
            search: args.search.as_deref(),
            format: args.format,
            tip_currency: settings.report.tip_currency.as_deref(),
        })?;
        println!("{out}");
        return Ok(());
    }

    let url = cli
        .database_url
        .unwrap_or_else(|| settings.database.url());
    let db = connect_db(&url).await?;
    let engine = Engine::builder().database(db).build().await?;
    run_ledger(&engine, cli.command).await
}

async fn connect_db(url: &str) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    tracing::debug!("database ready");
    Ok(database)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_ledger(engine: &Engine, command: Command) -> Result<(), Box<dyn Error + Send + Sync>> {
    match command {
        Command::Report(_) => Ok(()),
        Command::Account(Account { command }) => match command {
            AccountCommand::Create(args) => {
                let mut cmd = NewAccountCmd::new(args.name, args.owner);
                if args.private {
                    cmd = cmd.private();
                }
                if !args.currencies.is_empty() {
                    cmd = cmd.allowed_currencies(args.currencies);
                }
                print_json(&engine.new_account(cmd).await?)
            }
            AccountCommand::Show(args) => print_json(&engine.account(args.id).await?),
            AccountCommand::List(args) => print_json(&engine.accounts_of(&args.owner).await?),
            AccountCommand::Archive(args) => print_json(&engine.archive_account(args.id).await?),
            AccountCommand::History(args) => {
                let (operations, next_cursor) = engine
                    .list_operations_page(args.id, args.limit, args.cursor.as_deref())
                    .await?;
                print_json(&HistoryPage {
                    operations,
                    next_cursor,
                })
            }
            AccountCommand::Statement(args) => {
                let ledger = engine.ledger(args.id).await?;
                let rows = ledger.statement()?;
                let lines = rows
                    .iter()
                    .map(|row| StatementLine {
                        operation: row.operation,
                        balances_after: &row.balances_after,
                        marker: row.is_marker(),
                    })
                    .collect::<Vec<_>>();
                print_json(&lines)
            }
            AccountCommand::Recompute(args) => {
                print_json(&engine.recompute_balances(args.id).await?)
            }
        },
        Command::Op(Op { command }) => match command {
            OpCommand::Record(args) => {
                let cmd = RecordOperationCmd::new(
                    args.account,
                    args.kind,
                    args.amount,
                    args.meta.into_meta(),
                );
                print_json(&engine.record_operation(cmd).await?)
            }
            OpCommand::Delete(args) => print_json(&engine.delete_operation(args.id).await?),
            OpCommand::Edit(args) => {
                print_json(&engine.edit_operation(args.id, args.amount).await?)
            }
        },
        Command::Transfer(args) => {
            let cmd = TransferCmd::new(args.from, args.to, args.amount, args.meta.into_meta());
            print_json(&engine.transfer(cmd).await?)
        }
        Command::Exchange(args) => {
            let cmd = ExchangeCmd::new(args.account, args.out, args.inn, args.meta.into_meta());
            print_json(&engine.exchange_currency(cmd).await?)
        }
    }
}
