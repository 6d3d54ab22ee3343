use std::{fs::File, io, time::Duration};

use clap::{Args, Parser, Subcommand};
use engine::{
    BudgetReport, Dashboard, Engine, ExpenseInput, LocalStore, Month, RemoteStore,
    RolloverOutcome, StoreKind,
};

use crate::{
    error::{AppError, Result},
    settings::{DEFAULT_CONFIG_PATH, Settings},
    state::LocalState,
};

mod error;
mod settings;
mod state;

#[derive(Parser, Debug)]
#[command(name = "monthwise")]
#[command(about = "Monthly budget ledger: income, expenses, EMIs and budgets per month")]
struct Cli {
    /// Config file path (TOML).
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Work on this month (`YYYY-MM`) instead of the active one.
    #[arg(long, global = true)]
    month: Option<Month>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the ledger tables if missing.
    Init,
    /// Show the active month, or switch to another one carrying recurring lines over.
    Switch { to: Option<Month> },
    Income(Income),
    Expense(Expense),
    Emi(Emi),
    Budget(Budget),
    /// Totals, category breakdown and recent activity of the month.
    Dashboard {
        /// Print the dashboard as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Months holding data, newest first.
    Months,
    /// Budget vs actual per category, as CSV.
    Export {
        /// Output file; standard output when missing.
        #[arg(long, short)]
        output: Option<String>,
    },
    /// Copy the local file into the configured remote database.
    Sync,
}

#[derive(Args, Debug)]
struct Income {
    #[command(subcommand)]
    command: IncomeCommand,
}

#[derive(Subcommand, Debug)]
enum IncomeCommand {
    Add { description: String, amount: String },
    Edit { id: i64, description: String, amount: String },
    Rm { id: i64 },
    List,
}

#[derive(Args, Debug)]
struct Expense {
    #[command(subcommand)]
    command: ExpenseCommand,
}

#[derive(Args, Debug)]
struct ExpenseArgs {
    /// Day of the expense (`YYYY-MM-DD`).
    #[arg(long)]
    date: String,
    #[arg(long)]
    category: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    amount: String,
    #[arg(long, default_value = "")]
    payment_type: String,
}

impl ExpenseArgs {
    fn input(&self) -> ExpenseInput<'_> {
        ExpenseInput {
            date: &self.date,
            category: &self.category,
            description: &self.description,
            amount: &self.amount,
            payment_type: &self.payment_type,
        }
    }
}

#[derive(Subcommand, Debug)]
enum ExpenseCommand {
    Add(ExpenseArgs),
    Edit {
        id: i64,
        #[command(flatten)]
        args: ExpenseArgs,
    },
    Rm { id: i64 },
    List,
}

#[derive(Args, Debug)]
struct Emi {
    #[command(subcommand)]
    command: EmiCommand,
}

#[derive(Subcommand, Debug)]
enum EmiCommand {
    Add { loan_name: String, amount: String },
    Edit { id: i64, loan_name: String, amount: String },
    Rm { id: i64 },
    List,
}

#[derive(Args, Debug)]
struct Budget {
    #[command(subcommand)]
    command: BudgetCommand,
}

#[derive(Subcommand, Debug)]
enum BudgetCommand {
    /// Set the budget of a category, creating it if missing.
    Set { category: String, amount: String },
    Edit { id: i64, amount: String },
    Rm { id: i64 },
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::new(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "monthwise={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(io::stderr)
        .init();

    let engine = Engine::builder()
        .config(settings.store.clone())
        .build()
        .await?;
    let result = run(&engine, &settings, cli).await;
    engine.close().await?;
    result
}

async fn run(engine: &Engine, settings: &Settings, cli: Cli) -> Result<()> {
    let mut state = LocalState::load(&settings.app.state_path)?;
    let active = state.active_month();
    let month = cli.month.unwrap_or(active);

    match cli.command {
        Command::Init => {
            let backend = match engine.store().kind() {
                StoreKind::Local => format!("local file {}", settings.store.path),
                StoreKind::Remote => "remote database".to_string(),
            };
            println!("ledger ready on {backend}");
        }
        Command::Switch { to: None } => println!("{active}"),
        Command::Switch { to: Some(next) } => {
            let mut current = active;
            match engine.switch_month(&mut current, next).await {
                RolloverOutcome::Seeded(carried) => println!(
                    "{next}: carried over {} income, {} EMIs, {} budgets from {active}",
                    carried.income, carried.emis, carried.budgets
                ),
                RolloverOutcome::Aborted { error } => {
                    println!("{next}: carry-over from {active} failed ({error})")
                }
                _ => println!("{next}"),
            }
            state.active_month = Some(current);
            state.save(&settings.app.state_path)?;
        }
        Command::Income(Income { command }) => match command {
            IncomeCommand::Add {
                description,
                amount,
            } => {
                let id = engine.add_income(month, &description, &amount).await?;
                println!("income {id} added to {month}");
            }
            IncomeCommand::Edit {
                id,
                description,
                amount,
            } => engine.edit_income(id, &description, &amount).await?,
            IncomeCommand::Rm { id } => engine.delete_income(id).await?,
            IncomeCommand::List => {
                for line in engine.list_income(month).await? {
                    println!("{:>5}  {:>12}  {}", line.id, line.amount, line.description);
                }
            }
        },
        Command::Expense(Expense { command }) => match command {
            ExpenseCommand::Add(args) => {
                let id = engine.add_expense(month, args.input()).await?;
                println!("expense {id} added to {month}");
            }
            ExpenseCommand::Edit { id, args } => engine.edit_expense(id, args.input()).await?,
            ExpenseCommand::Rm { id } => engine.delete_expense(id).await?,
            ExpenseCommand::List => {
                for expense in engine.list_expenses(month).await? {
                    println!(
                        "{:>5}  {}  {:<14} {:>12}  {} {}",
                        expense.id,
                        expense.date,
                        expense.category,
                        expense.amount,
                        expense.description,
                        expense.payment_type
                    );
                }
            }
        },
        Command::Emi(Emi { command }) => match command {
            EmiCommand::Add { loan_name, amount } => {
                let id = engine.add_emi(month, &loan_name, &amount).await?;
                println!("emi {id} added to {month}");
            }
            EmiCommand::Edit {
                id,
                loan_name,
                amount,
            } => engine.edit_emi(id, &loan_name, &amount).await?,
            EmiCommand::Rm { id } => engine.delete_emi(id).await?,
            EmiCommand::List => {
                for emi in engine.list_emis(month).await? {
                    println!("{:>5}  {:>12}  {}", emi.id, emi.amount, emi.loan_name);
                }
            }
        },
        Command::Budget(Budget { command }) => match command {
            BudgetCommand::Set { category, amount } => {
                let id = engine.set_budget(month, &category, &amount).await?;
                println!("budget {id} of {month} set");
            }
            BudgetCommand::Edit { id, amount } => engine.edit_budget(id, &amount).await?,
            BudgetCommand::Rm { id } => engine.delete_budget(id).await?,
            BudgetCommand::List => {
                for budget in engine.list_budgets(month).await? {
                    println!("{:>5}  {:<14} {:>12}", budget.id, budget.category, budget.amount);
                }
            }
        },
        Command::Dashboard { json } => {
            let dashboard = engine.dashboard(month).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
            } else {
                print_dashboard(&dashboard);
            }
        }
        Command::Months => {
            for available in engine.available_months(active).await? {
                let marker = if available == active { "*" } else { " " };
                println!("{marker} {available}");
            }
        }
        Command::Export { output } => {
            let report = BudgetReport::from_dashboard(&engine.dashboard(month).await?)?;
            for row in report.overspent() {
                let over = row.actual.try_sub(row.budgeted)?;
                tracing::warn!("{month}: {} over budget by {over}", row.category);
            }
            match output {
                Some(path) => {
                    report.write_csv(File::create(&path)?)?;
                    tracing::info!("budget report of {month} written to {path}");
                }
                None => report.write_csv(io::stdout().lock())?,
            }
        }
        Command::Sync => sync(settings).await?,
    }
    Ok(())
}

fn print_dashboard(dashboard: &Dashboard) {
    println!("{}", dashboard.month);
    println!("  income            {:>12}", dashboard.total_income);
    println!("  expenses          {:>12}", dashboard.total_expenses);
    println!("  EMIs              {:>12}", dashboard.total_emi);
    println!("  budget            {:>12}", dashboard.total_budget);
    println!("  remaining budget  {:>12}", dashboard.remaining_budget);
    println!("  net savings       {:>12}", dashboard.net_savings);
    println!();
    println!("  {:<14} {:>12} {:>12}", "category", "budget", "spent");
    for ((label, budget), spent) in dashboard
        .chart
        .labels
        .iter()
        .zip(&dashboard.chart.budget_values)
        .zip(&dashboard.chart.spent_values)
    {
        println!("  {label:<14} {budget:>12} {spent:>12}");
    }
    if !dashboard.recent_transactions.is_empty() {
        println!();
        for entry in &dashboard.recent_transactions {
            println!(
                "  {}  {:<14} {:>12}  {}",
                entry.date, entry.category, entry.amount, entry.description
            );
        }
    }
}

/// Mirror the local file into the remote database named in the settings.
async fn sync(settings: &Settings) -> Result<()> {
    let store = &settings.store;
    let (Some(url), Some(token)) = (store.url.as_deref(), store.auth_token.as_deref()) else {
        return Err(AppError::Usage(
            "sync needs store.url and store.auth_token".to_string(),
        ));
    };

    let source = Engine::builder()
        .store(Box::new(LocalStore::open(&store.path).await?))
        .build()
        .await?;
    let target = RemoteStore::new(url, token, Duration::from_secs(store.timeout_secs))?;

    let result = source.mirror_to(&target).await;
    source.close().await?;
    for (table, rows) in result? {
        println!("{table}: {rows} rows");
    }
    Ok(())
}
