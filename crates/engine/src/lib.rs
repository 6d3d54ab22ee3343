pub use amount::Amount;
pub use budgets::Budget;
pub use category::Category;
pub use emis::Emi;
pub use error::{EngineError, StoreError};
pub use expenses::Expense;
pub use income::Income;
pub use month::{Month, parse_date};
pub use ops::{
    CarriedOver, Chart, Dashboard, Engine, EngineBuilder, EntryKind, ExpenseInput, MirrorReport,
    RecentTransaction, RolloverOutcome,
};
pub use report::{BudgetReport, ReportRow};
pub use store::{LocalStore, RecordStore, RemoteStore, StoreConfig, StoreKind};

mod amount;
mod budgets;
mod category;
mod emis;
mod error;
mod expenses;
mod income;
mod month;
mod ops;
mod report;
pub mod schema;
pub mod store;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
