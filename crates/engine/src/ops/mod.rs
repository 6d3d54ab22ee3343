use crate::{
    EngineError, ResultEngine, schema,
    store::{self, RecordStore, Row, StoreConfig, Value},
};

mod budgets;
mod dashboard;
mod emis;
mod expenses;
mod income;
mod rollover;
mod sync;

pub use dashboard::{Chart, Dashboard, EntryKind, RecentTransaction};
pub use expenses::ExpenseInput;
pub use rollover::{CarriedOver, RolloverOutcome};
pub use sync::MirrorReport;

/// Run a block of store work, committing on success and rolling back on error.
///
/// The block runs as its own async block, so `?` inside it lands here and the
/// pending work is always settled.
macro_rules! with_tx {
    ($self:expr, $body:block) => {{
        let result: $crate::ResultEngine<_> = async { $body }.await;
        match result {
            Ok(value) => {
                $self.store.commit().await?;
                Ok(value)
            }
            Err(err) => {
                $self.store.rollback().await?;
                Err(err)
            }
        }
    }};
}

pub(crate) use with_tx;

/// Entry point of every ledger operation.
///
/// An `Engine` owns one [`RecordStore`] and never branches on which backend
/// it is: the same calls work on the local file and on the remote database.
#[derive(Debug)]
pub struct Engine {
    store: Box<dyn RecordStore>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Create the ledger tables and indexes that do not exist yet.
    pub async fn ensure_schema(&self) -> ResultEngine<()> {
        ensure_schema(self.store.as_ref()).await
    }

    /// Release the store. Uncommitted work is discarded.
    pub async fn close(self) -> ResultEngine<()> {
        self.store.close().await?;
        Ok(())
    }

    async fn fetch<T>(&self, sql: &str, params: Vec<Value>) -> ResultEngine<Vec<T>>
    where
        T: for<'r> TryFrom<&'r Row, Error = EngineError>,
    {
        self.store
            .execute(sql, params)
            .await?
            .fetch_all()
            .iter()
            .map(T::try_from)
            .collect()
    }

    async fn fetch_by_id<T>(&self, sql: &str, label: &str, id: i64) -> ResultEngine<T>
    where
        T: for<'r> TryFrom<&'r Row, Error = EngineError>,
    {
        let row = self
            .store
            .execute(sql, vec![id.into()])
            .await?
            .fetch_one()
            .ok_or_else(|| EngineError::RecordNotFound(format!("{label} {id}")))?;
        T::try_from(&row)
    }
}

pub(crate) async fn ensure_schema(store: &dyn RecordStore) -> ResultEngine<()> {
    store.execute_batch(schema::statements()).await?;
    store.commit().await?;
    Ok(())
}

/// The builder for `Engine`
#[derive(Debug, Default)]
pub struct EngineBuilder {
    store: Option<Box<dyn RecordStore>>,
    config: Option<StoreConfig>,
}

impl EngineBuilder {
    /// Pass an already connected store
    pub fn store(mut self, store: Box<dyn RecordStore>) -> EngineBuilder {
        self.store = Some(store);
        self
    }

    /// Pass the store configuration. Ignored when a store is given.
    pub fn config(mut self, config: StoreConfig) -> EngineBuilder {
        self.config = Some(config);
        self
    }

    /// Construct `Engine`, creating the ledger tables if they are missing
    pub async fn build(self) -> ResultEngine<Engine> {
        let store = match self.store {
            Some(store) => store,
            None => store::connect(&self.config.unwrap_or_default()).await?,
        };
        let engine = Engine { store };
        engine.ensure_schema().await?;
        Ok(engine)
    }
}
