//! Settings for the application.
//!
//! Read from `config/monthwise.toml` (optional) and then from the environment,
//! e.g. `MONTHWISE_STORE__URL` or `MONTHWISE_APP__LEVEL`.
//!
//! ```toml
//! [app]
//! level = "info"
//! state_path = "config/monthwise_state.json"
//!
//! [store]
//! path = "budget.db"
//! # both set: use the remote database instead of the file
//! url = "libsql://budget-me.turso.io"
//! auth_token = "..."
//! timeout_secs = 10
//! ```

use config::{Config, Environment, File};
use engine::StoreConfig;
use serde::Deserialize;

use crate::error::Result;

pub const DEFAULT_CONFIG_PATH: &str = "config/monthwise.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct App {
    /// Log level for the binary and the engine.
    pub level: String,
    /// Where the active month is remembered between runs.
    pub state_path: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            state_path: "config/monthwise_state.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub store: StoreConfig,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("MONTHWISE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
