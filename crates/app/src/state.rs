use std::{fs, path::Path};

use engine::Month;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What survives between two runs of the binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalState {
    pub active_month: Option<Month>,
}

impl LocalState {
    pub fn load(path: &str) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(self)?;
        fs::write(path, payload)?;
        Ok(())
    }

    /// The persisted month, or the current one on first run.
    pub fn active_month(&self) -> Month {
        self.active_month.unwrap_or_else(Month::current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_fresh_state() {
        let state = LocalState::load("does/not/exist.json").unwrap();
        assert!(state.active_month.is_none());
    }

    #[test]
    fn month_is_stored_as_its_key() {
        let state = LocalState {
            active_month: Some("2025-03".parse().unwrap()),
        };
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"active_month":"2025-03"}"#);
    }
}
