use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{EngineError, store::Value};

/// Money amount represented as **integer minor units** (cents).
///
/// Every ledger amount (income, expense, EMI, budget) goes through this type,
/// and the store columns hold the same integer, so the local and remote
/// backends agree to the cent.
///
/// Derived figures (remaining budget, net savings) may be negative; amounts
/// entered by the user may not. Arithmetic is checked: a total that leaves
/// the `i64` range is an error, never a wrapped value.
///
/// # Examples
///
/// ```rust
/// use engine::Amount;
///
/// let amount: Amount = "12,5".parse().unwrap();
/// assert_eq!(amount.minor(), 1250);
/// assert_eq!(amount.to_string(), "12.50");
/// assert!("abc".parse::<Amount>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Largest amount a user may enter: one thousand billion units.
    pub const MAX_INPUT: Amount = Amount(100_000_000_000_000);

    /// Creates a new amount from minor units.
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    /// Adds two derived figures, failing with [`EngineError::InvalidAmount`]
    /// when the result does not fit.
    pub fn try_add(self, rhs: Amount) -> Result<Amount, EngineError> {
        self.checked_add(rhs).ok_or_else(out_of_range)
    }

    pub fn try_sub(self, rhs: Amount) -> Result<Amount, EngineError> {
        self.checked_sub(rhs).ok_or_else(out_of_range)
    }

    /// Sum of `amounts`, or an error if any partial sum overflows.
    pub fn total<I: IntoIterator<Item = Amount>>(amounts: I) -> Result<Amount, EngineError> {
        amounts
            .into_iter()
            .try_fold(Amount::ZERO, |acc, amount| acc.try_add(amount))
    }

    /// Parses user input and rejects negative values and values above
    /// [`Amount::MAX_INPUT`].
    ///
    /// This is the entry point for every amount typed by a user; the error
    /// is always [`EngineError::InvalidAmount`].
    pub fn parse_input(input: &str) -> Result<Self, EngineError> {
        let amount: Amount = input.parse()?;
        if amount.is_negative() {
            return Err(EngineError::InvalidAmount(format!(
                "amount must not be negative: {}",
                input.trim()
            )));
        }
        if amount > Self::MAX_INPUT {
            return Err(EngineError::InvalidAmount(format!(
                "amount above {}: {}",
                Self::MAX_INPUT,
                input.trim()
            )));
        }
        Ok(amount)
    }
}

fn out_of_range() -> EngineError {
    EngineError::InvalidAmount("total out of range".to_string())
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        f.pad(&format!("{sign}{}.{:02}", abs / 100, abs % 100))
    }
}

impl From<Amount> for Value {
    fn from(value: Amount) -> Self {
        Value::Integer(value.0)
    }
}

impl FromStr for Amount {
    type Err = EngineError;

    /// Parses a decimal string into minor units.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    /// At most two fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidAmount(format!("not a number: {}", s.trim()));
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(EngineError::InvalidAmount("empty amount".to_string()));
        }

        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let rest = rest.replace(',', ".");
        let (units_str, frac_str) = match rest.split_once('.') {
            Some((units, frac)) => (units, frac),
            None => (rest.as_str(), ""),
        };

        if units_str.is_empty() || !units_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if !frac_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let units: i64 = units_str.parse().map_err(|_| overflow())?;
        let frac: i64 = match frac_str.len() {
            0 => 0,
            1 => frac_str.parse::<i64>().map_err(|_| invalid())? * 10,
            2 => frac_str.parse::<i64>().map_err(|_| invalid())?,
            _ => return Err(EngineError::InvalidAmount("too many decimals".to_string())),
        };

        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(overflow)?;

        Ok(Amount(if negative { -total } else { total }))
    }
}
