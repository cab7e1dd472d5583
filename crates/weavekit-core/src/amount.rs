//! Token quantities.
//!
//! Every quantity on the wire is an integer number of winston, the smallest
//! unit. One AR is 10^12 winston. Conversions are done on integers only.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Winston in one AR.
pub const WINSTON_PER_AR: u128 = 1_000_000_000_000;

const AR_DECIMALS: usize = 12;

/// Denomination of a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Winston,
    Ar,
}

/// A non-negative quantity of winston.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_winston(winston: u128) -> Self {
        Self(winston)
    }

    pub const fn winston(&self) -> u128 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Parse a decimal string in the given unit.
    ///
    /// Winston must be an integer. AR accepts up to twelve fractional digits.
    pub fn parse(s: &str, unit: Unit) -> Result<Self> {
        let s = s.trim();
        match unit {
            Unit::Winston => parse_integer(s).map(Self),
            Unit::Ar => parse_ar(s).map(Self),
        }
    }

    /// Render as a decimal string in the given unit.
    ///
    /// AR values drop trailing fractional zeros: `1`, `0.5`, `0.000000000002`.
    pub fn to_unit_string(&self, unit: Unit) -> String {
        match unit {
            Unit::Winston => self.0.to_string(),
            Unit::Ar => {
                let whole = self.0 / WINSTON_PER_AR;
                let frac = self.0 % WINSTON_PER_AR;
                if frac == 0 {
                    return whole.to_string();
                }
                let frac = format!("{:0width$}", frac, width = AR_DECIMALS);
                format!("{}.{}", whole, frac.trim_end_matches('0'))
            }
        }
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }
}

fn parse_integer(s: &str) -> Result<u128> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::InvalidAmount(format!("not a decimal integer: {:?}", s)));
    }
    s.parse::<u128>()
        .map_err(|e| CoreError::InvalidAmount(format!("{}: {:?}", e, s)))
}

fn parse_ar(s: &str) -> Result<u128> {
    let (whole, frac) = match s.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (s, ""),
    };
    if frac.len() > AR_DECIMALS {
        return Err(CoreError::InvalidAmount(format!(
            "more than {} fractional digits: {:?}",
            AR_DECIMALS, s
        )));
    }

    let whole = if whole.is_empty() && !frac.is_empty() {
        0
    } else {
        parse_integer(whole)?
    };
    let frac = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = AR_DECIMALS);
        parse_integer(&padded)?
    };

    whole
        .checked_mul(WINSTON_PER_AR)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(|| CoreError::InvalidAmount(format!("overflow: {:?}", s)))
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, Unit::Winston)
    }
}

impl TryFrom<String> for Amount {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.to_string()
    }
}

impl From<u128> for Amount {
    fn from(winston: u128) -> Self {
        Self(winston)
    }
}
