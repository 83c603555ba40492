//! Token quantities.
//!
//! An asset is a signed 64-bit amount in minimal units plus the symbol that
//! fixes its display precision. Text form carries exactly `precision`
//! decimal places: `"1.0000 SYS"`, `"-0.50 ABC"`, `"3 NOP"` for precision 0.
//! Wire form is the amount followed by the raw symbol, both little-endian.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::abi::errors::{AbiError, AbiResult};
use crate::datastream::{DataStream, DataStreamMut};
use crate::types::symbol::{Symbol, SymbolCode};

/// Parsing rejects precisions that would overflow `10^p` in an i64 amount.
const ASSET_MAX_PRECISION: u32 = 18;

/// A token quantity: amount in minimal units plus its symbol.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Asset {
    pub amount: i64,
    pub symbol: Symbol,
}

impl Asset {
    pub fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }

    pub fn unpack(ds: &mut DataStream<'_>) -> AbiResult<Self> {
        let amount = ds.read_i64()?;
        let symbol = Symbol::unpack(ds)?;
        Ok(Self::new(amount, symbol))
    }

    pub fn pack(&self, ds: &mut DataStreamMut<'_>) -> AbiResult<()> {
        ds.write_i64(self.amount)?;
        self.symbol.pack(ds)
    }
}

impl FromStr for Asset {
    type Err = AbiError;

    fn from_str(s: &str) -> AbiResult<Self> {
        let invalid = || AbiError::InvalidValue {
            kind: "asset",
            text: s.to_string(),
        };
        let mut parts = s.split_whitespace();
        let (amount_str, code_str) = match (parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(c), None) => (a, c),
            _ => return Err(invalid()),
        };

        let (sign, digits) = match amount_str.strip_prefix('-') {
            Some(rest) => (-1i64, rest),
            None => (1i64, amount_str),
        };
        let (int_str, frac_str) = match digits.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (digits, ""),
        };
        if int_str.is_empty()
            || !int_str.bytes().all(|b| b.is_ascii_digit())
            || !frac_str.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let precision = frac_str.len() as u32;
        if precision > ASSET_MAX_PRECISION {
            return Err(invalid());
        }

        let int_part: i64 = int_str.parse().map_err(|_| invalid())?;
        let frac_part: i64 = if frac_str.is_empty() {
            0
        } else {
            frac_str.parse().map_err(|_| invalid())?
        };
        let scale = 10i64.pow(precision);
        let amount = int_part
            .checked_mul(scale)
            .and_then(|v| v.checked_add(frac_part))
            .and_then(|v| v.checked_mul(sign))
            .ok_or_else(invalid)?;

        let code: SymbolCode = code_str.parse().map_err(|_| invalid())?;
        Ok(Self::new(amount, Symbol::new(code, precision as u8)))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = u32::from(self.symbol.precision());
        if precision == 0 {
            return write!(f, "{} {}", self.amount, self.symbol.code());
        }
        // i128 keeps 10^p exact for precisions beyond what parsing produces
        let scale = 10i128.pow(precision);
        let amount = i128::from(self.amount);
        let sign = if amount < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:0width$} {}",
            sign,
            (amount / scale).abs(),
            (amount % scale).abs(),
            self.symbol.code(),
            width = precision as usize
        )
    }
}
