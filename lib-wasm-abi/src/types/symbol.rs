//! Token symbols.
//!
//! A `SymbolCode` is up to 7 uppercase `A-Z` characters packed one byte per
//! character, least significant byte first. A `Symbol` combines a code with
//! a decimal precision in its low byte: `(code << 8) | precision`. The text
//! form of a symbol is `"<precision>,<CODE>"`, e.g. `"4,SYS"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::abi::errors::{AbiError, AbiResult};
use crate::datastream::{DataStream, DataStreamMut};

/// Longest representable symbol code.
const SYMBOL_CODE_MAX_LEN: usize = 7;

/// A 64-bit packed token symbol code, e.g. `SYS`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SymbolCode {
    pub value: u64,
}

impl SymbolCode {
    pub fn new(value: u64) -> Self {
        Self { value }
    }

    pub fn unpack(ds: &mut DataStream<'_>) -> AbiResult<Self> {
        Ok(Self::new(ds.read_u64()?))
    }

    pub fn pack(&self, ds: &mut DataStreamMut<'_>) -> AbiResult<()> {
        ds.write_u64(self.value)
    }
}

impl FromStr for SymbolCode {
    type Err = AbiError;

    fn from_str(s: &str) -> AbiResult<Self> {
        let invalid = || AbiError::InvalidValue {
            kind: "symbol_code",
            text: s.to_string(),
        };
        let bytes = s.as_bytes();
        if bytes.is_empty() || bytes.len() > SYMBOL_CODE_MAX_LEN {
            return Err(invalid());
        }
        let mut value: u64 = 0;
        for (i, &c) in bytes.iter().enumerate() {
            if !c.is_ascii_uppercase() {
                return Err(invalid());
            }
            value |= u64::from(c) << (8 * i);
        }
        Ok(Self::new(value))
    }
}

impl fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tmp = self.value;
        while tmp > 0 {
            write!(f, "{}", (tmp & 0xff) as u8 as char)?;
            tmp >>= 8;
        }
        Ok(())
    }
}

/// A token symbol: code plus decimal precision, packed into a `u64`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Symbol {
    pub value: u64,
}

impl Symbol {
    pub fn new(code: SymbolCode, precision: u8) -> Self {
        Self {
            value: (code.value << 8) | u64::from(precision),
        }
    }

    pub fn from_raw(value: u64) -> Self {
        Self { value }
    }

    pub fn code(&self) -> SymbolCode {
        SymbolCode::new(self.value >> 8)
    }

    pub fn precision(&self) -> u8 {
        (self.value & 0xff) as u8
    }

    pub fn unpack(ds: &mut DataStream<'_>) -> AbiResult<Self> {
        Ok(Self::from_raw(ds.read_u64()?))
    }

    pub fn pack(&self, ds: &mut DataStreamMut<'_>) -> AbiResult<()> {
        ds.write_u64(self.value)
    }
}

impl FromStr for Symbol {
    type Err = AbiError;

    fn from_str(s: &str) -> AbiResult<Self> {
        let invalid = || AbiError::InvalidValue {
            kind: "symbol",
            text: s.to_string(),
        };
        let (precision_str, code_str) = s.split_once(',').ok_or_else(invalid)?;
        let precision: u8 = precision_str.parse().map_err(|_| invalid())?;
        let code: SymbolCode = code_str.parse().map_err(|_| invalid())?;
        Ok(Self::new(code, precision))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_code_round_trip() {
        for s in ["A", "SYS", "WICC", "ZZZZZZZ"] {
            let code: SymbolCode = s.parse().unwrap();
            assert_eq!(code.to_string(), s);
        }
    }

    #[test]
    fn symbol_code_rejects_bad_literals() {
        for s in ["", "sys", "TOOLONGX", "S-S", "1SY"] {
            assert!(s.parse::<SymbolCode>().is_err(), "'{s}' should not parse");
        }
    }

    #[test]
    fn symbol_packs_precision_low_byte() {
        let sym: Symbol = "4,SYS".parse().unwrap();
        assert_eq!(sym.precision(), 4);
        assert_eq!(sym.code().to_string(), "SYS");
        assert_eq!(sym.value & 0xff, 4);
        assert_eq!(sym.to_string(), "4,SYS");
    }

    #[test]
    fn symbol_rejects_bad_literals() {
        for s in ["SYS", "4SYS", ",SYS", "256,SYS", "4,sys"] {
            assert!(s.parse::<Symbol>().is_err(), "'{s}' should not parse");
        }
    }
}
