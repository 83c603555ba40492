//! Base-32 packed account names.
//!
//! A name is up to 13 characters over the alphabet `.12345a-z`, packed into a
//! single `u64`: the first 12 characters take 5 bits each from the most
//! significant end, the 13th takes the remaining 4 bits (so it may only be
//! one of the first 16 alphabet characters). Trailing dots are insignificant
//! and trimmed on display.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::abi::errors::{AbiError, AbiResult};
use crate::datastream::{DataStream, DataStreamMut};

/// Decode alphabet, indexed by 5-bit symbol value.
const NAME_CHARSET: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// Maximum characters a packed name can carry.
const NAME_MAX_LEN: usize = 13;

fn char_to_symbol(c: u8) -> Option<u64> {
    match c {
        b'a'..=b'z' => Some(u64::from(c - b'a') + 6),
        b'1'..=b'5' => Some(u64::from(c - b'1') + 1),
        b'.' => Some(0),
        _ => None,
    }
}

/// A 64-bit packed account, table or action name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Name {
    pub value: u64,
}

impl Name {
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

impl FromStr for Name {
    type Err = AbiError;

    fn from_str(s: &str) -> AbiResult<Self> {
        let invalid = || AbiError::InvalidValue {
            kind: "name",
            text: s.to_string(),
        };
        let bytes = s.as_bytes();
        if bytes.len() > NAME_MAX_LEN {
            return Err(invalid());
        }
        let mut value: u64 = 0;
        for (i, &c) in bytes.iter().enumerate() {
            let sym = char_to_symbol(c).ok_or_else(invalid)?;
            if i < 12 {
                value |= (sym & 0x1f) << (64 - 5 * (i as u64 + 1));
            } else {
                // 13th character only has 4 bits on the wire
                if sym > 0x0f {
                    return Err(invalid());
                }
                value |= sym;
            }
        }
        Ok(Self::new(value))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chars = [b'.'; NAME_MAX_LEN];
        let mut tmp = self.value;
        for i in 0..NAME_MAX_LEN {
            let (mask, shift) = if i == 0 { (0x0f, 4) } else { (0x1f, 5) };
            chars[NAME_MAX_LEN - 1 - i] = NAME_CHARSET[(tmp & mask) as usize];
            tmp >>= shift;
        }
        let end = chars
            .iter()
            .rposition(|&c| c != b'.')
            .map_or(0, |idx| idx + 1);
        for &c in &chars[..end] {
            write!(f, "{}", c as char)?;
        }
        Ok(())
    }
}
