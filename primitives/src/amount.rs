use {
  serde::{Deserialize, Deserializer, Serialize, Serializer},
  std::{fmt::Display, str::FromStr},
  thiserror::Error,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("Amount is empty")]
  Empty,

  #[error("Amount cannot be negative: {0}")]
  Negative(String),

  #[error("Amount is not a whole number: {0}")]
  NotANumber(String),

  #[error("Amount {0} does not fit in 128 bits")]
  Overflow(String),
}

/// An amount of the ledger's native currency in its smallest unit.
///
/// The remote contract stores amounts as 256-bit unsigned integers, the
/// client works with amounts up to `u128::MAX` which is far beyond any
/// realistic supply of an 18-decimals currency.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Amount(u128);

impl Amount {
  pub const ZERO: Amount = Amount(0);

  /// 0.01 of an 18-decimals coin. Every donation sends exactly this much.
  pub const DONATION_UNIT: Amount = Amount(10_000_000_000_000_000);

  pub const fn new(value: u128) -> Self {
    Self(value)
  }

  pub const fn get(&self) -> u128 {
    self.0
  }

  pub fn is_zero(&self) -> bool {
    self.0 == 0
  }

  pub fn checked_add(self, other: Amount) -> Option<Amount> {
    self.0.checked_add(other.0).map(Amount)
  }
}

impl From<u128> for Amount {
  fn from(value: u128) -> Self {
    Self(value)
  }
}

impl From<u64> for Amount {
  fn from(value: u64) -> Self {
    Self(value as u128)
  }
}

impl Display for Amount {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl FromStr for Amount {
  type Err = Error;

  /// Parses user input as a non-negative whole number of smallest units.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    if s.is_empty() {
      return Err(Error::Empty);
    }
    if s.starts_with('-') {
      return Err(Error::Negative(s.into()));
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
      return Err(Error::NotANumber(s.into()));
    }
    // only digits left, so the only possible failure is overflow
    s.parse::<u128>()
      .map(Amount)
      .map_err(|_| Error::Overflow(s.into()))
  }
}

impl Serialize for Amount {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.0.to_string())
  }
}

impl<'de> Deserialize<'de> for Amount {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}
