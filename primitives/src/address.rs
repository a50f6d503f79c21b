use {
  serde::{Deserialize, Deserializer, Serialize, Serializer},
  std::{
    fmt::{Debug, Display},
    ops::Deref,
    str::FromStr,
  },
  thiserror::Error,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
  #[error("Expected 40 hex characters, got {0}")]
  InvalidLength(usize),

  #[error("Invalid hex in address: {0}")]
  InvalidHex(#[from] hex::FromHexError),
}

/// Identity of an account on the remote ledger.
///
/// This is what campaign owners are recorded as, and what a connected
/// wallet signs transactions with. Externally it is always represented
/// as a `0x`-prefixed lowercase hex string of its 20 bytes.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

impl Address {
  pub const ZERO: Address = Address([0u8; 20]);

  pub const fn new(bytes: [u8; 20]) -> Self {
    Self(bytes)
  }
}

impl AsRef<[u8]> for Address {
  fn as_ref(&self) -> &[u8] {
    &self.0
  }
}

impl Deref for Address {
  type Target = [u8];

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl Display for Address {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "0x{}", hex::encode(self.0))
  }
}

impl Debug for Address {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "address(0x{})", hex::encode(self.0))
  }
}

impl From<[u8; 20]> for Address {
  fn from(bytes: [u8; 20]) -> Self {
    Self(bytes)
  }
}

impl FromStr for Address {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    let digits = s
      .strip_prefix("0x")
      .or_else(|| s.strip_prefix("0X"))
      .unwrap_or(s);
    if digits.len() != 40 {
      return Err(Error::InvalidLength(digits.len()));
    }
    let mut bytes = [0u8; 20];
    hex::decode_to_slice(digits, &mut bytes)?;
    Ok(Self(bytes))
  }
}

impl Serialize for Address {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.to_string())
  }
}

impl<'de> Deserialize<'de> for Address {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}
