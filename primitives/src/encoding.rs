pub trait ToHexString {
  fn to_hex(&self) -> String;
}

impl ToHexString for &[u8] {
  fn to_hex(&self) -> String {
    format!("0x{}", hex::encode(self))
  }
}

impl<const N: usize> ToHexString for [u8; N] {
  fn to_hex(&self) -> String {
    format!("0x{}", hex::encode(self))
  }
}

impl ToHexString for Vec<u8> {
  fn to_hex(&self) -> String {
    format!("0x{}", hex::encode(self))
  }
}

/// Parses a `0x`-prefixed hex quantity or data string as returned by
/// JSON-RPC nodes. The prefix is optional and an odd number of digits is
/// left-padded with a zero nibble.
pub fn from_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
  let digits = s.strip_prefix("0x").unwrap_or(s);
  if digits.len() % 2 == 1 {
    hex::decode(format!("0{digits}"))
  } else {
    hex::decode(digits)
  }
}
