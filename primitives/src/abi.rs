//! Solidity ABI codec for the crowdfunding contract.
//!
//! Only the handful of shapes this contract uses are supported: static
//! `uint256`, `address` and `bool` words and dynamic `string`s, laid out
//! in the usual head/tail encoding.

use {
  crate::{Address, Amount, Call, Campaign, CampaignId},
  multihash::MultihashDigest,
  std::fmt::Display,
  thiserror::Error,
};

/// Size of one ABI word in bytes.
pub const WORD: usize = 32;

pub const GET_CAMPAIGN_COUNT: &str = "getCampaignCount()";
pub const CAMPAIGNS: &str = "campaigns(uint256)";

/// Selector of `Error(string)`, emitted by `require` and `revert`.
pub const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Selector of `Panic(uint256)`, emitted on failed internal checks.
pub const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// Panic code for an out-of-bounds array access.
pub const PANIC_OUT_OF_BOUNDS: u64 = 0x32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("Expected at least {expected} bytes of return data, got {actual}")]
  TooShort { expected: usize, actual: usize },

  #[error("Value does not fit in {0} bits")]
  Overflow(u32),

  #[error("Word is not a valid address")]
  InvalidAddress,

  #[error("Word is not a valid boolean")]
  InvalidBool,

  #[error("String is not valid utf-8")]
  InvalidUtf8,
}

/// Keccak-256 digest of the input.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
  let digest = multihash::Code::Keccak256.digest(data);
  let mut output = [0u8; 32];
  output.copy_from_slice(digest.digest());
  output
}

/// First four bytes of the keccak-256 hash of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
  let hash = keccak256(signature.as_bytes());
  [hash[0], hash[1], hash[2], hash[3]]
}

pub fn uint_word(value: u128) -> [u8; WORD] {
  let mut word = [0u8; WORD];
  word[16..].copy_from_slice(&value.to_be_bytes());
  word
}

pub fn address_word(address: &Address) -> [u8; WORD] {
  let mut word = [0u8; WORD];
  word[12..].copy_from_slice(address);
  word
}

pub fn bool_word(value: bool) -> [u8; WORD] {
  uint_word(value as u128)
}

/// Tail encoding of a dynamic string: length word followed
/// by the utf-8 bytes right-padded to a whole number of words.
pub fn string_tail(value: &str) -> Vec<u8> {
  let bytes = value.as_bytes();
  let padded = (bytes.len() + WORD - 1) / WORD * WORD;
  let mut output = Vec::with_capacity(WORD + padded);
  output.extend_from_slice(&uint_word(bytes.len() as u128));
  output.extend_from_slice(bytes);
  output.resize(WORD + padded, 0);
  output
}

/// Calldata for a state-changing contract call.
pub fn encode_call(call: &Call) -> Vec<u8> {
  let mut output = selector(call.signature()).to_vec();
  match call {
    Call::CreateCampaign {
      goal,
      title,
      description,
    } => {
      let title = string_tail(title);
      let description = string_tail(description);
      let head_len = 3 * WORD;
      output.extend_from_slice(&uint_word(goal.get()));
      output.extend_from_slice(&uint_word(head_len as u128));
      output.extend_from_slice(&uint_word((head_len + title.len()) as u128));
      output.extend_from_slice(&title);
      output.extend_from_slice(&description);
    }
    Call::Donate { id, .. } | Call::EndCampaign { id } => {
      output.extend_from_slice(&uint_word(*id as u128));
    }
  }
  output
}

pub fn encode_get_campaign_count() -> Vec<u8> {
  selector(GET_CAMPAIGN_COUNT).to_vec()
}

pub fn encode_get_campaign(id: CampaignId) -> Vec<u8> {
  let mut output = selector(CAMPAIGNS).to_vec();
  output.extend_from_slice(&uint_word(id as u128));
  output
}

/// Return data of `campaigns(uint256)` for the given record.
pub fn encode_campaign(campaign: &Campaign) -> Vec<u8> {
  let title = string_tail(&campaign.title);
  let description = string_tail(&campaign.description);
  let head_len = 6 * WORD;

  let mut output = Vec::with_capacity(head_len + title.len() + description.len());
  output.extend_from_slice(&address_word(&campaign.owner));
  output.extend_from_slice(&uint_word(campaign.goal.get()));
  output.extend_from_slice(&uint_word(campaign.total_raised.get()));
  output.extend_from_slice(&uint_word(head_len as u128));
  output.extend_from_slice(&uint_word((head_len + title.len()) as u128));
  output.extend_from_slice(&bool_word(campaign.ended));
  output.extend_from_slice(&title);
  output.extend_from_slice(&description);
  output
}

fn word_at(data: &[u8], offset: usize) -> Result<&[u8], Error> {
  let end = offset.checked_add(WORD).ok_or(Error::Overflow(64))?;
  data.get(offset..end).ok_or(Error::TooShort {
    expected: end,
    actual: data.len(),
  })
}

fn read_u128(word: &[u8]) -> Result<u128, Error> {
  if word[..16].iter().any(|b| *b != 0) {
    return Err(Error::Overflow(128));
  }
  let mut bytes = [0u8; 16];
  bytes.copy_from_slice(&word[16..]);
  Ok(u128::from_be_bytes(bytes))
}

fn read_u64(word: &[u8]) -> Result<u64, Error> {
  u64::try_from(read_u128(word)?).map_err(|_| Error::Overflow(64))
}

fn read_usize(word: &[u8]) -> Result<usize, Error> {
  usize::try_from(read_u64(word)?).map_err(|_| Error::Overflow(64))
}

fn read_address(word: &[u8]) -> Result<Address, Error> {
  if word[..12].iter().any(|b| *b != 0) {
    return Err(Error::InvalidAddress);
  }
  let mut bytes = [0u8; 20];
  bytes.copy_from_slice(&word[12..]);
  Ok(Address::new(bytes))
}

fn read_bool(word: &[u8]) -> Result<bool, Error> {
  match read_u128(word) {
    Ok(0) => Ok(false),
    Ok(1) => Ok(true),
    _ => Err(Error::InvalidBool),
  }
}

/// Reads a dynamic string whose tail starts at `offset` within `data`.
fn read_string(data: &[u8], offset: usize) -> Result<String, Error> {
  let len = read_usize(word_at(data, offset)?)?;
  let start = offset + WORD;
  let end = start.checked_add(len).ok_or(Error::Overflow(64))?;
  let bytes = data.get(start..end).ok_or(Error::TooShort {
    expected: end,
    actual: data.len(),
  })?;
  String::from_utf8(bytes.to_vec()).map_err(|_| Error::InvalidUtf8)
}

/// Decodes the return data of `getCampaignCount()`.
pub fn decode_campaign_count(data: &[u8]) -> Result<u64, Error> {
  read_u64(word_at(data, 0)?)
}

/// Decodes the return data of `campaigns(uint256)`, which is the tuple
/// `(address owner, uint256 goal, uint256 totalRaised, string title,
/// string description, bool ended)`.
pub fn decode_campaign(id: CampaignId, data: &[u8]) -> Result<Campaign, Error> {
  let owner = read_address(word_at(data, 0)?)?;
  let goal = Amount::new(read_u128(word_at(data, WORD)?)?);
  let total_raised = Amount::new(read_u128(word_at(data, 2 * WORD)?)?);
  let title_offset = read_usize(word_at(data, 3 * WORD)?)?;
  let description_offset = read_usize(word_at(data, 4 * WORD)?)?;
  let ended = read_bool(word_at(data, 5 * WORD)?)?;

  Ok(Campaign {
    id,
    owner,
    goal,
    total_raised,
    title: read_string(data, title_offset)?,
    description: read_string(data, description_offset)?,
    ended,
  })
}

/// Reason attached to a reverted call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revert {
  /// `require(cond, "message")` or `revert("message")`
  Error(String),

  /// Compiler-inserted check failure with its panic code.
  Panic(u64),

  /// Custom error or empty revert, kept as raw bytes.
  Raw(Vec<u8>),
}

impl Revert {
  /// Reading past the end of the campaigns array is how the
  /// contract reports a campaign id that does not exist.
  pub fn is_out_of_bounds(&self) -> bool {
    matches!(self, Revert::Panic(PANIC_OUT_OF_BOUNDS))
  }
}

impl Display for Revert {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Revert::Error(message) => write!(f, "{message}"),
      Revert::Panic(code) => write!(f, "panic code {code:#x}"),
      Revert::Raw(data) if data.is_empty() => write!(f, "reverted"),
      Revert::Raw(data) => write!(f, "reverted with 0x{}", hex::encode(data)),
    }
  }
}

/// Decodes revert data. Payloads that do not match a known
/// shape are returned as [`Revert::Raw`].
pub fn decode_revert(data: &[u8]) -> Revert {
  if data.len() >= 4 {
    let (selector, payload) = data.split_at(4);
    if selector == ERROR_SELECTOR {
      if let Ok(message) =
        word_at(payload, 0).and_then(read_usize).and_then(|offset| read_string(payload, offset))
      {
        return Revert::Error(message);
      }
    } else if selector == PANIC_SELECTOR {
      if let Ok(code) = word_at(payload, 0).and_then(read_u64) {
        return Revert::Panic(code);
      }
    }
  }
  Revert::Raw(data.to_vec())
}

#[cfg(test)]
mod tests {
  use {
    super::*,
    crate::{Address, Amount, Call, Campaign},
  };

  #[test]
  fn well_known_selectors() {
    assert_eq!(selector("Error(string)"), ERROR_SELECTOR);
    assert_eq!(selector("Panic(uint256)"), PANIC_SELECTOR);
    assert_eq!(selector("transfer(address,uint256)"), [
      0xa9, 0x05, 0x9c, 0xbb
    ]);
  }

  #[test]
  fn create_campaign_calldata_layout() {
    let data = encode_call(&Call::CreateCampaign {
      goal: Amount::new(1000),
      title: "Fund A".into(),
      description: "".into(),
    });

    assert_eq!(&data[..4], &selector("createCampaign(uint256,string,string)"));
    let body = &data[4..];
    // head: goal, title offset, description offset
    assert_eq!(read_u128(word_at(body, 0).unwrap()).unwrap(), 1000);
    assert_eq!(read_usize(word_at(body, WORD).unwrap()).unwrap(), 96);
    assert_eq!(read_usize(word_at(body, 2 * WORD).unwrap()).unwrap(), 160);
    assert_eq!(read_string(body, 96).unwrap(), "Fund A");
    assert_eq!(read_string(body, 160).unwrap(), "");
    assert_eq!(body.len(), 6 * WORD);
  }

  #[test]
  fn donate_calldata() {
    let data = encode_call(&Call::Donate {
      id: 7,
      value: Amount::DONATION_UNIT,
    });
    assert_eq!(data.len(), 4 + WORD);
    assert_eq!(data[4 + WORD - 1], 7);
  }

  #[test]
  fn decodes_campaign_tuple() {
    let owner: Address =
      "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap();
    let campaign = Campaign {
      id: 3,
      owner,
      goal: Amount::new(1000),
      total_raised: Amount::DONATION_UNIT,
      title: "A title that is definitely longer than one word".into(),
      description: "ünïcödé".into(),
      ended: true,
    };

    let decoded = decode_campaign(3, &encode_campaign(&campaign)).unwrap();
    assert_eq!(decoded, campaign);
  }

  #[test]
  fn rejects_malformed_return_data() {
    assert_eq!(decode_campaign_count(&[0u8; 5]), Err(Error::TooShort {
      expected: 32,
      actual: 5
    }));

    let mut word = [0xffu8; 32];
    assert_eq!(decode_campaign_count(&word), Err(Error::Overflow(128)));
    word[..24].fill(0);
    assert_eq!(decode_campaign_count(&word), Ok(u64::MAX));

    let mut data = encode_campaign(&Campaign {
      id: 0,
      owner: Address::ZERO,
      goal: Amount::ZERO,
      total_raised: Amount::ZERO,
      title: "t".into(),
      description: "d".into(),
      ended: false,
    });
    // ended flag set to 2
    data[6 * WORD - 1] = 2;
    assert_eq!(decode_campaign(0, &data), Err(Error::InvalidBool));

    // title offset pointing past the end
    data[6 * WORD - 1] = 0;
    data[4 * WORD - 2] = 0xff;
    assert!(matches!(
      decode_campaign(0, &data),
      Err(Error::TooShort { .. })
    ));
  }

  #[test]
  fn decodes_reverts() {
    let mut data = ERROR_SELECTOR.to_vec();
    data.extend_from_slice(&uint_word(32));
    data.extend_from_slice(&string_tail("Not owner"));
    assert_eq!(decode_revert(&data), Revert::Error("Not owner".into()));

    let mut data = PANIC_SELECTOR.to_vec();
    data.extend_from_slice(&uint_word(0x32));
    let revert = decode_revert(&data);
    assert_eq!(revert, Revert::Panic(0x32));
    assert!(revert.is_out_of_bounds());

    assert_eq!(decode_revert(&[]), Revert::Raw(vec![]));
    assert_eq!(decode_revert(&[1, 2, 3, 4, 5]), Revert::Raw(vec![
      1, 2, 3, 4, 5
    ]));
  }
}
