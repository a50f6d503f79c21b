use {
  crate::{abi::keccak256, Address, Amount, CampaignId},
  serde::{Deserialize, Serialize},
  std::{
    fmt::{Debug, Display},
    str::FromStr,
  },
};

/// A validated state-changing call to the crowdfunding contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Call {
  CreateCampaign {
    goal: Amount,
    title: String,
    description: String,
  },

  /// Payable call, `value` is attached to the transaction
  /// as the native currency transfer.
  Donate { id: CampaignId, value: Amount },

  EndCampaign { id: CampaignId },
}

impl Call {
  /// Solidity signature of the contract function this call invokes.
  pub fn signature(&self) -> &'static str {
    match self {
      Call::CreateCampaign { .. } => "createCampaign(uint256,string,string)",
      Call::Donate { .. } => "donate(uint256)",
      Call::EndCampaign { .. } => "endCampaign(uint256)",
    }
  }

  /// The existing campaign this call operates on.
  pub fn campaign(&self) -> Option<CampaignId> {
    match self {
      Call::CreateCampaign { .. } => None,
      Call::Donate { id, .. } | Call::EndCampaign { id } => Some(*id),
    }
  }

  /// Native currency sent along with the call.
  pub fn value(&self) -> Amount {
    match self {
      Call::Donate { value, .. } => *value,
      _ => Amount::ZERO,
    }
  }
}

/// Keccak-256 hash identifying a submitted transaction.
#[derive(
  Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TxHash([u8; 32]);

impl TxHash {
  pub const fn new(bytes: [u8; 32]) -> Self {
    Self(bytes)
  }
}

impl Display for TxHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "0x{}", hex::encode(self.0))
  }
}

impl Debug for TxHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "tx(0x{})", hex::encode(self.0))
  }
}

impl FromStr for TxHash {
  type Err = hex::FromHexError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(s.strip_prefix("0x").unwrap_or(s), &mut bytes)?;
    Ok(Self(bytes))
  }
}

/// A call bound to the account that sent it.
///
/// The nonce is the sender's transaction counter at submission time and
/// makes two otherwise identical calls hash differently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
  pub from: Address,
  pub nonce: u64,
  pub call: Call,
}

impl Transaction {
  pub fn hash(&self) -> TxHash {
    TxHash(keccak256(
      &rmp_serde::to_vec(self).expect("transaction is always serializable"),
    ))
  }
}
