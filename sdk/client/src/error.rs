use {
  crowdfund_primitives::{abi, AmountError, CampaignId},
  thiserror::Error,
};

/// Local input problems detected before anything is sent to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("Invalid goal: {0}")]
  InvalidGoal(#[from] AmountError),

  #[error("Campaign title is required")]
  EmptyTitle,

  #[error("Campaign {0} has already ended")]
  CampaignEnded(CampaignId),
}

/// Reasons an intent or a refresh can fail.
///
/// Errors are cloneable because a single refresh outcome is
/// shared by every caller that was coalesced into it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("Validation error: {0}")]
  Validation(#[from] ValidationError),

  #[error("Precondition failed: {0}")]
  Precondition(String),

  #[error("Transport error: {0}")]
  Transport(String),

  #[error("Campaign {0} not found")]
  NotFound(CampaignId),

  #[error("Rejected by the remote ledger: {0}")]
  RemoteRejection(String),

  #[error("Operation cancelled")]
  Cancelled,
}

impl Error {
  pub fn no_signer() -> Self {
    Error::Precondition("no connected wallet to sign with".into())
  }
}

impl From<abi::Error> for Error {
  fn from(e: abi::Error) -> Self {
    Error::Transport(format!("malformed response: {e}"))
  }
}
