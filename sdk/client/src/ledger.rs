use {
  crate::{Error, Signer},
  crowdfund_primitives::{Amount, Call, Campaign, CampaignId, TxHash},
  futures::future::{BoxFuture, FutureExt},
  std::{fmt::Debug, future::Future},
};

/// Proof that a transaction was included by the remote ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
  pub tx_hash: TxHash,
  pub block_height: u64,
}

/// Terminal state of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
  /// Included and executed successfully.
  Confirmed(Receipt),

  /// Included or refused by the remote ledger without taking effect.
  /// The reason is whatever the ledger reported.
  Rejected(String),
}

/// A submitted transaction awaiting its final confirmation.
///
/// Dropping the handle stops waiting but does not, and cannot, withdraw
/// the transaction from the remote ledger.
pub struct PendingHandle {
  tx_hash: TxHash,
  confirmation: BoxFuture<'static, Result<Confirmation, Error>>,
}

impl PendingHandle {
  pub fn new(
    tx_hash: TxHash,
    confirmation: impl Future<Output = Result<Confirmation, Error>>
      + Send
      + 'static,
  ) -> Self {
    Self {
      tx_hash,
      confirmation: confirmation.boxed(),
    }
  }

  pub fn tx_hash(&self) -> TxHash {
    self.tx_hash
  }

  /// Suspends until the transaction is either confirmed or rejected.
  ///
  /// There is no client side timeout, the transport alone decides how
  /// long confirmation may take.
  pub async fn wait(self) -> Result<Confirmation, Error> {
    self.confirmation.await
  }
}

impl Debug for PendingHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PendingHandle")
      .field("tx_hash", &self.tx_hash)
      .finish()
  }
}

/// The capability set of the remote crowdfunding contract.
///
/// Any transport exposing those five operations can back the client,
/// whether it is a live node or an in-memory ledger used in tests.
pub trait RemoteLedger: Send + Sync {
  /// Number of campaigns ever created.
  fn campaign_count(&self) -> BoxFuture<'_, Result<u64, Error>>;

  /// Reads one campaign record. Ids at or past the remote count
  /// fail with [`Error::NotFound`].
  fn campaign(&self, id: CampaignId) -> BoxFuture<'_, Result<Campaign, Error>>;

  fn submit_create(
    &self,
    signer: Signer,
    goal: Amount,
    title: String,
    description: String,
  ) -> BoxFuture<'_, Result<PendingHandle, Error>>;

  fn submit_donate(
    &self,
    signer: Signer,
    id: CampaignId,
    amount: Amount,
  ) -> BoxFuture<'_, Result<PendingHandle, Error>>;

  fn submit_end(
    &self,
    signer: Signer,
    id: CampaignId,
  ) -> BoxFuture<'_, Result<PendingHandle, Error>>;

  /// Routes a validated call to the matching submit operation.
  fn submit(
    &self,
    signer: Signer,
    call: Call,
  ) -> BoxFuture<'_, Result<PendingHandle, Error>> {
    match call {
      Call::CreateCampaign {
        goal,
        title,
        description,
      } => self.submit_create(signer, goal, title, description),
      Call::Donate { id, value } => self.submit_donate(signer, id, value),
      Call::EndCampaign { id } => self.submit_end(signer, id),
    }
  }
}
