use {
  crate::{
    ledger::{Confirmation, Receipt},
    scheduler::{RefreshTrigger, SyncScheduler},
    store::CampaignStore,
    Config,
    Error,
    RemoteLedger,
    Shutdown,
    ValidationError,
    WalletSession,
  },
  crowdfund_primitives::{Amount, Call, Intent, TxHash},
  dashmap::DashMap,
  std::{
    fmt::Display,
    sync::{
      atomic::{AtomicU64, Ordering},
      Arc,
    },
  },
  tracing::{debug, info, warn},
};

/// Lifecycle of a single intent.
///
/// ```text
/// Idle -> Validating -> Submitting -> AwaitingConfirmation -> Succeeded
///              |             |                 |
///              +-------------+-----------------+-----------> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
  Idle,
  Validating,
  Submitting,
  AwaitingConfirmation,
  Succeeded,
  Failed,
}

impl Phase {
  pub fn is_terminal(&self) -> bool {
    matches!(self, Phase::Succeeded | Phase::Failed)
  }

  pub fn can_advance_to(&self, next: Phase) -> bool {
    use Phase::*;
    matches!(
      (self, next),
      (Idle, Validating)
        | (Validating, Submitting)
        | (Submitting, AwaitingConfirmation)
        | (AwaitingConfirmation, Succeeded)
        | (Idle | Validating | Submitting | AwaitingConfirmation, Failed)
    )
  }
}

impl Display for Phase {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    std::fmt::Debug::fmt(self, f)
  }
}

/// An intent that is still being processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation {
  pub id: u64,
  pub intent: Intent,
  pub phase: Phase,

  /// Known once the transaction was accepted for submission.
  pub tx_hash: Option<TxHash>,
}

/// Terminal result of an intent, for user feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  Succeeded(Receipt),
  Failed(Error),
}

impl Outcome {
  pub fn is_success(&self) -> bool {
    matches!(self, Outcome::Succeeded(_))
  }

  pub fn error(&self) -> Option<&Error> {
    match self {
      Outcome::Succeeded(_) => None,
      Outcome::Failed(e) => Some(e),
    }
  }

  pub fn into_result(self) -> Result<Receipt, Error> {
    match self {
      Outcome::Succeeded(receipt) => Ok(receipt),
      Outcome::Failed(e) => Err(e),
    }
  }
}

/// Registry entry of an in-flight operation. Removes itself from the
/// registry when the operation completes or is dropped mid-flight.
struct Tracked<'a> {
  id: u64,
  operations: &'a DashMap<u64, PendingOperation>,
}

impl<'a> Tracked<'a> {
  fn advance(&self, next: Phase) {
    if let Some(mut op) = self.operations.get_mut(&self.id) {
      if !op.phase.can_advance_to(next) {
        warn!("operation {} tried to move from {} to {next}", self.id, op.phase);
        return;
      }
      debug!("operation {} ({}): {} -> {next}", self.id, op.intent, op.phase);
      op.phase = next;
    }
  }

  fn submitted(&self, tx_hash: TxHash) {
    if let Some(mut op) = self.operations.get_mut(&self.id) {
      op.tx_hash = Some(tx_hash);
    }
  }
}

impl<'a> Drop for Tracked<'a> {
  fn drop(&mut self) {
    self.operations.remove(&self.id);
  }
}

/// Drives user intents through validation, submission and confirmation,
/// and resynchronizes the campaign store after every confirmed change.
///
/// Nothing is ever retried automatically. Submitting a transaction twice
/// is not safe, so a failed intent needs a new explicit request.
pub struct TransactionOrchestrator {
  ledger: Arc<dyn RemoteLedger>,
  wallet: Arc<dyn WalletSession>,
  scheduler: Arc<SyncScheduler>,
  store: Arc<CampaignStore>,
  config: Config,
  shutdown: Shutdown,
  operations: DashMap<u64, PendingOperation>,
  next_id: AtomicU64,
}

impl TransactionOrchestrator {
  pub fn new(
    ledger: Arc<dyn RemoteLedger>,
    wallet: Arc<dyn WalletSession>,
    scheduler: Arc<SyncScheduler>,
    store: Arc<CampaignStore>,
    config: Config,
    shutdown: Shutdown,
  ) -> Self {
    Self {
      ledger,
      wallet,
      scheduler,
      store,
      config,
      shutdown,
      operations: DashMap::new(),
      next_id: AtomicU64::new(0),
    }
  }

  /// Operations currently in flight, oldest first.
  pub fn pending(&self) -> Vec<PendingOperation> {
    let mut ops: Vec<_> =
      self.operations.iter().map(|op| op.value().clone()).collect();
    ops.sort_by_key(|op| op.id);
    ops
  }

  /// Runs one intent to its terminal outcome.
  ///
  /// On success the store has already been resynchronized (or the attempt
  /// to do so has failed and was logged) by the time this returns.
  pub async fn execute(&self, intent: Intent) -> Outcome {
    let id = self.next_id.fetch_add(1, Ordering::SeqCst);
    self.operations.insert(id, PendingOperation {
      id,
      intent: intent.clone(),
      phase: Phase::Idle,
      tx_hash: None,
    });
    let tracked = Tracked {
      id,
      operations: &self.operations,
    };

    let result = self
      .shutdown
      .guard(self.drive(&tracked, &intent))
      .await
      .and_then(|r| r);

    match result {
      Ok(receipt) => {
        info!("{intent} confirmed in block {}", receipt.block_height);
        // a failed resync does not undo a confirmed transaction
        if let Err(e) = self.scheduler.refresh(RefreshTrigger::Mutation).await {
          warn!("resync after {intent} failed: {e}");
        }
        Outcome::Succeeded(receipt)
      }
      Err(e) => {
        tracked.advance(Phase::Failed);
        warn!("{intent} failed: {e}");
        Outcome::Failed(e)
      }
    }
  }

  async fn drive(
    &self,
    tracked: &Tracked<'_>,
    intent: &Intent,
  ) -> Result<Receipt, Error> {
    tracked.advance(Phase::Validating);
    let call = self.validate(intent)?;

    tracked.advance(Phase::Submitting);
    let signer = match self.wallet.is_connected() {
      true => self.wallet.signer().ok_or_else(Error::no_signer)?,
      false => return Err(Error::no_signer()),
    };

    let handle = self.ledger.submit(signer, call).await?;
    tracked.submitted(handle.tx_hash());
    tracked.advance(Phase::AwaitingConfirmation);
    debug!("{intent} submitted as {}", handle.tx_hash());

    match handle.wait().await? {
      Confirmation::Confirmed(receipt) => {
        tracked.advance(Phase::Succeeded);
        Ok(receipt)
      }
      Confirmation::Rejected(reason) => Err(Error::RemoteRejection(reason)),
    }
  }

  /// Local checks that need no network round trip.
  fn validate(&self, intent: &Intent) -> Result<Call, ValidationError> {
    match intent {
      Intent::CreateCampaign {
        goal,
        title,
        description,
      } => {
        let goal: Amount = goal.parse()?;
        if self.config.require_title && title.trim().is_empty() {
          return Err(ValidationError::EmptyTitle);
        }
        Ok(Call::CreateCampaign {
          goal,
          title: title.clone(),
          description: description.clone(),
        })
      }
      Intent::Donate { id } => {
        self.ensure_not_ended(*id)?;
        Ok(Call::Donate {
          id: *id,
          value: self.config.donation_unit,
        })
      }
      Intent::EndCampaign { id } => {
        self.ensure_not_ended(*id)?;
        Ok(Call::EndCampaign { id: *id })
      }
    }
  }

  fn ensure_not_ended(&self, id: u64) -> Result<(), ValidationError> {
    if !self.config.reject_ended_locally {
      return Ok(());
    }
    match self.store.snapshot().get(id) {
      Some(campaign) if campaign.ended => Err(ValidationError::CampaignEnded(id)),
      _ => Ok(()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::Phase::{self, *};

  #[test]
  fn phase_transitions() {
    let happy = [
      Idle,
      Validating,
      Submitting,
      AwaitingConfirmation,
      Succeeded,
    ];
    for pair in happy.windows(2) {
      assert!(pair[0].can_advance_to(pair[1]), "{:?}", pair);
    }

    for phase in [Idle, Validating, Submitting, AwaitingConfirmation] {
      assert!(phase.can_advance_to(Failed));
      assert!(!phase.is_terminal());
    }

    // terminal phases go nowhere
    for next in [Idle, Validating, Submitting, AwaitingConfirmation, Succeeded, Failed] {
      assert!(!Succeeded.can_advance_to(next));
      assert!(!Failed.can_advance_to(next));
    }

    // no skipping ahead or going back
    assert!(!Validating.can_advance_to(AwaitingConfirmation));
    assert!(!Submitting.can_advance_to(Succeeded));
    assert!(!AwaitingConfirmation.can_advance_to(Submitting));
    assert!(!Phase::Idle.can_advance_to(Succeeded));
  }
}
