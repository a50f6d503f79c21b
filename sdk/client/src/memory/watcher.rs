use {
  crate::Confirmation,
  crowdfund_primitives::TxHash,
  dashmap::DashMap,
  tokio::sync::oneshot::{self, Receiver, Sender},
  tracing::warn,
};

/// Delivers confirmations of included transactions to whoever is waiting
/// on them.
///
/// Waiters are registered at submission time, before the transaction can
/// possibly be included, so a confirmation is never missed.
#[derive(Default)]
pub(super) struct ConfirmationWatcher {
  watchlist: DashMap<TxHash, Sender<Confirmation>>,
}

impl ConfirmationWatcher {
  pub fn watch(&self, hash: TxHash) -> Receiver<Confirmation> {
    let (tx, rx) = oneshot::channel();
    self.watchlist.insert(hash, tx);
    rx
  }

  pub fn signal(&self, hash: TxHash, confirmation: Confirmation) {
    if let Some((_, signal)) = self.watchlist.remove(&hash) {
      if signal.send(confirmation).is_err() {
        // the waiting side went away, nothing left to notify
        warn!("Nobody awaits confirmation of transaction {hash}");
      }
    }
  }

  pub fn len(&self) -> usize {
    self.watchlist.len()
  }
}
