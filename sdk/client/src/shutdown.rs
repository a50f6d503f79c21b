use {
  crate::Error,
  std::{future::Future, sync::Arc},
  tokio::sync::watch,
};

/// Signals that the context consuming the client is gone.
///
/// Once triggered, every in-flight operation guarded by it resolves to
/// [`Error::Cancelled`] and no further state is published.
#[derive(Debug, Clone)]
pub struct Shutdown {
  sender: Arc<watch::Sender<bool>>,
}

impl Default for Shutdown {
  fn default() -> Self {
    let (sender, _) = watch::channel(false);
    Self {
      sender: Arc::new(sender),
    }
  }
}

impl Shutdown {
  pub fn trigger(&self) {
    self.sender.send_replace(true);
  }

  pub fn is_triggered(&self) -> bool {
    *self.sender.borrow()
  }

  /// Resolves once shutdown has been triggered.
  pub async fn triggered(&self) {
    let mut receiver = self.sender.subscribe();
    loop {
      if *receiver.borrow_and_update() {
        return;
      }
      if receiver.changed().await.is_err() {
        // sender gone, nothing can trigger anymore
        return;
      }
    }
  }

  /// Runs the future to completion unless shutdown is triggered first,
  /// in which case the future is dropped mid-flight.
  pub async fn guard<F: Future>(&self, future: F) -> Result<F::Output, Error> {
    if self.is_triggered() {
      return Err(Error::Cancelled);
    }
    tokio::select! {
      output = future => Ok(output),
      _ = self.triggered() => Err(Error::Cancelled),
    }
  }
}
