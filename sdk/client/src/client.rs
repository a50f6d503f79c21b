use {
  crate::{
    orchestrator::{Outcome, PendingOperation, TransactionOrchestrator},
    scheduler::{RefreshTrigger, SyncScheduler},
    store::{CampaignStore, Snapshot},
    Config,
    Error,
    RemoteLedger,
    Shutdown,
    WalletSession,
  },
  crowdfund_primitives::{CampaignId, Intent},
  std::sync::Arc,
  tokio::sync::watch,
  tracing::info,
};

/// Entry point for anything presenting campaigns to a user.
///
/// Exposes the current snapshot and its change notifications for
/// rendering, and the three intents a user can issue. All pieces share one
/// shutdown signal, so tearing down the consuming context with
/// [`CrowdfundClient::shutdown`] cancels whatever is still in flight.
pub struct CrowdfundClient {
  store: Arc<CampaignStore>,
  scheduler: Arc<SyncScheduler>,
  orchestrator: TransactionOrchestrator,
  wallet: Arc<dyn WalletSession>,
  shutdown: Shutdown,
}

impl CrowdfundClient {
  pub fn new(
    ledger: Arc<dyn RemoteLedger>,
    wallet: Arc<dyn WalletSession>,
    config: Config,
  ) -> Self {
    let shutdown = Shutdown::default();
    let store = Arc::new(CampaignStore::new());
    let scheduler = Arc::new(SyncScheduler::new(
      Arc::clone(&ledger),
      Arc::clone(&store),
      shutdown.clone(),
    ));
    let orchestrator = TransactionOrchestrator::new(
      ledger,
      Arc::clone(&wallet),
      Arc::clone(&scheduler),
      Arc::clone(&store),
      config,
      shutdown.clone(),
    );

    Self {
      store,
      scheduler,
      orchestrator,
      wallet,
      shutdown,
    }
  }

  /// Initial load when the consuming view comes up.
  pub async fn mount(&self) -> Result<Arc<Snapshot>, Error> {
    self.scheduler.refresh(RefreshTrigger::Mount).await
  }

  pub async fn refresh(&self) -> Result<Arc<Snapshot>, Error> {
    self.scheduler.refresh(RefreshTrigger::Manual).await
  }

  pub fn snapshot(&self) -> Arc<Snapshot> {
    self.store.snapshot()
  }

  pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
    self.store.subscribe()
  }

  pub fn is_connected(&self) -> bool {
    self.wallet.is_connected()
  }

  pub fn scheduler(&self) -> &SyncScheduler {
    &self.scheduler
  }

  pub fn pending(&self) -> Vec<PendingOperation> {
    self.orchestrator.pending()
  }

  /// Creates a campaign. `goal` is raw user input in the smallest
  /// currency unit and is validated before anything is submitted.
  pub async fn request_create(
    &self,
    goal: impl Into<String>,
    title: impl Into<String>,
    description: impl Into<String>,
  ) -> Outcome {
    self
      .orchestrator
      .execute(Intent::CreateCampaign {
        goal: goal.into(),
        title: title.into(),
        description: description.into(),
      })
      .await
  }

  /// Donates the configured donation unit.
  pub async fn request_donate(&self, id: CampaignId) -> Outcome {
    self.orchestrator.execute(Intent::Donate { id }).await
  }

  pub async fn request_end(&self, id: CampaignId) -> Outcome {
    self.orchestrator.execute(Intent::EndCampaign { id }).await
  }

  /// Refreshes whenever the wallet (re)connects. Resolves on shutdown.
  pub async fn follow_connection(&self) {
    self
      .scheduler
      .follow_connection(self.wallet.as_ref())
      .await
  }

  /// Tears the client down. In-flight intents resolve as cancelled,
  /// in-flight refreshes never publish their result, and the store
  /// keeps its last snapshot from now on.
  pub fn shutdown(&self) {
    if !self.shutdown.is_triggered() {
      info!("crowdfund client shutting down");
      self.store.close();
      self.shutdown.trigger();
    }
  }
}

impl Drop for CrowdfundClient {
  fn drop(&mut self) {
    self.shutdown();
  }
}
