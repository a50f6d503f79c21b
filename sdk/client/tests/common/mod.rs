#![allow(dead_code)]

pub mod node;

use {
  crowdfund_client_sdk::{
    memory::{MemoryLedger, Mining},
    primitives::{Address, Amount},
    Config,
    CrowdfundClient,
    Phase,
    RemoteLedger,
    Signer,
    StaticWallet,
  },
  std::{sync::Arc, time::Duration},
};

/// A client wired to an in-memory ledger, with handles to both
/// so tests can act as the user and as the remote side.
pub struct Harness {
  pub ledger: MemoryLedger,
  pub wallet: Arc<StaticWallet>,
  pub client: CrowdfundClient,
}

impl Harness {
  pub fn new(mining: Mining) -> Self {
    Self::with(mining, Some(random_account()), Config::default())
  }

  pub fn with(mining: Mining, account: Option<Address>, config: Config) -> Self {
    let ledger = MemoryLedger::new(mining);
    let wallet = Arc::new(StaticWallet::new(account));
    let client =
      CrowdfundClient::new(Arc::new(ledger.clone()), wallet.clone(), config);
    Self {
      ledger,
      wallet,
      client,
    }
  }

  /// Resolves once the oldest in-flight operation reached `phase`.
  pub async fn reached(&self, phase: Phase) {
    loop {
      if self
        .client
        .pending()
        .first()
        .map(|op| op.phase == phase)
        .unwrap_or(false)
      {
        return;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
  }

  /// Resolves once at least `n` refreshes have been started.
  pub async fn refreshes(&self, n: u64) {
    while self.client.scheduler().refreshes_started() < n {
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
  }
}

/// Creates a campaign straight on the ledger, behind the client's back.
pub async fn create_remotely(h: &Harness, title: &str) -> anyhow::Result<()> {
  h.ledger
    .submit_create(
      Signer::new(random_account()),
      Amount::new(1000),
      title.into(),
      String::new(),
    )
    .await?
    .wait()
    .await?;
  Ok(())
}

pub fn random_account() -> Address {
  Address::new(rand::random())
}

pub fn init_logging() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}
