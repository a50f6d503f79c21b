use {
  common::{create_remotely, random_account, Harness},
  crowdfund_client_sdk::{
    memory::Mining,
    primitives::Intent,
    Config,
    Error,
    Outcome,
    Phase,
  },
  std::time::Duration,
};

mod common;

#[tokio::test]
async fn disconnected_wallet_cannot_submit() {
  let h = Harness::with(Mining::Instant, None, Config::default());
  assert!(!h.client.is_connected());

  for outcome in [
    h.client.request_create("1000", "Fund A", "").await,
    h.client.request_donate(0).await,
    h.client.request_end(0).await,
  ] {
    assert!(matches!(outcome.error(), Some(Error::Precondition(_))));
  }

  assert_eq!(h.ledger.height(), 0);
  assert_eq!(h.ledger.pending_transactions(), 0);
}

#[tokio::test]
async fn operations_move_through_phases() -> anyhow::Result<()> {
  common::init_logging();
  let h = Harness::new(Mining::Manual);

  let (outcome, observed) = tokio::join!(
    h.client.request_create("1000", "Fund A", ""),
    async {
      h.reached(Phase::AwaitingConfirmation).await;
      let pending = h.client.pending();

      // the campaign is not visible before its block exists
      assert!(h.client.snapshot().is_empty());
      h.ledger.produce_block();
      pending
    }
  );

  let receipt = outcome.into_result()?;
  assert_eq!(observed.len(), 1);
  assert_eq!(observed[0].phase, Phase::AwaitingConfirmation);
  assert_eq!(observed[0].tx_hash, Some(receipt.tx_hash));
  assert!(matches!(observed[0].intent, Intent::CreateCampaign { .. }));

  assert!(h.client.pending().is_empty());
  assert_eq!(h.client.snapshot().count(), 1);
  Ok(())
}

#[tokio::test]
async fn independent_intents_run_concurrently() -> anyhow::Result<()> {
  let h = Harness::new(Mining::Manual);
  let miner = h.ledger.start_mining(Duration::from_millis(10));

  let (a, b, c) = tokio::join!(
    h.client.request_create("1000", "Fund A", ""),
    h.client.request_create("2000", "Fund B", ""),
    h.client.request_create("3000", "Fund C", ""),
  );
  miner.abort();

  a.into_result()?;
  b.into_result()?;
  c.into_result()?;

  let snapshot = h.client.refresh().await?;
  assert_eq!(snapshot.count(), 3);
  let mut titles: Vec<_> =
    snapshot.iter().map(|c| c.title.as_str()).collect();
  titles.sort();
  assert_eq!(titles, ["Fund A", "Fund B", "Fund C"]);
  Ok(())
}

#[tokio::test]
async fn shutdown_cancels_awaiting_intents() {
  common::init_logging();
  let h = Harness::new(Mining::Manual);

  let (outcome, _) = tokio::join!(
    h.client.request_create("1000", "Fund A", ""),
    async {
      h.reached(Phase::AwaitingConfirmation).await;
      h.client.shutdown();
    }
  );
  assert_eq!(outcome, Outcome::Failed(Error::Cancelled));
  assert!(h.client.pending().is_empty());

  // the transaction was already out and still lands remotely,
  // but the store no longer changes
  h.ledger.produce_block();
  assert_eq!(h.ledger.campaigns().len(), 1);
  assert!(h.client.snapshot().is_empty());
  assert_eq!(h.client.refresh().await, Err(Error::Cancelled));
  assert!(h.client.snapshot().is_empty());
}

#[tokio::test]
async fn shutdown_cancels_inflight_refresh() -> anyhow::Result<()> {
  let h = Harness::new(Mining::Instant);
  create_remotely(&h, "Fund A").await?;
  let before = h.client.mount().await?;

  create_remotely(&h, "Fund B").await?;
  h.ledger.pause_reads();

  let (refresh, _) = tokio::join!(h.client.refresh(), async {
    h.refreshes(2).await;
    h.client.shutdown();
    h.ledger.resume_reads();
  });

  assert_eq!(refresh, Err(Error::Cancelled));
  assert_eq!(h.ledger.campaigns().len(), 2);
  assert_eq!(h.client.snapshot(), before);
  Ok(())
}

#[tokio::test]
async fn intents_after_shutdown_are_cancelled() {
  let h = Harness::new(Mining::Instant);
  h.client.shutdown();

  let outcome = h.client.request_create("1000", "Fund A", "").await;
  assert_eq!(outcome, Outcome::Failed(Error::Cancelled));
  assert_eq!(h.ledger.height(), 0);
}

#[tokio::test]
async fn connecting_a_wallet_triggers_refresh() -> anyhow::Result<()> {
  let h = Harness::with(Mining::Instant, None, Config::default());

  tokio::join!(h.client.follow_connection(), async {
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(h.client.scheduler().refreshes_started(), 0);

    h.wallet.connect(random_account());
    h.refreshes(1).await;

    // disconnecting does not refresh
    h.wallet.disconnect();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(h.client.scheduler().refreshes_started(), 1);

    h.client.shutdown();
  });

  assert!(!h.client.is_connected());
  Ok(())
}

#[tokio::test]
async fn rejected_intents_are_not_retried() {
  let h = Harness::new(Mining::Instant);
  let outcome = h.client.request_donate(7).await;
  assert_eq!(outcome.error(), Some(&Error::NotFound(7)));
  assert_eq!(h.ledger.pending_transactions(), 0);
  assert_eq!(h.ledger.height(), 0);
}
