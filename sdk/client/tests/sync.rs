use {
  common::{create_remotely, Harness},
  crowdfund_client_sdk::{memory::Mining, Error, RefreshTrigger},
  std::{sync::Arc, time::Duration},
  tokio::time::sleep,
};

mod common;

#[tokio::test]
async fn refresh_is_idempotent() -> anyhow::Result<()> {
  let h = Harness::new(Mining::Instant);
  create_remotely(&h, "Fund A").await?;
  create_remotely(&h, "Fund B").await?;

  let mut changes = h.client.subscribe();
  let first = h.client.mount().await?;
  assert!(changes.has_changed()?);
  changes.borrow_and_update();

  let second = h.client.refresh().await?;
  assert_eq!(first, second);
  assert!(Arc::ptr_eq(&first, &second));
  assert!(!changes.has_changed()?);
  Ok(())
}

#[tokio::test]
async fn snapshot_mirrors_remote_records() -> anyhow::Result<()> {
  let h = Harness::new(Mining::Instant);
  for title in ["Fund A", "Fund B", "Fund C"] {
    create_remotely(&h, title).await?;
  }

  let snapshot = h.client.mount().await?;
  assert_eq!(snapshot.count(), 3);
  assert_eq!(snapshot.campaigns(), h.ledger.campaigns().as_slice());
  for (index, campaign) in snapshot.iter().enumerate() {
    assert_eq!(campaign.id, index as u64);
  }
  Ok(())
}

#[tokio::test]
async fn failed_record_read_keeps_previous_snapshot() -> anyhow::Result<()> {
  let h = Harness::new(Mining::Instant);
  for title in ["Fund A", "Fund B", "Fund C"] {
    h.client.request_create("1000", title, "").await.into_result()?;
  }
  let before = h.client.snapshot();
  assert_eq!(before.count(), 3);

  h.ledger.fail_reads_of(1);

  // the transaction itself went through even though the
  // resync that followed it could not complete
  h.client.request_create("1000", "Fund D", "").await.into_result()?;
  assert_eq!(h.ledger.campaigns().len(), 4);
  assert_eq!(h.client.snapshot(), before);

  assert!(matches!(h.client.refresh().await, Err(Error::Transport(_))));
  assert_eq!(h.client.snapshot(), before);

  h.ledger.heal_reads();
  assert_eq!(h.client.refresh().await?.count(), 4);
  Ok(())
}

#[tokio::test]
async fn unreachable_ledger_keeps_previous_snapshot() -> anyhow::Result<()> {
  let h = Harness::new(Mining::Instant);
  create_remotely(&h, "Fund A").await?;
  let before = h.client.mount().await?;

  h.ledger.disconnect();
  assert!(matches!(h.client.refresh().await, Err(Error::Transport(_))));
  assert_eq!(h.client.snapshot(), before);

  h.ledger.reconnect();
  assert_eq!(h.client.refresh().await?, before);
  Ok(())
}

#[tokio::test]
async fn concurrent_refreshes_are_coalesced() -> anyhow::Result<()> {
  let h = Harness::new(Mining::Instant);
  create_remotely(&h, "Fund A").await?;
  h.ledger.pause_reads();

  let (first, second, third, _) = tokio::join!(
    h.client.refresh(),
    h.client.refresh(),
    h.client.scheduler().refresh(RefreshTrigger::ConnectionChange),
    async {
      h.refreshes(1).await;
      sleep(Duration::from_millis(20)).await;
      h.ledger.resume_reads();
    }
  );

  let (first, second, third) = (first?, second?, third?);
  assert_eq!(h.client.scheduler().refreshes_started(), 1);
  assert!(Arc::ptr_eq(&first, &second));
  assert!(Arc::ptr_eq(&first, &third));
  assert_eq!(first.count(), 1);

  // one count read plus one record read
  assert_eq!(h.ledger.reads(), 2);
  Ok(())
}

#[tokio::test]
async fn mutation_refresh_never_reuses_an_earlier_read() -> anyhow::Result<()> {
  let h = Harness::new(Mining::Instant);
  h.ledger.pause_reads();

  let scheduler = h.client.scheduler();
  let (manual, mutation, _) = tokio::join!(
    scheduler.refresh(RefreshTrigger::Manual),
    async {
      h.refreshes(1).await;
      scheduler.refresh(RefreshTrigger::Mutation).await
    },
    async {
      h.refreshes(1).await;
      sleep(Duration::from_millis(20)).await;
      h.ledger.resume_reads();
    }
  );

  manual?;
  mutation?;
  assert_eq!(scheduler.refreshes_started(), 2);
  Ok(())
}

#[tokio::test]
async fn sequential_refreshes_each_start() -> anyhow::Result<()> {
  let h = Harness::new(Mining::Instant);
  h.client.mount().await?;
  h.client.refresh().await?;
  h.client.refresh().await?;
  assert_eq!(h.client.scheduler().refreshes_started(), 3);
  Ok(())
}

#[tokio::test]
async fn subscribers_see_every_new_snapshot() -> anyhow::Result<()> {
  let h = Harness::new(Mining::Instant);
  let mut changes = h.client.subscribe();
  assert_eq!(changes.borrow_and_update().count(), 0);

  let (outcome, changed) = tokio::join!(
    h.client.request_create("1000", "Fund A", ""),
    changes.changed()
  );
  outcome.into_result()?;
  changed?;
  assert_eq!(changes.borrow_and_update().count(), 1);
  Ok(())
}
