use {
  crate::{
    store::{CampaignStore, Snapshot},
    Error,
    RemoteLedger,
    Shutdown,
    WalletSession,
  },
  crowdfund_primitives::Campaign,
  futures::{
    future::{BoxFuture, Shared},
    stream::{self, StreamExt, TryStreamExt},
    FutureExt,
  },
  parking_lot::Mutex,
  std::{
    fmt::Display,
    sync::{
      atomic::{AtomicU64, Ordering},
      Arc,
    },
  },
  tracing::{debug, info, warn},
};

/// What prompted a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
  /// The consuming view was just mounted.
  Mount,

  /// A state-changing transaction was confirmed.
  Mutation,

  /// The wallet connected.
  ConnectionChange,

  /// Explicitly requested by the user or the caller.
  Manual,
}

impl RefreshTrigger {
  /// A refresh after a confirmed mutation must observe that mutation,
  /// so it can't piggyback on a read that began before the confirmation.
  fn needs_fresh_start(&self) -> bool {
    matches!(self, RefreshTrigger::Mutation)
  }
}

impl Display for RefreshTrigger {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      RefreshTrigger::Mount => "mount",
      RefreshTrigger::Mutation => "mutation",
      RefreshTrigger::ConnectionChange => "connection change",
      RefreshTrigger::Manual => "manual",
    };
    write!(f, "{name}")
  }
}

/// Upper bound on campaign records read from the ledger at the same time
/// during one refresh.
const MAX_CONCURRENT_READS: usize = 8;

type RefreshFuture = Shared<BoxFuture<'static, Result<Arc<Snapshot>, Error>>>;

struct InFlight {
  /// Sequence number assigned when the refresh started.
  seq: u64,
  future: RefreshFuture,
}

enum Plan {
  Join(u64, RefreshFuture),
  WaitOut(RefreshFuture),
  Start(u64, RefreshFuture),
}

/// Decides when the campaign store is rebuilt from remote state and makes
/// sure at most one rebuild is in flight at any time.
///
/// Requests arriving while a refresh is running are coalesced into it
/// rather than queued. The one exception are refreshes following a
/// confirmed mutation: those only join a refresh that started after they
/// were requested, otherwise they wait the running one out first.
pub struct SyncScheduler {
  ledger: Arc<dyn RemoteLedger>,
  store: Arc<CampaignStore>,
  shutdown: Shutdown,
  inflight: Mutex<Option<InFlight>>,
  started: AtomicU64,
}

impl SyncScheduler {
  pub fn new(
    ledger: Arc<dyn RemoteLedger>,
    store: Arc<CampaignStore>,
    shutdown: Shutdown,
  ) -> Self {
    Self {
      ledger,
      store,
      shutdown,
      inflight: Mutex::new(None),
      started: AtomicU64::new(0),
    }
  }

  /// Number of refreshes actually started, coalesced requests not counted.
  pub fn refreshes_started(&self) -> u64 {
    self.started.load(Ordering::SeqCst)
  }

  /// Requests that the store be brought up to date with the remote ledger.
  ///
  /// On success the snapshot held by the store after this refresh is
  /// returned. On failure the store keeps its previous snapshot and the
  /// error is reported to every request coalesced into this refresh.
  pub async fn refresh(
    &self,
    trigger: RefreshTrigger,
  ) -> Result<Arc<Snapshot>, Error> {
    let requested_after = self.started.load(Ordering::SeqCst);

    loop {
      let plan = self.plan(trigger, requested_after);
      let (seq, future) = match plan {
        Plan::Join(seq, future) => {
          debug!("{trigger} refresh joins in-flight refresh #{seq}");
          (seq, future)
        }
        Plan::Start(seq, future) => {
          info!("{trigger} refresh #{seq} started");
          (seq, future)
        }
        Plan::WaitOut(stale) => {
          debug!("{trigger} refresh waits for a refresh that began earlier");
          let _ = self.shutdown.guard(stale).await?;
          continue;
        }
      };

      let result = self.shutdown.guard(future).await.and_then(|r| r);
      self.retire(seq);
      return result;
    }
  }

  /// Keeps refreshing every time the wallet becomes connected,
  /// until the client shuts down or the wallet goes away.
  pub async fn follow_connection(&self, wallet: &dyn WalletSession) {
    let mut changes = wallet.connection_changes();
    let _ = changes.borrow_and_update();

    loop {
      tokio::select! {
        changed = changes.changed() => {
          if changed.is_err() {
            break;
          }
          let connected = *changes.borrow_and_update();
          if connected {
            if let Err(e) = self.refresh(RefreshTrigger::ConnectionChange).await {
              warn!("refresh after wallet connection failed: {e}");
            }
          }
        }
        _ = self.shutdown.triggered() => break,
      }
    }
  }

  fn plan(&self, trigger: RefreshTrigger, requested_after: u64) -> Plan {
    let mut slot = self.inflight.lock();
    if let Some(inflight) = slot.as_ref() {
      if inflight.future.peek().is_none() {
        if !trigger.needs_fresh_start() || inflight.seq > requested_after {
          return Plan::Join(inflight.seq, inflight.future.clone());
        }
        return Plan::WaitOut(inflight.future.clone());
      }
    }

    let seq = self.started.fetch_add(1, Ordering::SeqCst) + 1;
    let future = fetch_snapshot(
      Arc::clone(&self.ledger),
      Arc::clone(&self.store),
      self.shutdown.clone(),
      seq,
    )
    .boxed()
    .shared();

    *slot = Some(InFlight {
      seq,
      future: future.clone(),
    });
    Plan::Start(seq, future)
  }

  fn retire(&self, seq: u64) {
    let mut slot = self.inflight.lock();
    if slot.as_ref().map(|inflight| inflight.seq) == Some(seq) {
      *slot = None;
    }
  }
}

/// Reads the count and then every record in `0..count`, and swaps the
/// result into the store only if all of it was read successfully.
async fn fetch_snapshot(
  ledger: Arc<dyn RemoteLedger>,
  store: Arc<CampaignStore>,
  shutdown: Shutdown,
  seq: u64,
) -> Result<Arc<Snapshot>, Error> {
  let result = async {
    let count = ledger.campaign_count().await?;
    let records: Vec<Campaign> = stream::iter(0..count)
      .map(|id| ledger.campaign(id))
      .buffered(MAX_CONCURRENT_READS)
      .try_collect()
      .await?;
    Snapshot::from_records(records).ok_or_else(|| {
      Error::Transport("remote returned records out of order".into())
    })
  }
  .await;

  match result {
    Ok(snapshot) if shutdown.is_triggered() => {
      debug!("refresh #{seq} finished after shutdown, discarding {} campaigns", snapshot.count());
      Err(Error::Cancelled)
    }
    Ok(snapshot) => {
      info!("refresh #{seq} fetched {} campaigns", snapshot.count());
      Ok(store.replace(snapshot))
    }
    Err(e) => {
      warn!("refresh #{seq} failed, keeping previous snapshot: {e}");
      Err(e)
    }
  }
}
