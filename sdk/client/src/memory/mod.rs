//! An in-memory remote ledger.
//!
//! Behaves like the deployed crowdfunding contract, including block
//! inclusion, asynchronous confirmations and rejections, and lets tests
//! inject transport failures.

mod chain;
mod mempool;
mod watcher;

use {
  crate::{Error, PendingHandle, RemoteLedger, Signer},
  chain::Chain,
  crowdfund_primitives::{
    Address,
    Amount,
    Block,
    Call,
    Campaign,
    CampaignId,
    Transaction,
  },
  dashmap::DashMap,
  futures::future::{BoxFuture, FutureExt},
  mempool::Mempool,
  parking_lot::Mutex,
  std::{
    collections::HashSet,
    num::NonZeroUsize,
    sync::{
      atomic::{AtomicBool, AtomicU64, Ordering},
      Arc,
    },
    time::Duration,
  },
  tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
  },
  tracing::{debug, info},
  watcher::ConfirmationWatcher,
};

/// When submitted transactions get included in a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mining {
  /// Every submission is included in its own block right away.
  Instant,

  /// Nothing is included until [`MemoryLedger::produce_block`] is called,
  /// or a background miner is started with [`MemoryLedger::start_mining`].
  Manual,
}

struct Faults {
  connected: AtomicBool,
  failing_reads: Mutex<HashSet<CampaignId>>,
  reads_paused: watch::Sender<bool>,
  reads: AtomicU64,
}

struct Inner {
  mining: Mining,
  chain: Mutex<Chain>,
  mempool: Mutex<Mempool>,
  watcher: ConfirmationWatcher,
  nonces: DashMap<Address, u64>,
  faults: Faults,
}

/// Shared handle to an in-memory crowdfunding ledger. Clones refer to
/// the same ledger.
#[derive(Clone)]
pub struct MemoryLedger {
  inner: Arc<Inner>,
}

impl Default for MemoryLedger {
  fn default() -> Self {
    Self::new(Mining::Instant)
  }
}

impl MemoryLedger {
  pub fn new(mining: Mining) -> Self {
    let (reads_paused, _) = watch::channel(false);
    Self {
      inner: Arc::new(Inner {
        mining,
        chain: Mutex::new(Chain::new(
          NonZeroUsize::new(64).expect("non-zero constant"),
        )),
        mempool: Mutex::new(Mempool::default()),
        watcher: ConfirmationWatcher::default(),
        nonces: DashMap::new(),
        faults: Faults {
          connected: AtomicBool::new(true),
          failing_reads: Mutex::new(HashSet::new()),
          reads_paused,
          reads: AtomicU64::new(0),
        },
      }),
    }
  }

  /// Remote truth, bypassing the transport and any injected faults.
  pub fn campaigns(&self) -> Vec<Campaign> {
    self.inner.chain.lock().campaigns().to_vec()
  }

  pub fn height(&self) -> u64 {
    self.inner.chain.lock().last().height
  }

  pub fn recent_blocks(&self) -> Vec<Block> {
    self.inner.chain.lock().recent().cloned().collect()
  }

  /// Transactions submitted but not yet included.
  pub fn pending_transactions(&self) -> usize {
    self.inner.mempool.lock().len()
  }

  /// Transactions whose submitter still waits for a confirmation.
  pub fn awaited_transactions(&self) -> usize {
    self.inner.watcher.len()
  }

  /// Includes all pending transactions in a new block and delivers their
  /// confirmations. Returns `None` when there was nothing to include.
  pub fn produce_block(&self) -> Option<Block> {
    let txs = self.inner.mempool.lock().take();
    if txs.is_empty() {
      return None;
    }

    let (block, confirmations) = self.inner.chain.lock().consume(txs);
    info!(
      "produced block {} with {} transactions",
      block.height,
      block.transactions.len()
    );

    for (hash, confirmation) in confirmations {
      self.inner.watcher.signal(hash, confirmation);
    }
    Some(block)
  }

  /// Produces a block with whatever is pending every `every` until the
  /// returned task is aborted.
  pub fn start_mining(&self, every: Duration) -> JoinHandle<()> {
    let ledger = self.clone();
    tokio::spawn(async move {
      let mut interval = interval(every);
      interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
      loop {
        interval.tick().await;
        ledger.produce_block();
      }
    })
  }

  /// Makes every operation fail with a transport error until reconnected.
  pub fn disconnect(&self) {
    self.inner.faults.connected.store(false, Ordering::SeqCst);
  }

  pub fn reconnect(&self) {
    self.inner.faults.connected.store(true, Ordering::SeqCst);
  }

  /// Makes reads of one campaign record fail with a transport error.
  pub fn fail_reads_of(&self, id: CampaignId) {
    self.inner.faults.failing_reads.lock().insert(id);
  }

  pub fn heal_reads(&self) {
    self.inner.faults.failing_reads.lock().clear();
  }

  /// Holds every read at its start until [`MemoryLedger::resume_reads`].
  pub fn pause_reads(&self) {
    self.inner.faults.reads_paused.send_replace(true);
  }

  pub fn resume_reads(&self) {
    self.inner.faults.reads_paused.send_replace(false);
  }

  /// Number of read operations served so far, count and record reads
  /// alike.
  pub fn reads(&self) -> u64 {
    self.inner.faults.reads.load(Ordering::SeqCst)
  }

  fn ensure_connected(&self) -> Result<(), Error> {
    match self.inner.faults.connected.load(Ordering::SeqCst) {
      true => Ok(()),
      false => Err(Error::Transport("ledger unreachable".into())),
    }
  }

  async fn begin_read(&self) -> Result<(), Error> {
    let mut paused = self.inner.faults.reads_paused.subscribe();
    while *paused.borrow_and_update() {
      if paused.changed().await.is_err() {
        break;
      }
    }
    self.ensure_connected()?;
    self.inner.faults.reads.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }

  fn submit_call(
    &self,
    signer: Signer,
    call: Call,
  ) -> Result<PendingHandle, Error> {
    self.ensure_connected()?;

    // mirrors gas estimation on a real node, calls
    // against unknown campaigns never make it to a block.
    if let Some(id) = call.campaign() {
      if self.inner.chain.lock().get(id).is_none() {
        return Err(Error::NotFound(id));
      }
    }

    let from = signer.address();
    let nonce = {
      let mut nonce = self.inner.nonces.entry(from).or_insert(0);
      let current = *nonce;
      *nonce += 1;
      current
    };

    let tx = Transaction { from, nonce, call };
    let hash = tx.hash();
    let confirmation = self.inner.watcher.watch(hash);
    self.inner.mempool.lock().consume(tx);
    debug!("accepted transaction {hash} from {from}");

    if self.inner.mining == Mining::Instant {
      self.produce_block();
    }

    Ok(PendingHandle::new(hash, async move {
      confirmation.await.map_err(|_| {
        Error::Transport(format!("ledger dropped transaction {hash}"))
      })
    }))
  }
}

impl RemoteLedger for MemoryLedger {
  fn campaign_count(&self) -> BoxFuture<'_, Result<u64, Error>> {
    async move {
      self.begin_read().await?;
      Ok(self.inner.chain.lock().count())
    }
    .boxed()
  }

  fn campaign(&self, id: CampaignId) -> BoxFuture<'_, Result<Campaign, Error>> {
    async move {
      self.begin_read().await?;
      if self.inner.faults.failing_reads.lock().contains(&id) {
        return Err(Error::Transport(format!("reading campaign {id} failed")));
      }
      self
        .inner
        .chain
        .lock()
        .get(id)
        .cloned()
        .ok_or(Error::NotFound(id))
    }
    .boxed()
  }

  fn submit_create(
    &self,
    signer: Signer,
    goal: Amount,
    title: String,
    description: String,
  ) -> BoxFuture<'_, Result<PendingHandle, Error>> {
    let call = Call::CreateCampaign {
      goal,
      title,
      description,
    };
    async move { self.submit_call(signer, call) }.boxed()
  }

  fn submit_donate(
    &self,
    signer: Signer,
    id: CampaignId,
    amount: Amount,
  ) -> BoxFuture<'_, Result<PendingHandle, Error>> {
    async move { self.submit_call(signer, Call::Donate { id, value: amount }) }
      .boxed()
  }

  fn submit_end(
    &self,
    signer: Signer,
    id: CampaignId,
  ) -> BoxFuture<'_, Result<PendingHandle, Error>> {
    async move { self.submit_call(signer, Call::EndCampaign { id }) }.boxed()
  }
}
