use {
  crowdfund_primitives::{Campaign, CampaignId},
  std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
  tokio::sync::watch,
  tracing::debug,
};

/// A complete, internally consistent copy of all campaigns as of
/// one refresh. Campaign at position `i` always has id `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Snapshot {
  campaigns: Vec<Campaign>,
}

impl Snapshot {
  /// Builds a snapshot out of records fetched for ids `0..count`.
  ///
  /// Returns `None` if the records are not exactly that dense sequence,
  /// a snapshot with holes or duplicates is never constructed.
  pub(crate) fn from_records(campaigns: Vec<Campaign>) -> Option<Self> {
    let dense = campaigns
      .iter()
      .enumerate()
      .all(|(index, campaign)| campaign.id == index as CampaignId);
    dense.then_some(Self { campaigns })
  }

  pub fn count(&self) -> u64 {
    self.campaigns.len() as u64
  }

  pub fn is_empty(&self) -> bool {
    self.campaigns.is_empty()
  }

  pub fn get(&self, id: CampaignId) -> Option<&Campaign> {
    usize::try_from(id)
      .ok()
      .and_then(|index| self.campaigns.get(index))
  }

  pub fn campaigns(&self) -> &[Campaign] {
    &self.campaigns
  }

  pub fn iter(&self) -> impl Iterator<Item = &Campaign> {
    self.campaigns.iter()
  }
}

/// Local cache of the remote ledger state and the single source of truth
/// for anything rendering campaigns.
///
/// There is intentionally no API to edit individual campaigns. The only
/// way data changes is a wholesale swap to a freshly fetched snapshot,
/// so readers never observe a mix of two refreshes.
#[derive(Debug)]
pub struct CampaignStore {
  current: watch::Sender<Arc<Snapshot>>,
  closed: AtomicBool,
}

impl Default for CampaignStore {
  fn default() -> Self {
    Self::new()
  }
}

impl CampaignStore {
  /// Starts out empty, with a count of zero.
  pub fn new() -> Self {
    let (current, _) = watch::channel(Arc::new(Snapshot::default()));
    Self {
      current,
      closed: AtomicBool::new(false),
    }
  }

  /// The last fully built snapshot.
  pub fn snapshot(&self) -> Arc<Snapshot> {
    Arc::clone(&self.current.borrow())
  }

  /// Subscribers are notified every time the snapshot
  /// is replaced with one that differs from the current.
  pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
    self.current.subscribe()
  }

  /// Atomically swaps in a new snapshot.
  ///
  /// Returns the snapshot now held by the store. After the store is
  /// closed this is a no-op that returns the last published snapshot.
  pub(crate) fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
    if self.closed.load(Ordering::Acquire) {
      debug!("store closed, discarding snapshot of {} campaigns", snapshot.count());
      return self.snapshot();
    }

    let snapshot = Arc::new(snapshot);
    let modified = self.current.send_if_modified(|current| {
      if **current == *snapshot {
        false
      } else {
        *current = Arc::clone(&snapshot);
        true
      }
    });

    if modified {
      debug!("installed snapshot with {} campaigns", snapshot.count());
      snapshot
    } else {
      self.snapshot()
    }
  }

  /// Stops accepting new snapshots.
  pub(crate) fn close(&self) {
    self.closed.store(true, Ordering::Release);
  }
}
