use {
  crate::{Confirmation, Receipt},
  crowdfund_primitives::{Block, Call, Campaign, CampaignId, Transaction, TxHash},
  std::{collections::VecDeque, num::NonZeroUsize},
  tracing::info,
};

/// Authoritative state of the in-memory ledger.
///
/// Applies transactions block by block following the rules of the
/// deployed crowdfunding contract, and remembers a bounded number of
/// recent blocks.
pub(super) struct Chain {
  campaigns: Vec<Campaign>,
  history_len: usize,
  recent: VecDeque<Block>,
}

impl Chain {
  pub fn new(history_len: NonZeroUsize) -> Self {
    let mut recent = VecDeque::new();
    recent.push_front(Block::zero());
    Self {
      campaigns: vec![],
      history_len: history_len.get(),
      recent,
    }
  }

  pub fn last(&self) -> &Block {
    self
      .recent
      .front()
      .expect("initialized with the zero block")
  }

  pub fn recent(&self) -> impl Iterator<Item = &Block> {
    self.recent.iter()
  }

  pub fn count(&self) -> u64 {
    self.campaigns.len() as u64
  }

  pub fn get(&self, id: CampaignId) -> Option<&Campaign> {
    usize::try_from(id).ok().and_then(|i| self.campaigns.get(i))
  }

  pub fn campaigns(&self) -> &[Campaign] {
    &self.campaigns
  }

  /// Includes the transactions in a new block and executes them in
  /// order. Every transaction gets its own confirmation, failing ones
  /// leave no trace in state.
  pub fn consume(
    &mut self,
    transactions: Vec<Transaction>,
  ) -> (Block, Vec<(TxHash, Confirmation)>) {
    let block = Block::new(self.last(), transactions);
    let height = block.height;

    let mut confirmations = Vec::with_capacity(block.transactions.len());
    for tx in block.transactions.iter() {
      let tx_hash = tx.hash();
      let confirmation = match self.execute(tx) {
        Ok(()) => Confirmation::Confirmed(Receipt {
          tx_hash,
          block_height: height,
        }),
        Err(reason) => Confirmation::Rejected(reason.into()),
      };
      info!("Transaction {tx_hash} result: {confirmation:?}");
      confirmations.push((tx_hash, confirmation));
    }

    self.recent.push_front(block.clone());
    if self.recent.len() > self.history_len {
      self.recent.pop_back();
    }

    (block, confirmations)
  }

  fn execute(&mut self, tx: &Transaction) -> Result<(), &'static str> {
    match &tx.call {
      Call::CreateCampaign {
        goal,
        title,
        description,
      } => {
        self.campaigns.push(Campaign {
          id: self.campaigns.len() as CampaignId,
          owner: tx.from,
          goal: *goal,
          total_raised: Default::default(),
          title: title.clone(),
          description: description.clone(),
          ended: false,
        });
        Ok(())
      }
      Call::Donate { id, value } => {
        let campaign = self.get_mut(*id)?;
        if campaign.ended {
          return Err("Campaign has ended");
        }
        if value.is_zero() {
          return Err("Donation must be greater than zero");
        }
        campaign.total_raised = campaign
          .total_raised
          .checked_add(*value)
          .ok_or("Donation overflows total raised")?;
        Ok(())
      }
      Call::EndCampaign { id } => {
        let campaign = self.get_mut(*id)?;
        if campaign.owner != tx.from {
          return Err("Only the owner can end the campaign");
        }
        if campaign.ended {
          return Err("Campaign already ended");
        }
        campaign.ended = true;
        Ok(())
      }
    }
  }

  fn get_mut(&mut self, id: CampaignId) -> Result<&mut Campaign, &'static str> {
    usize::try_from(id)
      .ok()
      .and_then(|i| self.campaigns.get_mut(i))
      .ok_or("Campaign does not exist")
  }
}
