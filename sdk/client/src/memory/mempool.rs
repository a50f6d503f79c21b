use crowdfund_primitives::Transaction;

/// Transactions accepted for submission but not yet included in a block.
#[derive(Default)]
pub(super) struct Mempool {
  txs: Vec<Transaction>,
}

impl Mempool {
  pub fn consume(&mut self, tx: Transaction) {
    self.txs.push(tx);
  }

  pub fn take(&mut self) -> Vec<Transaction> {
    std::mem::take(&mut self.txs)
  }

  pub fn len(&self) -> usize {
    self.txs.len()
  }
}
