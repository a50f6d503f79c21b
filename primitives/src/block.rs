use {
  crate::{abi::keccak256, encoding::ToHexString, Transaction, TxHash},
  once_cell::sync::OnceCell,
  serde::{Deserialize, Serialize},
};

/// A batch of transactions included by a ledger at a given height.
#[derive(Clone, Serialize, Deserialize)]
pub struct Block {
  pub height: u64,
  pub parent: [u8; 32],
  pub transactions: Vec<Transaction>,

  #[serde(skip)]
  hash_cache: OnceCell<[u8; 32]>,
}

impl Block {
  pub fn new(parent: &Block, transactions: Vec<Transaction>) -> Self {
    Self {
      height: parent.height + 1,
      parent: *parent.hash(),
      transactions,
      hash_cache: OnceCell::new(),
    }
  }

  pub fn zero() -> Self {
    Self {
      height: 0,
      parent: [0u8; 32],
      transactions: vec![],
      hash_cache: OnceCell::new(),
    }
  }

  pub fn hash(&self) -> &[u8; 32] {
    self.hash_cache.get_or_init(|| {
      keccak256(&rmp_serde::to_vec(self).expect("block is always serializable"))
    })
  }

  pub fn tx_hashes(&self) -> impl Iterator<Item = TxHash> + '_ {
    self.transactions.iter().map(|tx| tx.hash())
  }
}

impl std::fmt::Debug for Block {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Block")
      .field("height", &self.height)
      .field("parent", &self.parent.to_hex())
      .field("hash", &self.hash().to_hex())
      .field("transactions", &self.transactions)
      .finish()
  }
}
