use {crowdfund_primitives::Address, parking_lot::RwLock, tokio::sync::watch};

/// A handle able to sign transactions on behalf of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signer {
  address: Address,
}

impl Signer {
  pub fn new(address: Address) -> Self {
    Self { address }
  }

  pub fn address(&self) -> Address {
    self.address
  }
}

/// The wallet/session provider as seen by the client.
///
/// The client only needs to know whether a user is connected and whether
/// a signer can be obtained. A missing signer is treated the same way
/// regardless of whether the user disconnected or the provider failed.
pub trait WalletSession: Send + Sync {
  fn is_connected(&self) -> bool;

  fn signer(&self) -> Option<Signer>;

  /// Observes connection state transitions.
  fn connection_changes(&self) -> watch::Receiver<bool>;
}

/// A wallet session backed by a single, explicitly configured account.
///
/// Used when the signing account is managed by the node the client talks
/// to, and in tests to simulate users connecting and disconnecting.
pub struct StaticWallet {
  account: RwLock<Option<Address>>,
  connected: watch::Sender<bool>,
}

impl StaticWallet {
  pub fn new(account: Option<Address>) -> Self {
    let (connected, _) = watch::channel(account.is_some());
    Self {
      account: RwLock::new(account),
      connected,
    }
  }

  pub fn disconnected() -> Self {
    Self::new(None)
  }

  pub fn connect(&self, account: Address) {
    *self.account.write() = Some(account);
    self.connected.send_replace(true);
  }

  pub fn disconnect(&self) {
    *self.account.write() = None;
    self.connected.send_replace(false);
  }
}

impl WalletSession for StaticWallet {
  fn is_connected(&self) -> bool {
    *self.connected.borrow()
  }

  fn signer(&self) -> Option<Signer> {
    let account = *self.account.read();
    account.map(Signer::new)
  }

  fn connection_changes(&self) -> watch::Receiver<bool> {
    self.connected.subscribe()
  }
}

#[cfg(test)]
mod tests {
  use {
    super::{StaticWallet, WalletSession},
    crowdfund_primitives::Address,
  };

  #[test]
  fn connect_and_disconnect() {
    let wallet = StaticWallet::disconnected();
    let changes = wallet.connection_changes();
    assert!(!wallet.is_connected());
    assert!(wallet.signer().is_none());

    let account = Address::new([7u8; 20]);
    wallet.connect(account);
    assert!(wallet.is_connected());
    assert_eq!(wallet.signer().map(|s| s.address()), Some(account));
    assert!(changes.has_changed().unwrap());

    wallet.disconnect();
    assert!(!wallet.is_connected());
    assert!(wallet.signer().is_none());
  }
}
