use {
  crowdfund_primitives::{Address, Amount},
  std::time::Duration,
};

/// Client-side policy for turning intents into contract calls.
#[derive(Debug, Clone)]
pub struct Config {
  /// Amount sent with every donation. Donations are a fixed unit,
  /// users do not choose how much they give.
  pub donation_unit: Amount,

  /// When set, creating a campaign with a blank title fails validation
  /// locally. The contract itself accepts empty titles.
  pub require_title: bool,

  /// Reject donations to, and ending of, campaigns that the current
  /// snapshot already shows as ended. `ended` never flips back, so a
  /// stale snapshot can only err on the side of letting the remote
  /// ledger decide.
  pub reject_ended_locally: bool,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      donation_unit: Amount::DONATION_UNIT,
      require_title: false,
      reject_ended_locally: true,
    }
  }
}

/// Connection settings of the JSON-RPC ledger transport.
#[derive(Debug, Clone)]
pub struct RpcConfig {
  /// HTTP endpoint of the node.
  pub endpoint: String,

  /// Address of the deployed crowdfunding contract.
  pub contract: Address,

  /// How often to ask the node for the receipt of
  /// a submitted transaction until it shows up.
  pub poll_interval: Duration,

  /// Upper bound on a single HTTP round trip. This does not bound how
  /// long a transaction may take to confirm.
  pub request_timeout: Duration,
}

impl Default for RpcConfig {
  fn default() -> Self {
    Self {
      endpoint: "http://127.0.0.1:8545".into(),
      contract: "0x5FbDB2315678afecb367f032d93F642f64180aa3"
        .parse()
        .expect("constructed at compile time"),
      poll_interval: Duration::from_secs(1),
      request_timeout: Duration::from_secs(30),
    }
  }
}
