use {
  clap::{Parser, Subcommand},
  crowdfund_client_sdk::RpcConfig,
  crowdfund_primitives::{Address, CampaignId},
  humantime::Duration,
};

/// Crowdfund Client
///
/// Lists and inspects fundraising campaigns of a deployed crowdfunding
/// contract and submits campaign creations, donations and endings.
#[derive(Debug, Parser)]
pub struct Settings {
  /// JSON-RPC endpoint of the node hosting the contract
  #[clap(long,
    default_value = "http://127.0.0.1:8545",
    value_name = "URL")]
  rpc_url: String,

  /// Address of the crowdfunding contract
  #[clap(long,
    default_value = "0x5FbDB2315678afecb367f032d93F642f64180aa3",
    value_name = "ADDRESS")]
  contract: Address,

  /// Node-managed account that signs transactions.
  /// Without it the client can only read.
  #[clap(long, short, value_name = "ADDRESS")]
  from: Option<Address>,

  /// How often to poll for transaction receipts
  #[clap(long,
    default_value = "1s",
    value_name = "DURATION")]
  poll_interval: Duration,

  #[clap(subcommand)]
  pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
  /// List all campaigns
  List,

  /// Show a single campaign
  Show { id: CampaignId },

  /// Create a new campaign
  Create {
    /// Goal in the smallest currency unit
    #[clap(long, short)]
    goal: String,

    #[clap(long, short, default_value = "")]
    title: String,

    #[clap(long, short, default_value = "")]
    description: String,
  },

  /// Donate the fixed donation unit to a campaign
  Donate { id: CampaignId },

  /// End a campaign you own
  End { id: CampaignId },

  /// Keep the campaign list on screen, refreshing periodically
  Watch {
    #[clap(long, short, default_value = "5s", value_name = "DURATION")]
    every: Duration,
  },
}

impl Settings {
  pub fn rpc_config(&self) -> RpcConfig {
    RpcConfig {
      endpoint: self.rpc_url.clone(),
      contract: self.contract,
      poll_interval: self.poll_interval.into(),
      ..Default::default()
    }
  }

  pub fn signer(&self) -> Option<Address> {
    self.from
  }
}
