mod client;
mod config;
mod error;
mod ledger;
mod orchestrator;
mod scheduler;
mod shutdown;
mod store;
mod wallet;

pub mod memory;
pub mod rpc;

pub use {
  client::CrowdfundClient,
  config::{Config, RpcConfig},
  crowdfund_primitives as primitives,
  error::{Error, ValidationError},
  ledger::{Confirmation, PendingHandle, Receipt, RemoteLedger},
  orchestrator::{Outcome, PendingOperation, Phase, TransactionOrchestrator},
  scheduler::{RefreshTrigger, SyncScheduler},
  shutdown::Shutdown,
  store::{CampaignStore, Snapshot},
  wallet::{Signer, StaticWallet, WalletSession},
};
