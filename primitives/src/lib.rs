pub mod abi;
mod address;
mod amount;
mod block;
mod call;
mod campaign;
mod encoding;
mod intent;

pub use {
  address::{Address, Error as AddressError},
  amount::{Amount, Error as AmountError},
  block::Block,
  call::{Call, Transaction, TxHash},
  campaign::{Campaign, CampaignId},
  encoding::{from_hex, ToHexString},
  intent::Intent,
};
