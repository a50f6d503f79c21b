//! Remote ledger backed by an Ethereum JSON-RPC node hosting the
//! crowdfunding contract.

mod transport;

pub use transport::{ErrorObject, HttpTransport, RpcError};
use {
  crate::{Confirmation, Error, PendingHandle, Receipt, RemoteLedger, RpcConfig, Signer},
  crowdfund_primitives::{
    abi,
    from_hex,
    Address,
    Amount,
    Call,
    Campaign,
    CampaignId,
    ToHexString,
    TxHash,
  },
  futures::future::{BoxFuture, FutureExt},
  serde::{Deserialize, Serialize},
  std::time::Duration,
  tracing::{debug, info, warn},
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CallRequest {
  #[serde(skip_serializing_if = "Option::is_none")]
  from: Option<Address>,
  to: Address,
  data: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionReceipt {
  block_number: Option<String>,
  status: Option<String>,
}

/// Talks to the deployed contract through `eth_call`,
/// `eth_sendTransaction` and `eth_getTransactionReceipt`.
///
/// Transactions are signed by the node for the unlocked `from` account,
/// which is how local development nodes are normally used.
#[derive(Clone)]
pub struct JsonRpcLedger {
  transport: HttpTransport,
  contract: Address,
  poll_interval: Duration,
}

impl JsonRpcLedger {
  pub fn new(config: RpcConfig) -> Result<Self, Error> {
    let transport =
      HttpTransport::new(config.endpoint, config.request_timeout)
        .map_err(|e| Error::Transport(e.to_string()))?;
    info!(
      "using contract {} at {}",
      config.contract,
      transport.endpoint()
    );
    Ok(Self {
      transport,
      contract: config.contract,
      poll_interval: config.poll_interval,
    })
  }

  async fn read(
    &self,
    data: Vec<u8>,
    target: Option<CampaignId>,
  ) -> Result<Vec<u8>, Error> {
    let request = CallRequest {
      from: None,
      to: self.contract,
      data: data.to_hex(),
      value: None,
    };
    let result: String = self
      .transport
      .request("eth_call", (request, "latest"))
      .await
      .map_err(|e| classify(e, target))?;
    decode_data(&result)
  }

  async fn send(&self, signer: Signer, call: Call) -> Result<PendingHandle, Error> {
    let target = call.campaign();
    let request = CallRequest {
      from: Some(signer.address()),
      to: self.contract,
      data: abi::encode_call(&call).to_hex(),
      value: match call.value() {
        value if value.is_zero() => None,
        value => Some(quantity(value.get())),
      },
    };

    // dry run first so that contract rejections surface
    // as errors of the submission instead of burning gas.
    let _: String = self
      .transport
      .request("eth_call", (&request, "latest"))
      .await
      .map_err(|e| classify(e, target))?;

    let hash: String = self
      .transport
      .request("eth_sendTransaction", [&request])
      .await
      .map_err(|e| classify(e, target))?;
    let tx_hash: TxHash = hash
      .parse()
      .map_err(|_| Error::Transport(format!("invalid transaction hash {hash}")))?;
    debug!("sent {} as {tx_hash}", call.signature());

    let transport = self.transport.clone();
    let poll_interval = self.poll_interval;
    Ok(PendingHandle::new(
      tx_hash,
      await_receipt(transport, tx_hash, poll_interval),
    ))
  }
}

/// Polls for the receipt until one shows up in a block.
///
/// The transaction is already out when this runs, so a failed poll says
/// nothing about its fate and is only logged. Waiting ends on a receipt
/// or when the returned future is dropped.
async fn await_receipt(
  transport: HttpTransport,
  tx_hash: TxHash,
  poll_interval: Duration,
) -> Result<Confirmation, Error> {
  let mut interval = tokio::time::interval(poll_interval);
  loop {
    interval.tick().await;
    let receipt: Option<TransactionReceipt> = match transport
      .request("eth_getTransactionReceipt", [tx_hash.to_string()])
      .await
    {
      Ok(receipt) => receipt,
      Err(e) => {
        warn!("polling receipt of {tx_hash} failed, will retry: {e}");
        continue;
      }
    };

    let Some(receipt) = receipt else {
      continue;
    };
    let Some(block_number) = receipt.block_number else {
      continue;
    };
    let block_height = parse_quantity(&block_number)?;

    // receipts from before status codes were introduced carry none
    let status = receipt.status.as_deref().map(parse_quantity).transpose()?;
    return match status {
      None | Some(1) => Ok(Confirmation::Confirmed(Receipt {
        tx_hash,
        block_height,
      })),
      Some(0) => Ok(Confirmation::Rejected("transaction reverted".into())),
      Some(other) => Err(Error::Transport(format!(
        "receipt of {tx_hash} has unknown status {other}"
      ))),
    };
  }
}

impl RemoteLedger for JsonRpcLedger {
  fn campaign_count(&self) -> BoxFuture<'_, Result<u64, Error>> {
    async move {
      let data = self.read(abi::encode_get_campaign_count(), None).await?;
      Ok(abi::decode_campaign_count(&data)?)
    }
    .boxed()
  }

  fn campaign(&self, id: CampaignId) -> BoxFuture<'_, Result<Campaign, Error>> {
    async move {
      let data = self.read(abi::encode_get_campaign(id), Some(id)).await?;
      Ok(abi::decode_campaign(id, &data)?)
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
    self.send(signer, call).boxed()
  }

  fn submit_donate(
    &self,
    signer: Signer,
    id: CampaignId,
    amount: Amount,
  ) -> BoxFuture<'_, Result<PendingHandle, Error>> {
    self.send(signer, Call::Donate { id, value: amount }).boxed()
  }

  fn submit_end(
    &self,
    signer: Signer,
    id: CampaignId,
  ) -> BoxFuture<'_, Result<PendingHandle, Error>> {
    self.send(signer, Call::EndCampaign { id }).boxed()
  }
}

/// Maps a failed RPC call to a client error.
///
/// Reading past the end of the campaigns array panics inside the
/// contract, for calls that target a campaign that is reported as
/// [`Error::NotFound`]. Any other revert is a rejection by the contract.
fn classify(error: RpcError, target: Option<CampaignId>) -> Error {
  let object = match error {
    RpcError::Node(object) => object,
    other => return Error::Transport(other.to_string()),
  };

  if let Some(data) = object.revert_data() {
    if let Ok(bytes) = from_hex(data) {
      let revert = abi::decode_revert(&bytes);
      return match (target, revert) {
        (Some(id), revert) if revert.is_out_of_bounds() => Error::NotFound(id),
        (_, abi::Revert::Raw(_)) => Error::RemoteRejection(object.message),
        (_, revert) => Error::RemoteRejection(revert.to_string()),
      };
    }
  }

  // code 3 is what nodes use for execution errors
  if object.code == 3 || object.message.contains("revert") {
    Error::RemoteRejection(object.message)
  } else {
    Error::Transport(object.message)
  }
}

fn decode_data(s: &str) -> Result<Vec<u8>, Error> {
  from_hex(s).map_err(|e| Error::Transport(format!("invalid hex data: {e}")))
}

fn quantity(value: u128) -> String {
  format!("{value:#x}")
}

fn parse_quantity(s: &str) -> Result<u64, Error> {
  let digits = s.strip_prefix("0x").unwrap_or(s);
  u64::from_str_radix(digits, 16)
    .map_err(|_| Error::Transport(format!("invalid quantity {s}")))
}
