use {
  serde::{de::DeserializeOwned, Deserialize, Serialize},
  serde_json::Value,
  std::{
    sync::{
      atomic::{AtomicU64, Ordering},
      Arc,
    },
    time::Duration,
  },
  thiserror::Error,
  tracing::trace,
};

/// Error object of a failed JSON-RPC call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorObject {
  pub code: i64,
  pub message: String,
  #[serde(default)]
  pub data: Option<Value>,
}

impl ErrorObject {
  /// Hex encoded revert payload, if the node attached one.
  ///
  /// Nodes disagree on where it goes: some put the hex string directly
  /// in `data`, others nest it one level deeper as `data.data`.
  pub fn revert_data(&self) -> Option<&str> {
    match self.data.as_ref()? {
      Value::String(data) => Some(data),
      Value::Object(object) => object.get("data")?.as_str(),
      _ => None,
    }
  }
}

#[derive(Debug, Error)]
pub enum RpcError {
  #[error("http: {0}")]
  Http(#[from] reqwest::Error),

  #[error("invalid response: {0}")]
  InvalidResponse(String),

  #[error("node error {}: {}", .0.code, .0.message)]
  Node(ErrorObject),
}

#[derive(Serialize)]
struct Request<'a, P: Serialize> {
  jsonrpc: &'static str,
  id: u64,
  method: &'a str,
  params: P,
}

#[derive(Deserialize)]
struct Response {
  #[serde(default)]
  result: Option<Value>,
  #[serde(default)]
  error: Option<ErrorObject>,
}

/// JSON-RPC 2.0 over HTTP POST.
#[derive(Clone)]
pub struct HttpTransport {
  http: reqwest::Client,
  endpoint: String,
  next_id: Arc<AtomicU64>,
}

impl HttpTransport {
  pub fn new(endpoint: String, timeout: Duration) -> Result<Self, RpcError> {
    let http = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      http,
      endpoint,
      next_id: Arc::new(AtomicU64::new(1)),
    })
  }

  pub fn endpoint(&self) -> &str {
    &self.endpoint
  }

  pub async fn request<T: DeserializeOwned>(
    &self,
    method: &str,
    params: impl Serialize,
  ) -> Result<T, RpcError> {
    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
    trace!("rpc request #{id}: {method}");

    // nodes report call failures with non-2xx statuses on some setups,
    // the body still carries the JSON-RPC error object.
    let response: Response = self
      .http
      .post(&self.endpoint)
      .json(&Request {
        jsonrpc: "2.0",
        id,
        method,
        params,
      })
      .send()
      .await?
      .json()
      .await?;

    if let Some(error) = response.error {
      return Err(RpcError::Node(error));
    }

    serde_json::from_value(response.result.unwrap_or(Value::Null))
      .map_err(|e| RpcError::InvalidResponse(format!("{method}: {e}")))
  }
}

#[cfg(test)]
mod tests {
  use {super::ErrorObject, serde_json::json};

  #[test]
  fn revert_data_locations() {
    let flat: ErrorObject = serde_json::from_value(json!({
      "code": 3,
      "message": "execution reverted: Campaign has ended",
      "data": "0x08c379a0"
    }))
    .unwrap();
    assert_eq!(flat.revert_data(), Some("0x08c379a0"));

    let nested: ErrorObject = serde_json::from_value(json!({
      "code": -32603,
      "message": "Internal error",
      "data": { "message": "reverted", "data": "0x4e487b71" }
    }))
    .unwrap();
    assert_eq!(nested.revert_data(), Some("0x4e487b71"));

    let none: ErrorObject = serde_json::from_value(json!({
      "code": -32000,
      "message": "nonce too low"
    }))
    .unwrap();
    assert_eq!(none.revert_data(), None);
  }
}
