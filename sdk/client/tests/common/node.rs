use {
  parking_lot::Mutex,
  serde_json::{json, Value},
  std::sync::Arc,
  tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
  },
};

/// What the node answers to one JSON-RPC request.
pub enum Reply {
  Result(Value),
  Error(Value),

  /// A bare HTTP failure with a body that is not JSON,
  /// like a proxy in front of the node would send.
  Status(u16),
}

type Handler = dyn Fn(&str, &Value) -> Reply + Send + Sync;

/// A minimal JSON-RPC node on a local port. Every request is answered
/// by the handler and closes its connection.
pub struct Node {
  pub url: String,
  methods: Arc<Mutex<Vec<String>>>,
  task: JoinHandle<()>,
}

impl Node {
  pub async fn start(
    handler: impl Fn(&str, &Value) -> Reply + Send + Sync + 'static,
  ) -> anyhow::Result<Self> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let url = format!("http://{}", listener.local_addr()?);
    let methods = Arc::new(Mutex::new(Vec::new()));
    let handler: Arc<Handler> = Arc::new(handler);

    let task = tokio::spawn({
      let methods = Arc::clone(&methods);
      async move {
        while let Ok((stream, _)) = listener.accept().await {
          let handler = Arc::clone(&handler);
          let methods = Arc::clone(&methods);
          tokio::spawn(async move {
            let _ = serve(stream, handler.as_ref(), &methods).await;
          });
        }
      }
    });

    Ok(Self { url, methods, task })
  }

  /// Methods called so far, in arrival order.
  pub fn methods(&self) -> Vec<String> {
    self.methods.lock().clone()
  }
}

impl Drop for Node {
  fn drop(&mut self) {
    self.task.abort();
  }
}

async fn serve(
  mut stream: TcpStream,
  handler: &Handler,
  methods: &Mutex<Vec<String>>,
) -> anyhow::Result<()> {
  let mut buffer = Vec::new();
  let mut chunk = [0u8; 4096];

  let (body_start, body_len) = loop {
    let n = stream.read(&mut chunk).await?;
    anyhow::ensure!(n != 0, "connection closed mid-request");
    buffer.extend_from_slice(&chunk[..n]);

    if let Some(end) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
      let head = String::from_utf8_lossy(&buffer[..end]).to_lowercase();
      let len = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
      break (end + 4, len);
    }
  };

  while buffer.len() < body_start + body_len {
    let n = stream.read(&mut chunk).await?;
    anyhow::ensure!(n != 0, "connection closed mid-body");
    buffer.extend_from_slice(&chunk[..n]);
  }

  let request: Value =
    serde_json::from_slice(&buffer[body_start..body_start + body_len])?;
  let method = request["method"].as_str().unwrap_or_default().to_string();
  methods.lock().push(method.clone());

  let (status, body) = match handler(&method, &request["params"]) {
    Reply::Result(result) => (
      200,
      json!({ "jsonrpc": "2.0", "id": request["id"], "result": result })
        .to_string(),
    ),
    Reply::Error(error) => (
      200,
      json!({ "jsonrpc": "2.0", "id": request["id"], "error": error })
        .to_string(),
    ),
    Reply::Status(status) => (status, "upstream unavailable".to_string()),
  };

  let response = format!(
    "HTTP/1.1 {status} Node\r\ncontent-type: application/json\r\n\
     content-length: {}\r\nconnection: close\r\n\r\n{body}",
    body.len()
  );
  stream.write_all(response.as_bytes()).await?;
  stream.shutdown().await?;
  Ok(())
}
