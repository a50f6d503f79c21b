use {
  crate::settings::{Command, Settings},
  clap::Parser,
  crowdfund_client_sdk::{rpc::JsonRpcLedger, Config, CrowdfundClient, StaticWallet},
  std::{sync::Arc, time::Duration},
  tokio::time::{interval, MissedTickBehavior},
  tracing::{info, subscriber::set_global_default, warn},
  tracing_subscriber::{EnvFilter, FmtSubscriber},
};

mod render;
mod settings;

/// Re-renders the campaign list every time it changes, refreshing
/// every `every` until interrupted.
async fn watch(client: &CrowdfundClient, every: Duration) -> anyhow::Result<()> {
  let mut changes = client.subscribe();
  render::table(&changes.borrow_and_update());

  let mut interval = interval(every);
  interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

  loop {
    tokio::select! {
      _ = interval.tick() => {
        if let Err(e) = client.refresh().await {
          warn!("refresh failed: {e}");
        }
      }
      changed = changes.changed() => {
        changed?;
        let snapshot = changes.borrow_and_update().clone();
        println!();
        render::table(&snapshot);
      }
      _ = tokio::signal::ctrl_c() => {
        client.shutdown();
        return Ok(());
      }
    }
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // configure logging, stdout is reserved for output
  set_global_default(
    FmtSubscriber::builder()
      .with_env_filter(
        EnvFilter::try_from_default_env()
          .unwrap_or_else(|_| EnvFilter::new("info")),
      )
      .with_writer(std::io::stderr)
      .finish(),
  )?;

  // gather CLI parameters
  let settings = Settings::parse();
  info!("startup settings: {settings:#?}");

  let ledger = JsonRpcLedger::new(settings.rpc_config())?;
  let wallet = Arc::new(StaticWallet::new(settings.signer()));
  let client =
    CrowdfundClient::new(Arc::new(ledger), wallet, Config::default());

  // every command starts from a fresh view of the contract,
  // intents need it for local checks against ended campaigns.
  let snapshot = client.mount().await?;

  let outcome = match settings.command {
    Command::List => {
      render::table(&snapshot);
      return Ok(());
    }
    Command::Show { id } => {
      match snapshot.get(id) {
        Some(campaign) => render::details(campaign),
        None => anyhow::bail!("campaign {id} not found"),
      }
      return Ok(());
    }
    Command::Watch { every } => return watch(&client, every.into()).await,
    Command::Create {
      goal,
      title,
      description,
    } => client.request_create(goal, title, description).await,
    Command::Donate { id } => client.request_donate(id).await,
    Command::End { id } => client.request_end(id).await,
  };

  render::receipt(&outcome.into_result()?);
  Ok(())
}
