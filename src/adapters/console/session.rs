//! Console Session - Dispatch Protocol Commands to the Registry
//!
//! Owns the registry together with the in-memory ledger and currency it
//! runs against, persists the book after every change, journals
//! settlements and keeps the metrics current.
//!
//! Bootstrap sequence:
//! 1. Build the in-memory ledger and currency rail
//! 2. Seed genesis assets, holders and native balances from config
//! 3. Open the file repository and restore the last offer book

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{info, instrument, warn};

use super::protocol::{parse_address, parse_amount, Command, Reply};
use crate::adapters::ledger::InMemoryLedger;
use crate::adapters::metrics::MetricsRegistry;
use crate::adapters::native::InMemoryCurrency;
use crate::adapters::persistence::RepositoryImpl;
use crate::config::{parse_address as parse_config_address, scale, AppConfig, NATIVE_DECIMALS};
use crate::domain::error::RegistryError;
use crate::domain::offer::{CallContext, Posting, Settlement};
use crate::ports::asset_ledger::AssetLedger;
use crate::ports::native_currency::NativeCurrency;
use crate::ports::repository::{BookSnapshot, Repository};
use crate::usecases::registry::OfferRegistry;

/// Registry wired to in-memory collaborators.
pub type MemoryRegistry = OfferRegistry<InMemoryLedger, InMemoryCurrency>;

/// A console session over one registry instance.
pub struct Session {
  registry: Arc<MemoryRegistry>,
  ledger: Arc<InMemoryLedger>,
  currency: Arc<InMemoryCurrency>,
  repository: Option<Arc<dyn Repository>>,
  metrics: Option<Arc<MetricsRegistry>>,
}

impl Session {
  pub fn new(
    registry: Arc<MemoryRegistry>,
    ledger: Arc<InMemoryLedger>,
    currency: Arc<InMemoryCurrency>,
  ) -> Self {
    Self {
      registry,
      ledger,
      currency,
      repository: None,
      metrics: None,
    }
  }

  pub fn with_repository(mut self, repository: Arc<dyn Repository>) -> Self {
    self.repository = Some(repository);
    self
  }

  pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
    self.metrics = Some(metrics);
    self
  }

  /// Build a session from configuration: genesis state, persistence, metrics.
  #[instrument(skip_all, fields(registry = %config.registry.name))]
  pub async fn bootstrap(config: &AppConfig) -> Result<Self> {
    let ledger = Arc::new(InMemoryLedger::new());
    let currency = Arc::new(InMemoryCurrency::new());
    seed_genesis(config, &ledger, &currency).await?;

    let registry = Arc::new(OfferRegistry::with_policy(
      config.registry_address()?,
      Arc::clone(&ledger),
      Arc::clone(&currency),
      config.policy,
    ));

    let mut session = Self::new(registry, ledger, currency);

    if config.metrics.enabled {
      session = session.with_metrics(Arc::new(MetricsRegistry::new()?));
    }

    if config.persistence.enabled {
      let repository = RepositoryImpl::from_data_dir(&config.persistence.data_dir)
        .await
        .context("Failed to open data directory")?;
      if !repository.is_healthy().await {
        warn!(data_dir = %config.persistence.data_dir, "Data directory is not writable");
      }
      let settlements = repository.load_settlements().await?;
      info!(settlements = settlements.len(), "Settlement journal opened");
      if let Some(snapshot) = repository.load_book().await? {
        session.registry.restore(snapshot.offers).await;
      }
      session = session.with_repository(Arc::new(repository));
    }

    session.refresh_gauge().await;
    info!(
      address = %session.registry.address(),
      offers = session.registry.offer_count().await,
      "Session ready"
    );
    Ok(session)
  }

  pub fn registry(&self) -> &Arc<MemoryRegistry> {
    &self.registry
  }

  pub fn ledger(&self) -> &Arc<InMemoryLedger> {
    &self.ledger
  }

  pub fn currency(&self) -> &Arc<InMemoryCurrency> {
    &self.currency
  }

  /// Handle one protocol line and produce the reply line.
  pub async fn handle_line(&self, line: &str) -> String {
    let reply = match Command::parse(line) {
      Ok(command) => self.handle(command).await,
      Err(e) => {
        self.record_failure("parse", &e);
        Reply::failure(&e)
      }
    };
    reply.to_line()
  }

  /// Execute a command, recording metrics for the outcome.
  pub async fn handle(&self, command: Command) -> Reply {
    let operation = command.name();
    match self.execute(command).await {
      Ok(result) => Reply::success(result),
      Err(e) => {
        self.record_failure(operation, &e);
        Reply::failure(&e)
      }
    }
  }

  async fn execute(&self, command: Command) -> Result<serde_json::Value, RegistryError> {
    match command {
      Command::Post {
        caller,
        asset,
        quantity,
        price,
      } => {
        let seller = parse_address("caller", &caller)?;
        let asset = parse_address("asset", &asset)?;
        let quantity = parse_amount("quantity", &quantity)?;
        let price = parse_amount("price", &price)?;

        let posting = self.registry.post(seller, asset, quantity, price).await?;
        self.after_post(&posting).await;
        Ok(json!(posting))
      }
      Command::Fulfil {
        caller,
        asset,
        seller,
        value,
      } => {
        let buyer = parse_address("caller", &caller)?;
        let asset = parse_address("asset", &asset)?;
        let seller = parse_address("seller", &seller)?;
        let value = match value {
          Some(raw) => parse_amount("value", &raw)?,
          None => Default::default(),
        };

        let settlement = self
          .registry
          .fulfil(CallContext::new(buyer, value), asset, seller)
          .await?;
        self.after_fulfil(&settlement).await;
        Ok(json!(settlement))
      }
      Command::Query { asset } => {
        let asset = parse_address("asset", &asset)?;
        Ok(json!(self.registry.query(asset).await?))
      }
      Command::Readiness { asset, seller } => {
        let asset = parse_address("asset", &asset)?;
        let seller = parse_address("seller", &seller)?;
        Ok(json!(self.registry.readiness(asset, seller).await?))
      }
      Command::Approve {
        caller,
        asset,
        spender,
        quantity,
      } => {
        let owner = parse_address("caller", &caller)?;
        let asset = parse_address("asset", &asset)?;
        let spender = match spender {
          Some(raw) => parse_address("spender", &raw)?,
          None => self.registry.address(),
        };
        let quantity = parse_amount("quantity", &quantity)?;
        self.ledger.approve(asset, owner, spender, quantity).await?;
        Ok(json!({ "owner": owner, "spender": spender, "allowance": quantity }))
      }
      Command::Transfer {
        caller,
        asset,
        to,
        quantity,
      } => {
        let from = parse_address("caller", &caller)?;
        let asset = parse_address("asset", &asset)?;
        let to = parse_address("to", &to)?;
        let quantity = parse_amount("quantity", &quantity)?;
        self.ledger.transfer(asset, from, to, quantity).await?;
        Ok(json!({ "from": from, "to": to, "quantity": quantity }))
      }
      Command::Balance { asset, account } => {
        let asset = parse_address("asset", &asset)?;
        let account = parse_address("account", &account)?;
        let balance = self.ledger.balance_of(asset, account).await?;
        Ok(json!({ "asset": asset, "account": account, "balance": balance }))
      }
      Command::NativeBalance { account } => {
        let account = parse_address("account", &account)?;
        let balance = self.currency.balance_of(account).await?;
        Ok(json!({ "account": account, "balance": balance }))
      }
      Command::Metrics => {
        let metrics = self
          .metrics
          .as_ref()
          .ok_or_else(|| RegistryError::Unavailable("metrics are disabled".to_string()))?;
        let text = metrics
          .render()
          .map_err(|e| RegistryError::Unavailable(format!("metrics rendering failed: {e}")))?;
        Ok(json!(text))
      }
    }
  }

  async fn after_post(&self, posting: &Posting) {
    if let Some(metrics) = &self.metrics {
      metrics.offers_posted.with_label_values(&[posting.label()]).inc();
    }
    self.persist_book().await;
  }

  async fn after_fulfil(&self, settlement: &Settlement) {
    if let Some(metrics) = &self.metrics {
      metrics.settlements.inc();
    }
    if let Some(repository) = &self.repository {
      if let Err(e) = repository.append_settlement(settlement).await {
        warn!(settlement_id = %settlement.id, error = %e, "Failed to journal settlement");
      }
    }
    self.persist_book().await;
  }

  /// Write the current offer book to the repository, if one is attached.
  pub async fn persist(&self) -> Result<()> {
    let Some(repository) = &self.repository else {
      return Ok(());
    };
    let snapshot = BookSnapshot::new(self.registry.snapshot().await);
    repository.save_book(&snapshot).await
  }

  async fn persist_book(&self) {
    self.refresh_gauge().await;
    if let Err(e) = self.persist().await {
      warn!(error = %e, "Failed to persist offer book");
    }
  }

  async fn refresh_gauge(&self) {
    if let Some(metrics) = &self.metrics {
      metrics.set_active_offers(self.registry.offer_count().await);
    }
  }

  fn record_failure(&self, operation: &str, err: &RegistryError) {
    if let Some(metrics) = &self.metrics {
      metrics.record_failure(operation, err.kind());
    }
  }
}

/// Register configured assets and fund configured accounts.
async fn seed_genesis(
  config: &AppConfig,
  ledger: &InMemoryLedger,
  currency: &InMemoryCurrency,
) -> Result<()> {
  for asset in &config.assets {
    let address = parse_config_address(&asset.address)?;
    ledger
      .register_asset(address, &asset.symbol, asset.decimals)
      .await
      .with_context(|| format!("Failed to register asset {}", asset.symbol))?;
    for holder in &asset.holders {
      let account = parse_config_address(&holder.account)?;
      ledger
        .mint(address, account, scale(holder.amount, asset.decimals)?)
        .await
        .with_context(|| format!("Failed to mint {} for {account}", asset.symbol))?;
    }
  }

  for account in &config.accounts {
    let address = parse_config_address(&account.address)?;
    currency
      .credit(address, scale(account.native_balance, NATIVE_DECIMALS)?)
      .await
      .with_context(|| format!("Failed to fund {address}"))?;
  }

  info!(
    assets = config.assets.len(),
    accounts = config.accounts.len(),
    "Genesis state seeded"
  );
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::loader::parse_config;
  use serde_json::Value;

  const CONFIG: &str = r#"
[registry]
name = "otc-test"
address = "0x00000000000000000000000000000000000000ee"

[persistence]
enabled = false

[[assets]]
symbol = "SMPL"
address = "0x0000000000000000000000000000000000000070"
decimals = 0
holders = [{ account = "0x0000000000000000000000000000000000000001", amount = 5000 }]

[[accounts]]
address = "0x0000000000000000000000000000000000000002"
native_balance = 1
"#;

  const TOKEN: &str = "0x0000000000000000000000000000000000000070";
  const SELLER: &str = "0x0000000000000000000000000000000000000001";
  const BUYER: &str = "0x0000000000000000000000000000000000000002";

  async fn session() -> Session {
    Session::bootstrap(&parse_config(CONFIG).unwrap()).await.unwrap()
  }

  async fn send(session: &Session, request: Value) -> Value {
    serde_json::from_str(&session.handle_line(&request.to_string()).await).unwrap()
  }

  #[tokio::test]
  async fn test_post_approve_fulfil_over_protocol() {
    let s = session().await;

    let posted = send(&s, json!({"op":"post","caller":SELLER,"asset":TOKEN,"quantity":"1337","price":"1337"})).await;
    assert_eq!(posted["ok"], true);
    assert_eq!(posted["result"]["outcome"], "created");

    let approved = send(&s, json!({"op":"approve","caller":SELLER,"asset":TOKEN,"quantity":"1337"})).await;
    assert_eq!(approved["ok"], true);

    let settled = send(&s, json!({"op":"fulfil","caller":BUYER,"asset":TOKEN,"seller":SELLER,"value":"1337"})).await;
    assert_eq!(settled["ok"], true, "{settled}");

    let balance = send(&s, json!({"op":"balance","asset":TOKEN,"account":BUYER})).await;
    let expected = serde_json::to_value(alloy::primitives::U256::from(1337u64)).unwrap();
    assert_eq!(balance["result"]["balance"], expected);

    let listing = send(&s, json!({"op":"query","asset":TOKEN})).await;
    assert_eq!(listing["result"]["sellers"], json!([]));
  }

  #[tokio::test]
  async fn test_error_kinds_over_protocol() {
    let s = session().await;

    let missing = send(&s, json!({"op":"fulfil","caller":BUYER,"asset":TOKEN,"seller":SELLER,"value":"1"})).await;
    assert_eq!(missing["ok"], false);
    assert_eq!(missing["error"]["kind"], "OfferNotFound");

    let malformed = send(&s, json!({"op":"query","asset":"0xZZ"})).await;
    assert_eq!(malformed["error"]["kind"], "InvalidInput");

    let garbage = s.handle_line("not json").await;
    assert!(garbage.contains("InvalidInput"));
  }

  #[tokio::test]
  async fn test_disabled_metrics_report_unavailable() {
    let config = parse_config(&format!("{CONFIG}\n[metrics]\nenabled = false\n")).unwrap();
    let s = Session::bootstrap(&config).await.unwrap();

    let reply = send(&s, json!({"op":"metrics"})).await;
    assert_eq!(reply["ok"], false);
    assert_eq!(reply["error"]["kind"], "Unavailable");
  }

  #[tokio::test]
  async fn test_metrics_reflect_activity() {
    let s = session().await;
    send(&s, json!({"op":"post","caller":SELLER,"asset":TOKEN,"quantity":"1","price":"1"})).await;
    send(&s, json!({"op":"fulfil","caller":BUYER,"asset":TOKEN,"seller":SELLER,"value":"2"})).await;

    let metrics = send(&s, json!({"op":"metrics"})).await;
    let text = metrics["result"].as_str().unwrap();
    assert!(text.contains("otc_registry_active_offers 1"));
    assert!(text.contains("PaymentMismatch"));
  }
}
