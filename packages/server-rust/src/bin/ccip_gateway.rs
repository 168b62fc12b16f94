//! `ccip-gateway`: standalone CCIP-read gateway serving an in-memory ENS
//! record store for `text(bytes32,string)` and `addr(bytes32)`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use ccip_read_core::{
    namehash, CallContext, CallHandler, DuplicateSelectorPolicy, DynSolValue, GatewayConfig,
    GatewayResponse, HandlerChain, HandlerOutcome, SelectorRegistry, B256,
};
use ccip_read_server::{NetworkConfig, NetworkModule};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use parking_lot::RwLock;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const TEXT_SIGNATURE: &str = "function text(bytes32 node, string key) view returns (string)";
const ADDR_SIGNATURE: &str = "function addr(bytes32 node) view returns (address)";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Interface to bind.
    #[arg(long, env = "CCIP_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to bind (0 for OS-assigned).
    #[arg(long, env = "CCIP_PORT", default_value_t = 8080)]
    port: u16,

    /// Allowed CORS origin. Repeatable; defaults to `*` (any origin).
    #[arg(
        long = "cors-origin",
        env = "CCIP_CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "*"
    )]
    cors_origins: Vec<String>,

    #[arg(long, env = "CCIP_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,

    #[arg(long, env = "CCIP_MAX_BODY_BYTES", default_value_t = 65_536)]
    max_body_bytes: usize,

    /// Fail startup when two signatures share a selector.
    #[arg(long, env = "CCIP_REJECT_DUPLICATE_SELECTORS")]
    reject_duplicate_selectors: bool,

    /// Emit logs as JSON lines.
    #[arg(long, env = "CCIP_LOG_JSON")]
    log_json: bool,

    /// Serve Prometheus metrics on this port.
    #[arg(long, env = "CCIP_METRICS_PORT")]
    metrics_port: Option<u16>,

    /// Seed record as `NAME:KEY=VALUE`, e.g. `vitalik.eth:url=https://vitalik.ca`.
    /// The key `addr` sets the address returned by `addr(bytes32)`.
    #[arg(long = "record", value_parser = parse_record)]
    records: Vec<Record>,
}

impl Args {
    fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            cors_origins: self.cors_origins.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_body_bytes: self.max_body_bytes,
            ..NetworkConfig::default()
        }
    }

    fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            duplicate_selectors: if self.reject_duplicate_selectors {
                DuplicateSelectorPolicy::Reject
            } else {
                DuplicateSelectorPolicy::FirstWins
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Record {
    name: String,
    key: String,
    value: String,
}

fn parse_record(raw: &str) -> Result<Record, String> {
    let (name, rest) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:KEY=VALUE, got `{raw}`"))?;
    let (key, value) = rest
        .split_once('=')
        .ok_or_else(|| format!("expected NAME:KEY=VALUE, got `{raw}`"))?;
    if name.is_empty() || key.is_empty() {
        return Err(format!("name and key must be non-empty in `{raw}`"));
    }
    Ok(Record {
        name: name.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Records keyed by ENS node.
#[derive(Default)]
struct RecordStore {
    texts: RwLock<HashMap<(B256, String), String>>,
    addrs: RwLock<HashMap<B256, Address>>,
}

impl RecordStore {
    fn seed(records: &[Record]) -> anyhow::Result<Self> {
        let store = Self::default();
        for record in records {
            let node = namehash(&record.name);
            if record.key == "addr" {
                let addr: Address = record
                    .value
                    .parse()
                    .with_context(|| format!("invalid address for {}", record.name))?;
                store.addrs.write().insert(node, addr);
            } else {
                store
                    .texts
                    .write()
                    .insert((node, record.key.clone()), record.value.clone());
            }
        }
        Ok(store)
    }

    fn text(&self, node: B256, key: &str) -> String {
        self.texts
            .read()
            .get(&(node, key.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    fn addr(&self, node: B256) -> Address {
        self.addrs.read().get(&node).copied().unwrap_or_default()
    }
}

fn node_arg(ctx: &CallContext) -> anyhow::Result<B256> {
    match ctx.args.get("node") {
        Some(DynSolValue::FixedBytes(word, 32)) => Ok(*word),
        _ => Err(anyhow!("`node` argument is not bytes32")),
    }
}

struct TextResolver(Arc<RecordStore>);

#[async_trait]
impl CallHandler for TextResolver {
    async fn handle(&self, ctx: &mut CallContext) -> anyhow::Result<HandlerOutcome> {
        let node = node_arg(ctx)?;
        let key = ctx
            .args
            .get_str("key")
            .ok_or_else(|| anyhow!("`key` argument is not a string"))?;
        let value = self.0.text(node, key);
        debug!(%node, key, found = !value.is_empty(), "text lookup");

        let encoded = DynSolValue::Tuple(vec![DynSolValue::String(value)]).abi_encode_params();
        Ok(HandlerOutcome::Respond(GatewayResponse::data(encoded)))
    }
}

struct AddrResolver(Arc<RecordStore>);

#[async_trait]
impl CallHandler for AddrResolver {
    async fn handle(&self, ctx: &mut CallContext) -> anyhow::Result<HandlerOutcome> {
        let node = node_arg(ctx)?;
        let addr = self.0.addr(node);
        debug!(%node, %addr, "addr lookup");

        let encoded = DynSolValue::Tuple(vec![DynSolValue::Address(addr)]).abi_encode_params();
        Ok(HandlerOutcome::Respond(GatewayResponse::data(encoded)))
    }
}

fn build_registry(args: &Args, store: &Arc<RecordStore>) -> anyhow::Result<SelectorRegistry> {
    let registry = SelectorRegistry::builder()
        .config(args.gateway_config())
        .function(
            TEXT_SIGNATURE,
            HandlerChain::single(TextResolver(Arc::clone(store))),
        )
        .function(
            ADDR_SIGNATURE,
            HandlerChain::single(AddrResolver(Arc::clone(store))),
        )
        .build()?;
    Ok(registry)
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    if let Some(port) = args.metrics_port {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to install Prometheus exporter")?;
        info!(%addr, "metrics exporter listening");
    }

    let store = Arc::new(RecordStore::seed(&args.records)?);
    let registry = Arc::new(build_registry(&args, &store)?);

    let mut module = NetworkModule::new(args.network_config(), registry);
    let port = module.start().await?;
    info!(port, records = args.records.len(), "ccip-gateway started");

    module.serve(shutdown_signal()).await
}
