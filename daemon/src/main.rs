//! Token sidechain daemon: entry point for inspecting a node's ledger store.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use tokenchain_ledger::AssetInfo;
use tokenchain_node::{Node, NodeConfig};
use tokenchain_store_lmdb::{check_integrity, LmdbStore};
use tokenchain_transactions::{OutPoint, ProgramVerifier, Transaction};
use tokenchain_types::{token_string, AssetId, ProgramHash, SignedAmount};
use tokenchain_utils::{init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "tokenchain-daemon", about = "Token sidechain node daemon")]
struct Cli {
    /// Data directory for ledger storage.
    /// When a config file is provided, defaults to the file's value.
    #[arg(long, env = "TOKENCHAIN_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// LMDB map size in bytes.
    #[arg(long, env = "TOKENCHAIN_MAP_SIZE")]
    map_size: Option<usize>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TOKENCHAIN_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TOKENCHAIN_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "TOKENCHAIN_CONFIG")]
    config: Option<PathBuf>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the effective configuration as TOML.
    Config,
    /// Check store integrity and the unspent output index.
    Check,
    /// Show the chain tip.
    Tip,
    /// List registered assets.
    Assets,
    /// Show one asset.
    Asset {
        /// Asset id, hex encoded.
        id: AssetId,
    },
    /// Total unspent value per asset held by an address.
    Balance {
        address: ProgramHash,
    },
    /// Unspent outputs held by an address.
    Unspent {
        address: ProgramHash,
        /// Only list outputs of this asset.
        #[arg(long)]
        asset: Option<AssetId>,
    },
}

/// The daemon only reads state, so no unlocking program is ever accepted.
struct RefuseAll;

impl ProgramVerifier for RefuseAll {
    fn verify(&self, _tx: &Transaction) -> bool {
        false
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let base = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => NodeConfig::default(),
    };
    Ok(NodeConfig {
        data_dir: cli.data_dir.clone().unwrap_or(base.data_dir.clone()),
        map_size: cli.map_size.unwrap_or(base.map_size),
        log_level: cli.log_level.clone().unwrap_or(base.log_level.clone()),
        log_format: cli.log_format.unwrap_or(base.log_format),
        ..base
    })
}

fn open_node(config: &NodeConfig) -> anyhow::Result<Node> {
    Node::open(config.clone(), Arc::new(RefuseAll))
        .with_context(|| format!("opening ledger at {}", config.data_dir.display()))
}

fn asset_json(id: &AssetId, info: &AssetInfo) -> serde_json::Value {
    json!({
        "id": id.to_string(),
        "name": info.name,
        "description": info.description,
        "precision": info.precision,
        "type": format!("{:?}", info.asset_type),
        "controller": info.controller.to_address(),
        "height": info.height,
    })
}

/// Native balances with eight decimals, token balances with eighteen.
fn render(asset: &AssetId, amount: &SignedAmount, native: &AssetId) -> String {
    if asset == native {
        if let Some(value) = amount.to_fixed64() {
            return value.to_string();
        }
    }
    let sign = if amount.is_negative() { "-" } else { "" };
    format!("{sign}{}", token_string(&amount.magnitude()))
}

fn print(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format, &config.log_level)?;

    match cli.command {
        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }
        Command::Check => {
            {
                let store = LmdbStore::open(&config.data_dir, config.map_size)?;
                let report = check_integrity(store.environment())?;
                print(&json!({
                    "entries": report.total_entries,
                    "by_kind": report.entries_by_kind,
                    "errors": report.errors,
                }))?;
                if !report.is_healthy() {
                    anyhow::bail!("store integrity check failed");
                }
            }
            let node = open_node(&config)?;
            let audit = node.chain().audit_unspent_index()?;
            let listed = |outpoints: &[OutPoint]| -> Vec<String> {
                outpoints.iter().map(|o| o.to_string()).collect()
            };
            print(&json!({
                "buckets": audit.buckets,
                "bucket_records": audit.bucket_records,
                "unspent_outputs": audit.unspent_outputs,
                "missing_from_unspent": listed(&audit.missing_from_unspent),
                "missing_from_buckets": listed(&audit.missing_from_buckets),
                "duplicated": listed(&audit.duplicated),
            }))?;
            if !audit.is_consistent() {
                anyhow::bail!("unspent output index is inconsistent");
            }
            tracing::info!("ledger store is consistent");
        }
        Command::Tip => {
            let node = open_node(&config)?;
            match node.tip() {
                Some(tip) => print(&json!({
                    "height": tip.height,
                    "hash": tip.hash.to_string(),
                }))?,
                None => print(&serde_json::Value::Null)?,
            }
        }
        Command::Assets => {
            let node = open_node(&config)?;
            let assets: Vec<_> = node
                .list_assets()?
                .iter()
                .map(|(id, info)| asset_json(id, info))
                .collect();
            print(&serde_json::Value::Array(assets))?;
        }
        Command::Asset { id } => {
            let node = open_node(&config)?;
            let info = node
                .get_asset(&id)?
                .with_context(|| format!("unknown asset {id}"))?;
            print(&asset_json(&id, &info))?;
        }
        Command::Balance { address } => {
            let node = open_node(&config)?;
            let native = node.chain().params().native_asset_id;
            let balances: serde_json::Map<String, serde_json::Value> = node
                .balances(&address)?
                .iter()
                .map(|(asset, amount)| {
                    (asset.to_string(), json!(render(asset, amount, &native)))
                })
                .collect();
            print(&serde_json::Value::Object(balances))?;
        }
        Command::Unspent { address, asset } => {
            let node = open_node(&config)?;
            let unspent: Vec<_> = node
                .list_unspent(&address, asset)?
                .iter()
                .map(|u| {
                    json!({
                        "assetid": u.asset_id.to_string(),
                        "txid": u.tx_id.to_string(),
                        "vout": u.index,
                        "address": u.owner.to_address(),
                        "amount": u.amount,
                        "confirmations": u.confirmations,
                        "outputlock": u.output_lock,
                    })
                })
                .collect();
            print(&serde_json::Value::Array(unspent))?;
        }
    }

    Ok(())
}
