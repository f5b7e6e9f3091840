//! Headless wallet shell.
//!
//! Drives the wallet session and transaction coordinator from the command
//! line, against a JSON-RPC node or the built-in in-memory wallet.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//!                 │                  AppShell                     │
//!   status ──────▶│  WalletSessionManager ──┐                    │
//!   send   ──────▶│  TransactionCoordinator ├──▶ WalletClient ───┼──▶ ProviderGateway
//!                 │  SessionStore ──────────┘    (timeouts)      │    RpcGateway | InMemory
//!                 │                                              │
//!                 │  lifecycle: Shutdown ─▶ monitors, listeners  │
//!                 └──────────────────────────────────────────────┘
//! ```

use alloy::primitives::{Address, U256};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use wallet_shell::config::{load_config, ShellConfig};
use wallet_shell::lifecycle::signals::shutdown_on_ctrl_c;
use wallet_shell::observability::logging::init_logging;
use wallet_shell::provider::{InMemoryProvider, ProviderGateway, RpcGateway};
use wallet_shell::storage::{FileStore, KeyValueStore, MemoryStore};
use wallet_shell::transactions::TransactionRequest;
use wallet_shell::wallet::chains::SUPPORTED_CHAINS;
use wallet_shell::{AppShell, Shutdown};

/// Funded account exposed by `--in-memory`.
const DEV_ACCOUNT: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

#[derive(Parser)]
#[command(name = "wallet-shell")]
#[command(about = "Headless wallet session and transaction shell", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the in-memory wallet instead of a JSON-RPC node
    #[arg(long)]
    in_memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the wallet session and logged-in user
    Status,
    /// Estimate and submit a transfer
    Send {
        /// Recipient address
        #[arg(long)]
        to: String,
        /// Amount in ether
        #[arg(long)]
        value: String,
        /// Wait until the transaction is confirmed or failed
        #[arg(long)]
        wait: bool,
    },
    /// List known chains
    Chains,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ShellConfig::default(),
    };
    init_logging(&config.observability);

    tracing::info!(
        rpc_url = %config.provider.rpc_url,
        in_memory = cli.in_memory,
        "wallet-shell v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if let Commands::Chains = cli.command {
        for chain in SUPPORTED_CHAINS {
            println!(
                "0x{:x}\t{}\t{}\t{}",
                chain.chain_id, chain.name, chain.currency_symbol, chain.explorer
            );
        }
        return Ok(());
    }

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_ctrl_c(shutdown.clone()));

    let mut memory = None;
    let gateway: Arc<dyn ProviderGateway> = if cli.in_memory {
        let account: Address = DEV_ACCOUNT.parse()?;
        let provider = Arc::new(
            InMemoryProvider::new()
                .with_accounts(vec![account])
                .with_balance(account, U256::from(100u64) * U256::from(10u64).pow(U256::from(18u64))),
        );
        memory = Some(provider.clone());
        provider
    } else {
        let gateway = RpcGateway::new(config.provider.clone())?;
        gateway.spawn_event_watcher(shutdown.subscribe());
        Arc::new(gateway)
    };

    let store: Arc<dyn KeyValueStore> = match &config.storage.session_path {
        Some(path) => Arc::new(FileStore::open(path)?),
        None => Arc::new(MemoryStore::new()),
    };

    let shell = AppShell::new(gateway, store, &config, shutdown.clone());
    shell.restore().await;

    match cli.command {
        Commands::Status => {
            let session = shell.wallet().session();
            let decimals = config.transactions.display_decimals;
            let report = json!({
                "connected": session.connected,
                "address": session.address_hex(),
                "balance": session.balance_display(decimals),
                "chainId": session.chain_id,
                "chainName": session.chain_name(),
                "error": session.error.as_ref().map(ToString::to_string),
                "user": shell.current_user(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Send { to, value, wait } => {
            let user = shell.connect_wallet().await?;
            tracing::info!(from = ?user.address, "Wallet ready");

            let transactions = shell.transactions();
            let request = TransactionRequest::new(to, value);
            let estimate = transactions.estimate_gas(&request).await?;
            println!("{}", serde_json::to_string_pretty(&estimate)?);

            let record = transactions
                .send_transaction(&request.with_estimate(&estimate))
                .await?;
            println!("{}", serde_json::to_string_pretty(&record)?);

            if let Some(provider) = &memory {
                // The in-memory wallet has no block production of its own.
                provider.mine(&record.hash, true, 21_000);
            }

            if wait {
                let mut signal = shutdown.subscribe();
                loop {
                    if let Some(current) = transactions.transaction(&record.hash) {
                        if current.status.is_terminal() {
                            println!("{}", serde_json::to_string_pretty(&current)?);
                            break;
                        }
                    }
                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_millis(500)) => {}
                        _ = signal.recv() => break,
                    }
                }
            }
        }
        Commands::Chains => {}
    }

    shell.teardown();
    tracing::info!("Shutdown complete");
    Ok(())
}
