//! Example: connect a wallet and mint one token from a drop.
//!
//! Usage:
//!
//!   cargo run -p drops --example mint -- --slug <SLUG> --rpc-url <HTTP_URL> --wallet-url <BRIDGE_URL>
//!
//! Options:
//!   --provider <metamask|walletconnect|coinbase>  Wallet provider kind. Default: metamask.
//!   --dry-run                                     Load supply and price, do not mint.
//!
//! The wallet bridge must speak EIP-1193 over JSON-RPC (an Anvil node with
//! unlocked accounts works for local testing).

use drops::{
    ChainConfig, ContentClient, ContentConfig, DropContract, MintOrchestrator, MintOutcome,
    RpcDrop, ToastEvent, Toaster, WalletConfig, WalletKind, WalletSession,
};
use std::sync::Arc;

fn parse_provider(s: &str) -> Option<WalletKind> {
    match s.to_ascii_lowercase().as_str() {
        "metamask" => Some(WalletKind::MetaMask),
        "walletconnect" => Some(WalletKind::WalletConnect),
        "coinbase" | "coinbasewallet" => Some(WalletKind::CoinbaseWallet),
        _ => None,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args: Vec<String> = std::env::args().collect();
    let mut slug = String::new();
    let mut rpc_url = String::new();
    let mut wallet_url = String::new();
    let mut provider = WalletKind::MetaMask;
    let mut dry_run = false;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--slug" => {
                i += 1;
                slug = args.get(i).cloned().unwrap_or_default();
            }
            "--rpc-url" => {
                i += 1;
                rpc_url = args.get(i).cloned().unwrap_or_default();
            }
            "--wallet-url" => {
                i += 1;
                wallet_url = args.get(i).cloned().unwrap_or_default();
            }
            "--provider" => {
                i += 1;
                match args.get(i).and_then(|s| parse_provider(s)) {
                    Some(k) => provider = k,
                    None => {
                        eprintln!("--provider must be metamask, walletconnect or coinbase");
                        std::process::exit(1);
                    }
                }
            }
            "--dry-run" => dry_run = true,
            _ => {}
        }
        i += 1;
    }
    if slug.is_empty() || rpc_url.is_empty() || wallet_url.is_empty() {
        eprintln!("Usage: mint --slug SLUG --rpc-url URL --wallet-url URL [--provider KIND] [--dry-run]");
        std::process::exit(1);
    }

    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    rt.block_on(async {
        let content = ContentClient::new(&ContentConfig::from_env())?;
        let Some(collection) = content.collection_by_slug(&slug).await? else {
            eprintln!("no drop with slug {}", slug);
            std::process::exit(1);
        };
        let contract_address = collection.contract_address()?;

        let session = Arc::new(WalletSession::from_config(
            &WalletConfig::default().with_provider(provider, wallet_url),
        )?);
        let toaster = Arc::new(Toaster::new());
        let mut toasts = toaster.subscribe();
        tokio::spawn(async move {
            while let Ok(ev) = toasts.recv().await {
                match ev {
                    ToastEvent::Show(t) => println!("[{:?}] {}", t.kind, t.message),
                    ToastEvent::Dismiss(_) => {}
                }
            }
        });

        let drop = RpcDrop::new(&ChainConfig::new(rpc_url), contract_address)?
            .with_wallet(Arc::clone(&session));
        let contract: Arc<dyn DropContract> = Arc::new(drop);
        let orchestrator = Arc::new(MintOrchestrator::new(Some(contract), Arc::clone(&toaster)));
        tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            let wallet = session.subscribe();
            async move { orchestrator.follow_wallet(wallet).await }
        });

        // The drop view mounts first; the wallet connects afterwards.
        if let Err(e) = orchestrator.mount().await {
            tracing::warn!(reason = %e, "supply unavailable");
        }
        if let Err(e) = session.connect(provider).await {
            tracing::warn!(reason = %e, "wallet connect failed");
        }
        let mut state_rx = orchestrator.subscribe();
        let _ = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            state_rx.wait_for(|s| s.connected_address == session.connected_address()),
        )
        .await;
        let state = orchestrator.state();
        println!("{}: {}", collection.title, state.supply_label());
        println!("button: {} (enabled: {})", state.button().label, state.button().enabled);

        if !dry_run && state.button().enabled {
            tokio::select! {
                outcome = orchestrator.mint_nft() => match outcome {
                    MintOutcome::Minted(r) => println!("minted in tx {}", r.tx_hash),
                    MintOutcome::Failed(e) => println!("mint failed: {}", e),
                    MintOutcome::Skipped => println!("mint skipped"),
                },
                // Dropping the mint future runs its cleanup; the claim may still land on chain.
                _ = tokio::signal::ctrl_c() => println!("interrupted"),
            }
            println!("{}", orchestrator.state().supply_label());
        }
        orchestrator.teardown();
        Ok::<_, Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}
