//! Mint orchestrator for a drop detail view.
//!
//! Phases: `Idle → SupplyLoading → Ready → Minting → (MintSucceeded | MintFailed) → Ready`.
//!
//! State lives in a `watch` channel so a view can re-render whenever it changes.
//! Supply reads (claimed list, total supply) run concurrently and both must land
//! before `Ready`. The price read runs beside them and never gates `Ready`, so the
//! mint button can be enabled while the price is still unknown; the label then
//! reads `Mint` without a price.

use crate::contract::{ClaimReceipt, ContractError, DropContract};
use crate::notify::{ToastId, Toaster};
use alloy::primitives::Address;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Duration;

/// Tokens claimed per mint.
pub const MINT_QUANTITY: u64 = 1;

pub const SUCCESS_TOAST_DURATION: Duration = Duration::from_secs(8);

pub const PENDING_MESSAGE: &str = "Minting NFT...";
pub const SUCCESS_MESSAGE: &str = "Hooray! You've successfully minted!";
pub const FAILURE_MESSAGE: &str = "Whoops! Something went wrong!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MintPhase {
    Idle,
    SupplyLoading,
    Ready,
    Minting,
    MintSucceeded,
    MintFailed,
}

/// Unit price as displayed (`0.01` + `ETH`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Price {
    pub display_value: String,
    pub symbol: String,
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.display_value, self.symbol)
    }
}

/// Per-view mint state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintState {
    pub phase: MintPhase,
    pub claimed_supply: u64,
    /// Unknown until the supply reads land.
    pub total_supply: Option<u64>,
    pub unit_price: Option<Price>,
    pub is_loading_supply: bool,
    /// True only between claim submission and its settlement.
    pub is_minting: bool,
    pub connected_address: Option<Address>,
}

impl Default for MintState {
    fn default() -> Self {
        Self {
            phase: MintPhase::Idle,
            claimed_supply: 0,
            total_supply: None,
            unit_price: None,
            is_loading_supply: true,
            is_minting: false,
            connected_address: None,
        }
    }
}

impl MintState {
    pub fn is_sold_out(&self) -> bool {
        self.total_supply == Some(self.claimed_supply)
    }

    /// Sets the claimed count, never above a known total.
    fn set_claimed(&mut self, claimed: u64) {
        self.claimed_supply = match self.total_supply {
            Some(total) if claimed > total => {
                tracing::warn!(claimed, total, "claimed supply above total, clamping");
                total
            }
            _ => claimed,
        };
    }

    pub fn button(&self) -> MintButton {
        let label = if self.is_loading_supply {
            ButtonLabel::Loading
        } else if self.is_minting {
            ButtonLabel::Minting
        } else if self.is_sold_out() {
            ButtonLabel::SoldOut
        } else if self.connected_address.is_none() {
            ButtonLabel::ConnectWallet
        } else {
            ButtonLabel::Mint(self.unit_price.clone())
        };
        let enabled = !(self.is_minting
            || self.is_loading_supply
            || self.is_sold_out()
            || self.connected_address.is_none());
        MintButton { label, enabled }
    }

    /// `Loading...` or `<claimed> / <total> NFTs Claimed`.
    pub fn supply_label(&self) -> String {
        match (self.is_loading_supply, self.total_supply) {
            (false, Some(total)) => format!("{} / {} NFTs Claimed", self.claimed_supply, total),
            _ => "Loading...".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonLabel {
    Loading,
    Minting,
    SoldOut,
    ConnectWallet,
    Mint(Option<Price>),
}

impl fmt::Display for ButtonLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ButtonLabel::Loading => f.write_str("Loading..."),
            ButtonLabel::Minting => f.write_str("Minting..."),
            ButtonLabel::SoldOut => f.write_str("Sold Out"),
            ButtonLabel::ConnectWallet => f.write_str("Connect Wallet to Mint"),
            ButtonLabel::Mint(Some(price)) => write!(f, "Mint ({})", price),
            ButtonLabel::Mint(None) => f.write_str("Mint"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintButton {
    pub label: ButtonLabel,
    pub enabled: bool,
}

#[derive(Debug)]
pub enum MintOutcome {
    /// Guard failed (no contract, no wallet, or a mint already in flight).
    Skipped,
    Minted(ClaimReceipt),
    Failed(ContractError),
}

/// Drives supply/price reads and the claim for one drop view.
pub struct MintOrchestrator {
    contract: Option<Arc<dyn DropContract>>,
    toaster: Arc<Toaster>,
    state: watch::Sender<MintState>,
    torn_down: AtomicBool,
}

impl MintOrchestrator {
    pub fn new(contract: Option<Arc<dyn DropContract>>, toaster: Arc<Toaster>) -> Self {
        let (state, _) = watch::channel(MintState::default());
        Self {
            contract,
            toaster,
            state,
            torn_down: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<MintState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> MintState {
        self.state.borrow().clone()
    }

    pub fn set_connected_address(&self, address: Option<Address>) {
        self.update(|s| s.connected_address = address);
    }

    /// Keeps `connected_address` in step with a wallet session's address
    /// channel. Returns once the session is dropped or the view is torn down.
    pub async fn follow_wallet(&self, mut wallet: watch::Receiver<Option<Address>>) {
        loop {
            let address = *wallet.borrow_and_update();
            self.set_connected_address(address);
            if self.torn_down.load(Ordering::SeqCst) || wallet.changed().await.is_err() {
                break;
            }
        }
        tracing::debug!("stopped following wallet");
    }

    /// Marks the view gone; results of in-flight requests are discarded.
    pub fn teardown(&self) {
        self.torn_down.store(true, Ordering::SeqCst);
    }

    fn update(&self, f: impl FnOnce(&mut MintState)) {
        if self.torn_down.load(Ordering::SeqCst) {
            tracing::debug!("view torn down, dropping state update");
            return;
        }
        self.state.send_modify(f);
    }

    /// Loads supply and price concurrently. Returns the supply result; a price
    /// failure is only logged.
    pub async fn mount(&self) -> Result<(), ContractError> {
        let (supply, price) = tokio::join!(self.load_supply(), self.load_price());
        if let Err(e) = price {
            tracing::warn!(reason = %e, "price lookup failed");
        }
        supply
    }

    /// Reads claimed and total supply. On failure the view stays in `SupplyLoading`.
    pub async fn load_supply(&self) -> Result<(), ContractError> {
        let Some(contract) = self.contract.as_ref() else {
            return Ok(());
        };
        self.update(|s| {
            s.phase = MintPhase::SupplyLoading;
            s.is_loading_supply = true;
        });

        let (claimed, total) = tokio::join!(contract.claimed_count(), contract.total_supply());
        let (claimed, total) = match (claimed, total) {
            (Ok(c), Ok(t)) => (c, t),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(reason = %e, drop = %contract.address(), "supply read failed");
                return Err(e);
            }
        };
        let total: u64 = total
            .try_into()
            .map_err(|_| ContractError::Decode("total supply overflows u64".into()))?;

        tracing::debug!(claimed, total, "supply loaded");
        self.update(|s| {
            s.total_supply = Some(total);
            s.set_claimed(claimed);
            s.is_loading_supply = false;
            if s.phase == MintPhase::SupplyLoading {
                s.phase = MintPhase::Ready;
            }
        });
        Ok(())
    }

    /// Reads the active claim condition and records its display price.
    pub async fn load_price(&self) -> Result<(), ContractError> {
        let Some(contract) = self.contract.as_ref() else {
            return Ok(());
        };
        let conditions = contract.active_claim_conditions().await?;
        let price = conditions.first().map(|c| Price {
            display_value: c.price.display_value.clone(),
            symbol: c.price.symbol.clone(),
        });
        if price.is_none() {
            tracing::debug!(drop = %contract.address(), "drop has no claim conditions");
        }
        self.update(|s| s.unit_price = price);
        Ok(())
    }

    /// Claims one token to the connected wallet.
    ///
    /// The pending toast is dismissed and `is_minting` cleared on every exit path,
    /// including when this future is dropped before completion.
    pub async fn mint_nft(&self) -> MintOutcome {
        let Some(contract) = self.contract.clone() else {
            return MintOutcome::Skipped;
        };
        if self.torn_down.load(Ordering::SeqCst) {
            return MintOutcome::Skipped;
        }
        // Check and claim the in-flight slot in one step.
        let mut address = None;
        self.state.send_if_modified(|s| {
            if s.is_minting || s.connected_address.is_none() {
                return false;
            }
            s.is_minting = true;
            s.phase = MintPhase::Minting;
            address = s.connected_address;
            true
        });
        let Some(address) = address else {
            return MintOutcome::Skipped;
        };
        let pending = self.toaster.loading(PENDING_MESSAGE);
        let _cleanup = MintCleanup {
            orchestrator: self,
            pending,
        };

        match contract.claim_to(address, MINT_QUANTITY).await {
            Ok(receipt) => {
                let claimed = match contract.claimed_count().await {
                    Ok(count) => count,
                    Err(e) => {
                        tracing::warn!(reason = %e, "claimed supply refresh failed, counting locally");
                        self.state.borrow().claimed_supply.saturating_add(MINT_QUANTITY)
                    }
                };
                self.update(|s| {
                    s.set_claimed(claimed);
                    s.phase = MintPhase::MintSucceeded;
                });
                self.toaster.success(SUCCESS_MESSAGE, SUCCESS_TOAST_DURATION);
                tracing::info!(tx_hash = %receipt.tx_hash, %address, "minted");
                MintOutcome::Minted(receipt)
            }
            Err(e) => {
                tracing::warn!(reason = %e, %address, "mint failed");
                self.toaster.error(FAILURE_MESSAGE);
                self.update(|s| s.phase = MintPhase::MintFailed);
                MintOutcome::Failed(e)
            }
        }
    }
}

/// Scoped cleanup for one mint attempt.
struct MintCleanup<'a> {
    orchestrator: &'a MintOrchestrator,
    pending: ToastId,
}

impl Drop for MintCleanup<'_> {
    fn drop(&mut self) {
        self.orchestrator.toaster.dismiss(self.pending);
        self.orchestrator.update(|s| {
            s.is_minting = false;
            s.phase = MintPhase::Ready;
        });
    }
}
