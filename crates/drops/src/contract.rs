//! Drop contract adapter (thirdweb DropERC721).
//!
//! Reads go straight to a node with `eth_call`; the claim is handed to the
//! connected wallet for signing and then tracked by polling for its receipt.

use crate::config::ChainConfig;
use crate::rpc::{parse_hex_bytes, to_hex, JsonRpcClient, RpcError};
use crate::wallet::{TransactionRequest, WalletError, WalletSession};
use alloy::primitives::{address, utils::format_units, Address, Bytes, TxHash, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::time::{sleep, Duration, Instant};

sol! {
    interface IDropERC721 {
        struct ClaimCondition {
            uint256 startTimestamp;
            uint256 maxClaimableSupply;
            uint256 supplyClaimed;
            uint256 quantityLimitPerWallet;
            bytes32 merkleRoot;
            uint256 pricePerToken;
            address currency;
            string metadata;
        }

        struct AllowlistProof {
            bytes32[] proof;
            uint256 quantityLimitPerWallet;
            uint256 pricePerToken;
            address currency;
        }

        function nextTokenIdToMint() external view returns (uint256);
        function nextTokenIdToClaim() external view returns (uint256);
        function claimCondition() external view returns (uint256 currentStartId, uint256 count);
        function getActiveClaimConditionId() external view returns (uint256);
        function getClaimConditionById(uint256 conditionId) external view returns (ClaimCondition condition);
        function claim(
            address receiver,
            uint256 quantity,
            address currency,
            uint256 pricePerToken,
            AllowlistProof allowlistProof,
            bytes data
        ) external payable;
    }

    interface IERC20Metadata {
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
    }
}

/// Sentinel thirdweb uses for the chain's native currency.
pub const NATIVE_TOKEN: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

const NATIVE_SYMBOL: &str = "ETH";
const NATIVE_DECIMALS: u8 = 18;

/// Longest claimed-id list [RpcDrop] will materialize.
pub const MAX_LISTED_TOKENS: u64 = 100_000;

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("chain request failed: {0}")]
    Rpc(#[from] RpcError),
    #[error("wallet: {0}")]
    Wallet(#[from] WalletError),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("no wallet connected to sign the claim")]
    NoSigner,
    #[error("transaction {0} reverted")]
    Reverted(TxHash),
    #[error("no receipt for {0} after {1:?}")]
    ReceiptTimeout(TxHash, Duration),
}

impl From<alloy::sol_types::Error> for ContractError {
    fn from(e: alloy::sol_types::Error) -> Self {
        ContractError::Decode(e.to_string())
    }
}

/// Currency amount with its human-readable rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyValue {
    pub currency: Address,
    pub symbol: String,
    pub decimals: u8,
    pub value: U256,
    /// `value` scaled by `decimals`, trailing zeros trimmed (e.g. `0.01`).
    pub display_value: String,
}

impl CurrencyValue {
    pub fn new(currency: Address, symbol: impl Into<String>, decimals: u8, value: U256) -> Result<Self, ContractError> {
        Ok(Self {
            currency,
            symbol: symbol.into(),
            decimals,
            value,
            display_value: display_units(value, decimals)?,
        })
    }
}

/// One claim phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimCondition {
    pub start_timestamp: U256,
    pub max_claimable_supply: U256,
    pub supply_claimed: U256,
    pub quantity_limit_per_wallet: U256,
    pub price: CurrencyValue,
}

/// Outcome of a mined claim transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
}

/// Read and claim surface of a deployed drop.
#[async_trait]
pub trait DropContract: Send + Sync {
    fn address(&self) -> Address;

    /// Token ids claimed so far.
    async fn claimed_tokens(&self) -> Result<Vec<U256>, ContractError>;

    /// Number of tokens claimed so far.
    async fn claimed_count(&self) -> Result<u64, ContractError> {
        Ok(self.claimed_tokens().await?.len() as u64)
    }

    /// Total mintable supply.
    async fn total_supply(&self) -> Result<U256, ContractError>;

    /// Claim phases, active one first.
    async fn active_claim_conditions(&self) -> Result<Vec<ClaimCondition>, ContractError>;

    /// Claims `quantity` tokens to `receiver` and waits until the claim is mined.
    async fn claim_to(&self, receiver: Address, quantity: u64) -> Result<ClaimReceipt, ContractError>;
}

/// [DropContract] over JSON-RPC, signing through whichever wallet is
/// connected to the session when a claim is made.
pub struct RpcDrop {
    address: Address,
    rpc: JsonRpcClient,
    wallet: Option<Arc<WalletSession>>,
    poll_interval: Duration,
    receipt_timeout: Duration,
}

impl RpcDrop {
    pub fn new(config: &ChainConfig, address: Address) -> Result<Self, ContractError> {
        Ok(Self {
            address,
            rpc: JsonRpcClient::new(config.rpc_url.clone())?,
            wallet: None,
            poll_interval: Duration::from_millis(config.receipt_poll_interval_ms),
            receipt_timeout: Duration::from_secs(config.receipt_timeout_secs),
        })
    }

    /// Session whose connected wallet signs claims. Without one, reads still work.
    pub fn with_wallet(mut self, wallet: Arc<WalletSession>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    async fn next_token_id_to_claim(&self) -> Result<u64, ContractError> {
        let next = self
            .call(self.address, &IDropERC721::nextTokenIdToClaimCall {})
            .await?
            ._0;
        next.try_into()
            .map_err(|_| ContractError::Decode("claimed count overflows u64".into()))
    }

    async fn call<C: SolCall>(&self, to: Address, call: &C) -> Result<C::Return, ContractError> {
        let params = json!([{
            "to": to.to_string(),
            "data": to_hex(&call.abi_encode()),
        }, "latest"]);
        let result = self.rpc.request("eth_call", params).await?;
        let s = result
            .as_str()
            .ok_or_else(|| ContractError::Decode("eth_call result not string".into()))?;
        let bytes = parse_hex_bytes(s)?;
        Ok(C::abi_decode_returns(&bytes, true)?)
    }

    async fn currency_value(&self, currency: Address, value: U256) -> Result<CurrencyValue, ContractError> {
        if currency == NATIVE_TOKEN {
            return CurrencyValue::new(currency, NATIVE_SYMBOL, NATIVE_DECIMALS, value);
        }
        let symbol = self.call(currency, &IERC20Metadata::symbolCall {}).await?._0;
        let decimals = self.call(currency, &IERC20Metadata::decimalsCall {}).await?._0;
        CurrencyValue::new(currency, symbol, decimals, value)
    }

    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<Value>, ContractError> {
        let result = self
            .rpc
            .request("eth_getTransactionReceipt", json!([tx_hash.to_string()]))
            .await?;
        Ok(if result.is_null() { None } else { Some(result) })
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<ClaimReceipt, ContractError> {
        let deadline = Instant::now() + self.receipt_timeout;
        loop {
            if let Some(receipt) = self.receipt(tx_hash).await? {
                return decode_receipt(tx_hash, &receipt);
            }
            if Instant::now() >= deadline {
                return Err(ContractError::ReceiptTimeout(tx_hash, self.receipt_timeout));
            }
            sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl DropContract for RpcDrop {
    fn address(&self) -> Address {
        self.address
    }

    async fn claimed_tokens(&self) -> Result<Vec<U256>, ContractError> {
        let count = self.next_token_id_to_claim().await?;
        if count > MAX_LISTED_TOKENS {
            return Err(ContractError::Decode(format!(
                "{} claimed tokens is too many to list",
                count
            )));
        }
        Ok((0..count).map(U256::from).collect())
    }

    async fn claimed_count(&self) -> Result<u64, ContractError> {
        self.next_token_id_to_claim().await
    }

    async fn total_supply(&self) -> Result<U256, ContractError> {
        Ok(self
            .call(self.address, &IDropERC721::nextTokenIdToMintCall {})
            .await?
            ._0)
    }

    async fn active_claim_conditions(&self) -> Result<Vec<ClaimCondition>, ContractError> {
        let list = self.call(self.address, &IDropERC721::claimConditionCall {}).await?;
        let active = match self
            .call(self.address, &IDropERC721::getActiveClaimConditionIdCall {})
            .await
        {
            Ok(r) => Some(r._0),
            // No phase has started yet.
            Err(ContractError::Rpc(RpcError::Rpc(reason))) => {
                tracing::debug!(%reason, "no active claim condition");
                None
            }
            Err(e) => return Err(e),
        };

        let mut ids: Vec<U256> = Vec::new();
        let mut id = list.currentStartId;
        let end = list.currentStartId.saturating_add(list.count);
        while id < end {
            ids.push(id);
            id += U256::from(1);
        }
        if let Some(active) = active {
            if let Some(pos) = ids.iter().position(|i| *i == active) {
                let a = ids.remove(pos);
                ids.insert(0, a);
            }
        }

        let mut conditions = Vec::with_capacity(ids.len());
        for id in ids {
            let c = self
                .call(self.address, &IDropERC721::getClaimConditionByIdCall { conditionId: id })
                .await?
                .condition;
            conditions.push(ClaimCondition {
                start_timestamp: c.startTimestamp,
                max_claimable_supply: c.maxClaimableSupply,
                supply_claimed: c.supplyClaimed,
                quantity_limit_per_wallet: c.quantityLimitPerWallet,
                price: self.currency_value(c.currency, c.pricePerToken).await?,
            });
        }
        Ok(conditions)
    }

    async fn claim_to(&self, receiver: Address, quantity: u64) -> Result<ClaimReceipt, ContractError> {
        let wallet = self.wallet.as_ref().ok_or(ContractError::NoSigner)?;
        let (signer, from) = wallet.active().await.ok_or(ContractError::NoSigner)?;
        let conditions = self.active_claim_conditions().await?;
        let active = conditions
            .first()
            .ok_or_else(|| ContractError::Decode("drop has no claim condition".into()))?;
        let mut tx = claim_transaction(self.address, receiver, quantity, &active.price);
        tx.from = from;
        let tx_hash = signer.send_transaction(&tx).await?;
        tracing::info!(%tx_hash, %receiver, quantity, "claim submitted");
        let receipt = self.wait_for_receipt(tx_hash).await?;
        tracing::info!(%tx_hash, block = ?receipt.block_number, "claim mined");
        Ok(receipt)
    }
}

/// Builds the `claim` transaction paying `price` per token.
pub fn claim_transaction(drop: Address, receiver: Address, quantity: u64, price: &CurrencyValue) -> TransactionRequest {
    let quantity = U256::from(quantity);
    let call = IDropERC721::claimCall {
        receiver,
        quantity,
        currency: price.currency,
        pricePerToken: price.value,
        allowlistProof: IDropERC721::AllowlistProof {
            proof: Vec::new(),
            quantityLimitPerWallet: U256::ZERO,
            pricePerToken: U256::MAX,
            currency: Address::ZERO,
        },
        data: Bytes::new(),
    };
    let value = if price.currency == NATIVE_TOKEN {
        price.value.saturating_mul(quantity)
    } else {
        U256::ZERO
    };
    TransactionRequest {
        from: receiver,
        to: drop,
        data: Bytes::from(call.abi_encode()),
        value,
    }
}

fn decode_receipt(tx_hash: TxHash, receipt: &Value) -> Result<ClaimReceipt, ContractError> {
    let status = receipt
        .get("status")
        .and_then(|s| s.as_str())
        .ok_or_else(|| ContractError::Decode("receipt without status".into()))?;
    if status != "0x1" {
        return Err(ContractError::Reverted(tx_hash));
    }
    let block_number = receipt
        .get("blockNumber")
        .and_then(|b| b.as_str())
        .and_then(|s| u64::from_str_radix(s.strip_prefix("0x").unwrap_or(s), 16).ok());
    Ok(ClaimReceipt { tx_hash, block_number })
}

/// `format_units` with trailing fractional zeros removed (`0.010000` → `0.01`).
pub fn display_units(value: U256, decimals: u8) -> Result<String, ContractError> {
    let s = format_units(value, decimals).map_err(|e| ContractError::Decode(e.to_string()))?;
    if !s.contains('.') {
        return Ok(s);
    }
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    Ok(trimmed.to_string())
}
