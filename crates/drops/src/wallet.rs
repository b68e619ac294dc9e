//! Wallet session: provider connectors and the connected address.
//!
//! Signing stays inside the wallet. A [Connector] only asks a provider for
//! accounts and hands it transactions to sign and submit. Providers are
//! reached through their EIP-1193 JSON-RPC bridge ([Eip1193Connector]), one
//! connector per [WalletKind].

use crate::config::WalletConfig;
use crate::rpc::{to_hex, JsonRpcClient, RpcError};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{watch, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalletKind {
    /// Browser-extension wallet.
    MetaMask,
    /// Remote wallet over a WalletConnect relay.
    WalletConnect,
    /// Exchange-hosted wallet.
    CoinbaseWallet,
}

impl WalletKind {
    pub const ALL: [WalletKind; 3] = [
        WalletKind::MetaMask,
        WalletKind::WalletConnect,
        WalletKind::CoinbaseWallet,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            WalletKind::MetaMask => "Metamask",
            WalletKind::WalletConnect => "WalletConnect",
            WalletKind::CoinbaseWallet => "Coinbase Wallet",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            WalletKind::MetaMask => "/images/metamask.webp",
            WalletKind::WalletConnect => "/images/walletconnect.png",
            WalletKind::CoinbaseWallet => "/images/coinbase.svg",
        }
    }
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("no connector configured for {0}")]
    UnknownProvider(WalletKind),
    #[error("{0} returned no accounts")]
    NoAccounts(WalletKind),
    #[error("wallet not connected")]
    NotConnected,
    #[error("wallet request failed: {0}")]
    Rpc(#[from] RpcError),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Transaction handed to the wallet for signing and submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

impl TransactionRequest {
    fn to_json(&self) -> Value {
        json!({
            "from": self.from.to_string(),
            "to": self.to.to_string(),
            "data": to_hex(&self.data),
            "value": format!("0x{:x}", self.value),
        })
    }
}

/// One wallet provider.
#[async_trait]
pub trait Connector: Send + Sync {
    fn kind(&self) -> WalletKind;

    /// Asks the provider for account access; the first account is used.
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Signs and submits `tx`, returning its hash once accepted by the provider.
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError> {
        Ok(())
    }
}

/// Connector for a provider exposing EIP-1193 methods over JSON-RPC.
#[derive(Debug)]
pub struct Eip1193Connector {
    kind: WalletKind,
    rpc: JsonRpcClient,
}

impl Eip1193Connector {
    pub fn new(kind: WalletKind, url: impl Into<String>) -> Result<Self, WalletError> {
        Ok(Self {
            kind,
            rpc: JsonRpcClient::new(url)?,
        })
    }
}

#[async_trait]
impl Connector for Eip1193Connector {
    fn kind(&self) -> WalletKind {
        self.kind
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        let result = self.rpc.request("eth_requestAccounts", json!([])).await?;
        parse_accounts(&result)
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, WalletError> {
        let result = self
            .rpc
            .request("eth_sendTransaction", json!([tx.to_json()]))
            .await?;
        let s = result
            .as_str()
            .ok_or_else(|| WalletError::Decode("tx hash not string".into()))?;
        s.parse::<TxHash>()
            .map_err(|e| WalletError::Decode(format!("tx hash: {}", e)))
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.rpc
            .request("wallet_revokePermissions", json!([{ "eth_accounts": {} }]))
            .await?;
        Ok(())
    }
}

fn parse_accounts(result: &Value) -> Result<Vec<Address>, WalletError> {
    let arr = result
        .as_array()
        .ok_or_else(|| WalletError::Decode("accounts not array".into()))?;
    arr.iter()
        .map(|a| {
            a.as_str()
                .ok_or_else(|| WalletError::Decode("account not string".into()))?
                .parse::<Address>()
                .map_err(|e| WalletError::Decode(format!("account: {}", e)))
        })
        .collect()
}

/// Connected-wallet state shared by the header and the mint view.
pub struct WalletSession {
    connectors: Vec<Arc<dyn Connector>>,
    /// Connected provider and the account it signs for.
    active: RwLock<Option<(Arc<dyn Connector>, Address)>>,
    address_tx: watch::Sender<Option<Address>>,
}

impl WalletSession {
    pub fn new(connectors: Vec<Arc<dyn Connector>>) -> Self {
        let (address_tx, _) = watch::channel(None);
        Self {
            connectors,
            active: RwLock::new(None),
            address_tx,
        }
    }

    /// One [Eip1193Connector] per configured provider.
    pub fn from_config(config: &WalletConfig) -> Result<Self, WalletError> {
        let mut connectors: Vec<Arc<dyn Connector>> = Vec::new();
        for p in &config.providers {
            connectors.push(Arc::new(Eip1193Connector::new(p.kind, p.url.clone())?));
        }
        Ok(Self::new(connectors))
    }

    /// Provider kinds in menu order.
    pub fn providers(&self) -> Vec<WalletKind> {
        self.connectors.iter().map(|c| c.kind()).collect()
    }

    pub fn connected_address(&self) -> Option<Address> {
        *self.address_tx.borrow()
    }

    /// Watch the connected address (None when disconnected).
    pub fn subscribe(&self) -> watch::Receiver<Option<Address>> {
        self.address_tx.subscribe()
    }

    /// Connector and account of the connected wallet, read together when a
    /// transaction is submitted.
    pub async fn active(&self) -> Option<(Arc<dyn Connector>, Address)> {
        self.active.read().await.clone()
    }

    pub async fn connect(&self, kind: WalletKind) -> Result<Address, WalletError> {
        let connector = self
            .connectors
            .iter()
            .find(|c| c.kind() == kind)
            .cloned()
            .ok_or(WalletError::UnknownProvider(kind))?;
        let accounts = connector.request_accounts().await?;
        let address = *accounts.first().ok_or(WalletError::NoAccounts(kind))?;
        let mut active = self.active.write().await;
        *active = Some((connector, address));
        self.address_tx.send_replace(Some(address));
        drop(active);
        tracing::info!(%kind, %address, "wallet connected");
        Ok(address)
    }

    /// Forgets the connected wallet. Provider-side revocation is best effort.
    pub async fn disconnect(&self) {
        let connector = {
            let mut active = self.active.write().await;
            self.address_tx.send_replace(None);
            active.take()
        };
        if let Some((c, _)) = connector {
            if let Err(e) = c.disconnect().await {
                tracing::debug!(reason = %e, kind = %c.kind(), "provider disconnect failed");
            }
            tracing::info!(kind = %c.kind(), "wallet disconnected");
        }
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockConnector;
    use super::*;
    use std::sync::atomic::Ordering;

    fn addr(b: u8) -> Address {
        Address::with_last_byte(b)
    }

    #[tokio::test]
    async fn connect_sets_address_and_signer() {
        let session = WalletSession::new(vec![
            Arc::new(MockConnector::new(WalletKind::MetaMask, vec![addr(1), addr(2)])),
            Arc::new(MockConnector::new(WalletKind::CoinbaseWallet, vec![addr(3)])),
        ]);
        let mut rx = session.subscribe();
        assert_eq!(session.connected_address(), None);

        let a = session.connect(WalletKind::CoinbaseWallet).await.unwrap();
        assert_eq!(a, addr(3));
        assert_eq!(session.connected_address(), Some(addr(3)));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Some(addr(3)));
        assert_eq!(session.active().await.unwrap().0.kind(), WalletKind::CoinbaseWallet);
    }

    #[tokio::test]
    async fn connect_unknown_provider() {
        let session = WalletSession::new(vec![Arc::new(MockConnector::new(
            WalletKind::MetaMask,
            vec![addr(1)],
        ))]);
        let err = session.connect(WalletKind::WalletConnect).await.unwrap_err();
        assert!(matches!(err, WalletError::UnknownProvider(WalletKind::WalletConnect)));
        assert_eq!(session.connected_address(), None);
    }

    #[tokio::test]
    async fn connect_rejected_or_empty_leaves_session_disconnected() {
        let session = WalletSession::new(vec![
            Arc::new(MockConnector::rejecting(WalletKind::MetaMask)),
            Arc::new(MockConnector::new(WalletKind::WalletConnect, vec![])),
        ]);
        assert!(matches!(
            session.connect(WalletKind::MetaMask).await,
            Err(WalletError::Rpc(_))
        ));
        assert!(matches!(
            session.connect(WalletKind::WalletConnect).await,
            Err(WalletError::NoAccounts(WalletKind::WalletConnect))
        ));
        assert_eq!(session.connected_address(), None);
        assert!(session.active().await.is_none());
    }

    #[tokio::test]
    async fn disconnect_clears_state() {
        let connector = Arc::new(MockConnector::new(WalletKind::MetaMask, vec![addr(7)]));
        let session = WalletSession::new(vec![connector.clone()]);
        session.connect(WalletKind::MetaMask).await.unwrap();
        session.disconnect().await;
        assert_eq!(session.connected_address(), None);
        assert!(session.active().await.is_none());
        assert_eq!(connector.disconnects.load(Ordering::SeqCst), 1);

        // Disconnecting twice is harmless.
        session.disconnect().await;
        assert_eq!(connector.disconnects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reconnect_switches_signer_and_account() {
        let metamask = Arc::new(MockConnector::new(WalletKind::MetaMask, vec![addr(1)]));
        let coinbase = Arc::new(MockConnector::new(WalletKind::CoinbaseWallet, vec![addr(2)]));
        let session = WalletSession::new(vec![metamask.clone(), coinbase.clone()]);

        session.connect(WalletKind::MetaMask).await.unwrap();
        let (signer, from) = session.active().await.unwrap();
        assert_eq!((signer.kind(), from), (WalletKind::MetaMask, addr(1)));

        session.disconnect().await;
        assert!(session.active().await.is_none());
        session.connect(WalletKind::CoinbaseWallet).await.unwrap();
        let (signer, from) = session.active().await.unwrap();
        assert_eq!((signer.kind(), from), (WalletKind::CoinbaseWallet, addr(2)));
        assert_eq!(metamask.disconnects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn parse_accounts_rejects_garbage() {
        let ok = parse_accounts(&json!(["0x0000000000000000000000000000000000000001"])).unwrap();
        assert_eq!(ok, vec![addr(1)]);
        assert!(parse_accounts(&json!("0x01")).is_err());
        assert!(parse_accounts(&json!(["not-an-address"])).is_err());
    }

    #[test]
    fn transaction_json_shape() {
        let tx = TransactionRequest {
            from: addr(1),
            to: addr(2),
            data: Bytes::from(vec![0x84, 0xbb, 0x1e, 0x42]),
            value: U256::from(10_000_000_000_000_000u64),
        };
        let v = tx.to_json();
        assert_eq!(v["data"], "0x84bb1e42");
        assert_eq!(v["value"], "0x2386f26fc10000");
        assert_eq!(
            v["to"].as_str().unwrap().to_lowercase(),
            "0x0000000000000000000000000000000000000002"
        );
    }

    #[test]
    fn menu_labels() {
        let labels: Vec<_> = WalletKind::ALL.iter().map(|k| k.label()).collect();
        assert_eq!(labels, ["Metamask", "WalletConnect", "Coinbase Wallet"]);
    }
}
