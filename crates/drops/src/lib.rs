//! Simply Drops: browse NFT drops from a headless content store and mint from a
//! thirdweb DropERC721 contract through a connected wallet.
//!
//! - **ContentClient**: GROQ queries for the collection listing and a single drop by slug.
//! - **WalletSession**: connector per wallet provider, connected address as a watch channel.
//! - **RpcDrop**: [DropContract] over JSON-RPC; claims are signed by the wallet.
//! - **MintOrchestrator**: supply/price reads and the claim lifecycle for one drop view.
//! - **Site**: routes (`/`, `/nft/<slug>`) rendered to HTML pages.

pub mod components;
pub mod config;
pub mod content;
pub mod contract;
pub mod image;
pub mod mint;
pub mod notify;
pub mod pages;
pub mod rpc;
pub mod wallet;

pub use components::{HeaderView, WalletMenu};
pub use config::{ChainConfig, ContentConfig, RetryConfig, WalletConfig};
pub use content::{Collection, CollectionSummary, ContentClient, ContentError};
pub use contract::{ClaimCondition, ClaimReceipt, ContractError, CurrencyValue, DropContract, RpcDrop};
pub use image::{Fit, ImageUrlBuilder};
pub use mint::{ButtonLabel, MintButton, MintOrchestrator, MintOutcome, MintPhase, MintState, Price};
pub use notify::{Toast, ToastEvent, ToastKind, Toaster};
pub use pages::{Page, PageStatus, Route, Site, SiteError};
pub use wallet::{Connector, Eip1193Connector, WalletError, WalletKind, WalletSession};
