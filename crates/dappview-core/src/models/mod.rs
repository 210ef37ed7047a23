pub mod asset;
pub mod chain;
pub mod config;
pub mod message;
pub mod rpc;
pub mod tab;
pub mod transaction;

pub use asset::{WatchAssetRequest, WatchedAsset};
pub use chain::{AddEthereumChainParameter, ChainDefinition, NativeCurrency};
pub use config::{Config, DecoderConfig, GateConfig, HostConfig, ReceiptConfig, WalletConfig};
pub use message::{DebugFrame, HostMessage, PageFrame};
pub use rpc::{Notification, Request, RequestId, Response, RpcError};
pub use tab::Tab;
pub use transaction::{DecodedParam, DecodedTransaction, TransactionReceipt, TransactionRequest};
