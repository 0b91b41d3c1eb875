//! Submits one precompiled contract-deployment transaction to an
//! Ethereum-compatible network and reports the deployed address.

pub mod config;
pub mod deployer;
pub mod error;
pub mod network;
pub mod transaction;

pub use config::Config;
pub use deployer::{deploy, Deployment, DeploymentReceipt};
pub use error::{DeployError, Result};
pub use network::{Network, RpcNetwork};
pub use transaction::{DeployTransaction, SignedDeployment};
