//! JSON-RPC calls the deployment needs, behind a small trait so the pipeline
//! can run against an in-memory node.

use ethers::{
    providers::{Http, Middleware, Provider, ProviderError},
    types::{Address, BlockNumber, Bytes, TransactionReceipt, H256, U256},
};
use url::Url;

use crate::error::{DeployError, Result};

#[allow(async_fn_in_trait)]
pub trait Network {
    /// `eth_chainId`. Also serves as the connection handshake.
    async fn chain_id(&self) -> std::result::Result<U256, ProviderError>;

    /// `eth_getTransactionCount` against the pending block.
    async fn pending_nonce(&self, address: Address) -> std::result::Result<U256, ProviderError>;

    async fn send_raw_transaction(&self, raw: Bytes) -> std::result::Result<H256, ProviderError>;

    /// `Ok(None)` until the transaction is included in a block.
    async fn transaction_receipt(
        &self,
        hash: H256,
    ) -> std::result::Result<Option<TransactionReceipt>, ProviderError>;
}

/// A node reached over HTTP(S).
#[derive(Debug, Clone)]
pub struct RpcNetwork {
    provider: Provider<Http>,
}

impl RpcNetwork {
    /// Builds the transport. Nothing is sent until the first call.
    pub fn connect(rpc_url: &Url) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url.as_str())
            .map_err(|e| DeployError::Connection(e.to_string()))?;
        Ok(RpcNetwork { provider })
    }
}

impl Network for RpcNetwork {
    async fn chain_id(&self) -> std::result::Result<U256, ProviderError> {
        self.provider.get_chainid().await
    }

    async fn pending_nonce(&self, address: Address) -> std::result::Result<U256, ProviderError> {
        self.provider
            .get_transaction_count(address, Some(BlockNumber::Pending.into()))
            .await
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> std::result::Result<H256, ProviderError> {
        let pending_tx = self.provider.send_raw_transaction(raw).await?;
        Ok(pending_tx.tx_hash())
    }

    async fn transaction_receipt(
        &self,
        hash: H256,
    ) -> std::result::Result<Option<TransactionReceipt>, ProviderError> {
        self.provider.get_transaction_receipt(hash).await
    }
}
