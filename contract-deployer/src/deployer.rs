//! The deployment pipeline: handshake, nonce, build, sign, send, wait.

use std::{io::Write, time::Duration};

use ethers::{
    signers::Signer,
    types::{Address, TransactionReceipt, H256, U256},
    utils::{format_ether, to_checksum},
};
use log::{debug, info, warn};
use tokio::time;

use crate::{
    config::Config,
    error::{DeployError, Result},
    network::Network,
    transaction::{decode_bytecode, parse_wallet, DeployTransaction, CHAIN_ID},
};

/// Terminal artifact of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReceipt {
    pub transaction_hash: H256,
    pub block_number: Option<u64>,
    pub status: Option<u64>,
    pub contract_address: Address,
    pub gas_used: Option<U256>,
    pub effective_gas_price: Option<U256>,
}

impl DeploymentReceipt {
    /// Wei paid for the deployment, when the node reports it and the product fits.
    pub fn cost(&self) -> Option<U256> {
        self.gas_used?.checked_mul(self.effective_gas_price?)
    }
}

impl TryFrom<TransactionReceipt> for DeploymentReceipt {
    type Error = DeployError;

    fn try_from(receipt: TransactionReceipt) -> Result<Self> {
        let status = receipt.status.map(|s| s.as_u64());
        // Pre-Byzantium receipts carry no status; treat as success
        if status == Some(0) {
            return Err(DeployError::ReceiptWait(format!(
                "transaction {:#x} was mined but reverted",
                receipt.transaction_hash
            )));
        }
        let contract_address = receipt.contract_address.ok_or_else(|| {
            DeployError::ReceiptWait(format!(
                "receipt for {:#x} has no contract address",
                receipt.transaction_hash
            ))
        })?;

        Ok(DeploymentReceipt {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number.map(|n| n.as_u64()),
            status,
            contract_address,
            gas_used: receipt.gas_used,
            effective_gas_price: receipt.effective_gas_price,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Deployment {
    pub chain_id: u64,
    pub nonce: U256,
    pub transaction_hash: H256,
    pub receipt: DeploymentReceipt,
}

/// Runs the whole flow once, writing progress lines to `out`. Every step is
/// attempted exactly once and the first failure ends the run.
pub async fn deploy<N, W>(network: &N, config: &Config, out: &mut W) -> Result<Deployment>
where
    N: Network,
    W: Write,
{
    info!(
        "Connecting to {}",
        config.rpc_url.host_str().unwrap_or("<no host>")
    );
    let chain_id = network
        .chain_id()
        .await
        .map_err(|e| DeployError::Connection(e.to_string()))?;
    // Compared as U256: a node may answer with any quantity
    if chain_id != U256::from(CHAIN_ID) {
        return Err(DeployError::Connection(format!(
            "node reports chain id {}, expected {}",
            chain_id, CHAIN_ID
        )));
    }
    writeln!(out, "Connected to Ethereum network (chain id {}).", chain_id)?;

    let nonce = match config.nonce {
        Some(nonce) => {
            debug!("Using pinned nonce {}", nonce);
            U256::from(nonce)
        }
        None => network
            .pending_nonce(config.sender)
            .await
            .map_err(|e| DeployError::Connection(format!("failed to fetch nonce: {}", e)))?,
    };
    writeln!(out, "Current Nonce: {}", nonce)?;

    let record = DeployTransaction::new(nonce, decode_bytecode(&config.bytecode)?);
    debug!(
        "Built deployment: {} bytes of code, gas limit {}, gas price {} wei",
        record.data().len(),
        record.gas_limit(),
        record.gas_price()
    );

    let wallet = parse_wallet(&config.private_key)?;
    if wallet.address() != config.sender {
        return Err(DeployError::Signing(format!(
            "private key does not belong to sender {}",
            to_checksum(&config.sender, None)
        )));
    }
    let signed = record.sign(&wallet)?;
    let local_hash = signed.hash();

    let tx_hash = network
        .send_raw_transaction(signed.into_raw())
        .await
        .map_err(|e| DeployError::Send(e.to_string()))?;
    if tx_hash != local_hash {
        warn!(
            "Node returned hash {:#x}, locally computed {:#x}",
            tx_hash, local_hash
        );
    }
    writeln!(out, "Transaction sent, hash: {:#x}", tx_hash)?;

    let receipt =
        wait_for_receipt(network, tx_hash, config.receipt_timeout, config.poll_interval).await?;
    let receipt = DeploymentReceipt::try_from(receipt)?;
    if let Some(cost) = receipt.cost() {
        info!(
            "Deployment mined in block {:?}, cost {} ETH",
            receipt.block_number,
            format_ether(cost)
        );
    }
    writeln!(
        out,
        "Transaction mined! Contract deployed at address: {}",
        to_checksum(&receipt.contract_address, None)
    )?;

    Ok(Deployment {
        chain_id: CHAIN_ID,
        nonce,
        transaction_hash: tx_hash,
        receipt,
    })
}

/// Polls until the node reports a receipt, a node error occurs, or `timeout` elapses.
pub async fn wait_for_receipt<N: Network>(
    network: &N,
    tx_hash: H256,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<TransactionReceipt> {
    let poll = async {
        loop {
            match network.transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => {
                    debug!("Transaction {:#x} not mined yet", tx_hash);
                    time::sleep(poll_interval).await;
                }
                Err(e) => return Err(DeployError::ReceiptWait(e.to_string())),
            }
        }
    };

    time::timeout(timeout, poll).await.map_err(|_| {
        DeployError::ReceiptWait(format!(
            "transaction {:#x} not mined within {:?}",
            tx_hash, timeout
        ))
    })?
}
