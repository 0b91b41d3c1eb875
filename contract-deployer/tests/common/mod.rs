//! In-memory node with per-account nonces, for driving the pipeline end to end.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use contract_deployer::{transaction::CHAIN_ID, Config, Network};
use ethers::{
    providers::ProviderError,
    types::{Address, Bytes, Transaction, TransactionReceipt, H256, U256, U64},
    utils::{get_contract_address, keccak256, rlp},
};

pub const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const SENDER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const BYTECODE: &str = "0x600a600c600039600a6000f3602a60005260206000f3";

pub fn sender() -> Address {
    SENDER.parse().unwrap()
}

pub fn config() -> Config {
    config_with(&[])
}

/// Complete config; `overrides` replace or add variables.
pub fn config_with(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("INFURA_URL", "http://127.0.0.1:8545"),
        ("SENDER_ADDRESS", SENDER),
        ("PRIVATE_KEY", KEY),
        ("BYTECODE", BYTECODE),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(|name| vars.get(name).cloned())
        .unwrap()
        .with_receipt_timeout(Duration::from_millis(500))
        .with_poll_interval(Duration::from_millis(5))
}

#[derive(Debug)]
struct State {
    chain_id: U256,
    reachable: bool,
    reject_sends: Option<String>,
    revert: bool,
    never_mine: bool,
    contract_address: Option<Address>,
    // Polls answered with `None` before a receipt appears
    mining_delay: usize,
    nonces: HashMap<Address, U256>,
    receipts: HashMap<H256, (TransactionReceipt, usize)>,
    block_number: u64,
    calls: Vec<&'static str>,
}

/// Cloning shares the node state, so two runs can hit the same chain.
#[derive(Debug, Clone)]
pub struct MockNetwork {
    state: Arc<Mutex<State>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        MockNetwork {
            state: Arc::new(Mutex::new(State {
                chain_id: U256::from(CHAIN_ID),
                reachable: true,
                reject_sends: None,
                revert: false,
                never_mine: false,
                contract_address: None,
                mining_delay: 2,
                nonces: HashMap::new(),
                receipts: HashMap::new(),
                block_number: 100,
                calls: Vec::new(),
            })),
        }
    }

    pub fn unreachable() -> Self {
        let node = Self::new();
        node.state.lock().unwrap().reachable = false;
        node
    }

    pub fn with_chain_id(self, chain_id: U256) -> Self {
        self.state.lock().unwrap().chain_id = chain_id;
        self
    }

    pub fn with_account_nonce(self, address: Address, nonce: u64) -> Self {
        self.state.lock().unwrap().nonces.insert(address, U256::from(nonce));
        self
    }

    pub fn with_contract_address(self, address: Address) -> Self {
        self.state.lock().unwrap().contract_address = Some(address);
        self
    }

    pub fn rejecting_sends(self, reason: &str) -> Self {
        self.state.lock().unwrap().reject_sends = Some(reason.to_string());
        self
    }

    pub fn reverting(self) -> Self {
        self.state.lock().unwrap().revert = true;
        self
    }

    pub fn never_mining(self) -> Self {
        self.state.lock().unwrap().never_mine = true;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn nonce_of(&self, address: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .nonces
            .get(&address)
            .copied()
            .unwrap_or_default()
    }

    fn record(&self, call: &'static str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.reachable {
            Ok(())
        } else {
            Err(ProviderError::CustomError(
                "error sending request: connection refused".into(),
            ))
        }
    }
}

impl Network for MockNetwork {
    async fn chain_id(&self) -> Result<U256, ProviderError> {
        self.record("chain_id")?;
        Ok(self.state.lock().unwrap().chain_id)
    }

    async fn pending_nonce(&self, address: Address) -> Result<U256, ProviderError> {
        self.record("pending_nonce")?;
        Ok(self.nonce_of(address))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256, ProviderError> {
        self.record("send_raw_transaction")?;
        let tx: Transaction = rlp::decode(&raw)
            .map_err(|e| ProviderError::CustomError(format!("invalid transaction: {}", e)))?;
        let from = tx
            .recover_from()
            .map_err(|e| ProviderError::CustomError(format!("invalid signature: {}", e)))?;

        let mut state = self.state.lock().unwrap();
        if let Some(reason) = &state.reject_sends {
            return Err(ProviderError::CustomError(reason.clone()));
        }
        if tx.chain_id != Some(state.chain_id) {
            return Err(ProviderError::CustomError("invalid chain id for signer".into()));
        }
        let expected = state.nonces.get(&from).copied().unwrap_or_default();
        if tx.nonce < expected {
            return Err(ProviderError::CustomError(format!(
                "nonce too low: next nonce {}, tx nonce {}",
                expected, tx.nonce
            )));
        }
        if tx.nonce > expected {
            return Err(ProviderError::CustomError(format!(
                "nonce too high: next nonce {}, tx nonce {}",
                expected, tx.nonce
            )));
        }
        state.nonces.insert(from, expected + 1);

        let hash = H256::from(keccak256(&raw));
        state.block_number += 1;
        let receipt = TransactionReceipt {
            transaction_hash: hash,
            block_number: Some(U64::from(state.block_number)),
            from,
            status: Some(U64::from(if state.revert { 0u64 } else { 1 })),
            contract_address: Some(
                state
                    .contract_address
                    .unwrap_or_else(|| get_contract_address(from, tx.nonce)),
            ),
            gas_used: Some(U256::from(53_000)),
            effective_gas_price: tx.gas_price,
            ..Default::default()
        };
        let delay = state.mining_delay;
        state.receipts.insert(hash, (receipt, delay));
        Ok(hash)
    }

    async fn transaction_receipt(
        &self,
        hash: H256,
    ) -> Result<Option<TransactionReceipt>, ProviderError> {
        self.record("transaction_receipt")?;
        let mut state = self.state.lock().unwrap();
        let never_mine = state.never_mine;
        let Some((receipt, remaining)) = state.receipts.get_mut(&hash) else {
            return Ok(None);
        };
        if never_mine {
            return Ok(None);
        }
        if *remaining > 0 {
            *remaining -= 1;
            return Ok(None);
        }
        Ok(Some(receipt.clone()))
    }
}
