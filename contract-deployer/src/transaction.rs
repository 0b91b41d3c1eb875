//! The contract-creation transaction and its local signing.

use ethers::{
    signers::{LocalWallet, Signer},
    types::{transaction::eip2718::TypedTransaction, Bytes, TransactionRequest, H256, U256},
    utils::keccak256,
};

use crate::error::{DeployError, Result};

/// Sepolia test network
pub const CHAIN_ID: u64 = 11_155_111;
pub const GAS_LIMIT: u64 = 2_000_000;
pub const GAS_PRICE_GWEI: u64 = 10;

pub fn gas_price() -> U256 {
    U256::from(GAS_PRICE_GWEI) * U256::exp10(9)
}

/// A fully populated contract-creation transaction. There is no recipient;
/// the payload is the creation bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployTransaction {
    chain_id: u64,
    gas_limit: U256,
    gas_price: U256,
    nonce: U256,
    data: Bytes,
}

impl DeployTransaction {
    /// Uses the fixed chain id, gas limit and gas price.
    pub fn new(nonce: U256, data: Bytes) -> Self {
        DeployTransaction {
            chain_id: CHAIN_ID,
            gas_limit: U256::from(GAS_LIMIT),
            gas_price: gas_price(),
            nonce,
            data,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn gas_limit(&self) -> U256 {
        self.gas_limit
    }

    pub fn gas_price(&self) -> U256 {
        self.gas_price
    }

    pub fn nonce(&self) -> U256 {
        self.nonce
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Signs as an EIP-155 legacy transaction. Consumes the record.
    pub fn sign(self, wallet: &LocalWallet) -> Result<SignedDeployment> {
        let wallet = wallet.clone().with_chain_id(self.chain_id);
        let tx = TransactionRequest::new()
            .from(wallet.address())
            .gas(self.gas_limit)
            .gas_price(self.gas_price)
            .nonce(self.nonce)
            .data(self.data)
            .chain_id(self.chain_id);

        let typed_tx = TypedTransaction::Legacy(tx);
        let signature = wallet
            .sign_transaction_sync(&typed_tx)
            .map_err(|e| DeployError::Signing(e.to_string()))?;
        let raw = typed_tx.rlp_signed(&signature);
        let hash = H256::from(keccak256(&raw));

        Ok(SignedDeployment { raw, hash })
    }
}

/// Raw signed bytes ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone)]
pub struct SignedDeployment {
    raw: Bytes,
    hash: H256,
}

impl SignedDeployment {
    pub fn hash(&self) -> H256 {
        self.hash
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn into_raw(self) -> Bytes {
        self.raw
    }
}

pub fn parse_wallet(private_key: &str) -> Result<LocalWallet> {
    private_key
        .trim()
        .parse::<LocalWallet>()
        .map_err(|e| DeployError::Signing(format!("invalid private key: {}", e)))
}

pub fn decode_bytecode(bytecode: &str) -> Result<Bytes> {
    let bytes = hex::decode(bytecode.trim().trim_start_matches("0x"))
        .map_err(|e| DeployError::Signing(format!("invalid bytecode: {}", e)))?;
    if bytes.is_empty() {
        return Err(DeployError::Signing("invalid bytecode: payload is empty".into()));
    }
    Ok(bytes.into())
}
