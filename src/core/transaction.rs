// Account-based value transfer: a transaction spends from a single sender
// balance into one or more outputs, carries a fee for the sealing miner,
// and a per-sender nonce that makes replays detectable.

use crate::error::Result;
use crate::utils::{hash_hex, rsa_sha256_sign, rsa_sha256_verify, to_canonical_json};
use crate::wallet::{address_matches_key, decode_public_pem};
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single payment leg of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub amount: u64,
    pub address: String,
}

// Wire field order is part of the canonical form: from, nonce, pubKey,
// sig, fee, outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    from: String,
    nonce: u64,
    #[serde(rename = "pubKey")]
    pub_key: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    sig: Option<String>,
    fee: u64,
    outputs: Vec<Output>,
}

// The id preimage deliberately excludes the signature: ids are defined
// before signing, and a replayed transaction keeps its id.
#[derive(Serialize)]
struct IdPreimage<'a> {
    from: &'a str,
    nonce: u64,
    #[serde(rename = "pubKey")]
    pub_key: &'a str,
    outputs: &'a [Output],
    fee: u64,
}

/// Literal prefix of the transaction id preimage. Part of the consensus
/// identity of every transaction.
const TX_ID_PREFIX: &str = "TX";

impl Transaction {
    pub fn new(
        from: String,
        nonce: u64,
        pub_key: String,
        sig: Option<String>,
        outputs: Vec<Output>,
        fee: u64,
    ) -> Transaction {
        Transaction {
            from,
            nonce,
            pub_key,
            sig,
            fee,
            outputs,
        }
    }

    /// Content hash over `(from, nonce, pubKey, outputs, fee)`, hex-encoded.
    pub fn id(&self) -> String {
        let preimage = IdPreimage {
            from: self.from.as_str(),
            nonce: self.nonce,
            pub_key: self.pub_key.as_str(),
            outputs: self.outputs.as_slice(),
            fee: self.fee,
        };
        match to_canonical_json(&preimage) {
            Ok(json) => hash_hex(format!("{TX_ID_PREFIX}{json}").as_bytes()),
            Err(_) => {
                log::error!("Transaction serialization failed during id calculation");
                hash_hex(b"transaction_serialization_error")
            }
        }
    }

    /// Sign the transaction id with the sender's private key.
    pub fn sign(&mut self, private_key: &RsaPrivateKey) -> Result<()> {
        self.sig = Some(rsa_sha256_sign(private_key, self.id().as_bytes())?);
        Ok(())
    }

    /// A signature is valid when it is present, the public key matches the
    /// claimed sender address, and the RSA verification over the id passes.
    pub fn valid_signature(&self) -> bool {
        let sig = match &self.sig {
            Some(sig) => sig,
            None => return false,
        };
        if !address_matches_key(&self.from, &self.pub_key) {
            return false;
        }
        let public_key = match decode_public_pem(&self.pub_key) {
            Ok(key) => key,
            Err(_) => return false,
        };
        rsa_sha256_verify(&public_key, self.id().as_bytes(), sig)
    }

    /// Check the sender's balance against the total spend. An unknown
    /// sender never has sufficient funds.
    pub fn sufficient_funds(&self, balances: &HashMap<String, u64>) -> bool {
        match balances.get(&self.from) {
            Some(balance) => *balance >= self.total_output(),
            None => false,
        }
    }

    /// Fee plus the sum of all output amounts.
    pub fn total_output(&self) -> u64 {
        self.outputs
            .iter()
            .map(|output| output.amount)
            .fold(self.fee, |acc, amount| acc.saturating_add(amount))
    }

    pub fn get_from(&self) -> &str {
        self.from.as_str()
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    pub fn get_pub_key(&self) -> &str {
        self.pub_key.as_str()
    }

    pub fn get_sig(&self) -> Option<&str> {
        self.sig.as_deref()
    }

    pub fn get_fee(&self) -> u64 {
        self.fee
    }

    pub fn get_outputs(&self) -> &[Output] {
        self.outputs.as_slice()
    }
}
