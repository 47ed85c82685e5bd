use crate::config::GLOBAL_CONFIG;
use crate::error::{BlockchainError, Result};
use crate::utils::{generate_keypair, hash_base64, rsa_sha256_sign};
use rsa::pkcs8::{DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};

pub struct Wallet {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
    public_pem: String,
    address: String,
}

impl Wallet {
    /// Generate a wallet with the configured RSA modulus length.
    pub fn new() -> Result<Wallet> {
        Self::with_key_bits(GLOBAL_CONFIG.get_key_bits())
    }

    pub fn with_key_bits(bits: usize) -> Result<Wallet> {
        let (private_key, public_key) = generate_keypair(bits)?;
        let public_pem = encode_public_pem(&public_key)?;
        let address = calc_address(&public_pem);
        Ok(Wallet {
            private_key,
            public_key,
            public_pem,
            address,
        })
    }

    pub fn get_address(&self) -> &str {
        self.address.as_str()
    }

    /// Canonical text form of the public key. This exact string is what
    /// travels in transactions and feeds address derivation.
    pub fn get_public_pem(&self) -> &str {
        self.public_pem.as_str()
    }

    pub fn get_public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn get_private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    pub fn sign(&self, message: &[u8]) -> Result<String> {
        rsa_sha256_sign(&self.private_key, message)
    }

    pub fn export_private_pem(&self) -> Result<String> {
        let pem = self
            .private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| BlockchainError::Crypto(format!("Failed to encode private key: {e}")))?;
        Ok(pem.to_string())
    }
}

pub fn encode_public_pem(public_key: &RsaPublicKey) -> Result<String> {
    public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| BlockchainError::Crypto(format!("Failed to encode public key: {e}")))
}

pub fn decode_public_pem(pem: &str) -> Result<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .map_err(|e| BlockchainError::Crypto(format!("Failed to decode public key: {e}")))
}

/// Derive an address from a public key's canonical text form.
pub fn calc_address(public_pem: &str) -> String {
    hash_base64(public_pem.as_bytes())
}

pub fn address_matches_key(address: &str, public_pem: &str) -> bool {
    calc_address(public_pem) == address
}
