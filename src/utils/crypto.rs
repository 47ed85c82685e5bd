use data_encoding::{BASE64, HEXLOWER};
use ring::digest::{Context, SHA256};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::error::{BlockchainError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn current_timestamp() -> Result<u64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BlockchainError::Crypto(format!("System time error: {e}")))?
        .as_millis();

    // Ensure the timestamp fits in u64
    if duration > u64::MAX as u128 {
        return Err(BlockchainError::Crypto("Timestamp overflow".to_string()));
    }

    Ok(duration as u64)
}

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    digest.as_ref().to_vec()
}

/// SHA-256 of the input, rendered as lowercase hex. Block and transaction
/// ids use this form.
pub fn hash_hex(data: &[u8]) -> String {
    HEXLOWER.encode(sha256_digest(data).as_slice())
}

/// SHA-256 of the input, rendered as base64. Address derivation uses this
/// form.
pub fn hash_base64(data: &[u8]) -> String {
    BASE64.encode(sha256_digest(data).as_slice())
}

pub fn generate_keypair(bits: usize) -> Result<(RsaPrivateKey, RsaPublicKey)> {
    let mut rng = rand::thread_rng();
    let private_key = RsaPrivateKey::new(&mut rng, bits)
        .map_err(|e| BlockchainError::Crypto(format!("Failed to generate RSA key pair: {e}")))?;
    let public_key = RsaPublicKey::from(&private_key);
    Ok((private_key, public_key))
}

/// RSA-SHA256 (PKCS#1 v1.5) signature over the message, hex-encoded.
/// The scheme is deterministic: the same key and message always produce the
/// same signature.
pub fn rsa_sha256_sign(private_key: &RsaPrivateKey, message: &[u8]) -> Result<String> {
    let signing_key = SigningKey::<Sha256>::new(private_key.clone());
    let signature = signing_key
        .try_sign(message)
        .map_err(|e| BlockchainError::Crypto(format!("Failed to sign message: {e}")))?;
    Ok(HEXLOWER.encode(&signature.to_vec()))
}

pub fn rsa_sha256_verify(public_key: &RsaPublicKey, message: &[u8], signature_hex: &str) -> bool {
    let signature_bytes = match HEXLOWER.decode(signature_hex.as_bytes()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let signature = match Signature::try_from(signature_bytes.as_slice()) {
        Ok(sig) => sig,
        Err(_) => return false,
    };
    let verifying_key = VerifyingKey::<Sha256>::new(public_key.clone());
    verifying_key.verify(message, &signature).is_ok()
}
