//! Cryptographic primitives and canonical serialization helpers

pub mod crypto;
pub mod serialization;

pub use crypto::{
    current_timestamp, generate_keypair, hash_base64, hash_hex, rsa_sha256_sign,
    rsa_sha256_verify, sha256_digest,
};
pub use serialization::{from_json, to_canonical_json};
