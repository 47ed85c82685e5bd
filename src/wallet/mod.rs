//! Key management and address derivation
//!
//! A wallet is an RSA keypair plus the address derived from the public
//! key's canonical PEM text. Addresses are compared as opaque strings; two
//! addresses are equal exactly when the underlying public keys are.

pub mod wallet;

pub use wallet::{
    address_matches_key, calc_address, decode_public_pem, encode_public_pem, Wallet,
};
