use crate::utils::sha256_digest;
use num_bigint::BigUint;
use once_cell::sync::Lazy;

/// Maximum representable 256-bit target: sixty-four 'f's in hex. Every hash
/// is below this, so a block built against it seals on the first attempt.
pub static POW_BASE_TARGET: Lazy<BigUint> =
    Lazy::new(|| BigUint::from_bytes_be(&[0xff; 32]));

/// Standard mining target: a hash must land in the lowest 1/2^15 slice of
/// the space.
pub static HIT_POW_TARGET: Lazy<BigUint> = Lazy::new(|| &*POW_BASE_TARGET >> 15);

/// Tighter target used to exercise almost-valid proofs.
pub static NEAR_MISS_POW_TARGET: Lazy<BigUint> = Lazy::new(|| &*POW_BASE_TARGET >> 18);

/// Interpret a serialized block as an unsigned 256-bit integer via SHA-256.
pub fn hash_as_int(serialized: &str) -> BigUint {
    let digest = sha256_digest(serialized.as_bytes());
    BigUint::from_bytes_be(digest.as_slice())
}

/// The proof-of-work inequality: strictly below the target wins.
pub fn meets_target(serialized: &str, target: &BigUint) -> bool {
    hash_as_int(serialized) < *target
}
