use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::env;
use std::sync::RwLock;

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

const KEY_BITS_KEY: &str = "RSA_KEY_BITS";
const MINING_ROUNDS_KEY: &str = "MINING_ROUNDS";

/// Small RSA modulus so that keypair generation stays fast in tests.
const DEFAULT_KEY_BITS: usize = 512;

/// Proof attempts per cooperative mining burst.
const DEFAULT_MINING_ROUNDS: u64 = 2000;

pub struct Config {
    inner: RwLock<HashMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Config {
        let mut map = HashMap::new();

        if let Ok(bits) = env::var(KEY_BITS_KEY) {
            map.insert(String::from(KEY_BITS_KEY), bits);
        }
        if let Ok(rounds) = env::var(MINING_ROUNDS_KEY) {
            map.insert(String::from(MINING_ROUNDS_KEY), rounds);
        }

        Config {
            inner: RwLock::new(map),
        }
    }

    /// RSA modulus length in bits for newly generated keypairs.
    pub fn get_key_bits(&self) -> usize {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config - this should never happen");
        inner
            .get(KEY_BITS_KEY)
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_KEY_BITS)
    }

    pub fn set_key_bits(&self, bits: usize) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on config - this should never happen");
        inner.insert(String::from(KEY_BITS_KEY), bits.to_string());
    }

    /// Default batch size for a miner's proof search burst.
    pub fn get_mining_rounds(&self) -> u64 {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config - this should never happen");
        inner
            .get(MINING_ROUNDS_KEY)
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MINING_ROUNDS)
    }

    pub fn set_mining_rounds(&self, rounds: u64) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on config - this should never happen");
        inner.insert(String::from(MINING_ROUNDS_KEY), rounds.to_string());
    }
}
