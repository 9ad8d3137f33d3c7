//! Random source for market generation.
//!
//! Sessions draw from OS entropy by default, so runs are not reproducible.
//! Tests and the automated tester seed the stream from a user seed instead;
//! the stream seed is derived with HMAC-SHA256 over a domain tag so the same
//! user seed can feed other streams later without correlation.

use hmac::{Hmac, Mac};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use sha2::Sha256;

const MARKET_DOMAIN_TAG: &[u8] = b"market";

/// Counting wrapper around the market RNG stream.
#[derive(Debug, Clone)]
pub struct MarketRng {
    rng: SmallRng,
    seed: Option<u64>,
    draws: u64,
}

impl MarketRng {
    /// Non-reproducible stream seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
            seed: None,
            draws: 0,
        }
    }

    /// Deterministic stream derived from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(derive_stream_seed(seed, MARKET_DOMAIN_TAG)),
            seed: Some(seed),
            draws: 0,
        }
    }

    /// User seed this stream was derived from, if any.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl RngCore for MarketRng {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
