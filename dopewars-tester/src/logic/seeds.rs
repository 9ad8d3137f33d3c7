use anyhow::{Result, bail};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// A seed as requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    /// Original phrase when the seed was derived from text
    pub phrase: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, phrase: None }
    }

    #[must_use]
    pub fn from_phrase(phrase: &str) -> Self {
        Self {
            seed: phrase_seed(phrase),
            phrase: Some(phrase.to_string()),
        }
    }

    /// Seed for a given iteration of a run.
    #[must_use]
    pub const fn iteration_seed(&self, iteration: usize) -> u64 {
        self.seed.wrapping_add(iteration as u64)
    }
}

/// Hash a free-form phrase into a seed: the first eight bytes of its
/// SHA-256 digest, little endian.
#[must_use]
pub fn phrase_seed(phrase: &str) -> u64 {
    let digest = Sha256::digest(phrase.trim().to_lowercase().as_bytes());
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// Resolve CLI seed tokens.
///
/// Integers are used as-is (negative values by magnitude) and phrases made
/// of letters, digits, `-` and `_` are hashed. Duplicates are dropped and an
/// empty list falls back to 1337.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let info = if let Ok(value) = token.parse::<u64>() {
            SeedInfo::from_numeric(value)
        } else if let Ok(value) = token.parse::<i64>() {
            SeedInfo::from_numeric(value.unsigned_abs())
        } else if token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            SeedInfo::from_phrase(token)
        } else {
            bail!("Unrecognized seed token: {token}");
        };
        if seen.insert(info.seed) {
            resolved.push(info);
        }
    }

    if resolved.is_empty() {
        resolved.push(SeedInfo::from_numeric(1337));
    }
    Ok(resolved)
}
