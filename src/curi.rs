//! Generated conduit addresses (`curi`).
//!
//! An address is `<prefix>-<token>.<domain>`, with the token drawn from a
//! configured alphabet. Uniqueness is left to the store; [`insert_with_curi`]
//! retries once on collision.

use rand::Rng;

use crate::config::{ConfigError, CuriSettings};
use crate::error::Error;
use crate::model::Conduit;
use crate::store::StoreError;

/// Attempts made before creation fails with [`Error::CuriCollision`].
pub const MAX_CURI_ATTEMPTS: usize = 2;

/// Source of conduit addresses.
pub trait AddressGenerator: Send + Sync {
    /// Returns a fresh address starting with `prefix`.
    fn generate(&self, prefix: &str) -> String;
}

/// Random address generator driven by [`CuriSettings`].
#[derive(Debug, Clone)]
pub struct CuriGenerator {
    alphabet: Vec<char>,
    length: usize,
    domain: String,
}

impl CuriGenerator {
    /// Builds a generator from `settings`.
    ///
    /// # Errors
    ///
    /// Fails if the alphabet is empty or the token length is zero.
    pub fn new(settings: &CuriSettings) -> Result<Self, ConfigError> {
        let alphabet: Vec<char> = settings.alphabet.chars().collect();
        if alphabet.is_empty() {
            return Err(ConfigError::EmptyAlphabet);
        }
        if settings.length == 0 {
            return Err(ConfigError::ZeroTokenLength);
        }
        Ok(Self {
            alphabet,
            length: settings.length,
            domain: settings.domain.clone(),
        })
    }

    /// A random token of the configured length.
    pub fn token(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.length)
            .map(|_| self.alphabet[rng.gen_range(0..self.alphabet.len())])
            .collect()
    }
}

impl AddressGenerator for CuriGenerator {
    fn generate(&self, prefix: &str) -> String {
        format!("{prefix}-{}.{}", self.token(), self.domain)
    }
}

/// Runs `insert` with fresh addresses until it succeeds, giving up after
/// [`MAX_CURI_ATTEMPTS`] unique violations.
///
/// Store errors other than a unique violation are returned immediately.
pub fn insert_with_curi<F>(generator: &dyn AddressGenerator, prefix: &str, mut insert: F) -> Result<Conduit, Error>
where
    F: FnMut(String) -> Result<Conduit, StoreError>,
{
    for attempt in 1..=MAX_CURI_ATTEMPTS {
        let curi = generator.generate(prefix);
        match insert(curi) {
            Ok(conduit) => return Ok(conduit),
            Err(StoreError::UniqueViolation { .. }) => {
                tracing::warn!(attempt, max = MAX_CURI_ATTEMPTS, "generated curi already taken");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(Error::CuriCollision {
        attempts: MAX_CURI_ATTEMPTS,
    })
}
