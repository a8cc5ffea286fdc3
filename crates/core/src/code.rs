use rand::Rng;

use crate::error::CoreError;
use crate::types::ShareCode;

/// Symbols used for generated codes: lower-case base36.
const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of codes produced by [`RandomCodeGenerator::default`].
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Shortest code length a generator may be configured with.
pub const MIN_CODE_LENGTH: usize = 4;

/// Produces share codes.
///
/// Generators make no uniqueness promise. Collisions are detected by the
/// session store's conditional insert and resolved by drawing again.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> ShareCode;
}

/// Draws codes uniformly from the base36 alphabet.
#[derive(Debug, Clone, Copy)]
pub struct RandomCodeGenerator {
    length: usize,
}

impl RandomCodeGenerator {
    pub fn new(length: usize) -> Result<Self, CoreError> {
        if length < MIN_CODE_LENGTH {
            return Err(CoreError::CodeTooShort {
                length,
                minimum: MIN_CODE_LENGTH,
            });
        }
        Ok(Self { length })
    }

    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomCodeGenerator {
    fn default() -> Self {
        Self {
            length: DEFAULT_CODE_LENGTH,
        }
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> ShareCode {
        let mut rng = rand::thread_rng();
        let code: String = (0..self.length)
            .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
            .collect();
        ShareCode::new(code)
    }
}
