use rand::rngs::OsRng;
use rand::Rng;

use crate::errors::{ToolkitError, ToolkitResult};

/// Default identifier alphabet: digits, upper and lower case letters, `_` and `+`.
pub const DEFAULT_ALPHABET: &str =
    "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_+";

/// A non-empty set of characters identifiers are drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    chars: Vec<char>,
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            chars: DEFAULT_ALPHABET.chars().collect(),
        }
    }
}

impl Alphabet {
    pub fn new(chars: &str) -> ToolkitResult<Self> {
        if chars.is_empty() {
            return Err(ToolkitError::EmptyAlphabet);
        }
        Ok(Self {
            chars: chars.chars().collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn contains(&self, c: char) -> bool {
        self.chars.contains(&c)
    }

    /// Generate `len` characters, each an independent uniform draw from
    /// the operating system's CSPRNG.
    pub fn generate(&self, len: usize) -> String {
        let mut rng = OsRng;
        (0..len)
            .map(|_| self.chars[rng.gen_range(0..self.chars.len())])
            .collect()
    }
}

/// Random string of `len` characters from [`DEFAULT_ALPHABET`].
pub fn generate_random_string(len: usize) -> String {
    Alphabet::default().generate(len)
}
