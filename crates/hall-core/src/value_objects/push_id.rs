//! Push ID - 20-character chronologically sortable identifier
//!
//! Structure:
//! - Chars 0-7:  Timestamp (milliseconds since Unix epoch, 48 bits)
//! - Chars 8-19: Entropy suffix (72 bits)
//!
//! The alphabet is ASCII-ordered, so plain lexicographic comparison of ids
//! matches generation order. Two ids generated in the same millisecond by the
//! same generator stay ordered because the suffix is incremented instead of
//! redrawn.

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// 64-symbol alphabet in ascending ASCII order.
const ALPHABET: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// Timestamp prefix length in characters (6 bits each).
const PREFIX_LEN: usize = 8;
/// Entropy suffix length in characters.
const SUFFIX_LEN: usize = 12;
/// Total id length.
const ID_LEN: usize = PREFIX_LEN + SUFFIX_LEN;

/// Chronologically sortable push id used to key room logs and records.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PushId(String);

impl PushId {
    /// Parse from string representation, validating length and alphabet
    pub fn parse(s: &str) -> Result<Self, PushIdParseError> {
        if s.len() != ID_LEN {
            return Err(PushIdParseError::InvalidLength(s.len()));
        }
        if !s.bytes().all(|b| ALPHABET.contains(&b)) {
            return Err(PushIdParseError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    /// Borrow the raw id string
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract the embedded timestamp (milliseconds since Unix epoch)
    pub fn timestamp_millis(&self) -> i64 {
        self.0
            .bytes()
            .take(PREFIX_LEN)
            .fold(0_i64, |acc, b| (acc << 6) | i64::from(symbol_index(b)))
    }

    /// Convert the embedded timestamp to `DateTime<Utc>`
    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        use chrono::{TimeZone, Utc};
        Utc.timestamp_millis_opt(self.timestamp_millis())
            .single()
            .unwrap_or_else(|| Utc.timestamp_millis_opt(0).unwrap())
    }
}

/// Position of a symbol within the alphabet. Caller guarantees membership.
fn symbol_index(b: u8) -> u8 {
    match ALPHABET.iter().position(|&a| a == b) {
        Some(i) => i as u8,
        None => 0,
    }
}

/// Error when parsing a push id from string
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PushIdParseError {
    #[error("push id must be {ID_LEN} characters, got {0}")]
    InvalidLength(usize),

    #[error("push id contains a character outside the alphabet")]
    InvalidCharacter,
}

impl fmt::Display for PushId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PushId {
    type Err = PushIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PushId::parse(s)
    }
}

impl Serialize for PushId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PushId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PushId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Internal generator state guarded by a mutex.
struct GeneratorState {
    last_millis: i64,
    suffix: [u8; SUFFIX_LEN],
}

/// Thread-safe push id generator.
///
/// Within one process, ids are strictly increasing even when several are
/// generated in the same millisecond. Across writers, collision resistance
/// comes from the 72-bit random suffix.
pub struct PushIdGenerator {
    state: parking_lot::Mutex<GeneratorState>,
}

impl PushIdGenerator {
    /// Create a new generator
    pub fn new() -> Self {
        Self {
            state: parking_lot::Mutex::new(GeneratorState {
                last_millis: 0,
                suffix: [0; SUFFIX_LEN],
            }),
        }
    }

    /// Generate a new unique push id
    pub fn generate(&self) -> PushId {
        let now = current_millis();
        let mut state = self.state.lock();

        if now > state.last_millis {
            state.last_millis = now;
            let mut rng = rand::thread_rng();
            for slot in &mut state.suffix {
                *slot = rng.gen_range(0..64);
            }
        } else {
            // Same millisecond (or clock went backwards): bump the suffix so
            // the new id still sorts after the previous one.
            for i in (0..SUFFIX_LEN).rev() {
                if state.suffix[i] < 63 {
                    state.suffix[i] += 1;
                    break;
                }
                state.suffix[i] = 0;
                if i == 0 {
                    // Full suffix overflow: move to the next millisecond.
                    state.last_millis += 1;
                }
            }
        }

        let mut out = [0_u8; ID_LEN];
        let mut millis = state.last_millis;
        for i in (0..PREFIX_LEN).rev() {
            out[i] = ALPHABET[(millis & 0x3F) as usize];
            millis >>= 6;
        }
        for (i, &slot) in state.suffix.iter().enumerate() {
            out[PREFIX_LEN + i] = ALPHABET[slot as usize];
        }

        // The buffer is built exclusively from the ASCII alphabet.
        PushId(String::from_utf8_lossy(&out).into_owned())
    }
}

impl Default for PushIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Current timestamp in milliseconds since Unix epoch
#[inline]
fn current_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
