//! Receipt numbers - process-wide unique payment tokens

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Receipt number attached to a paid fee record, e.g. `RCP-1718000000000-0007`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptNumber(String);

impl ReceiptNumber {
    /// Borrow the raw token
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReceiptNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Process-wide receipt number source.
///
/// Tokens embed the issue timestamp; a monotonically increasing sequence
/// disambiguates receipts issued in the same millisecond.
pub struct ReceiptGenerator {
    sequence: AtomicU64,
}

impl ReceiptGenerator {
    /// Create a new generator
    pub fn new() -> Self {
        Self {
            sequence: AtomicU64::new(0),
        }
    }

    /// Issue the next receipt number
    pub fn issue(&self) -> ReceiptNumber {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        ReceiptNumber(format!("RCP-{millis}-{seq:04}"))
    }
}

impl Default for ReceiptGenerator {
    fn default() -> Self {
        Self::new()
    }
}
