use serde::{Deserialize, Serialize};

/// Tuning knobs shared by the binary and JSON encoders.
///
/// Deserializable so a host can embed it in its own configuration; missing
/// fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Bytes preallocated by each encoder's writer.
    pub initial_capacity: usize,
    /// Digits after the decimal point for floats in JSON output.
    pub float_decimals: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 64 * 1024,
            float_decimals: 6,
        }
    }
}
