//! Tolerant field decoders for push payloads
//!
//! `#[serde(default)]` only covers absent fields. These helpers also fall
//! back to the default when a field is present but `null` or of the wrong
//! type, so one bad field never costs the whole event.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decode the field as `T`, or `T::default()` if it does not fit
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Decode a non-negative count
///
/// Fractions are floored and numeric strings are accepted. Negative,
/// non-finite or out-of-range values become zero.
pub fn whole_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64> + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_whole_number(&value)
        .and_then(|n| T::try_from(n).ok())
        .unwrap_or_default())
}

fn as_whole_number(value: &Value) -> Option<u64> {
    let float = match value {
        Value::Number(n) => {
            if let Some(n) = n.as_u64() {
                return Some(n);
            }
            n.as_f64()?
        }
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (float.is_finite() && float >= 0.0 && float < u64::MAX as f64).then(|| float.floor() as u64)
}
