//! JSON encoding of payloads
//!
//! serde_json refuses documents nested deeper than 128 levels and both its
//! parser and serializer recurse once per level. Payloads here may nest up to
//! [`MAX_DEPTH`] levels, so decoding lifts the recursion limit and both
//! directions run on a stack that grows on demand.

use crate::Payload;
use serde::de::Error as _;
use serde::{Deserialize, Serialize};

/// Deepest array/object nesting accepted in a payload
pub const MAX_DEPTH: usize = 1024;

/// Decodes a payload, rejecting documents nested deeper than [`MAX_DEPTH`]
pub fn from_slice(bytes: &[u8]) -> Result<Payload, serde_json::Error> {
    check_depth(bytes)?;

    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let value = Payload::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

/// Encodes a payload as compact JSON
pub fn to_vec(value: &Payload) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::with_capacity(128);
    let mut ser = serde_json::Serializer::new(&mut out);
    value.serialize(serde_stacker::Serializer::new(&mut ser))?;
    Ok(out)
}

/// Scans brackets outside of strings. Malformed input is left for the parser
/// to report.
fn check_depth(bytes: &[u8]) -> Result<(), serde_json::Error> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for &b in bytes {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(serde_json::Error::custom(format!(
                        "payload nests deeper than {MAX_DEPTH} levels"
                    )));
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}
