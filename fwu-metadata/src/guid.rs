// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Canonical UUID text and its 16-byte wire encoding.
//!
//! On the wire the first three groups (32, 16 and 16 bits) are stored
//! byte-swapped relative to their textual hex order; the final two groups are
//! stored in textual order. That is the GUID convention, not raw text order,
//! and `uuid`'s `to_bytes_le`/`from_bytes_le` pair implements exactly it.

use uuid::Uuid;

use crate::error::{MetadataError, Result};

/// The all-zero UUID, valid as an "unset" sentinel.
pub const NIL_UUID: &str = "00000000-0000-0000-0000-000000000000";

/// Checks the canonical hyphenated 8-4-4-4-12 form, case-insensitive.
///
/// Stricter than `Uuid::parse_str`, which also accepts simple, braced and
/// URN forms that must not appear in metadata files.
pub fn validate_uuid(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() != 36 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| match i {
        8 | 13 | 18 | 23 => *b == b'-',
        _ => b.is_ascii_hexdigit(),
    })
}

/// Normalizes valid UUID text to its lowercase canonical form.
pub fn normalize_uuid(text: &str) -> Result<String> {
    Ok(parse_uuid(text)?.as_hyphenated().to_string())
}

/// Encodes canonical UUID text into the 16-byte mixed-endian wire form.
pub fn encode_uuid(text: &str) -> Result<[u8; 16]> {
    Ok(parse_uuid(text)?.to_bytes_le())
}

/// Decodes the 16-byte mixed-endian wire form back to canonical text.
pub fn decode_uuid(bytes: &[u8; 16]) -> String {
    Uuid::from_bytes_le(*bytes).as_hyphenated().to_string()
}

/// Generates a fresh random v4 UUID in canonical text form.
pub fn fresh_uuid() -> String {
    Uuid::new_v4().as_hyphenated().to_string()
}

fn parse_uuid(text: &str) -> Result<Uuid> {
    if !validate_uuid(text) {
        return Err(MetadataError::UuidFormat(text.to_string()));
    }
    Uuid::parse_str(text).map_err(|_| MetadataError::UuidFormat(text.to_string()))
}
