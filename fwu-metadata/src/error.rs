// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the metadata codec.
//!
//! Codec-layer functions fail fast: a malformed size or byte sequence means a
//! caller or configuration defect, not a recoverable runtime condition. The
//! checks in [`crate::validate`] return status booleans instead; a caller
//! that wants to abort converts `false` into [`MetadataError::Validation`]
//! or [`MetadataError::Consistency`].

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = core::result::Result<T, MetadataError>;

/// Errors produced by the metadata codec and its helpers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetadataError {
    /// Image or bank count outside the supported range.
    #[error("invalid configuration: {image_count} image(s), {bank_count} bank(s)")]
    Config {
        /// Configured number of firmware images.
        image_count: usize,
        /// Configured number of banks per image.
        bank_count: usize,
    },
    /// Binary buffer length does not match the layout's record size.
    #[error("buffer is {actual} bytes, expected {expected}")]
    SizeMismatch {
        /// Record size demanded by the layout.
        expected: usize,
        /// Length of the buffer handed in.
        actual: usize,
    },
    /// Stored crc32 does not match the one recomputed over the record.
    #[error("crc32 mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    Integrity {
        /// Checksum read from the record.
        stored: u32,
        /// Checksum recomputed with the crc32 slot zeroed.
        computed: u32,
    },
    /// Structural validation failed.
    #[error("metadata failed structural validation")]
    Validation,
    /// Structured model and binary record carry diverging values.
    #[error("structured metadata and binary record do not match")]
    Consistency,
    /// UUID text is not in canonical 8-4-4-4-12 form.
    #[error("malformed uuid `{0}`")]
    UuidFormat(String),
    /// The UUID side-table has no value for a key the encoder needs.
    #[error("no uuid registered for key `{0}`")]
    Encode(String),
}
