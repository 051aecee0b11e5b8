// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Byte layout of the binary metadata record.
//!
//! The record is parametric: its geometry is fixed by the configured image
//! and bank counts, which are not stored in the record itself. Encode and
//! decode must be driven by the identical configuration; a mismatch silently
//! misinterprets the buffer. That is a property of the format, not something
//! this crate tries to detect, since the counts are external context. The
//! layout is computed once and threaded through every codec call.

use crate::error::{MetadataError, Result};

/// Offset of the crc32 header field.
pub const CRC32_OFFSET: usize = 0;
/// Offset of the version header field.
pub const VERSION_OFFSET: usize = 4;
/// Offset of the active bank-set index.
pub const ACTIVE_INDEX_OFFSET: usize = 8;
/// Offset of the previously active bank-set index.
pub const PREVIOUS_ACTIVE_INDEX_OFFSET: usize = 12;
/// Image entries start right after the header.
pub const ENTRIES_OFFSET: usize = 16;

/// Size of one UUID on the wire.
pub const UUID_SIZE: usize = 16;
/// img_type_uuid (16) + location_uuid (16) ahead of the bank records.
pub const ENTRY_HEADER_SIZE: usize = 2 * UUID_SIZE;
/// img_uuid (16) + accepted (4) + reserved (4).
pub const BANK_INFO_SIZE: usize = 24;

/// Offset of the accepted flag within one bank info record.
pub const BANK_ACCEPTED_OFFSET: usize = 16;
/// Offset of the reserved word within one bank info record.
pub const BANK_RESERVED_OFFSET: usize = 20;

/// Record geometry derived from (image count, bank count).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataLayout {
    image_count: usize,
    bank_count: usize,
    entry_stride: usize,
    total_size: usize,
}

impl MetadataLayout {
    /// Computes the layout for `image_count` images of `bank_count` banks
    /// each. Both counts must be at least 1.
    pub fn new(image_count: usize, bank_count: usize) -> Result<Self> {
        if image_count < 1 || bank_count < 1 {
            return Err(MetadataError::Config { image_count, bank_count });
        }
        let entry_stride = ENTRY_HEADER_SIZE + bank_count * BANK_INFO_SIZE;
        let total_size = ENTRIES_OFFSET + image_count * entry_stride;
        Ok(Self { image_count, bank_count, entry_stride, total_size })
    }

    /// Number of image entries in the record.
    pub fn image_count(&self) -> usize {
        self.image_count
    }

    /// Number of banks per image entry.
    pub fn bank_count(&self) -> usize {
        self.bank_count
    }

    /// Distance in bytes between consecutive image entries.
    pub fn entry_stride(&self) -> usize {
        self.entry_stride
    }

    /// Total record size in bytes.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Offset of image entry `img`, which is also its img_type_uuid field.
    pub fn entry_offset(&self, img: usize) -> usize {
        debug_assert!(img < self.image_count);
        ENTRIES_OFFSET + img * self.entry_stride
    }

    /// Offset of the location_uuid field of image entry `img`.
    pub fn location_uuid_offset(&self, img: usize) -> usize {
        self.entry_offset(img) + UUID_SIZE
    }

    /// Offset of bank info record `bank` of image entry `img`, which is also
    /// its img_uuid field.
    pub fn bank_info_offset(&self, img: usize, bank: usize) -> usize {
        debug_assert!(bank < self.bank_count);
        self.entry_offset(img) + ENTRY_HEADER_SIZE + bank * BANK_INFO_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_follows_formula() {
        for imgs in 1..=16 {
            for banks in 1..=16 {
                let layout = MetadataLayout::new(imgs, banks).expect("valid counts");
                assert_eq!(layout.total_size(), 16 + imgs * (32 + banks * 24));
            }
        }
    }

    #[test]
    fn single_image_two_banks() {
        let layout = MetadataLayout::new(1, 2).expect("valid counts");
        assert_eq!(layout.entry_stride(), 32 + 2 * 24);
        assert_eq!(layout.total_size(), 96);
        assert_eq!(layout.entry_offset(0), 16);
        assert_eq!(layout.location_uuid_offset(0), 32);
        assert_eq!(layout.bank_info_offset(0, 0), 48);
        assert_eq!(layout.bank_info_offset(0, 1), 72);
    }

    #[test]
    fn entries_are_contiguous() {
        let layout = MetadataLayout::new(3, 4).expect("valid counts");
        assert_eq!(layout.entry_offset(1), layout.entry_offset(0) + layout.entry_stride());
        assert_eq!(
            layout.bank_info_offset(2, 3) + BANK_INFO_SIZE,
            layout.total_size()
        );
    }

    #[test]
    fn zero_counts_rejected() {
        assert_eq!(
            MetadataLayout::new(0, 2).expect_err("zero images"),
            MetadataError::Config { image_count: 0, bank_count: 2 }
        );
        assert_eq!(
            MetadataLayout::new(1, 0).expect_err("zero banks"),
            MetadataError::Config { image_count: 1, bank_count: 0 }
        );
    }
}
