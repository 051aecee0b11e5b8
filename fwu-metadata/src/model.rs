// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Structured metadata model.
//!
//! The canonical in-memory shape of the record: header fields, per-image
//! entries with per-bank records, and the UUID side-table mapping symbolic
//! keys (image name, location name, `"<image>_bank_<n>"`) to canonical UUID
//! text. The side-table has no binary counterpart; it is what keeps the
//! structured form human-editable.
//!
//! Maps are `IndexMap` so JSON declaration order is preserved; iteration
//! order defines binary slot order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{MetadataError, Result};
use crate::layout::MetadataLayout;

/// Top-level structured form, the unit of load/save/generate/decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FwuMetadata {
    /// Header fields and per-image entries.
    pub metadata: MetadataSection,
    /// Symbolic key to UUID side-table.
    pub uuids: UuidTable,
    /// Out-of-band record geometry.
    pub configs: Configs,
}

/// Header fields plus the ordered image entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSection {
    /// Metadata format version.
    pub version: u32,
    /// Currently selected bank set.
    pub active_index: u32,
    /// Previously selected bank set, kept for rollback.
    pub previous_active_index: u32,
    /// Image entries keyed by image name, in record order.
    pub img_entry: IndexMap<String, ImageEntry>,
}

/// One firmware image slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    /// Key into the side-table's `locations`.
    pub location: String,
    /// Bank records keyed `"<image>_bank_<n>"`, in record order.
    pub img_bank_info: IndexMap<String, BankInfo>,
}

/// Per-bank trial-boot state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankInfo {
    /// Bank passed trial-boot confirmation.
    pub accepted: bool,
    /// Unused on current hardware, carried verbatim.
    pub reserved: u32,
}

/// Symbolic key to canonical UUID text. Structured form only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UuidTable {
    /// Image names and bank keys.
    pub entries: IndexMap<String, String>,
    /// Location names.
    pub locations: IndexMap<String, String>,
}

/// Record geometry carried alongside the structured form, since the binary
/// record does not describe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configs {
    /// Number of firmware images.
    pub nb_fw_img: u32,
    /// Number of banks per image.
    pub nb_fw_banks: u32,
}

/// Template fragment supplied to recover symbolic names when decoding a raw
/// binary record: the geometry plus the known key-to-UUID tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Record geometry the binary was produced with.
    pub configs: Configs,
    /// Known symbolic names, matched against decoded UUIDs by value.
    pub uuids: UuidTable,
}

/// Side-table key of bank `bank` of image `image`.
pub fn bank_key(image: &str, bank: usize) -> String {
    format!("{image}_bank_{bank}")
}

impl FwuMetadata {
    /// Layout implied by the carried configuration.
    pub fn layout(&self) -> Result<MetadataLayout> {
        MetadataLayout::new(self.configs.nb_fw_img as usize, self.configs.nb_fw_banks as usize)
    }

    /// Sets the active bank-set index, range-checked against the
    /// configured bank count.
    pub fn set_active_index(&mut self, index: u32) -> Result<()> {
        if index >= self.configs.nb_fw_banks {
            return Err(MetadataError::Validation);
        }
        self.metadata.active_index = index;
        Ok(())
    }

    /// Sets the previous active bank-set index, range-checked against the
    /// configured bank count.
    pub fn set_previous_active_index(&mut self, index: u32) -> Result<()> {
        if index >= self.configs.nb_fw_banks {
            return Err(MetadataError::Validation);
        }
        self.metadata.previous_active_index = index;
        Ok(())
    }

    /// Flips the accepted flag of bank `bank` of image `image`.
    ///
    /// Fails if the image or the bank record does not exist.
    pub fn set_bank_accepted(&mut self, image: &str, bank: usize, accepted: bool) -> Result<()> {
        let entry = self
            .metadata
            .img_entry
            .get_mut(image)
            .ok_or(MetadataError::Validation)?;
        let key = bank_key(image, bank);
        let info = entry.img_bank_info.get_mut(&key).ok_or(MetadataError::Validation)?;
        info.accepted = accepted;
        Ok(())
    }

    /// Image names in record order.
    pub fn image_names(&self) -> impl Iterator<Item = &str> {
        self.metadata.img_entry.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy::dummy_metadata;

    #[test]
    fn json_field_names_match_schema() {
        let model = dummy_metadata(1, 2).expect("valid counts");
        let json = serde_json::to_value(&model).expect("serializable");
        assert!(json["metadata"]["img_entry"]["img_0"]["img_bank_info"]["img_0_bank_0"]
            ["accepted"]
            .is_boolean());
        assert!(json["uuids"]["entries"]["img_0_bank_1"].is_string());
        assert!(json["uuids"]["locations"]["location_0"].is_string());
        assert_eq!(json["configs"]["nb_fw_img"], 1);
        assert_eq!(json["configs"]["nb_fw_banks"], 2);
    }

    #[test]
    fn json_round_trip_preserves_entry_order() {
        let model = dummy_metadata(3, 2).expect("valid counts");
        let text = serde_json::to_string(&model).expect("serializable");
        let back: FwuMetadata = serde_json::from_str(&text).expect("deserializable");
        assert_eq!(back, model);
        let names: Vec<_> = back.image_names().collect();
        assert_eq!(names, ["img_0", "img_1", "img_2"]);
    }

    #[test]
    fn set_active_index_rejects_out_of_range() {
        let mut model = dummy_metadata(1, 2).expect("valid counts");
        model.set_active_index(1).expect("in range");
        assert_eq!(model.metadata.active_index, 1);
        let err = model.set_active_index(2).expect_err("out of range");
        assert_eq!(err, MetadataError::Validation);
    }

    #[test]
    fn set_bank_accepted_requires_existing_bank() {
        let mut model = dummy_metadata(1, 2).expect("valid counts");
        model.set_bank_accepted("img_0", 1, false).expect("bank exists");
        assert!(!model.metadata.img_entry["img_0"].img_bank_info["img_0_bank_1"].accepted);
        model.set_bank_accepted("img_0", 2, true).expect_err("no such bank");
        model.set_bank_accepted("nope", 0, true).expect_err("no such image");
    }
}
