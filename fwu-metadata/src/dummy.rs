// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Synthetic, structurally valid metadata for a given configuration.
//!
//! The shape is deterministic (images `img_<i>` at `location_<i>`, banks
//! `img_<i>_bank_<j>`, both indices 0, every bank accepted) while every
//! symbolic key gets a fresh random UUID. Used as a baseline for tests, for
//! provisioning a fresh system, and as the interpretation basis when a raw
//! binary record is decoded without a template.

use indexmap::IndexMap;

use crate::error::{MetadataError, Result};
use crate::guid;
use crate::model::{
    bank_key, BankInfo, Configs, FwuMetadata, ImageEntry, MetadataSection, UuidTable,
};

/// Image name of slot `img` in the dummy naming scheme.
pub fn placeholder_image(img: usize) -> String {
    format!("img_{img}")
}

/// Location name of slot `img` in the dummy naming scheme.
pub fn placeholder_location(img: usize) -> String {
    format!("location_{img}")
}

/// Builds a dummy model for `image_count` images of `bank_count` banks each.
pub fn dummy_metadata(image_count: usize, bank_count: usize) -> Result<FwuMetadata> {
    if image_count < 1 || bank_count < 1 {
        return Err(MetadataError::Config { image_count, bank_count });
    }

    let mut img_entry = IndexMap::new();
    let mut entries = IndexMap::new();
    let mut locations = IndexMap::new();

    for img in 0..image_count {
        let name = placeholder_image(img);
        let location = placeholder_location(img);
        entries.insert(name.clone(), guid::fresh_uuid());
        locations.insert(location.clone(), guid::fresh_uuid());

        let mut img_bank_info = IndexMap::new();
        for bank in 0..bank_count {
            let key = bank_key(&name, bank);
            entries.insert(key.clone(), guid::fresh_uuid());
            img_bank_info.insert(key, BankInfo { accepted: true, reserved: 0 });
        }
        img_entry.insert(name, ImageEntry { location, img_bank_info });
    }

    Ok(FwuMetadata {
        metadata: MetadataSection {
            version: 0,
            active_index: 0,
            previous_active_index: 0,
            img_entry,
        },
        uuids: UuidTable { entries, locations },
        configs: Configs {
            nb_fw_img: image_count as u32,
            nb_fw_banks: bank_count as u32,
        },
    })
}
