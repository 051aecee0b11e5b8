// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Structural validation and model/binary cross-consistency.
//!
//! Both checks report a status boolean instead of failing: the caller (a
//! shell, a CLI, provisioning scripts) decides whether a `false` aborts the
//! run or is merely reported. Neither check ever mutates its input. The
//! reason for a `false` is logged at debug level.

use log::debug;

use crate::codec;
use crate::guid;
use crate::layout::MetadataLayout;
use crate::model::{bank_key, FwuMetadata};

/// Checks that `model` is structurally well-formed: counts match the carried
/// configuration, indices are in range, bank keys follow the
/// `"<image>_bank_<n>"` scheme in slot order, every symbolic key has a
/// side-table value and every side-table value is syntactically valid UUID
/// text (the all-zero UUID serving as the "unset" sentinel).
pub fn validate_metadata(model: &FwuMetadata) -> bool {
    let image_count = model.configs.nb_fw_img as usize;
    let bank_count = model.configs.nb_fw_banks as usize;
    if image_count < 1 || bank_count < 1 {
        debug!("configs carry non-positive counts");
        return false;
    }
    if model.metadata.img_entry.len() != image_count {
        debug!(
            "{} image entries, configs say {image_count}",
            model.metadata.img_entry.len()
        );
        return false;
    }
    if model.metadata.active_index >= model.configs.nb_fw_banks
        || model.metadata.previous_active_index >= model.configs.nb_fw_banks
    {
        debug!("bank-set index out of range");
        return false;
    }

    for (name, entry) in &model.metadata.img_entry {
        if !model.uuids.entries.contains_key(name) {
            debug!("image `{name}` missing from the uuid side-table");
            return false;
        }
        if !model.uuids.locations.contains_key(&entry.location) {
            debug!("location `{}` missing from the uuid side-table", entry.location);
            return false;
        }
        if entry.img_bank_info.len() != bank_count {
            debug!("image `{name}` has {} banks, configs say {bank_count}", entry.img_bank_info.len());
            return false;
        }
        for (bank, key) in entry.img_bank_info.keys().enumerate() {
            if *key != bank_key(name, bank) {
                debug!("bank {bank} of image `{name}` is keyed `{key}`");
                return false;
            }
            if !model.uuids.entries.contains_key(key) {
                debug!("bank `{key}` missing from the uuid side-table");
                return false;
            }
        }
    }

    for (key, value) in model.uuids.entries.iter().chain(model.uuids.locations.iter()) {
        if !guid::validate_uuid(value) {
            debug!("side-table value for `{key}` is not canonical uuid text");
            return false;
        }
    }

    true
}

/// Checks that `model` and a previously written binary `record` carry the
/// same information under `layout`.
///
/// The comparison is field by field, not byte for byte: both sides are
/// brought into the placeholder name space (re-encode the model, decode both
/// buffers without a template) so that symbolic-name resolution differences
/// cannot mask or fake a divergence. Catches drift between independently
/// edited structured data and a stale binary file.
pub fn validate_consistency(
    model: &FwuMetadata,
    record: &[u8],
    layout: &MetadataLayout,
) -> bool {
    let ours = match codec::encode(model, layout) {
        Ok(buf) => buf,
        Err(err) => {
            debug!("model does not encode under this layout: {err}");
            return false;
        }
    };
    let ours = match codec::decode(&ours, layout, None) {
        Ok(decoded) => decoded,
        Err(err) => {
            debug!("re-encoded model does not decode: {err}");
            return false;
        }
    };
    let theirs = match codec::decode(record, layout, None) {
        Ok(decoded) => decoded,
        Err(err) => {
            debug!("binary record does not decode: {err}");
            return false;
        }
    };

    if ours.metadata.version != theirs.metadata.version {
        debug!(
            "version diverges: {} vs {}",
            ours.metadata.version, theirs.metadata.version
        );
        return false;
    }
    if ours.metadata.active_index != theirs.metadata.active_index {
        debug!(
            "active_index diverges: {} vs {}",
            ours.metadata.active_index, theirs.metadata.active_index
        );
        return false;
    }
    if ours.metadata.previous_active_index != theirs.metadata.previous_active_index {
        debug!(
            "previous_active_index diverges: {} vs {}",
            ours.metadata.previous_active_index, theirs.metadata.previous_active_index
        );
        return false;
    }
    // Placeholder keys are positional on both sides, so map equality is
    // value equality: every image-type, location and bank UUID plus every
    // accepted/reserved word.
    if ours.metadata.img_entry != theirs.metadata.img_entry {
        debug!("bank records diverge");
        return false;
    }
    if ours.uuids != theirs.uuids {
        debug!("uuid values diverge");
        return false;
    }

    true
}
