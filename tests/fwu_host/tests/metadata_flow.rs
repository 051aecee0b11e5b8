// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: Integration tests for the FWU metadata codec and validators
//! OWNERS: @tools-team
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: 9 tests
//!
//! TEST_SCOPE:
//!   - Known-answer wire format (offsets, endianness, GUID byte order)
//!   - Dummy model round-trip
//!   - Template and template-less name recovery
//!   - Integrity rejection for every single-bit corruption
//!   - Size mismatch rejection
//!   - Structural validation limits
//!   - Model/binary drift detection
//!
//! TEST_SCENARIOS:
//!   - test_known_answer_record(): JSON fixture encodes to the documented layout
//!   - test_dummy_round_trips_exactly(): generate(1, 2) survives encode/decode
//!   - test_template_recovers_symbolic_keys(): exact template, identical keys
//!   - test_template_less_decode_uses_placeholders(): values survive, names don't
//!   - test_every_bit_flip_is_detected(): corruption outside the crc slot
//!   - test_wrong_size_is_rejected(): truncated and padded buffers
//!   - test_active_index_out_of_range_fails_validation()
//!   - test_consistency_detects_flipped_accepted_flag()
//!   - test_consistency_holds_for_own_encoding()

use fwu_metadata::{
    decode, dummy_metadata, encode, validate_consistency, validate_metadata, FwuMetadata,
    MetadataError, Template,
};

const FIXTURE: &str = r#"{
  "metadata": {
    "version": 1,
    "active_index": 0,
    "previous_active_index": 0,
    "img_entry": {
      "app": {
        "location": "sda",
        "img_bank_info": {
          "app_bank_0": { "accepted": true, "reserved": 0 }
        }
      }
    }
  },
  "uuids": {
    "entries": {
      "app": "01020304-0506-0708-090a-0b0c0d0e0f10",
      "app_bank_0": "ffeeddcc-bbaa-9988-7766-554433221100"
    },
    "locations": {
      "sda": "00112233-4455-6677-8899-aabbccddeeff"
    }
  },
  "configs": { "nb_fw_img": 1, "nb_fw_banks": 1 }
}"#;

fn fixture_model() -> FwuMetadata {
    serde_json::from_str(FIXTURE).expect("fixture parses")
}

#[test]
fn test_known_answer_record() {
    let model = fixture_model();
    assert!(validate_metadata(&model));
    let layout = model.layout().expect("valid configs");
    assert_eq!(layout.total_size(), 72);

    let record = encode(&model, &layout).expect("encodable");
    assert_eq!(record.len(), 72);

    // Header: version 1, both indices 0, all little-endian.
    assert_eq!(&record[4..8], &[1, 0, 0, 0]);
    assert_eq!(&record[8..16], &[0; 8]);

    // img_type_uuid: first three groups byte-swapped, last two verbatim.
    assert_eq!(
        &record[16..32],
        &[0x04, 0x03, 0x02, 0x01, 0x06, 0x05, 0x08, 0x07, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
            0x0f, 0x10]
    );
    // location_uuid for `sda`.
    assert_eq!(
        &record[32..48],
        &[0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd,
            0xee, 0xff]
    );
    // bank img_uuid, then accepted = 1 and reserved = 0.
    assert_eq!(
        &record[48..64],
        &[0xcc, 0xdd, 0xee, 0xff, 0xaa, 0xbb, 0x88, 0x99, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22,
            0x11, 0x00]
    );
    assert_eq!(&record[64..68], &[1, 0, 0, 0]);
    assert_eq!(&record[68..72], &[0, 0, 0, 0]);

    // The stamped crc32 must verify on decode.
    let decoded = decode(&record, &layout, None).expect("intact record");
    assert_eq!(decoded.metadata.version, 1);
}

#[test]
fn test_dummy_round_trips_exactly() {
    let model = dummy_metadata(1, 2).expect("valid counts");
    assert!(validate_metadata(&model));
    let layout = model.layout().expect("valid configs");
    let record = encode(&model, &layout).expect("encodable");
    let decoded = decode(&record, &layout, None).expect("intact record");
    assert_eq!(decoded, model);
}

#[test]
fn test_template_recovers_symbolic_keys() {
    let mut model = fixture_two_image_model();
    model.set_active_index(1).expect("in range");
    let layout = model.layout().expect("valid configs");
    let record = encode(&model, &layout).expect("encodable");

    let template = Template { configs: model.configs, uuids: model.uuids.clone() };
    let decoded = decode(&record, &layout, Some(&template)).expect("intact record");

    assert_eq!(decoded.image_names().collect::<Vec<_>>(), ["boot", "app"]);
    assert_eq!(decoded, model);
}

#[test]
fn test_template_less_decode_uses_placeholders() {
    let mut model = fixture_two_image_model();
    model.set_active_index(1).expect("in range");
    model.set_bank_accepted("app", 1, false).expect("bank exists");
    let layout = model.layout().expect("valid configs");
    let record = encode(&model, &layout).expect("encodable");

    let decoded = decode(&record, &layout, None).expect("intact record");
    assert_eq!(decoded.image_names().collect::<Vec<_>>(), ["img_0", "img_1"]);
    assert_eq!(decoded.metadata.active_index, 1);

    // Same UUID and accepted values under the synthesized keys.
    assert_eq!(decoded.uuids.entries["img_0"], model.uuids.entries["boot"]);
    assert_eq!(decoded.uuids.entries["img_1"], model.uuids.entries["app"]);
    assert_eq!(decoded.uuids.entries["img_1_bank_1"], model.uuids.entries["app_bank_1"]);
    assert!(!decoded.metadata.img_entry["img_1"].img_bank_info["img_1_bank_1"].accepted);
    assert!(decoded.metadata.img_entry["img_0"].img_bank_info["img_0_bank_0"].accepted);
}

#[test]
fn test_every_bit_flip_is_detected() {
    let model = fixture_model();
    let layout = model.layout().expect("valid configs");
    let record = encode(&model, &layout).expect("encodable");

    // Every bit outside the crc32 slot must trip the integrity check.
    for byte in 4..record.len() {
        for bit in 0..8 {
            let mut corrupted = record.clone();
            corrupted[byte] ^= 1 << bit;
            let err = decode(&corrupted, &layout, None)
                .expect_err("corruption must not decode");
            assert!(
                matches!(err, MetadataError::Integrity { .. }),
                "byte {byte} bit {bit} slipped through"
            );
        }
    }
}

#[test]
fn test_wrong_size_is_rejected() {
    let model = fixture_model();
    let layout = model.layout().expect("valid configs");
    let mut record = encode(&model, &layout).expect("encodable");

    record.pop();
    assert_eq!(
        decode(&record, &layout, None).expect_err("truncated"),
        MetadataError::SizeMismatch { expected: 72, actual: 71 }
    );
    record.extend_from_slice(&[0, 0]);
    assert_eq!(
        decode(&record, &layout, None).expect_err("padded"),
        MetadataError::SizeMismatch { expected: 72, actual: 73 }
    );
}

#[test]
fn test_active_index_out_of_range_fails_validation() {
    let mut model = dummy_metadata(1, 2).expect("valid counts");
    assert!(validate_metadata(&model));
    model.metadata.active_index = 2;
    assert!(!validate_metadata(&model));
}

#[test]
fn test_consistency_holds_for_own_encoding() {
    let model = fixture_two_image_model();
    let layout = model.layout().expect("valid configs");
    let record = encode(&model, &layout).expect("encodable");
    assert!(validate_consistency(&model, &record, &layout));
}

#[test]
fn test_consistency_detects_flipped_accepted_flag() {
    let mut model = fixture_two_image_model();
    let layout = model.layout().expect("valid configs");
    let record = encode(&model, &layout).expect("encodable");

    // Flip the flag in the model only; the stale record must be caught.
    model.set_bank_accepted("boot", 0, false).expect("bank exists");
    assert!(!validate_consistency(&model, &record, &layout));
}

/// Two images ("boot", "app") with two banks each.
///
/// Parsed with `from_str`, not the `json!` macro: `serde_json::Value`
/// reorders object keys, and declaration order is what defines binary slot
/// order.
fn fixture_two_image_model() -> FwuMetadata {
    serde_json::from_str(
        r#"{
        "metadata": {
            "version": 3,
            "active_index": 0,
            "previous_active_index": 0,
            "img_entry": {
                "boot": {
                    "location": "nor0",
                    "img_bank_info": {
                        "boot_bank_0": { "accepted": true, "reserved": 0 },
                        "boot_bank_1": { "accepted": true, "reserved": 0 }
                    }
                },
                "app": {
                    "location": "mmc0",
                    "img_bank_info": {
                        "app_bank_0": { "accepted": true, "reserved": 0 },
                        "app_bank_1": { "accepted": true, "reserved": 0 }
                    }
                }
            }
        },
        "uuids": {
            "entries": {
                "boot": "0aa1665d-fbf7-49a8-a3a4-0b12e3ad5fa8",
                "boot_bank_0": "94e7bb53-8cd9-4e30-993c-9e4bea59580f",
                "boot_bank_1": "a2e31a5c-99fb-4f15-a5ea-e2b3a8a54b66",
                "app": "3f1a2b3c-4d5e-4f60-8172-93a4b5c6d7e8",
                "app_bank_0": "c0ffee00-1111-4222-8333-444455556666",
                "app_bank_1": "deadbeef-7777-4888-9999-000011112222"
            },
            "locations": {
                "nor0": "5a0b4d1e-2c3f-4a5b-8c7d-6e5f4a3b2c1d",
                "mmc0": "7b8c9dae-0f1e-42d3-94c5-b6a798d90e1f"
            }
        },
        "configs": { "nb_fw_img": 2, "nb_fw_banks": 2 }
    }"#,
    )
    .expect("fixture parses")
}
