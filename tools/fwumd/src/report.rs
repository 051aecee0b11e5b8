// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Console report for a decoded metadata record.

use fwu_metadata::FwuMetadata;

/// Prints the header fields and every image/bank line of `model`, with the
/// stored crc32 read straight from `record`.
pub fn print_record(model: &FwuMetadata, record: &[u8]) {
    let stored_crc = u32::from_le_bytes([record[0], record[1], record[2], record[3]]);
    println!(
        "fwu_metadata v{} ({} bytes, crc32 {:#010x})",
        model.metadata.version,
        record.len(),
        stored_crc
    );
    println!("  active_index          : {}", model.metadata.active_index);
    println!("  previous_active_index : {}", model.metadata.previous_active_index);

    for (name, entry) in &model.metadata.img_entry {
        let type_uuid = uuid_of(model, name);
        let location_uuid = model
            .uuids
            .locations
            .get(&entry.location)
            .map(String::as_str)
            .unwrap_or("<unknown>");
        println!("  image `{name}` {type_uuid}");
        println!("    location `{}` {location_uuid}", entry.location);
        for (bank, (key, info)) in entry.img_bank_info.iter().enumerate() {
            let verdict = if info.accepted { "accepted" } else { "refused" };
            println!(
                "    bank {bank}: {} {verdict} (reserved {:#010x})",
                uuid_of(model, key),
                info.reserved
            );
        }
    }
}

/// Prints the raw record, 16 bytes per line.
pub fn print_hexdump(record: &[u8]) {
    for (line, chunk) in record.chunks(16).enumerate() {
        println!("  {:04x}  {}", line * 16, hex::encode(chunk));
    }
}

fn uuid_of<'a>(model: &'a FwuMetadata, key: &str) -> &'a str {
    model.uuids.entries.get(key).map(String::as_str).unwrap_or("<unknown>")
}
