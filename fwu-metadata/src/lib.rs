// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: FWU bank-selection metadata codec and validation engine
//! OWNERS: @tools-team
//! STATUS: Functional (host-first)
//! API_STABILITY: Stable (v1.0)
//! TEST_COVERAGE: unit tests per module + tests/fwu_host integration suite
//!
//! PUBLIC API:
//!   - MetadataLayout: record geometry from (image count, bank count)
//!   - FwuMetadata / Template: structured model + name-recovery template
//!   - encode / decode: structured model <-> binary record
//!   - validate_metadata / validate_consistency: status checks
//!   - dummy_metadata: synthetic baseline model
//!
//! DEPENDENCIES:
//!   - crc32fast: record checksum (whole record, crc slot zeroed)
//!   - uuid: canonical text <-> mixed-endian GUID wire form
//!   - serde + indexmap: JSON-compatible structured form, declaration order
//!
//! The record geometry is not self-described: image and bank counts are
//! external context and must be identical on both sides of any
//! encode/decode pair. File I/O, argument parsing and report formatting
//! live in `tools/fwumd`, never here.

#![forbid(unsafe_code)]

pub mod codec;
pub mod dummy;
pub mod error;
pub mod guid;
pub mod layout;
pub mod model;
pub mod validate;

pub use codec::{decode, encode};
pub use dummy::dummy_metadata;
pub use error::{MetadataError, Result};
pub use layout::MetadataLayout;
pub use model::{
    bank_key, BankInfo, Configs, FwuMetadata, ImageEntry, MetadataSection, Template, UuidTable,
};
pub use validate::{validate_consistency, validate_metadata};
