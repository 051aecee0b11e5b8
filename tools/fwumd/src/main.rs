// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: Host CLI for FWU bank-selection metadata
//! OWNERS: @tools-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: unit tests below + shell session tests
//!
//! PUBLIC API:
//!   - CLI: fwumd [--nb-fw-imgs N] [--nb-banks N] <dummy|jsonparse|binparse|dump|shell>
//!
//! DEPENDENCIES:
//!   - fwu-metadata: codec + validation core (owns no I/O)
//!   - clap: argument parsing
//!   - serde_json: structured metadata files and templates
//!
//! All file I/O and console formatting happen here; the core library only
//! ever sees in-memory buffers and models.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use fwu_metadata::{
    decode, dummy_metadata, encode, validate_metadata, FwuMetadata, MetadataError,
    MetadataLayout, Template,
};

mod report;
mod shell;

#[derive(Parser)]
#[command(name = "fwumd", version, about = "Interact with FWU bank-selection metadata")]
struct Cli {
    /// Number of firmware images in entries
    #[arg(long, global = true, default_value_t = 1)]
    nb_fw_imgs: usize,
    /// Number of firmware banks for each image
    #[arg(long, global = true, default_value_t = 2)]
    nb_banks: usize,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a dummy JSON metadata file and a dummy binary metadata file
    Dummy {
        /// Display the record after creation
        #[arg(long, short = 'v')]
        display: bool,
        /// JSON file to write the dummy metadata to
        #[arg(long, short = 'j', default_value = "dummy.json")]
        jsonfile: PathBuf,
        /// Binary file to write the dummy metadata to
        #[arg(long, short = 'b', default_value = "dummy.bin")]
        binfile: PathBuf,
    },
    /// Parse JSON metadata and create a binary metadata file
    Jsonparse {
        /// JSON file to read the metadata from
        jsonfile: PathBuf,
        /// Display the record after creation
        #[arg(long, short = 'v')]
        display: bool,
        /// Binary file to write
        #[arg(long, short = 'b', default_value = "fwupd.bin")]
        binfile: PathBuf,
    },
    /// Parse a binary record and generate a JSON metadata file
    Binparse {
        /// Binary file to read the record from
        binfile: PathBuf,
        /// Display the record after parsing
        #[arg(long, short = 'v')]
        display: bool,
        /// JSON file to write
        #[arg(long, short = 'j', default_value = "fwupd.json")]
        jsonfile: PathBuf,
        /// JSON template supplying the configs and known uuid names
        #[arg(long, short = 't')]
        template: Option<PathBuf>,
    },
    /// Read a binary metadata file and print its contents
    Dump {
        /// Binary file to read the record from
        binfile: PathBuf,
    },
    /// Interact with metadata from an interactive or scripted shell
    Shell {
        /// JSON file to load on entry and save back on exit
        #[arg(long, short = 'j')]
        jsonfile: Option<PathBuf>,
        /// Binary file to load on entry and save back on exit
        #[arg(long, short = 'b')]
        binfile: Option<PathBuf>,
        /// File containing shell commands to run first
        #[arg(long, short = 's')]
        script: Option<PathBuf>,
        /// Keep the shell open for interactive commands after the script
        #[arg(long, short = 'k')]
        keep: bool,
        /// Echo commands as they run
        #[arg(long, short = 'v')]
        verbose: bool,
        /// Comma-separated commands to run after the script
        commands: Vec<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Dummy { display, jsonfile, binfile } => {
            let model = dummy_metadata(cli.nb_fw_imgs, cli.nb_banks)?;
            if !validate_metadata(&model) {
                return Err(MetadataError::Validation.into());
            }
            let record = encode(&model, &model.layout()?)?;
            if display {
                report::print_record(&model, &record);
            }
            write_json(&jsonfile, &model)?;
            fs::write(&binfile, &record)
                .with_context(|| format!("writing {}", binfile.display()))?;
            info!("dummy metadata written to {} and {}", jsonfile.display(), binfile.display());
            Ok(())
        }
        Command::Jsonparse { jsonfile, display, binfile } => {
            let model = read_json(&jsonfile)?;
            if !validate_metadata(&model) {
                return Err(MetadataError::Validation.into());
            }
            let record = encode(&model, &model.layout()?)?;
            if display {
                report::print_record(&model, &record);
            }
            fs::write(&binfile, &record)
                .with_context(|| format!("writing {}", binfile.display()))?;
            Ok(())
        }
        Command::Binparse { binfile, display, jsonfile, template } => {
            let record = fs::read(&binfile)
                .with_context(|| format!("reading {}", binfile.display()))?;
            let template = match template {
                Some(path) => Some(read_template(&path)?),
                None => None,
            };
            // The template's configs override the command-line counts; the
            // record itself cannot say how big it is.
            let layout = match &template {
                Some(t) => MetadataLayout::new(
                    t.configs.nb_fw_img as usize,
                    t.configs.nb_fw_banks as usize,
                )?,
                None => MetadataLayout::new(cli.nb_fw_imgs, cli.nb_banks)?,
            };
            let model = decode(&record, &layout, template.as_ref())?;
            if display {
                report::print_record(&model, &record);
            }
            write_json(&jsonfile, &model)?;
            Ok(())
        }
        Command::Dump { binfile } => {
            let record = fs::read(&binfile)
                .with_context(|| format!("reading {}", binfile.display()))?;
            let layout = MetadataLayout::new(cli.nb_fw_imgs, cli.nb_banks)?;
            let model = decode(&record, &layout, None)?;
            report::print_record(&model, &record);
            report::print_hexdump(&record);
            Ok(())
        }
        Command::Shell { jsonfile, binfile, script, keep, verbose, commands } => {
            let mut cmdlist = Vec::new();
            if let Some(path) = script {
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                cmdlist.extend(parse_script_lines(&text));
            }
            cmdlist.extend(parse_script_lines(&commands.join(" ")));
            let options = shell::ShellOptions {
                jsonfile,
                binfile: binfile.map(|path| (path, cli.nb_fw_imgs, cli.nb_banks)),
                keep,
                verbose,
            };
            shell::run(&cmdlist, &options)
        }
    }
}

fn read_json(path: &Path) -> Result<FwuMetadata> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn read_template(path: &Path) -> Result<Template> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn write_json(path: &Path, model: &FwuMetadata) -> Result<()> {
    let mut text = serde_json::to_string_pretty(model)?;
    text.push('\n');
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

/// Strips `#` comments, splits comma-separated commands, drops empties.
fn parse_script_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.split('#').next())
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|cmd| !cmd.is_empty())
        .map(str::to_string)
        .collect()
}
