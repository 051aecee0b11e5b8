// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scripted / interactive shell over a metadata session.
//!
//! The session owns the currently loaded model; nothing is process-global.
//! Scripted runs are restricted to an allow-list of commands and stop at the
//! first failure, reporting the failing command's position. Files named on
//! the command line are loaded on entry and saved back after a clean run.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use log::debug;

use fwu_metadata::{
    bank_key, decode, dummy_metadata, encode, validate_consistency, validate_metadata,
    FwuMetadata, MetadataError, MetadataLayout,
};

use crate::report;

const EXIT_ALIASES: &[&str] = &["exit", "quit", "q", "bye"];

/// Commands allowed in non-interactive (scripted) runs.
const SCRIPT_COMMANDS: &[&str] = &[
    "echo",
    "exit",
    "load",
    "load_binary",
    "load_json",
    "save",
    "save_binary",
    "save_json",
    "autodummy",
    "dump",
    "set_bank_policy",
    "set_active_index",
    "set_previous_active_index",
    "print_choices_uuids",
    "print_all_uuids",
];

/// Files to pre-load and save back, plus loop behavior.
pub struct ShellOptions {
    pub jsonfile: Option<PathBuf>,
    /// Binary file plus the out-of-band (image count, bank count) needed to
    /// interpret it when no JSON file supplies the configs.
    pub binfile: Option<(PathBuf, usize, usize)>,
    pub keep: bool,
    pub verbose: bool,
}

/// Shell state: the currently loaded model, owned by the loop.
#[derive(Default)]
pub struct Session {
    model: Option<FwuMetadata>,
}

/// Runs `commands`, then an interactive loop if requested (or if there was
/// nothing to run), then saves back the files named in `options`.
pub fn run(commands: &[String], options: &ShellOptions) -> Result<()> {
    let mut session = Session::default();

    match (&options.jsonfile, &options.binfile) {
        (Some(json), Some((bin, _, _))) => session.load_pair(json, bin)?,
        (Some(json), None) => session.load_json(json)?,
        (None, Some((bin, imgs, banks))) => session.load_binary(bin, *imgs, *banks)?,
        (None, None) => {}
    }

    let mut exited = false;
    for (index, command) in commands.iter().enumerate() {
        if options.verbose {
            println!("+ {command}");
        }
        let name = command.split_whitespace().next().unwrap_or("");
        if !SCRIPT_COMMANDS.contains(&name) {
            bail!("command `{name}` not known/allowed for scripting");
        }
        if session
            .execute(command)
            .with_context(|| format!("script stopped at command {}/{}", index + 1, commands.len()))?
        {
            exited = true;
            break;
        }
    }

    if !exited && (options.keep || commands.is_empty()) {
        interactive_loop(&mut session)?;
    }

    if let Some(json) = &options.jsonfile {
        session.save_json(json)?;
    }
    if let Some((bin, _, _)) = &options.binfile {
        session.save_binary(bin)?;
    }
    Ok(())
}

fn interactive_loop(session: &mut Session) -> Result<()> {
    println!("Welcome! Type ? to list the commands");
    let stdin = io::stdin();
    loop {
        print!("fwupd> ");
        io::stdout().flush().ok();
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            return Ok(());
        }
        match session.execute(line.trim()) {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(err) => println!("error: {err:#}"),
        }
    }
}

impl Session {
    /// Dispatches one command line. Returns `true` when the shell should
    /// exit.
    pub fn execute(&mut self, line: &str) -> Result<bool> {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            return Ok(false);
        };
        let args: Vec<&str> = parts.collect();

        if EXIT_ALIASES.contains(&command) {
            return Ok(true);
        }
        match command {
            "help" | "?" => print_help(),
            "echo" => println!("{}", args.join(" ")),
            "load" => self.load(&args)?,
            "load_json" => self.load_json(Path::new(arg(&args, 0, "<filename>")?))?,
            "load_binary" => {
                let path = arg(&args, 0, "<filename>")?.to_string();
                let imgs = int_arg(&args, 1, "<nb_fw_imgs>")?;
                let banks = int_arg(&args, 2, "<nb_banks>")?;
                self.load_binary(Path::new(&path), imgs, banks)?;
            }
            "save" => self.save(&args)?,
            "save_json" => self.save_json(Path::new(arg(&args, 0, "<filename>")?))?,
            "save_binary" => self.save_binary(Path::new(arg(&args, 0, "<filename>")?))?,
            "autodummy" => {
                let imgs = int_arg(&args, 0, "<nb_fw_imgs>")?;
                let banks = int_arg(&args, 1, "<nb_banks>")?;
                self.model = Some(dummy_metadata(imgs, banks)?);
            }
            "dump" => self.dump()?,
            "set_bank_policy" => {
                let image = arg(&args, 0, "<image name / uuid>")?.to_string();
                let bank = arg(&args, 1, "<bank number>")?.to_string();
                let policy = arg(&args, 2, "<accept / refuse>")?.to_string();
                self.set_bank_policy(&image, &bank, &policy)?;
            }
            "set_active_index" => {
                let index = int_arg(&args, 0, "<index>")? as u32;
                self.model_mut()?
                    .set_active_index(index)
                    .map_err(|_| anyhow!("active index {index} is out of range"))?;
            }
            "set_previous_active_index" => {
                let index = int_arg(&args, 0, "<index>")? as u32;
                self.model_mut()?
                    .set_previous_active_index(index)
                    .map_err(|_| anyhow!("previous active index {index} is out of range"))?;
            }
            "print_choices_uuids" => self.print_choices_uuids()?,
            "print_all_uuids" => self.print_all_uuids()?,
            _ => bail!("unknown command `{command}`, type ? for help"),
        }
        Ok(false)
    }

    fn model(&self) -> Result<&FwuMetadata> {
        self.model
            .as_ref()
            .ok_or_else(|| anyhow!("no metadata loaded; use `load` or `autodummy` first"))
    }

    fn model_mut(&mut self) -> Result<&mut FwuMetadata> {
        self.model
            .as_mut()
            .ok_or_else(|| anyhow!("no metadata loaded; use `load` or `autodummy` first"))
    }

    fn load(&mut self, args: &[&str]) -> Result<()> {
        match arg(args, 0, "<json/binary/pair>")? {
            "json" => self.load_json(Path::new(arg(args, 1, "<filename>")?)),
            "binary" => {
                let path = arg(args, 1, "<filename>")?.to_string();
                let imgs = int_arg(args, 2, "<nb_fw_imgs>")?;
                let banks = int_arg(args, 3, "<nb_banks>")?;
                self.load_binary(Path::new(&path), imgs, banks)
            }
            "pair" => {
                let json = arg(args, 1, "<jsonfile>")?.to_string();
                let bin = arg(args, 2, "<binfile>")?.to_string();
                self.load_pair(Path::new(&json), Path::new(&bin))
            }
            other => bail!("wrong argument `{other}`, expected json, binary or pair"),
        }
    }

    fn save(&mut self, args: &[&str]) -> Result<()> {
        match arg(args, 0, "<json/binary/pair>")? {
            "json" => self.save_json(Path::new(arg(args, 1, "<filename>")?)),
            "binary" => self.save_binary(Path::new(arg(args, 1, "<filename>")?)),
            "pair" => {
                let json = arg(args, 1, "<jsonfile>")?.to_string();
                let bin = arg(args, 2, "<binfile>")?.to_string();
                self.save_json(Path::new(&json))?;
                self.save_binary(Path::new(&bin))
            }
            other => bail!("wrong argument `{other}`, expected json, binary or pair"),
        }
    }

    fn load_json(&mut self, path: &Path) -> Result<()> {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let model: FwuMetadata =
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        if !validate_metadata(&model) {
            return Err(MetadataError::Validation.into());
        }
        self.model = Some(model);
        Ok(())
    }

    fn load_binary(&mut self, path: &Path, imgs: usize, banks: usize) -> Result<()> {
        let record = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let layout = MetadataLayout::new(imgs, banks)?;
        self.model = Some(decode(&record, &layout, None)?);
        Ok(())
    }

    /// Loads the JSON model and cross-checks it against the binary record;
    /// drift between the two fails the load.
    fn load_pair(&mut self, json: &Path, bin: &Path) -> Result<()> {
        let text =
            fs::read_to_string(json).with_context(|| format!("reading {}", json.display()))?;
        let model: FwuMetadata =
            serde_json::from_str(&text).with_context(|| format!("parsing {}", json.display()))?;
        if !validate_metadata(&model) {
            return Err(MetadataError::Validation.into());
        }
        let record = fs::read(bin).with_context(|| format!("reading {}", bin.display()))?;
        let layout = model.layout()?;
        if !validate_consistency(&model, &record, &layout) {
            return Err(MetadataError::Consistency.into());
        }
        debug!("pair {} / {} is consistent", json.display(), bin.display());
        self.model = Some(model);
        Ok(())
    }

    fn save_json(&self, path: &Path) -> Result<()> {
        let model = self.model()?;
        let mut text = serde_json::to_string_pretty(model)?;
        text.push('\n');
        fs::write(path, text).with_context(|| format!("writing {}", path.display()))
    }

    fn save_binary(&self, path: &Path) -> Result<()> {
        let model = self.model()?;
        let record = encode(model, &model.layout()?)?;
        fs::write(path, record).with_context(|| format!("writing {}", path.display()))
    }

    fn dump(&self) -> Result<()> {
        let model = self.model()?;
        let record = encode(model, &model.layout()?)?;
        println!("--- record ---");
        report::print_record(model, &record);
        println!("--- json ---");
        println!("{}", serde_json::to_string_pretty(model)?);
        Ok(())
    }

    fn set_bank_policy(&mut self, image: &str, bank: &str, policy: &str) -> Result<()> {
        let accepted = match policy {
            "accept" | "1" | "true" => true,
            "refuse" | "0" | "false" => false,
            other => bail!("policy `{other}` not recognized"),
        };
        let bank: usize = bank
            .parse()
            .with_context(|| format!("bank has to be set by number, got `{bank}`"))?;

        let model = self.model_mut()?;
        // The image may be named either by its key or by its type UUID.
        let name = if model.metadata.img_entry.contains_key(image) {
            image.to_string()
        } else {
            let matched = model
                .uuids
                .entries
                .iter()
                .find(|(key, value)| {
                    !key.contains("_bank_") && value.eq_ignore_ascii_case(image)
                })
                .map(|(key, _)| key.clone());
            match matched {
                Some(name) => name,
                None => {
                    let known: Vec<&str> = model.image_names().collect();
                    bail!("image `{image}` not found in metadata (images: {})", known.join(", "));
                }
            }
        };
        model
            .set_bank_accepted(&name, bank, accepted)
            .map_err(|_| anyhow!("bank {bank} not found in entry `{name}`"))
    }

    fn print_choices_uuids(&self) -> Result<()> {
        let model = self.model()?;
        let active = model.metadata.active_index as usize;
        println!("Banks {active} selected");
        let mut will_boot = true;
        for (name, entry) in &model.metadata.img_entry {
            let key = bank_key(name, active);
            let accepted = entry.img_bank_info.get(&key).map(|info| info.accepted).unwrap_or(false);
            let uuid = model.uuids.entries.get(&key).map(String::as_str).unwrap_or("<unknown>");
            let verdict = if accepted { "accepted" } else { "refused" };
            will_boot &= accepted;
            println!("{name}: {uuid} ({verdict})");
        }
        if !will_boot {
            println!();
            println!("/!\\ This setup will not be booted");
            println!("    Verify that all the banks are accepted");
            println!();
        }
        Ok(())
    }

    fn print_all_uuids(&self) -> Result<()> {
        let model = self.model()?;
        println!("--- Locations ---");
        for (key, uuid) in &model.uuids.locations {
            println!("{key}: {uuid}");
        }

        println!();
        println!("--- Image types ---");
        let images: Vec<&String> =
            model.uuids.entries.keys().filter(|key| !key.contains("_bank_")).collect();
        for key in &images {
            println!("{key}: {}", model.uuids.entries[key.as_str()]);
        }

        println!();
        println!("--- Image banks ---");
        for image in &images {
            println!(" - {image} banks");
            let prefix = format!("{image}_bank_");
            for (key, uuid) in &model.uuids.entries {
                if key.starts_with(&prefix) {
                    println!("\t{key}: {uuid}");
                }
            }
            println!();
        }
        Ok(())
    }
}

fn arg<'a>(args: &[&'a str], index: usize, what: &str) -> Result<&'a str> {
    args.get(index).copied().ok_or_else(|| anyhow!("expected argument {what}"))
}

fn int_arg(args: &[&str], index: usize, what: &str) -> Result<usize> {
    arg(args, index, what)?
        .parse()
        .with_context(|| format!("argument {what} must be a number"))
}

fn print_help() {
    println!("Commands:");
    println!("  load <json/binary/pair> <args...>   load a file into the session");
    println!("      json:   <filename>");
    println!("      binary: <filename> <nb_fw_imgs> <nb_banks>");
    println!("      pair:   <jsonfile> <binfile> (cross-checked for drift)");
    println!("  save <json/binary/pair> <filename(s)>");
    println!("  autodummy <nb_fw_imgs> <nb_banks>   generate a dummy model");
    println!("  dump                                print record and JSON form");
    println!("  set_bank_policy <image> <bank> <accept/refuse>");
    println!("  set_active_index <n>");
    println!("  set_previous_active_index <n>");
    println!("  print_choices_uuids                 images selected by the active index");
    println!("  print_all_uuids                     every known uuid by section");
    println!("  echo <message>");
    println!("  exit ({})", EXIT_ALIASES.join(", "));
}
