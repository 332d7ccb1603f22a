//! `vault` — open, create, and re-key PassKeeper vault files.
//!
//! The interactive editor is a separate program; this tool covers the
//! lifecycle around it: creating a vault, inspecting it from a terminal,
//! and rotating the master password.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use passkeeper_vault::{CellRole, Record, VaultEngine};

#[derive(Parser)]
#[command(
    name = "vault",
    about = "Local encrypted password vault",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Vault file: opened if it exists, created otherwise.
    file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Open an existing vault and list its records.
    Open {
        /// Path to the vault file.
        file: PathBuf,
    },
    /// Create a new empty vault, overwriting any existing file.
    New {
        /// Path for the new vault file.
        file: PathBuf,
    },
    /// Change the master password of an existing vault.
    Chpass {
        /// Path to the vault file.
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::init();

    // Bad usage exits 1; only help and version output exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    let result = match (cli.command, cli.file) {
        (Some(Command::Open { file }), _) => open_vault(&file),
        (Some(Command::New { file }), _) => new_vault(&file),
        (Some(Command::Chpass { file }), _) => change_password(&file),
        (None, Some(file)) => {
            if file.exists() {
                open_vault(&file)
            } else {
                new_vault(&file)
            }
        }
        (None, None) => {
            // Without a file there is nothing to do but explain ourselves.
            let _ = Cli::command().print_help();
            return ExitCode::SUCCESS;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("vault: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn open_vault(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("{} does not exist (use `vault new` to create it)", path.display());
    }
    let password = rpassword::prompt_password("Master password: ")
        .context("cannot read the master password")?;

    let mut engine = VaultEngine::new(path);
    engine.set_password(&password);
    engine.load()?;
    log::info!(
        "opened {} with {} record(s)",
        path.display(),
        engine.records().len()
    );

    print_records(&engine);
    Ok(())
}

fn new_vault(path: &Path) -> Result<()> {
    let password = prompt_new_password()?;

    let mut engine = VaultEngine::new(path);
    engine.set_password(&password);
    engine.save()?;
    println!("Created empty vault at {}", path.display());
    Ok(())
}

fn change_password(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("{} does not exist", path.display());
    }
    let current = rpassword::prompt_password("Current master password: ")
        .context("cannot read the master password")?;

    let mut engine = VaultEngine::new(path);
    engine.set_password(&current);
    engine.load()?;

    let replacement = prompt_new_password()?;
    engine.set_password(&replacement);
    engine.save()?;
    println!("Master password changed for {}", path.display());
    Ok(())
}

/// Ask for a new master password twice; the two entries must match.
fn prompt_new_password() -> Result<String> {
    let first = rpassword::prompt_password("New master password: ")
        .context("cannot read the master password")?;
    let second = rpassword::prompt_password("Repeat master password: ")
        .context("cannot read the master password")?;
    if first != second {
        bail!("passwords do not match");
    }
    Ok(first)
}

fn print_records(engine: &VaultEngine) {
    if engine.records().is_empty() {
        println!("(vault is empty)");
        return;
    }
    println!("{:<24} {:<24} {:<10} {}", "SERVICE", "LOGIN", "PASSWORD", "COMMENT");
    for record in engine.records() {
        println!(
            "{:<24} {:<24} {:<10} {}",
            cell_text(record, CellRole::Service),
            cell_text(record, CellRole::Login),
            // The secret stays in the vault; the editor is the place to see it.
            if record.password.is_empty() { "" } else { "***" },
            cell_text(record, CellRole::Comment),
        );
    }
}

fn cell_text(record: &Record, role: CellRole) -> String {
    String::from_utf8_lossy(record.cell(role)).into_owned()
}
