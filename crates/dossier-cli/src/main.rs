//! # Dossier CLI
//!
//! Verify, checksum and sign dossier files.
//!
//! ## Exit Codes
//!
//! | Code | Meaning                                    |
//! |------|--------------------------------------------|
//! | 0    | ALLOW, or the command succeeded            |
//! | 2    | WARN                                       |
//! | 1    | BLOCK, validation problems, or any error   |
//!
//! Logs go to stderr (`DOSSIER_LOG`, `DOSSIER_JSON_LOGS`); command output
//! goes to stdout.

mod cli;
mod commands;
mod report;
mod telemetry;

use anyhow::Result;
use clap::Parser;
use dossier_verification::VerificationConfig;
use std::process::ExitCode;

use cli::{Cli, Command, KeysCommand};
use commands::SignOptions;
use telemetry::TelemetryConfig;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let telemetry = TelemetryConfig::from_env().with_verbosity(cli.verbose);
    telemetry::init_logging(&telemetry)?;

    let config = VerificationConfig::from_env();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Verify {
            file,
            trusted_keys,
            json,
        } => commands::verify(config, &file, trusted_keys.as_deref(), json, &mut out).await,

        Command::Checksum { file, write } => commands::checksum(&file, write, &mut out),

        Command::Sign {
            file,
            key,
            key_id,
            signed_by,
            dry_run,
        } => {
            let options = SignOptions {
                file: &file,
                signed_by,
                dry_run,
            };
            commands::sign(options, key.as_deref(), key_id, &mut out).await
        }

        Command::SignKms {
            file,
            kms_key_id,
            region,
            signed_by,
            dry_run,
        } => {
            let options = SignOptions {
                file: &file,
                signed_by,
                dry_run,
            };
            commands::sign_kms(config, options, &kms_key_id, region.as_deref(), &mut out).await
        }

        Command::Validate { file } => commands::validate(&file, &mut out),

        Command::Keys {
            command: KeysCommand::List { trusted_keys },
        } => commands::keys_list(&config, trusted_keys.as_deref(), &mut out),
    }
}
