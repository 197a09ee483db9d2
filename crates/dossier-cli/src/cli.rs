//! Command-line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Dossier: verify and sign dossier files
#[derive(Parser, Debug)]
#[command(name = "dossier", version)]
#[command(about = "Verify integrity, authenticity and risk of dossier files")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Verify a dossier and print the recommendation (exit 0 ALLOW, 2 WARN, 1 BLOCK)
    Verify {
        /// Dossier file
        file: PathBuf,

        /// Trusted keys file (default: ~/.dossier/trusted-keys.txt)
        #[arg(long)]
        trusted_keys: Option<PathBuf>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute the SHA-256 checksum of a dossier body
    Checksum {
        /// Dossier file
        file: PathBuf,

        /// Store the checksum in the dossier metadata
        #[arg(long)]
        write: bool,
    },

    /// Checksum and sign a dossier with an Ed25519 key
    Sign {
        /// Dossier file
        file: PathBuf,

        /// Ed25519 private key in PKCS#8 PEM format
        #[arg(long, required_unless_present = "dry_run")]
        key: Option<PathBuf>,

        /// Human-readable key identifier (e.g. 'imboard-ai-2024')
        #[arg(long)]
        key_id: Option<String>,

        /// Signer identity (e.g. 'Imboard AI <security@imboard.ai>')
        #[arg(long)]
        signed_by: Option<String>,

        /// Calculate the checksum and print the metadata without signing
        #[arg(long)]
        dry_run: bool,
    },

    /// Checksum and sign a dossier with a KMS key (ECDSA-SHA-256)
    SignKms {
        /// Dossier file
        file: PathBuf,

        /// KMS key id, ARN or alias
        #[arg(long)]
        kms_key_id: String,

        /// Region for key ids that are not ARNs (default: DOSSIER_KMS_REGION, AWS_REGION or us-east-1)
        #[arg(long)]
        region: Option<String>,

        /// Signer identity
        #[arg(long)]
        signed_by: Option<String>,

        /// Calculate the checksum and print the metadata without signing
        #[arg(long)]
        dry_run: bool,
    },

    /// Check that the metadata declares every required field
    Validate {
        /// Dossier file
        file: PathBuf,
    },

    /// Inspect the trusted keys file
    Keys {
        #[command(subcommand)]
        command: KeysCommand,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum KeysCommand {
    /// List trusted keys
    List {
        /// Trusted keys file (default: ~/.dossier/trusted-keys.txt)
        #[arg(long)]
        trusted_keys: Option<PathBuf>,
    },
}
