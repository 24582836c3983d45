//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod checklist;
mod classify;
mod config_cmd;
mod serve;
mod upload;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Tax document intake: OCR, classification and Drive filing")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Classify documents and file them in the client's Drive folder
    Upload {
        /// Client name; becomes the client folder under the root folder
        #[arg(long)]
        client: String,
        /// Files to upload (PDFs or images)
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Keep everything in memory and print where files would go
        #[arg(long)]
        dry_run: bool,
    },

    /// Show which category a document or text falls into
    Classify {
        /// PDF or image to classify
        #[arg(required_unless_present = "text", conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Classify this text instead of a file
        #[arg(long)]
        text: Option<String>,
    },

    /// List categories and keywords in priority order
    Categories,

    /// Print the document request message for a client
    Checklist {
        /// Client name used in the greeting
        #[arg(long)]
        name: Option<String>,
        /// Tax year (default: current year)
        #[arg(long)]
        year: Option<i32>,
        /// Leave out the salary income section
        #[arg(long)]
        no_salary: bool,
        /// Has dependents
        #[arg(long)]
        dependents: bool,
        /// Pays rent
        #[arg(long)]
        rent: bool,
        /// Has medical expenses
        #[arg(long)]
        health: bool,
        /// Has education expenses
        #[arg(long)]
        education: bool,
        /// Has bank accounts or investments
        #[arg(long)]
        investments: bool,
    },

    /// Start the upload web server
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default from config, else 127.0.0.1:3030)
        bind: Option<String>,
        /// Keep uploads in memory instead of Drive
        #[arg(long)]
        dry_run: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective settings (secrets redacted)
    Show,
    /// Show which config file was loaded
    Path,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
    };
    let (settings, config) = load_settings_with_options(options).await?;

    match cli.command {
        Commands::Upload {
            client,
            files,
            dry_run,
        } => upload::cmd_upload(&settings, &client, &files, dry_run).await,
        Commands::Classify { file, text } => {
            classify::cmd_classify(&settings, file.as_deref(), text.as_deref()).await
        }
        Commands::Categories => classify::cmd_categories(&settings),
        Commands::Checklist {
            name,
            year,
            no_salary,
            dependents,
            rent,
            health,
            education,
            investments,
        } => {
            let profile = crate::checklist::ClientProfile {
                name: name.unwrap_or_default(),
                salary: !no_salary,
                dependents,
                rent,
                health,
                education,
                investments,
            };
            checklist::cmd_checklist(&profile, year)
        }
        Commands::Serve { bind, dry_run } => {
            let bind = bind.unwrap_or_else(|| settings.bind.clone());
            serve::cmd_serve(&settings, &bind, dry_run).await
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => config_cmd::cmd_config_show(&settings),
            ConfigCommands::Path => config_cmd::cmd_config_path(&config),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_upload() {
        let cli = Cli::try_parse_from([
            "intake", "upload", "--client", "Maria", "a.pdf", "b.jpg", "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Commands::Upload {
                client,
                files,
                dry_run,
            } => {
                assert_eq!(client, "Maria");
                assert_eq!(files.len(), 2);
                assert!(dry_run);
            }
            _ => panic!("expected upload"),
        }
    }

    #[test]
    fn test_upload_requires_files() {
        assert!(Cli::try_parse_from(["intake", "upload", "--client", "Maria"]).is_err());
    }

    #[test]
    fn test_classify_needs_file_or_text() {
        assert!(Cli::try_parse_from(["intake", "classify"]).is_err());
        assert!(Cli::try_parse_from(["intake", "classify", "--text", "iptu"]).is_ok());
        assert!(Cli::try_parse_from(["intake", "classify", "doc.pdf"]).is_ok());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["intake", "categories", "--config", "x.toml", "-v"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(cli.verbose);
    }
}
