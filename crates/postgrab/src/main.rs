// Copyright 2026 Postgrab Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use postgrab::cli;
use postgrab::config::{ManifestPaths, DEFAULT_TITLES_FILE, DEFAULT_URLS_FILE};
use postgrab::logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "postgrab",
    about = "Postgrab: collect every post of a feed and download its images",
    version,
    after_help = "Run 'postgrab <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ManifestArgs {
    /// File holding one post URL per line
    #[arg(long, default_value = DEFAULT_URLS_FILE)]
    urls_file: PathBuf,
    /// File holding one post title per line
    #[arg(long, default_value = DEFAULT_TITLES_FILE)]
    titles_file: PathBuf,
}

impl ManifestArgs {
    fn paths(self) -> ManifestPaths {
        ManifestPaths {
            urls: self.urls_file,
            titles: self.titles_file,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Collect every post link of a feed into the manifest files
    Harvest {
        /// Feed URL (prompted for when omitted)
        feed_url: Option<String>,
        #[command(flatten)]
        manifest: ManifestArgs,
        /// JSON site profile overriding selectors and timings
        #[arg(long)]
        profile: Option<PathBuf>,
        /// Stop after this many load-more clicks
        #[arg(long)]
        max_clicks: Option<u32>,
        /// Consecutive failed load-more clicks tolerated before giving up
        #[arg(long, default_value = "2")]
        retries: u32,
    },
    /// Download the images of every post in the manifest files
    Download {
        /// Prefix folder names with the post number (y/n, prompted for when omitted)
        #[arg(long)]
        indexed: Option<String>,
        /// Directory to create post folders in
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        #[command(flatten)]
        manifest: ManifestArgs,
        /// JSON site profile overriding selectors and timings
        #[arg(long)]
        profile: Option<PathBuf>,
    },
    /// Harvest a feed, then download every post, in one browser session
    Run {
        /// Feed URL (prompted for when omitted)
        feed_url: Option<String>,
        /// Prefix folder names with the post number (y/n, prompted for when omitted)
        #[arg(long)]
        indexed: Option<String>,
        /// Directory to create post folders in
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        #[command(flatten)]
        manifest: ManifestArgs,
        /// JSON site profile overriding selectors and timings
        #[arg(long)]
        profile: Option<PathBuf>,
        /// Stop after this many load-more clicks
        #[arg(long)]
        max_clicks: Option<u32>,
        /// Consecutive failed load-more clicks tolerated before giving up
        #[arg(long, default_value = "2")]
        retries: u32,
    },
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global flags via environment variables so all modules can check them
    if cli.json {
        std::env::set_var("POSTGRAB_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("POSTGRAB_QUIET", "1");
    }
    logging::init(
        logging::level_for(&cli.log_level, cli.verbose, cli.quiet),
        cli.json,
    );

    let result = match cli.command {
        Commands::Harvest {
            feed_url,
            manifest,
            profile,
            max_clicks,
            retries,
        } => {
            cli::harvest_cmd::run(
                feed_url,
                &manifest.paths(),
                profile.as_deref(),
                max_clicks,
                retries,
            )
            .await
        }
        Commands::Download {
            indexed,
            output_dir,
            manifest,
            profile,
        } => {
            cli::download_cmd::run(
                indexed.as_deref(),
                &output_dir,
                &manifest.paths(),
                profile.as_deref(),
            )
            .await
        }
        Commands::Run {
            feed_url,
            indexed,
            output_dir,
            manifest,
            profile,
            max_clicks,
            retries,
        } => {
            cli::run_cmd::run(
                feed_url,
                indexed.as_deref(),
                &output_dir,
                &manifest.paths(),
                profile.as_deref(),
                max_clicks,
                retries,
            )
            .await
        }
        Commands::Doctor => cli::doctor::run().await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "postgrab", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if cli::output::is_json() {
            cli::output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        } else {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}
