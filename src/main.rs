// SPDX-License-Identifier: PMPL-1.0-or-later
//! a11yscan CLI - rule-driven accessibility analysis

use a11yscan::config::{default_config_path, load_config, write_default_config};
use a11yscan::report::{build, build_static, generate_report, OutputFormat, ScanOutput};
use a11yscan::rules;
use a11yscan::scanner::{DocumentRequest, Scanner};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Rule-driven accessibility analysis for markup and source trees
#[derive(Parser)]
#[command(name = "a11yscan")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan every recognised file under a directory
    Scan {
        /// Directory to scan
        root: PathBuf,

        /// Rule corpus directory (one subdirectory per team)
        #[arg(long)]
        rules: PathBuf,

        /// Configuration file (defaults to <root>/.a11yscan.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// Scan a single captured document
    Document {
        /// File holding the document body
        file: PathBuf,

        /// Rule corpus directory (one subdirectory per team)
        #[arg(long)]
        rules: PathBuf,

        /// Declared document kind (html, xaml, css, ...)
        #[arg(long, default_value = "html")]
        kind: String,

        /// URL to record for the document (defaults to the file path)
        #[arg(long)]
        url: Option<String>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// Validate a rule corpus without scanning
    Validate {
        /// Rule corpus directory (one subdirectory per team)
        #[arg(long)]
        rules: PathBuf,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination (.toml or .yaml)
        path: PathBuf,
    },
}

/// Output format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("a11yscan=debug")
    } else {
        EnvFilter::new("a11yscan=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let scanner = Scanner::default();

    match cli.command {
        Commands::Scan { root, rules, config, format, output, verbose } => {
            init_logging(verbose);
            let config_path = config.unwrap_or_else(|| default_config_path(&root));
            let config = load_config(&config_path)?;

            let scan = scanner.scan_root(&root, &rules, &config)?;
            let report = build_static(&scan.documents, &scan.issues, &scan.rules);
            let rendered = generate_report(
                &ScanOutput {
                    report: &report,
                    documents: &scan.documents,
                    issues: &scan.issues,
                },
                format.into(),
            );
            write_output(&rendered, output.as_deref())?;
        }

        Commands::Document { file, rules, kind, url, format, output, verbose } => {
            init_logging(verbose);
            let content = std::fs::read_to_string(&file)?;
            let url = url.unwrap_or_else(|| file.display().to_string());
            let request = DocumentRequest::new(rules, &url, &content).with_kind(&kind);

            let scan = scanner.scan_document(&request)?;
            let documents = [scan.document];
            let report = build(&documents, &scan.issues);
            let rendered = generate_report(
                &ScanOutput {
                    report: &report,
                    documents: &documents,
                    issues: &scan.issues,
                },
                format.into(),
            );
            write_output(&rendered, output.as_deref())?;
        }

        Commands::Validate { rules: rules_root, verbose } => {
            init_logging(verbose);
            let validation = rules::validate(&rules_root)?;
            let count: usize = validation.teams.iter().map(|t| t.rules.len()).sum();

            if validation.is_valid() {
                println!(
                    "Rule corpus is valid: {} team(s), {} rule(s)",
                    validation.teams.len(),
                    count
                );
            } else {
                for error in &validation.errors {
                    println!("{}/{}: {}", error.team, error.rule_id, error.message);
                }
                eprintln!("Rule validation failed with {} error(s)", validation.errors.len());
                std::process::exit(1);
            }
        }

        Commands::InitConfig { path } => {
            write_default_config(&path)?;
            println!("Default configuration written to {}", path.display());
        }
    }

    Ok(())
}

/// Write output to file or stdout
fn write_output(content: &str, path: Option<&std::path::Path>) -> anyhow::Result<()> {
    match path {
        Some(p) => {
            std::fs::write(p, content)?;
            eprintln!("Report written to {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
