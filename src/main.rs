//! ust-matcher - Pattern matching CLI over serialized USTs
//!
//! Matches built-in and user-supplied patterns against front-end output.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use ust_matcher::{
    concurrency::Shutdown,
    config::{Config, OutputFormat},
    reporter::create_reporter,
    repository::{MemoryPatternRepository, PatternRepository},
    Language, Scanner,
};

/// Multi-language pattern matching over Universal Syntax Trees
#[derive(Parser)]
#[command(name = "ust-matcher")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy)]
enum OutputFormatArg {
    Text,
    Json,
    Sarif,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Text => OutputFormat::Text,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Sarif => OutputFormat::Sarif,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Match patterns against UST files
    Match {
        /// UST files or directories holding *.ust.json files
        #[arg(long, required = true, num_args = 1..)]
        ust: Vec<PathBuf>,

        /// JSON pattern files
        #[arg(long, num_args = 1..)]
        patterns: Vec<PathBuf>,

        /// Do not load the built-in patterns
        #[arg(long)]
        no_builtin: bool,

        /// Report matches nested inside earlier matches of the same pattern
        #[arg(long)]
        all_alternatives: bool,

        /// Report spans of structural pattern nodes too
        #[arg(long)]
        nonterminal_spans: bool,

        /// Only match these languages (comma-separated)
        #[arg(long)]
        languages: Option<String>,

        /// Only run patterns with these keys (comma-separated)
        #[arg(long)]
        pattern_ids: Option<String>,

        /// Matching threads (0 = one per core)
        #[arg(long)]
        threads: Option<usize>,

        /// Per-file matching budget in milliseconds (0 = unlimited)
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Output format
        #[arg(short = 'f', long)]
        format: Option<OutputFormatArg>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Disable colors in text output
        #[arg(long)]
        no_color: bool,
    },

    /// List loaded patterns
    Patterns {
        /// JSON pattern files
        #[arg(long, num_args = 1..)]
        patterns: Vec<PathBuf>,

        /// Do not load the built-in patterns
        #[arg(long)]
        no_builtin: bool,
    },

    /// Load a pattern file and report the records it skips
    Validate {
        /// JSON pattern file
        path: PathBuf,
    },
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 if cli.quiet => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level.to_string())),
        )
        .init();

    // Load configuration
    let mut config = if let Some(ref config_path) = cli.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };

    match cli.command {
        Commands::Match {
            ust,
            patterns,
            no_builtin,
            all_alternatives,
            nonterminal_spans,
            languages,
            pattern_ids,
            threads,
            timeout_ms,
            format,
            output,
            no_color,
        } => {
            // Override with CLI options
            config.patterns.paths.extend(patterns);
            if no_builtin {
                config.patterns.builtin = false;
            }
            config.matching.find_all_alternatives |= all_alternatives;
            config.matching.include_nonterminal_text_spans |= nonterminal_spans;
            if let Some(languages) = languages {
                let mut selected = Vec::new();
                for name in split_list(&languages) {
                    match name.parse::<Language>() {
                        Ok(language) => selected.push(language),
                        Err(e) => warn!("Ignoring language: {}", e),
                    }
                }
                config.matching.languages = selected;
            }
            if let Some(ids) = pattern_ids {
                config.matching.pattern_ids = Some(split_list(&ids).map(str::to_string).collect());
            }
            if let Some(threads) = threads {
                config.concurrency.threads = threads;
            }
            if let Some(timeout_ms) = timeout_ms {
                config.concurrency.file_timeout_ms = timeout_ms;
            }
            if let Some(format) = format {
                config.output.format = format.into();
            }
            if output.is_some() {
                config.output.output_path = output;
            }
            if no_color {
                config.output.colors = false;
            }

            config.validate()?;

            // Set up graceful shutdown handling
            let shutdown = Shutdown::new();
            let handler_flag = shutdown.clone();
            if let Err(e) = ctrlc::set_handler(move || {
                if handler_flag.is_requested() {
                    error!("Received second interrupt, forcing shutdown");
                    std::process::exit(130);
                }
                handler_flag.request();
            }) {
                warn!("Failed to install interrupt handler: {}", e);
            }

            let scanner = Scanner::new(config.clone())?.with_shutdown(shutdown);
            let files = ust_matcher::collect_ust_files(&ust);
            if files.is_empty() {
                warn!("No UST files found");
            }
            let summary = scanner.match_files(&files);

            // Generate and output report
            let patterns = scanner.repository().all();
            let reporter = create_reporter(config.output.format, config.output.colors, &patterns);
            let report = reporter.generate(&summary);

            if let Some(ref output_path) = config.output.output_path {
                std::fs::write(output_path, &report)?;
                info!("Report written to: {}", output_path.display());
            } else {
                println!("{}", report);
            }

            if !summary.is_complete() {
                std::process::exit(1);
            }
        }

        Commands::Patterns {
            patterns,
            no_builtin,
        } => {
            config.patterns.paths.extend(patterns);
            if no_builtin {
                config.patterns.builtin = false;
            }
            let (repository, report) = ust_matcher::load_repository(&config.patterns)?;
            for pattern in repository.all() {
                let mut languages: Vec<String> =
                    pattern.languages.iter().map(|l| l.to_string()).collect();
                languages.sort();
                println!("{}\t{}\t[{}]", pattern.key, pattern.debug_info, languages.join(", "));
            }
            println!("{} patterns, {} skipped", repository.len(), report.skipped);
        }

        Commands::Validate { path } => {
            let mut repository = MemoryPatternRepository::new();
            let report = repository.load_file(&path, None)?;
            for message in &report.errors {
                println!("skipped: {}", message);
            }
            println!("{}: {} loaded, {} skipped", path.display(), report.loaded, report.skipped);
            if report.skipped > 0 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
