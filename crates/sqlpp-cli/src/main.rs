use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sqlpp_core::{Config, Diagnostic, OutputFormat, Report, Severity};
use sqlpp_engine::{parse_newer_than, DryRunExecutor, DryRunIntrospector, EchoFormatter, Processor};
use sqlpp_preprocess::{PreprocessError, RawLine};
use sqlpp_script::{ScriptPipeline, Statement};

/// Name used for scripts read from standard input
const STDIN_NAME: &str = "<stdin>";

/// sqlpp - SQL script preprocessor
#[derive(Parser)]
#[command(name = "sqlpp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: search for sqlpp.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Define a macro before the script is read (NAME=VALUE, or NAME for 1)
    #[arg(short = 'D', long = "define", value_name = "NAME=VALUE", global = true)]
    defines: Vec<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the preprocessed line stream
    Expand {
        /// Script to expand, or - for standard input
        input: String,

        /// Prefix each line with the file and line it came from
        #[arg(long)]
        locations: bool,
    },

    /// Print the statements a script assembles into
    Statements {
        /// Script to compile, or - for standard input
        input: String,

        /// Listing format: text or json (default: from config)
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Run scripts with the dry-run executor
    Run {
        /// Script to run, or - for standard input (default when no directory is given)
        #[arg(conflicts_with = "directory")]
        input: Option<String>,

        /// Run every script in this directory
        #[arg(short, long)]
        directory: Option<PathBuf>,

        /// Only scripts modified at or after this time (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)
        #[arg(short, long, requires = "directory")]
        newer: Option<String>,

        /// Continue after failures (overrides end_on_error)
        #[arg(long)]
        force: bool,

        /// Write a JSON run report to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Result format: text or json (default: from config)
        #[arg(short, long)]
        output: Option<OutputFormat>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // .env may point SQLPP_CONFIG somewhere else
    dotenvy::dotenv().ok();

    let mut config = load_config(cli.config.as_deref(), cli.verbose)?;
    apply_defines(&mut config, &cli.defines)?;

    match cli.command {
        Commands::Expand { input, locations } => expand_command(&config, &input, locations),
        Commands::Statements { input, format } => {
            statements_command(&config, &input, format.unwrap_or(config.output))
        }
        Commands::Run {
            input,
            directory,
            newer,
            force,
            report,
            output,
        } => {
            if force {
                config.end_on_error = false;
            }
            if let Some(output) = output {
                config.output = output;
            }
            run_command(&config, input.as_deref(), directory.as_deref(), newer.as_deref(), report.as_deref(), cli.verbose)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::discover().context("Failed to load config")?,
    };

    tracing::debug!(root = %config.project_root.display(), defines = config.defines.len(), "loaded config");

    if verbose {
        eprintln!("{} {}", "Project root:".cyan(), config.project_root.display());
        if !config.defines.is_empty() {
            eprintln!("{} {}", "Predefined macros:".cyan(), config.defines.len());
        }
    }

    Ok(config)
}

/// Fold `-D NAME=VALUE` flags into the config defines
fn apply_defines(config: &mut Config, defines: &[String]) -> Result<()> {
    for define in defines {
        let (name, value) = define.split_once('=').unwrap_or((define.as_str(), "1"));
        config.defines.insert(name.trim().to_string(), value.to_string());
    }

    config.validate().context("Invalid -D define")?;
    Ok(())
}

fn pipeline(config: &Config) -> Result<ScriptPipeline> {
    ScriptPipeline::from_config(config).context("Invalid define in configuration")
}

/// Expand command - print preprocessed lines
fn expand_command(config: &Config, input: &str, locations: bool) -> Result<()> {
    let pipeline = pipeline(config)?;
    let expanded = if input == "-" {
        pipeline.expand_reader(io::stdin().lock(), STDIN_NAME)
    } else {
        pipeline.expand_file(Path::new(input))
    };
    let lines = exit_on_preprocess_error(expanded);

    let mut stdout = io::stdout().lock();
    for line in &lines {
        write_line(&mut stdout, line, locations)?;
    }

    Ok(())
}

fn write_line(out: &mut impl Write, line: &RawLine, locations: bool) -> io::Result<()> {
    if locations {
        writeln!(out, "{}: {}", line.origin, line.text)
    } else {
        writeln!(out, "{}", line.text)
    }
}

/// Statements command - print assembled statements
fn statements_command(config: &Config, input: &str, format: OutputFormat) -> Result<()> {
    let pipeline = pipeline(config)?;
    let compiled = if input == "-" {
        pipeline.compile_reader(io::stdin().lock(), STDIN_NAME)
    } else {
        pipeline.compile_file(Path::new(input))
    };
    let statements = exit_on_preprocess_error(compiled);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&statements)?),
        OutputFormat::Text => print_statements(&statements),
    }

    Ok(())
}

fn print_statements(statements: &[Statement]) {
    for (i, statement) in statements.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!(
            "{} {} {}",
            format!("[{}]", i + 1).bright_blue(),
            statement.kind.to_string().bold(),
            statement.origin.to_string().dimmed()
        );
        println!("{}", statement.text);
    }
}

/// Run command - drive the processor with dry-run collaborators
fn run_command(
    config: &Config,
    input: Option<&str>,
    directory: Option<&Path>,
    newer: Option<&str>,
    report_path: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let newer_than = newer.map(parse_newer_than).transpose()?;

    let mut processor = Processor::from_config(
        config,
        DryRunExecutor::new(),
        EchoFormatter::stdout(config.output),
        DryRunIntrospector::stdout(),
    )?;

    // Failures are already recorded in the report
    match (directory, input) {
        (Some(dir), _) => {
            if verbose {
                eprintln!("{} {}", "Processing directory:".cyan(), dir.display());
                if let Some(cutoff) = newer_than {
                    eprintln!("{} {}", "Files newer than:".cyan(), cutoff.format("%Y-%m-%d %H:%M:%S"));
                }
            }
            if let Ok(found) = processor.process_directory(dir, newer_than) {
                if found == 0 {
                    eprintln!("{} {}", "No scripts found in".yellow(), dir.display());
                }
            }
        }
        (None, None) | (None, Some("-")) => {
            let _ = processor.process_stdin();
        }
        (None, Some(file)) => {
            let _ = processor.process_file(Path::new(file));
        }
    }

    let mut report = processor.into_report();
    report.metadata = Some(serde_json::json!({
        "executor": "dry-run",
        "end_on_error": config.end_on_error,
    }));

    if let Some(path) = report_path {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        if verbose {
            eprintln!("{} {}", "Report saved to:".green(), path.display());
        }
    }

    print_report_summary(&report);

    if report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Print preprocessing failures compiler-style and exit
fn exit_on_preprocess_error<T>(result: std::result::Result<T, PreprocessError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            print_diagnostic(&err.to_diagnostic());
            std::process::exit(1);
        }
    }
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    let severity = match diagnostic.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warn => "warning".yellow().bold(),
        Severity::Info => "info".cyan().bold(),
    };

    match &diagnostic.location {
        Some(location) => eprintln!("{}: {}: {}", location.to_string().bold(), severity, diagnostic.message),
        None => eprintln!("{}: {}", severity, diagnostic.message),
    }
}

fn print_report_summary(report: &Report) {
    for diagnostic in &report.diagnostics {
        print_diagnostic(diagnostic);
    }

    let summary = &report.summary;
    eprintln!();
    eprintln!(
        "{} {} script(s), {} statement(s)",
        "Processed".bold(),
        summary.scripts_processed + summary.scripts_failed,
        summary.statements_executed
    );

    if report.has_errors() {
        eprintln!(
            "{} {} script(s) failed, {} statement(s) failed",
            "✗".red().bold(),
            summary.scripts_failed.to_string().red(),
            summary.statements_failed.to_string().red()
        );
    } else {
        eprintln!("{}", "✓ No errors".green());
    }
}
