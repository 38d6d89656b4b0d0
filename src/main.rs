use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use helm_debugger::config::{DEFAULT_RELEASE_NAME, DEFAULT_TIMEOUT_SECS};
use helm_debugger::report::{self, SearchResult, TextReporter};
use helm_debugger::{debugger, DebugConfig, SearchMode, Silent};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Find the template block or line that makes `helm template` fail.
#[derive(Parser, Debug)]
#[command(name = "helm-debug", version, about)]
struct Cli {
    /// Path to the chart directory
    chart: PathBuf,

    /// Values file passed to helm (repeatable)
    #[arg(short = 'f', long = "values")]
    values: Vec<PathBuf>,

    /// key=value override passed to helm (repeatable)
    #[arg(long = "set")]
    set: Vec<String>,

    #[arg(short, long, value_enum, default_value_t = SearchMode::Binary)]
    mode: SearchMode,

    /// Only debug this template
    #[arg(long)]
    file: Option<String>,

    #[arg(short = 'n', long, default_value = DEFAULT_RELEASE_NAME)]
    release_name: String,

    /// Helm executable to use instead of searching PATH
    #[arg(long)]
    helm_path: Option<PathBuf>,

    /// Extra arguments for every helm render, shell-quoted
    #[arg(long, allow_hyphen_values = true)]
    helm_args: Option<String>,

    /// Seconds allowed per render
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[arg(short, long)]
    verbose: bool,

    #[arg(long)]
    no_color: bool,
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.output == OutputFormat::Json {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn build_config(cli: &Cli) -> helm_debugger::Result<DebugConfig> {
    let mut config = DebugConfig::new(&cli.chart);
    config.release_name = cli.release_name.clone();
    config.values_files = cli.values.clone();
    config.set_values = cli.set.clone();
    config.helm_path = cli.helm_path.clone();
    config.timeout = Duration::from_secs(cli.timeout);
    config.mode = cli.mode;
    config.target_file = cli.file.clone();
    if let Some(raw) = &cli.helm_args {
        config.extra_args = DebugConfig::parse_extra_args(raw)?;
    }
    config.resolve_values_files()?;
    Ok(config)
}

fn print_json(result: &SearchResult) -> Result<()> {
    println!(
        "{}",
        result
            .to_json_pretty()
            .context("failed to serialize report")?
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    if cli.no_color || !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            let fallback = DebugConfig {
                mode: cli.mode,
                ..DebugConfig::new(&cli.chart)
            };
            let result = report::assemble_tool_error(&fallback, None, None, &e);
            match cli.output {
                OutputFormat::Json => print_json(&result)?,
                OutputFormat::Text => TextReporter::new(cli.verbose).print_result(&result),
            }
            std::process::exit(result.exit_code);
        }
    };

    let result = match cli.output {
        OutputFormat::Json => {
            let result = debugger::run(&config, &mut Silent);
            print_json(&result)?;
            result
        }
        OutputFormat::Text => {
            let mut reporter = TextReporter::new(cli.verbose);
            let result = debugger::run(&config, &mut reporter);
            reporter.print_result(&result);
            result
        }
    };

    std::process::exit(result.exit_code);
}
