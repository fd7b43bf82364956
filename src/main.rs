use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use archetl::config::Config;
use archetl::mapping::RowMapper;
use archetl::pipeline::{self, LoadResult, Pipeline};
use archetl::sink::{self, OutputFormat};
use archetl::source;

#[derive(Parser)]
#[command(name = "archetl", version, about = "Map legacy rows to archetype object graphs")]
struct Cli {
    /// Config file (defaults to archetl.json)
    #[arg(short, long, global = true, default_value = "")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Map input rows and write the resulting values
    Map {
        /// Mappings file (JSON or YAML)
        #[arg(short, long)]
        mappings: Option<String>,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<String>,

        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Stop at the first row that fails to map
        #[arg(long)]
        fail_fast: bool,

        /// Input files, directories or glob patterns
        inputs: Vec<String>,
    },
    /// Check mappings against the columns of the inputs
    Check {
        /// Mappings file (JSON or YAML)
        #[arg(short, long)]
        mappings: Option<String>,

        /// Input files, directories or glob patterns
        inputs: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Init { force } => {
            let path = Config::write_template(&cli.config, force)?;
            println!("{path}");
            Ok(())
        }
        Command::Map {
            mappings,
            output,
            format,
            fail_fast,
            inputs,
        } => {
            let mut config = Config::load(&cli.config)?;
            if let Some(path) = mappings {
                config.mappings_path = path;
            }
            if let Some(path) = output {
                config.output_path = path;
            }
            if let Some(format) = format {
                config.output_format = format;
            }
            if !inputs.is_empty() {
                config.input_patterns = inputs;
            }
            config.fail_fast |= fail_fast;
            config.validate()?;
            run_map(&config)
        }
        Command::Check { mappings, inputs } => {
            let mut config = Config::load(&cli.config)?;
            if let Some(path) = mappings {
                config.mappings_path = path;
            }
            if !inputs.is_empty() {
                config.input_patterns = inputs;
            }
            config.validate()?;
            run_check(&config)
        }
    }
}

fn input_files(config: &Config) -> Result<Vec<PathBuf>> {
    let files = config.get_input_files()?;
    if files.is_empty() {
        bail!("no input files found");
    }
    Ok(files)
}

fn run_map(config: &Config) -> Result<()> {
    let mappings = config.load_mappings()?;
    let files = input_files(config)?;
    let options = config.read_options();

    let writer: Box<dyn Write> = if config.output_path.is_empty() {
        Box::new(BufWriter::new(io::stdout().lock()))
    } else {
        let file = File::create(&config.output_path)
            .with_context(|| format!("failed to create output: {}", config.output_path))?;
        Box::new(BufWriter::new(file))
    };

    let mut pipeline = Pipeline::new(
        RowMapper::new(&mappings),
        sink::create(config.output_format, writer),
    )
    .with_fail_fast(config.fail_fast)
    .with_progress(config.progress);

    let mut total = LoadResult::default();
    for file in &files {
        let table = source::read_table(file, &options)
            .with_context(|| format!("failed to read {}", file.display()))?;
        pipeline::ensure_columns(&mappings, &table.columns, file)?;
        let result = pipeline
            .run(&table)
            .with_context(|| format!("failed to map {}", file.display()))?;
        total.merge(result);
    }
    pipeline.finish()?;

    info!(
        "Done: {} files, {} rows, {} mapped, {} failed, {} values",
        files.len(),
        total.rows,
        total.mapped,
        total.failed,
        total.values
    );
    if total.failed > 0 {
        warn!("{} rows could not be mapped", total.failed);
    }
    Ok(())
}

fn run_check(config: &Config) -> Result<()> {
    let mappings = config.load_mappings()?;
    let files = input_files(config)?;
    let options = config.read_options();

    let mut errors = 0;
    for file in &files {
        let table = source::read_table(file, &options)
            .with_context(|| format!("failed to read {}", file.display()))?;
        println!("{}", file.display());
        for remark in mappings.check(&table.columns) {
            if remark.is_error() {
                errors += 1;
            }
            println!("  {remark}");
        }
    }

    if errors > 0 {
        bail!("{errors} mapping errors");
    }
    Ok(())
}
