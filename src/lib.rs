pub mod analysis;
pub mod analyze_cmd;
pub mod cache;
pub mod cli;
pub mod data;
pub mod error;
pub mod filter;
pub mod format;
pub mod group;
pub mod group_cmd;
pub mod insight;
pub mod io_utils;
pub mod lots;
pub mod normalize;
pub mod overlap;
pub mod profile;
pub mod report_cmd;
pub mod sort;
pub mod sort_cmd;
pub mod table;
pub mod yields;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    analysis::{PipelineConfig, PreparedLots, prepare},
    cli::{Cli, Commands, InputArgs},
    error::CoercionWarning,
    normalize::Table,
    profile::ColumnProfile,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sheetflow", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => analyze_cmd::execute(&args),
        Commands::Sort(args) => sort_cmd::execute(&args),
        Commands::Group(args) => group_cmd::execute(&args),
        Commands::Yield(args) => report_cmd::execute_yield(&args),
        Commands::Repeats(args) => report_cmd::execute_repeats(&args),
        Commands::Result(args) => analyze_cmd::show_latest(&args),
        Commands::Profile(args) => handle_profile(&args),
    }
}

fn handle_profile(args: &cli::ProfileArgs) -> Result<()> {
    let profile = ColumnProfile::default();
    match args.output.as_deref() {
        Some(path) if !io_utils::is_dash(path) => {
            profile.save(path)?;
            info!(
                "Column profile with {} allowed column(s) written to {:?}",
                profile.allowed_columns.len(),
                path
            );
        }
        _ => print!("{}", profile.to_yaml_string()?),
    }
    Ok(())
}

/// A sheet read from disk together with the pipeline settings from its profile.
pub(crate) struct LoadedSheet {
    pub delimiter: u8,
    pub config: PipelineConfig,
    pub raw: Table,
}

impl LoadedSheet {
    pub fn load(args: &InputArgs) -> Result<Self> {
        let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
        let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
        info!(
            "Reading '{}' (delimiter '{}', encoding {})",
            args.input.display(),
            printable_delimiter(delimiter),
            encoding.name()
        );
        let profile = ColumnProfile::load_or_default(args.profile.as_deref())?;
        let config = profile.pipeline_config(&args.filters)?;
        let raw = io_utils::read_table(&args.input, delimiter, encoding)
            .with_context(|| format!("Reading lot sheet {:?}", args.input))?;
        debug!("Raw headers: {:?}", raw.headers);
        info!("Loaded {} row(s) across {} column(s)", raw.rows.len(), raw.headers.len());
        Ok(Self {
            delimiter,
            config,
            raw,
        })
    }

    pub fn prepare(&self) -> Result<PreparedLots> {
        let prepared = prepare(&self.raw, &self.config)?;
        report_warnings(&prepared.warnings);
        Ok(prepared)
    }
}

pub(crate) fn report_warnings(warnings: &[CoercionWarning]) {
    for warning in warnings {
        warn!("{warning}");
    }
    if !warnings.is_empty() {
        info!("{} cell(s) could not be interpreted and were treated as missing", warnings.len());
    }
}

pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "tab".to_string(),
        b';' => ";".to_string(),
        b'|' => "|".to_string(),
        other => (other as char).to_string(),
    }
}
