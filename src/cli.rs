use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::insight::Locale;

#[derive(Debug, Parser)]
#[command(author, version, about = "Check lot ledgers for serial collisions and report yield", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Detect overlapping serial ranges and summarize the findings
    Analyze(AnalyzeArgs),
    /// Sort a lot sheet and export it as CSV or preview it as a table
    Sort(SortArgs),
    /// Group serial ranges per product ordered by ship date
    Group(GroupArgs),
    /// Report tested/good/defect totals per product
    Yield(YieldArgs),
    /// List rows repeated on a key set (all occurrences)
    Repeats(RepeatsArgs),
    /// Show the most recent analysis result saved to a cache file
    Result(ResultArgs),
    /// Write the built-in column profile as YAML
    Profile(ProfileArgs),
}

/// Options shared by every command that reads a lot sheet.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Input CSV/TSV export of the lot sheet (`-` reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Column profile YAML (defaults to the built-in profile)
    #[arg(short = 'p', long = "profile")]
    pub profile: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Row filters such as `codes in A|B` or `testdate>=2024-01-01`
    #[arg(long = "filter", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Save the result as the latest result in this cache file
    #[arg(long)]
    pub cache: Option<PathBuf>,
    /// Print the full result as JSON instead of tables
    #[arg(long)]
    pub json: bool,
    /// Number of duplicate rows to display (0 = all)
    #[arg(long, default_value_t = 50)]
    pub preview: usize,
    /// Language of the insight text (en, ko)
    #[arg(long, value_parser = parse_locale)]
    pub locale: Option<Locale>,
}

#[derive(Debug, Args)]
pub struct SortArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Sort directives of the form `field[:asc|desc]` (replaces the profile's keys)
    #[arg(long = "sort", action = clap::ArgAction::Append)]
    pub sort: Vec<String>,
    /// Render the first N rows as a formatted table instead of CSV
    #[arg(long)]
    pub preview: Option<usize>,
}

#[derive(Debug, Args)]
pub struct GroupArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Write a flat CSV export here instead of printing JSON
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct YieldArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Aggregate only rows involved in a serial overlap
    #[arg(long = "duplicates-only")]
    pub duplicates_only: bool,
    /// Language of the insight text (en, ko)
    #[arg(long, value_parser = parse_locale)]
    pub locale: Option<Locale>,
    /// Print stats as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct RepeatsArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Key fields to compare (defaults to product code, serials and ship date)
    #[arg(short = 'k', long = "keys", value_delimiter = ',')]
    pub keys: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ResultArgs {
    /// Cache file written by `analyze --cache`
    #[arg(long)]
    pub cache: PathBuf,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Destination YAML file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub fn parse_locale(value: &str) -> Result<Locale, String> {
    value.parse()
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_collects_repeated_filters() {
        let cli = Cli::try_parse_from([
            "sheetflow",
            "analyze",
            "-i",
            "lots.csv",
            "--filter",
            "codes in A|B",
            "--filter",
            "testdate>=2024-01-01",
            "--locale",
            "ko",
        ])
        .expect("parse");
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.input.filters.len(), 2);
        assert_eq!(args.locale, Some(Locale::Ko));
        assert_eq!(args.preview, 50);
    }

    #[test]
    fn parse_delimiter_accepts_names() {
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert!(parse_delimiter("::").is_err());
    }
}
