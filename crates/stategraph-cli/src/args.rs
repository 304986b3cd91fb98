//! Command-line argument definitions for the Stategraph CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, the output format,
//! which path to highlight, configuration file selection, and logging
//! verbosity.

use clap::{Parser, ValueEnum};

/// Format of the written drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Standalone SVG document
    Svg,
    /// JSON report with placements and routes
    Json,
}

/// Command-line arguments for the Stategraph tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input JSON file (trace list or explicit graph)
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output file
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Svg)]
    pub format: OutputFormat,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Comma separated node ids of a path to highlight
    #[arg(short, long, value_delimiter = ',', conflicts_with = "trace")]
    pub path: Vec<String>,

    /// Key of an input trace whose path to highlight
    #[arg(short, long)]
    pub trace: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["stategraph", "in.json"]).unwrap();

        assert_eq!(args.input, "in.json");
        assert_eq!(args.output, "out.svg");
        assert_eq!(args.format, OutputFormat::Svg);
        assert!(args.path.is_empty());
        assert!(args.trace.is_none());
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn test_path_is_comma_separated() {
        let args =
            Args::try_parse_from(["stategraph", "in.json", "-p", "A,B,C", "-f", "json"]).unwrap();

        assert_eq!(args.path, ["A", "B", "C"]);
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_path_and_trace_conflict() {
        let result = Args::try_parse_from(["stategraph", "in.json", "-p", "A", "-t", "t1"]);
        assert!(result.is_err());
    }
}
