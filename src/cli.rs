/*!
tsviz Command Line Interface

Provides commands for interpolating time macros into SQL, validating query
context, analyzing result rows, and synthesizing chart specifications.
*/

use std::io::Read as _;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tsviz::interpolate::{interpolate, InterpolateContext};
use tsviz::time::TimeRangeDescriptor;
use tsviz::{
    analyze, auto_detect_mapping, chart, synthesize, validate, ChartConfiguration, ChartKind,
    ColumnDescriptor, FieldMapping, Row, VERSION,
};

#[derive(Parser)]
#[command(name = "tsviz")]
#[command(about = "Time-series SQL macro interpolation and chart synthesis")]
#[command(version = VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interpolate time macros into a SQL query
    Interpolate {
        /// The macro-bearing SQL query
        query: String,

        /// Time column name
        #[arg(long)]
        time_column: Option<String>,

        /// Range start ("now-1h", "2024-01-01", ...)
        #[arg(long)]
        from: Option<String>,

        /// Range end ("now", an absolute timestamp, ...)
        #[arg(long, default_value = "now")]
        to: String,

        /// IANA time zone for quoted bound literals and snap expressions
        #[arg(long, default_value = "UTC")]
        time_zone: String,

        /// Bucket-count cap for $__interval
        #[arg(long, default_value_t = tsviz::interpolate::DEFAULT_MAX_POINTS)]
        max_points: u32,
    },

    /// Validate a query's macro context without interpolating
    Validate {
        /// The macro-bearing SQL query
        query: String,

        /// Time column name
        #[arg(long)]
        time_column: Option<String>,

        /// Range start
        #[arg(long)]
        from: Option<String>,

        /// Range end
        #[arg(long, default_value = "now")]
        to: String,
    },

    /// Analyze result rows into field metadata
    Analyze {
        /// Path to a JSON array of row objects, or `-` for stdin
        rows: PathBuf,

        /// Path to a JSON array of column schema hints
        #[arg(long)]
        schema: Option<PathBuf>,
    },

    /// Synthesize a chart render spec from result rows
    Chart {
        /// Path to a JSON array of row objects, or `-` for stdin
        rows: PathBuf,

        /// X-axis field (auto-detected when omitted)
        #[arg(long)]
        x: Option<String>,

        /// Y-axis field (auto-detected when omitted)
        #[arg(long)]
        y: Option<String>,

        /// Group-by field
        #[arg(long)]
        group: Option<String>,

        /// Chart kind (line, bar, area)
        #[arg(long, default_value = "line")]
        kind: String,

        /// Chart title
        #[arg(long, default_value = "query result")]
        title: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Interpolate {
            query,
            time_column,
            from,
            to,
            time_zone,
            max_points,
        } => {
            let time_zone = time_zone
                .parse::<chrono_tz::Tz>()
                .map_err(|e| anyhow::anyhow!("unknown time zone: {}", e))?;
            let ctx = InterpolateContext {
                time_column,
                time_column_schema: None,
                time_range: query_range(from, to),
                time_zone,
                max_points,
            };
            let result = interpolate(&query, &ctx);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Validate {
            query,
            time_column,
            from,
            to,
        } => {
            let range = query_range(from, to);
            let result = validate(&query, time_column.as_deref(), range.as_ref());
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.is_valid {
                std::process::exit(1);
            }
        }

        Commands::Analyze { rows, schema } => {
            let rows = read_rows(&rows)?;
            let hints: Vec<ColumnDescriptor> = match schema {
                Some(path) => serde_json::from_str(&read_input(&path)?)
                    .context("failed to parse schema hints")?,
                None => Vec::new(),
            };
            let fields = analyze(&rows, &hints);
            println!("{}", serde_json::to_string_pretty(&fields)?);
        }

        Commands::Chart {
            rows,
            x,
            y,
            group,
            kind,
            title,
        } => {
            let rows = read_rows(&rows)?;
            let fields = analyze(&rows, &[]);
            let mapping = match (x, y) {
                (Some(x_axis), Some(y_axis)) => FieldMapping {
                    x_axis,
                    y_axis,
                    group_by: group,
                },
                _ => {
                    let mut mapping = auto_detect_mapping(&fields)
                        .context("could not auto-detect a field mapping from the rows")?;
                    if group.is_some() {
                        mapping.group_by = group;
                    }
                    mapping
                }
            };
            let kind = parse_kind(&kind)?;
            let time_formatting = chart::auto_time_formatting(&fields, &mapping);
            let config = ChartConfiguration::new(title, kind, mapping)
                .with_time_formatting(time_formatting);
            let config = synthesize(&rows, &config, &[]);
            match config.render_spec {
                Some(spec) => println!("{}", serde_json::to_string_pretty(&spec)?),
                None => {
                    eprintln!("nothing to draw");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

/// Build a query-range descriptor from CLI flags; no `--from` means no range.
fn query_range(from: Option<String>, to: String) -> Option<TimeRangeDescriptor> {
    from.map(|from| TimeRangeDescriptor::Query {
        from,
        to,
        enabled: None,
    })
}

fn parse_kind(kind: &str) -> anyhow::Result<ChartKind> {
    match kind {
        "line" => Ok(ChartKind::Line),
        "bar" => Ok(ChartKind::Bar),
        "area" => Ok(ChartKind::Area),
        other => anyhow::bail!("unknown chart kind: {} (expected line, bar, or area)", other),
    }
}

fn read_rows(path: &std::path::Path) -> anyhow::Result<Vec<Row>> {
    serde_json::from_str(&read_input(path)?).context("failed to parse rows as a JSON array")
}

fn read_input(path: &std::path::Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))
    }
}
