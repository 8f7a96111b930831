use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::info;
use wavefront_window::{
    columns,
    encode::CsvEncoder,
    metric_columns,
    runner::{Connect, HttpConnect},
    LogLogger, Logger, Properties, Runner,
};

#[derive(Parser)]
#[command(name = "wavefront-window")]
#[command(about = "Fetch the Wavefront data for the hours elapsed since the last run as CSV")]
#[command(version)]
struct Cli {
    /// JSON file with wavefront-server, wavefront-token and the start-time cursor.
    /// The advanced cursor is written back to it.
    #[arg(long)]
    properties: PathBuf,

    /// Run a single query; rows are customer, cluster, ts, <value-column>
    #[arg(long, conflicts_with = "metric", required_unless_present = "metric")]
    query: Option<String>,

    /// Name of the value column for --query
    #[arg(long, default_value = "value")]
    value_column: String,

    /// Run one query per metric, given as NAME=QUERY. May be repeated
    #[arg(long, value_parser = parse_metric)]
    metric: Vec<(String, String)>,

    /// Write CSV to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn parse_metric(s: &str) -> Result<(String, String)> {
    let (name, query) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=QUERY, got {:?}", s))?;
    if name.is_empty() {
        return Err(anyhow!("metric name is empty in {:?}", s));
    }
    Ok((name.to_string(), query.to_string()))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut properties = Properties::load(&cli.properties)
        .with_context(|| format!("failed to load {}", cli.properties.display()))?;
    let out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut encoder = CsvEncoder::new(out);
    let runner = Runner::new(HttpConnect, LogLogger);

    let written = match &cli.query {
        Some(query) => write_query(
            runner,
            &mut encoder,
            &mut properties,
            &cli.properties,
            query,
            &cli.value_column,
        )?,
        None => write_metrics(
            runner,
            &mut encoder,
            &mut properties,
            &cli.properties,
            &cli.metric,
        )?,
    };
    info!(
        "wrote {} rows, start-time is now {}",
        written,
        properties.start_time().unwrap_or_default()
    );
    Ok(())
}

fn save(properties: &Properties, path: &Path) -> Result<()> {
    properties
        .save(path)
        .with_context(|| format!("failed to save {}", path.display()))
}

// The cursor is saved only once the rows are flushed, so a failed write
// fetches the same window again on the next run. A failed query has
// already advanced the cursor and is saved before the error is returned.
fn write_query<C: Connect, L: Logger, W: Write>(
    runner: Runner<C, L>,
    encoder: &mut CsvEncoder<W>,
    properties: &mut Properties,
    path: &Path,
    query: &str,
    value_column: &str,
) -> Result<usize> {
    let rows = match runner.run(properties, query) {
        Ok(rows) => rows,
        Err(e) => {
            save(properties, path)?;
            return Err(e.into());
        }
    };
    encoder.encode_header(&columns(value_column))?;
    encoder.encode_rows(&rows)?;
    encoder.flush()?;
    save(properties, path)?;
    Ok(rows.len())
}

fn write_metrics<C: Connect, L: Logger, W: Write>(
    runner: Runner<C, L>,
    encoder: &mut CsvEncoder<W>,
    properties: &mut Properties,
    path: &Path,
    metrics: &[(String, String)],
) -> Result<usize> {
    encoder.encode_header(&metric_columns())?;
    let mut written = 0;
    let queries = metrics
        .iter()
        .map(|(name, query)| (name.as_str(), query.as_str()));
    for rows in runner.run_all(properties, queries) {
        let rows = rows?;
        encoder.encode_rows(&rows)?;
        written += rows.len();
    }
    encoder.flush()?;
    save(properties, path)?;
    Ok(written)
}
