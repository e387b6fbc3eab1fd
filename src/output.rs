use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use tabled::{Table, Tabled, settings::Style};

use crate::models::{CriterionReport, CriterionStatus, OutputFormats, SearchResult};

pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y_%H-%M-%S";

const DETAIL_MAX_CHARS: usize = 60;

pub const CSV_HEADER: [&str; 6] = ["_id", "sort", "page_url", "task_url", "stats", "brand"];

pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn output_path(folder: &Path, title: &str, timestamp: &str, ext: &str) -> PathBuf {
    folder.join(format!("{title}_{timestamp}.{ext}"))
}

/// Write the aggregated results in every enabled format. Both files share
/// the one timestamp so a JSON/CSV pair always carries matching names.
pub fn write_results(
    folder: &Path,
    title: &str,
    results: &[SearchResult],
    formats: OutputFormats,
    timestamp: &str,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    if !formats.any() {
        tracing::warn!("both Result_json and Result_csv are disabled; nothing written");
        return Ok(written);
    }
    fs::create_dir_all(folder)
        .with_context(|| format!("create output folder {}", folder.display()))?;

    if formats.json {
        let path = output_path(folder, title, timestamp, "json");
        write_json(&path, results)?;
        println!("Resultados guardados en {}", path.display());
        tracing::info!(path = %path.display(), records = results.len(), "json written");
        written.push(path);
    }
    if formats.csv {
        let path = output_path(folder, title, timestamp, "csv");
        write_csv(&path, results)?;
        println!("Resultados guardados en {}", path.display());
        tracing::info!(path = %path.display(), records = results.len(), "csv written");
        written.push(path);
    }
    Ok(written)
}

/// Pretty-printed array with four-space indentation.
pub fn write_json(path: &Path, results: &[SearchResult]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    results
        .serialize(&mut ser)
        .with_context(|| format!("serialize results to {}", path.display()))?;
    out.flush()
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn write_csv(path: &Path, results: &[SearchResult]) -> Result<()> {
    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    wtr.write_record(CSV_HEADER)?;
    for record in results {
        wtr.write_record(project_row(record))?;
    }
    wtr.flush()
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Flatten one record into the six CSV columns. Absent fields become empty
/// cells; structured values are written as compact JSON.
pub fn project_row(record: &SearchResult) -> [String; 6] {
    let nested = |outer: &str| record.get(outer).and_then(|v| v.get("url"));
    [
        cell(record.get("_id")),
        cell(record.get("sort")),
        cell(nested("page")),
        cell(nested("task")),
        cell(record.get("stats")),
        cell(record.get("brand")),
    ]
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn print_summary(reports: &[CriterionReport]) {
    if reports.is_empty() {
        println!("Sin criterios procesados.");
        return;
    }
    let rows: Vec<SummaryRow> = reports.iter().map(SummaryRow::from).collect();
    if std::env::var("NO_TABLE").ok().as_deref() == Some("1") {
        for r in &rows {
            if r.detail.is_empty() {
                println!("  - {} [{}] {}", r.query, r.status, r.results);
            } else {
                println!("  - {} [{}] {} ({})", r.query, r.status, r.results, r.detail);
            }
        }
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

#[derive(Clone, Tabled)]
struct SummaryRow {
    #[tabled(rename = "Consulta")]
    query: String,
    #[tabled(rename = "Estado")]
    status: String,
    #[tabled(rename = "Resultados")]
    results: usize,
    #[tabled(rename = "Detalle")]
    detail: String,
}

impl From<&CriterionReport> for SummaryRow {
    fn from(r: &CriterionReport) -> Self {
        let (status, detail) = match &r.status {
            CriterionStatus::Found(_) => ("OK".to_string(), String::new()),
            CriterionStatus::Rejected { status, body } => (format!("HTTP {status}"), shorten(body)),
            CriterionStatus::Failed { reason } => ("Error".to_string(), shorten(reason)),
        };
        Self {
            query: r.query.clone(),
            status,
            results: r.status.result_count(),
            detail,
        }
    }
}

/// First line of a response body or error, cut to fit a table cell.
fn shorten(text: &str) -> String {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    if line.chars().count() <= DETAIL_MAX_CHARS {
        return line.to_string();
    }
    let mut cut: String = line.chars().take(DETAIL_MAX_CHARS).collect();
    cut.push('…');
    cut
}
