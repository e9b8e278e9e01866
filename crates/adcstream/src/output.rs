use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use adcstream_source::PortInfo;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// One line of `monitor` output, emitted per telemetry report.
#[derive(Debug, Serialize)]
pub struct TelemetryLine {
    pub kind: &'static str,
    pub source: String,
    pub rate_hz: f64,
    pub backlog_bytes: usize,
    pub packets: u64,
    pub frames_total: u64,
    pub errors_total: u64,
    pub dropped_bytes: u64,
    pub latest: Option<Vec<u16>>,
    pub timestamp: String,
}

pub fn print_telemetry(line: &TelemetryLine, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(line),
        OutputFormat::Table => print_table(
            &[
                "SOURCE", "RATE_HZ", "BACKLOG", "FRAMES", "ERRORS", "DROPPED", "LATEST",
            ],
            vec![vec![
                line.source.clone(),
                format!("{:.1}", line.rate_hz),
                line.backlog_bytes.to_string(),
                line.frames_total.to_string(),
                line.errors_total.to_string(),
                line.dropped_bytes.to_string(),
                latest_preview(line.latest.as_deref()),
            ]],
        ),
        OutputFormat::Pretty => {
            println!(
                "rate={:.1} Hz backlog={} B frames={} errors={} dropped={} latest={}",
                line.rate_hz,
                line.backlog_bytes,
                line.frames_total,
                line.errors_total,
                line.dropped_bytes,
                latest_preview(line.latest.as_deref())
            );
        }
    }
}

#[derive(Debug, Serialize)]
struct SampleOutput<'a> {
    kind: &'static str,
    index: u64,
    values: &'a [u16],
}

pub fn print_sample(index: u64, values: &[u16], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&SampleOutput {
            kind: "sample",
            index,
            values,
        }),
        // One table per sample is unreadable; table mode shows the summary only.
        OutputFormat::Table => {}
        OutputFormat::Pretty => println!("{index}: {}", latest_preview(Some(values))),
    }
}

/// Result of a `decode` run.
#[derive(Debug, Serialize)]
pub struct DecodeSummary {
    pub kind: &'static str,
    pub channels: usize,
    pub bytes_total: u64,
    pub frames_total: u64,
    pub errors_total: u64,
    pub overflow_bytes_total: u64,
    pub trailing_bytes: usize,
}

pub fn print_decode_summary(summary: &DecodeSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(summary),
        OutputFormat::Table => print_table(
            &["CHANNELS", "BYTES", "FRAMES", "ERRORS", "OVERFLOW", "TRAILING"],
            vec![vec![
                summary.channels.to_string(),
                summary.bytes_total.to_string(),
                summary.frames_total.to_string(),
                summary.errors_total.to_string(),
                summary.overflow_bytes_total.to_string(),
                summary.trailing_bytes.to_string(),
            ]],
        ),
        OutputFormat::Pretty => println!(
            "decoded {} frames from {} bytes ({} errors, {} trailing bytes)",
            summary.frames_total,
            summary.bytes_total,
            summary.errors_total,
            summary.trailing_bytes
        ),
    }
}

/// Result of a `throughput` run.
#[derive(Debug, Serialize)]
pub struct ThroughputSummary {
    pub kind: &'static str,
    pub source: String,
    pub bytes_total: u64,
    pub reads: u64,
    pub elapsed_secs: f64,
    pub bytes_per_sec: f64,
}

pub fn print_throughput(summary: &ThroughputSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(summary),
        OutputFormat::Table => print_table(
            &["SOURCE", "BYTES", "READS", "SECONDS", "BYTES/S"],
            vec![vec![
                summary.source.clone(),
                summary.bytes_total.to_string(),
                summary.reads.to_string(),
                format!("{:.3}", summary.elapsed_secs),
                format!("{:.1}", summary.bytes_per_sec),
            ]],
        ),
        OutputFormat::Pretty => println!(
            "{}: {} bytes in {:.3}s = {:.1} B/s",
            summary.source, summary.bytes_total, summary.elapsed_secs, summary.bytes_per_sec
        ),
    }
}

#[derive(Debug, Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    kind: &'a str,
    vid: Option<String>,
    pid: Option<String>,
    manufacturer: Option<&'a str>,
    product: Option<&'a str>,
    serial_number: Option<&'a str>,
}

impl<'a> From<&'a PortInfo> for PortOutput<'a> {
    fn from(port: &'a PortInfo) -> Self {
        Self {
            name: &port.name,
            kind: port.kind,
            vid: port.vid.map(|v| format!("{v:04x}")),
            pid: port.pid.map(|p| format!("{p:04x}")),
            manufacturer: port.manufacturer.as_deref(),
            product: port.product.as_deref(),
            serial_number: port.serial_number.as_deref(),
        }
    }
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    let rows: Vec<PortOutput<'_>> = ports.iter().map(PortOutput::from).collect();
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => print_table(
            &["PORT", "TYPE", "VID:PID", "MANUFACTURER", "PRODUCT"],
            rows.iter()
                .map(|port| {
                    vec![
                        port.name.to_string(),
                        port.kind.to_string(),
                        vid_pid(port),
                        port.manufacturer.unwrap_or("-").to_string(),
                        port.product.unwrap_or("-").to_string(),
                    ]
                })
                .collect(),
        ),
        OutputFormat::Pretty => {
            if rows.is_empty() {
                println!("no serial ports found");
            }
            for port in &rows {
                println!("{} ({}, {})", port.name, port.kind, vid_pid(port));
            }
        }
    }
}

fn vid_pid(port: &PortOutput<'_>) -> String {
    match (&port.vid, &port.pid) {
        (Some(vid), Some(pid)) => format!("{vid}:{pid}"),
        _ => "-".to_string(),
    }
}

pub fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn print_table(header: &[&str], rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    for row in rows {
        table.add_row(row);
    }
    println!("{table}");
}

fn latest_preview(values: Option<&[u16]>) -> String {
    match values {
        Some(values) => values
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(","),
        None => "-".to_string(),
    }
}
