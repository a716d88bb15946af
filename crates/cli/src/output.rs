//! Result sinks: terminal, file, and fan-out to both

use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use bugscan_common::{ReportRecord, ResultSink};
use crate::args::OutputFormat;

/// Colored record line, same columns as `ReportRecord::to_plain_line`.
pub fn format_terminal_line(record: &ReportRecord) -> String {
    format!(
        "{}  {}  {:<22}  {}  {}",
        format!("{:<6}", record.method).cyan(),
        format!("{:<4}", record.status_code).magenta(),
        record.server,
        format!("{:<4}", record.port).truecolor(255, 135, 0),
        record.host.bright_green()
    )
}

/// Render a record for the output file.
pub fn format_file_line(record: &ReportRecord, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(record.to_plain_line()),
        OutputFormat::Jsonl => serde_json::to_string(record).context("Failed to encode record"),
    }
}

/// Prints colored records to stdout.
pub struct TerminalSink;

#[async_trait]
impl ResultSink for TerminalSink {
    async fn emit(&self, record: &ReportRecord) -> Result<()> {
        let mut line = format_terminal_line(record);
        line.push('\n');
        // One write under the stdout lock keeps concurrent records whole
        let mut out = std::io::stdout().lock();
        out.write_all(line.as_bytes()).context("Failed to write to stdout")?;
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        std::io::stdout().lock().flush().context("Failed to flush stdout")
    }
}

/// Appends records to a file, one per line.
pub struct FileSink {
    writer: Mutex<BufWriter<File>>,
    format: OutputFormat,
}

impl FileSink {
    pub fn create(path: &Path, format: OutputFormat) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            format,
        })
    }
}

#[async_trait]
impl ResultSink for FileSink {
    async fn emit(&self, record: &ReportRecord) -> Result<()> {
        let mut line = format_file_line(record, self.format)?;
        line.push('\n');
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("output file lock poisoned"))?;
        writer.write_all(line.as_bytes()).context("Failed to write output file")?;
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("output file lock poisoned"))?;
        writer.flush().context("Failed to flush output file")
    }
}

/// Forwards every record to each inner sink in order.
pub struct TeeSink {
    sinks: Vec<Arc<dyn ResultSink>>,
}

impl TeeSink {
    pub fn new(sinks: Vec<Arc<dyn ResultSink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl ResultSink for TeeSink {
    async fn emit(&self, record: &ReportRecord) -> Result<()> {
        for sink in &self.sinks {
            sink.emit(record).await?;
        }
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        for sink in &self.sinks {
            sink.flush().await?;
        }
        Ok(())
    }
}

/// Terminal output, plus the output file when one is configured.
pub fn build_sink(output: Option<&Path>, format: OutputFormat) -> Result<Arc<dyn ResultSink>> {
    let terminal: Arc<dyn ResultSink> = Arc::new(TerminalSink);
    match output {
        Some(path) => {
            let file: Arc<dyn ResultSink> = Arc::new(FileSink::create(path, format)?);
            Ok(Arc::new(TeeSink::new(vec![terminal, file])))
        }
        None => Ok(terminal),
    }
}
