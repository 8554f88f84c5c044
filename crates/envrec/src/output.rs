use std::io::{self, IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use envrec_envelope::{Payload, Record, TimeStamp};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line.
    Json,
    /// Bordered tables, rendered in batches.
    Table,
    /// Classic text dump; timestamps print as `seconds.microseconds` with
    /// microseconds zero-padded to six digits.
    Pretty,
    /// Payload bytes only.
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct RecordJson<'a> {
    frame_index: u64,
    offset: u64,
    data_type: i32,
    sender_stamp: u32,
    sent: Option<TimeStamp>,
    received: Option<TimeStamp>,
    sample_time_stamp: Option<TimeStamp>,
    payload_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_error: Option<String>,
}

impl<'a> RecordJson<'a> {
    fn new(record: &'a Record) -> Self {
        let envelope = &record.envelope;
        let (payload_type, payload, payload_error) = match &record.payload {
            Payload::Decoded(message) => {
                (Some(message.message_name()), Some(message.to_json()), None)
            }
            Payload::Unknown => (None, None, None),
            Payload::Failed(err) => (Some(err.message), None, Some(err.to_string())),
        };

        Self {
            frame_index: record.frame_index,
            offset: record.offset,
            data_type: envelope.data_type,
            sender_stamp: envelope.sender_stamp,
            sent: envelope.sent,
            received: envelope.received,
            sample_time_stamp: envelope.sample_time_stamp,
            payload_size: envelope.payload().len(),
            payload_type,
            payload,
            payload_error,
        }
    }
}

/// Rows rendered per table when dumping in [`OutputFormat::Table`].
pub const TABLE_BATCH_ROWS: usize = 32;

/// Writes records to `out` in one of the output formats.
///
/// Table rows are rendered in batches of [`TABLE_BATCH_ROWS`], each batch as
/// its own table; [`finish`](Self::finish) writes the last partial batch.
/// Every other format streams one record at a time.
pub struct RecordOutput<W: Write> {
    out: W,
    format: OutputFormat,
    rows: Vec<Vec<String>>,
}

impl<W: Write> RecordOutput<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            rows: Vec::new(),
        }
    }

    pub fn write_record(&mut self, record: &Record) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, &RecordJson::new(record))?;
                writeln!(self.out)
            }
            OutputFormat::Table => {
                self.rows.push(table_row(record));
                if self.rows.len() >= TABLE_BATCH_ROWS {
                    self.flush_table()?;
                }
                Ok(())
            }
            OutputFormat::Pretty => write_pretty(&mut self.out, record),
            OutputFormat::Raw => self.out.write_all(record.envelope.payload()),
        }
    }

    /// Write pending table rows and hand back the writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.flush_table()?;
        self.out.flush()?;
        Ok(self.out)
    }

    fn flush_table(&mut self) -> io::Result<()> {
        if self.rows.is_empty() {
            return Ok(());
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                "FRAME", "OFFSET", "TYPE", "SENDER", "SENT", "SAMPLE", "SIZE", "PAYLOAD",
            ]);
        for row in self.rows.drain(..) {
            table.add_row(row);
        }
        writeln!(self.out, "{table}")?;
        self.out.flush()
    }
}

fn table_row(record: &Record) -> Vec<String> {
    let envelope = &record.envelope;
    vec![
        record.frame_index.to_string(),
        record.offset.to_string(),
        envelope.data_type.to_string(),
        envelope.sender_stamp.to_string(),
        envelope.sent().to_string(),
        envelope.sample_time_stamp().to_string(),
        envelope.payload().len().to_string(),
        payload_summary(&record.payload),
    ]
}

fn write_pretty<W: Write>(out: &mut W, record: &Record) -> io::Result<()> {
    let envelope = &record.envelope;
    writeln!(
        out,
        "Envelope ID/senderStamp = {}/{}",
        envelope.data_type, envelope.sender_stamp
    )?;
    writeln!(out, " - sent                 = {}", envelope.sent())?;
    writeln!(out, " - received             = {}", envelope.received())?;
    writeln!(out, " - sample time          = {}", envelope.sample_time_stamp())?;
    if !matches!(record.payload, Payload::Unknown) {
        writeln!(out, "Payload: {}", payload_summary(&record.payload))?;
    }
    writeln!(out)
}

fn payload_summary(payload: &Payload) -> String {
    match payload {
        Payload::Decoded(message) => format!("{} {}", message.message_name(), message.to_json()),
        Payload::Unknown => "-".to_string(),
        Payload::Failed(err) => format!("<{err}>"),
    }
}
