//! Export artifact assembly.

use chrono::NaiveDateTime;
use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use encoding_rs::{Encoding, UTF_8};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::value::RawValue;
use etl_model::{Artifact, ColumnSpec, FileFormat, NormalizedRecord};

use crate::error::OutputError;
use crate::format::{json_cell, text_cell};

/// Timestamp layout used in artifact names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    pub format: FileFormat,
    /// Target encoding of CSV output. JSON is always UTF-8.
    pub encoding: &'static Encoding,
    pub delimiter: u8,
}

impl ExportOptions {
    pub fn new(format: FileFormat, encoding_label: &str, delimiter: char) -> Result<Self, OutputError> {
        let encoding = Encoding::for_label(encoding_label.trim().as_bytes()).ok_or_else(|| {
            OutputError::UnknownEncoding {
                label: encoding_label.to_string(),
            }
        })?;
        if encoding.output_encoding() != encoding {
            return Err(OutputError::UnsupportedEncoding {
                encoding: encoding.name().to_string(),
            });
        }
        let delimiter = u8::try_from(delimiter)
            .ok()
            .filter(|byte| byte.is_ascii() && !matches!(byte, b'"' | b'\n' | b'\r'))
            .ok_or(OutputError::InvalidDelimiter { delimiter })?;
        Ok(Self {
            format,
            encoding,
            delimiter,
        })
    }

    pub fn content_type(&self) -> String {
        match self.format {
            FileFormat::Csv => format!(
                "text/csv; charset={}",
                self.encoding.name().to_ascii_lowercase()
            ),
            FileFormat::Json => "application/json".to_string(),
        }
    }
}

/// Keep a name component to characters that are safe in blob and file names.
pub fn sanitize_component(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || matches!(ch, '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// `<prefix>_<customer>_<YYYY-MM-DD_HH-MM-SS>`.
pub fn artifact_stem(prefix: &str, customer: &str, timestamp: NaiveDateTime) -> String {
    format!(
        "{}_{}_{}",
        sanitize_component(prefix),
        sanitize_component(customer),
        timestamp.format(TIMESTAMP_FORMAT)
    )
}

pub fn artifact_name(
    prefix: &str,
    customer: &str,
    timestamp: NaiveDateTime,
    format: FileFormat,
) -> String {
    format!(
        "{}.{}",
        artifact_stem(prefix, customer, timestamp),
        format.extension()
    )
}

/// Serialize accepted records in column order.
pub fn build(
    records: &[NormalizedRecord],
    spec: &ColumnSpec,
    options: &ExportOptions,
    name: impl Into<String>,
) -> Result<Artifact, OutputError> {
    let bytes = match options.format {
        FileFormat::Csv => build_csv(records, spec, options.delimiter, options.encoding)?,
        FileFormat::Json => build_json(records, spec)?,
    };
    let artifact = Artifact::new(name, options.content_type(), bytes);
    tracing::debug!(
        customer = spec.customer(),
        artifact = %artifact.name,
        rows = records.len(),
        bytes = artifact.len(),
        "built export artifact"
    );
    Ok(artifact)
}

fn encode_row(text: &str, encoding: &'static Encoding, line: u64) -> Result<Vec<u8>, OutputError> {
    if encoding == UTF_8 {
        return Ok(text.as_bytes().to_vec());
    }
    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors {
        return Err(OutputError::Unmappable {
            line,
            encoding: encoding.name().to_string(),
        });
    }
    Ok(bytes.into_owned())
}

/// Encode the bytes the writer produced since the last call.
fn take_row(
    writer: &mut Writer<Vec<u8>>,
    written: &mut usize,
    encoding: &'static Encoding,
    line: u64,
) -> Result<Vec<u8>, OutputError> {
    writer.flush().map_err(csv::Error::from)?;
    let buffer = writer.get_ref();
    let row = std::str::from_utf8(&buffer[*written..])?;
    *written = buffer.len();
    encode_row(row, encoding, line)
}

/// Header of display names, then one row per record. Rows are encoded one
/// at a time so an unmappable character is reported with its source line.
pub fn build_csv(
    records: &[NormalizedRecord],
    spec: &ColumnSpec,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<Vec<u8>, OutputError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .terminator(Terminator::Any(b'\n'))
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());
    let mut written = 0;
    writer.write_record(spec.display_names())?;
    let mut out = take_row(&mut writer, &mut written, encoding, 1)?;
    for record in records {
        writer.write_record(
            spec.columns()
                .iter()
                .map(|column| text_cell(column, record.get(&column.key))),
        )?;
        out.extend(take_row(&mut writer, &mut written, encoding, record.line)?);
    }
    Ok(out)
}

/// One JSON object keyed by display name, in column order.
struct JsonRow<'a> {
    cells: Vec<(&'a str, Box<RawValue>)>,
}

impl Serialize for JsonRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A JSON array with one object per line, keyed by display name.
pub fn build_json(records: &[NormalizedRecord], spec: &ColumnSpec) -> Result<Vec<u8>, OutputError> {
    if records.is_empty() {
        return Ok(b"[]\n".to_vec());
    }

    let mut out = b"[\n".to_vec();
    for (idx, record) in records.iter().enumerate() {
        if idx > 0 {
            out.extend_from_slice(b",\n");
        }
        let cells = spec
            .columns()
            .iter()
            .map(|column| Ok((column.name.as_str(), json_cell(column, record.get(&column.key))?)))
            .collect::<Result<Vec<_>, serde_json::Error>>()?;
        serde_json::to_writer(&mut out, &JsonRow { cells })?;
    }
    out.extend_from_slice(b"\n]\n");
    Ok(out)
}
