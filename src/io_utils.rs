//! I/O utilities for CSV reading, writing, character encodings and dialects.
//!
//! All file I/O in csv-metadata flows through this module. It provides:
//!
//! - **Charsets**: label resolution via `encoding_rs`, including the
//!   `utf-8-sig` spelling for BOM-signed UTF-8.
//! - **Decoding**: per-field decoding under a `strict`/`replace`/`ignore`
//!   error mode; UTF-16 input is transcoded to UTF-8 at the stream level.
//! - **Reader/writer construction**: `open_records` yields decoded rows,
//!   `open_csv_writer` encodes output through [`TranscodingWriter`].
//! - **stdin/stdout**: the `-` path convention routes through standard streams.
//! - **Write policy**: `claim_output` decides create/overwrite/skip.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, bail};
use csv::{QuoteStyle, Terminator};
use encoding_rs::{DecoderResult, EncoderResult, Encoding, UTF_8};
use encoding_rs_io::DecodeReaderBytesBuilder;

use crate::{
    cli::CharsetErrorMode,
    config::{CsvDialect, InputConfig, OutputConfig},
    error::UsageError,
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_CELL_WIDTH_LIMIT: usize = 4 * 1024 * 1024;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charset {
    pub encoding: &'static Encoding,
    /// Write (and expect) a byte-order mark.
    pub bom: bool,
    /// Name recorded in table metadata when it differs from the encoding's
    /// own, e.g. `LATIN1` for labels `encoding_rs` folds into windows-1252.
    pub alias: Option<&'static str>,
}

impl Charset {
    pub fn plain(encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            bom: false,
            alias: None,
        }
    }

    pub fn utf8_sig() -> Self {
        Self {
            encoding: UTF_8,
            bom: true,
            alias: None,
        }
    }

    /// `encoding_rs` decodes UTF-16 but only encodes it as UTF-8.
    pub fn is_encodable(&self) -> bool {
        self.encoding.output_encoding() == self.encoding
    }
}

/// Resolves a charset label, accepting WHATWG labels as well as the
/// underscore spellings common elsewhere (`utf_8`, `latin_1`, `utf_8_sig`).
pub fn resolve_charset(label: &str) -> Result<Charset> {
    let lowered = label.trim().to_ascii_lowercase();
    let hyphenated = lowered.replace('_', "-");
    if matches!(hyphenated.as_str(), "utf-8-sig" | "utf8-sig") {
        return Ok(Charset::utf8_sig());
    }
    let compact = hyphenated.replace('-', "");
    let alias = match compact.as_str() {
        "latin1" | "iso88591" | "l1" | "cp819" | "ibm819" => Some("LATIN1"),
        "ascii" | "usascii" => Some("ASCII"),
        _ => None,
    };
    [lowered.as_str(), hyphenated.as_str(), compact.as_str()]
        .into_iter()
        .find_map(|candidate| Encoding::for_label(candidate.as_bytes()))
        .map(|encoding| Charset {
            alias,
            ..Charset::plain(encoding)
        })
        .ok_or_else(|| UsageError::UnknownCharset(label.to_string()).into())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTerminator {
    /// `\r`, `\n` or `\r\n` on input; the platform line break on output.
    Standard,
    Crlf,
    Byte(u8),
}

impl RowTerminator {
    pub fn reader_terminator(self) -> Terminator {
        match self {
            RowTerminator::Standard | RowTerminator::Crlf => Terminator::CRLF,
            RowTerminator::Byte(byte) => Terminator::Any(byte),
        }
    }

    pub fn writer_terminator(self) -> Terminator {
        match self {
            RowTerminator::Standard if cfg!(windows) => Terminator::CRLF,
            RowTerminator::Standard => Terminator::Any(b'\n'),
            RowTerminator::Crlf => Terminator::CRLF,
            RowTerminator::Byte(byte) => Terminator::Any(byte),
        }
    }
}

pub fn decode_bytes(
    bytes: &[u8],
    encoding: &'static Encoding,
    mode: CharsetErrorMode,
) -> Result<String> {
    if encoding == UTF_8
        && let Ok(text) = std::str::from_utf8(bytes)
    {
        return Ok(text.to_string());
    }

    let mut decoder = encoding.new_decoder_without_bom_handling();
    let capacity = decoder
        .max_utf8_buffer_length_without_replacement(bytes.len())
        .unwrap_or(bytes.len());
    let mut text = String::with_capacity(capacity);
    let mut remaining = bytes;
    loop {
        let (result, read) =
            decoder.decode_to_string_without_replacement(remaining, &mut text, true);
        remaining = &remaining[read..];
        match result {
            DecoderResult::InputEmpty => return Ok(text),
            DecoderResult::OutputFull => text.reserve(remaining.len().max(4) * 3),
            DecoderResult::Malformed(_, _) => match mode {
                CharsetErrorMode::Strict => bail!(
                    "Failed to decode text with encoding {}",
                    encoding.name()
                ),
                CharsetErrorMode::Replace => text.push('\u{FFFD}'),
                CharsetErrorMode::Ignore => {}
            },
        }
    }
}

pub fn encode_text(
    text: &str,
    encoding: &'static Encoding,
    mode: CharsetErrorMode,
) -> io::Result<Vec<u8>> {
    let mut encoder = encoding.new_encoder();
    let capacity = encoder
        .max_buffer_length_from_utf8_without_replacement(text.len())
        .unwrap_or(text.len());
    let mut bytes = Vec::with_capacity(capacity);
    let mut remaining = text;
    loop {
        let (result, read) =
            encoder.encode_from_utf8_to_vec_without_replacement(remaining, &mut bytes, true);
        remaining = &remaining[read..];
        match result {
            EncoderResult::InputEmpty => return Ok(bytes),
            EncoderResult::OutputFull => bytes.reserve(remaining.len().max(4) * 4),
            EncoderResult::Unmappable(ch) => match mode {
                CharsetErrorMode::Strict => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("Character {ch:?} cannot be encoded as {}", encoding.name()),
                    ));
                }
                CharsetErrorMode::Replace => bytes.push(b'?'),
                CharsetErrorMode::Ignore => {}
            },
        }
    }
}

pub fn open_csv_reader<R>(reader: R, dialect: &CsvDialect) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(dialect.delimiter)
        .terminator(dialect.terminator.reader_terminator())
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

/// Opens `path` (or stdin for `-`) and yields its rows as decoded strings.
/// The header row is the first item, like any other row.
pub fn open_records(path: &Path, input: &InputConfig) -> Result<DecodedRecords<Box<dyn Read>>> {
    let base: Box<dyn Read> = if is_dash(path) {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    let (reader, encoding): (Box<dyn Read>, &'static Encoding) =
        if input.charset.encoding.is_ascii_compatible() {
            (base, input.charset.encoding)
        } else {
            let transcoded = DecodeReaderBytesBuilder::new()
                .encoding(Some(input.charset.encoding))
                .build(base);
            (Box::new(transcoded), UTF_8)
        };
    Ok(DecodedRecords {
        reader: open_csv_reader(reader, &input.dialect),
        record: csv::ByteRecord::new(),
        encoding,
        error_mode: input.error_mode,
        cell_width_limit: input.cell_width_limit,
        at_start: true,
    })
}

pub struct DecodedRecords<R> {
    reader: csv::Reader<R>,
    record: csv::ByteRecord,
    encoding: &'static Encoding,
    error_mode: CharsetErrorMode,
    cell_width_limit: Option<usize>,
    /// No record has been read yet, so a leading byte-order mark is still
    /// possible.
    at_start: bool,
}

impl<R: Read> DecodedRecords<R> {
    fn decode_current(&self) -> Result<Vec<String>> {
        let row = self.record.position().map_or(0, |pos| pos.line());
        let mut cells = Vec::with_capacity(self.record.len());
        for (idx, field) in self.record.iter().enumerate() {
            let field = if self.at_start && idx == 0 && self.encoding == UTF_8 {
                field.strip_prefix(UTF8_BOM).unwrap_or(field)
            } else {
                field
            };
            let cell = decode_bytes(field, self.encoding, self.error_mode)
                .with_context(|| format!("Decoding row {row}, column {}", idx + 1))?;
            if let Some(limit) = self.cell_width_limit {
                let width = cell.chars().count();
                if width > limit {
                    return Err(UsageError::CellTooWide {
                        row,
                        column: idx + 1,
                        width,
                        limit,
                    }
                    .into());
                }
            }
            cells.push(cell);
        }
        Ok(cells)
    }
}

impl<R: Read> Iterator for DecodedRecords<R> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_byte_record(&mut self.record) {
            Ok(true) => {
                let cells = self.decode_current();
                self.at_start = false;
                Some(cells)
            }
            Ok(false) => None,
            Err(err) => Some(Err(err).context("Reading CSV record")),
        }
    }
}

/// Opens a CSV writer on `path`, or stdout when `path` is `None` or `-`.
pub fn open_csv_writer(
    path: Option<&Path>,
    output: &OutputConfig,
) -> Result<csv::Writer<Box<dyn Write>>> {
    let mut base: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(io::stdout()),
    };
    if output.charset.bom {
        base.write_all(UTF8_BOM)
            .context("Writing byte-order mark")?;
    }

    let encoding = output.charset.encoding;
    let writer: Box<dyn Write> = if encoding == UTF_8 {
        base
    } else {
        Box::new(TranscodingWriter::new(base, encoding, output.error_mode))
    };

    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(output.dialect.delimiter)
        .terminator(output.dialect.terminator.writer_terminator())
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true)
        .flexible(true);
    Ok(builder.from_writer(writer))
}

pub fn write_rows<W: Write>(writer: &mut csv::Writer<W>, rows: &[Vec<String>]) -> Result<()> {
    for row in rows {
        writer.write_record(row).context("Writing CSV row")?;
    }
    writer.flush().context("Flushing output writer")?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputClaim {
    Create,
    Overwrite,
    Skip,
}

pub fn claim_output(path: &Path, overwrite: bool) -> OutputClaim {
    if !path.exists() {
        OutputClaim::Create
    } else if overwrite {
        OutputClaim::Overwrite
    } else {
        OutputClaim::Skip
    }
}

/// True when `err` was caused by the reading end of a pipe going away.
pub fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return io_err.kind() == io::ErrorKind::BrokenPipe;
        }
        matches!(
            cause.downcast_ref::<csv::Error>().map(csv::Error::kind),
            Some(csv::ErrorKind::Io(io_err)) if io_err.kind() == io::ErrorKind::BrokenPipe
        )
    })
}

struct TranscodingWriter<W: Write> {
    inner: W,
    encoding: &'static Encoding,
    mode: CharsetErrorMode,
    buffer: Vec<u8>,
}

impl<W: Write> TranscodingWriter<W> {
    fn new(inner: W, encoding: &'static Encoding, mode: CharsetErrorMode) -> Self {
        Self {
            inner,
            encoding,
            mode,
            buffer: Vec::new(),
        }
    }

    fn flush_buffer(&mut self, force: bool) -> io::Result<()> {
        match std::str::from_utf8(&self.buffer) {
            Ok(valid) => {
                let encoded = encode_text(valid, self.encoding, self.mode)?;
                self.inner.write_all(&encoded)?;
                self.buffer.clear();
                Ok(())
            }
            Err(err) => {
                if let Some(error_len) = err.error_len() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("Invalid UTF-8 sequence in output stream ({error_len} bytes)"),
                    ));
                }
                if force {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "Incomplete UTF-8 sequence at end of output stream",
                    ));
                }
                let valid_up_to = err.valid_up_to();
                if valid_up_to > 0 {
                    let text = std::str::from_utf8(&self.buffer[..valid_up_to])
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                    let encoded = encode_text(text, self.encoding, self.mode)?;
                    self.inner.write_all(&encoded)?;
                    self.buffer.drain(..valid_up_to);
                }
                Ok(())
            }
        }
    }
}

impl<W: Write> Write for TranscodingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        self.flush_buffer(false)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_buffer(true)?;
        self.inner.flush()
    }
}
