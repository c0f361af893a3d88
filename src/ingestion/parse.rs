//! Parse functions - turn a downloaded report into a clean data file
//!
//! Downloaded reports carry a fixed-size preamble (report name, date range,
//! filters), then the real header, the data rows, and a trailing totals row.
//! Cleaning keeps only the header and the data rows.

use crate::ingestion::error::ReportError;
use crate::ingestion::types::{CleanStats, CleanerLayout};
use crate::ingestion::write::{cleaned_writer, CleanedWriter};
use csv::ByteRecord;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Iterator adapter that yields every item except the last one.
///
/// Holds two slots: the item read on the previous step (`pending`) and the
/// one just read. `pending` is only released once a successor exists, so
/// the final item is discarded when the source runs dry.
pub struct DropLast<I: Iterator> {
    inner: I,
    pending: Option<I::Item>,
    primed: bool,
}

impl<I: Iterator> DropLast<I> {
    pub fn new(inner: I) -> Self {
        DropLast {
            inner,
            pending: None,
            primed: false,
        }
    }
}

impl<I: Iterator> Iterator for DropLast<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.primed {
            self.primed = true;
            self.pending = self.inner.next();
        }

        // nothing buffered: source was empty or is already exhausted
        self.pending.as_ref()?;

        match self.inner.next() {
            Some(current) => self.pending.replace(current),
            None => {
                self.pending = None;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lower, upper) = self.inner.size_hint();
        match (self.primed, &self.pending) {
            (false, _) => (lower.saturating_sub(1), upper.map(|u| u.saturating_sub(1))),
            (true, None) => (0, Some(0)),
            // each remaining inner item releases exactly one buffered item
            (true, Some(_)) => (lower, upper),
        }
    }
}

pub trait DropLastExt: Iterator + Sized {
    fn drop_last(self) -> DropLast<Self> {
        DropLast::new(self)
    }
}

impl<I: Iterator> DropLastExt for I {}

/// Make a header field safe to use as a column identifier.
/// Works on raw bytes; only ASCII is touched, so other encodings pass through.
pub fn sanitize_header_field(field: &[u8], colon_replacement: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(field.len());
    for &byte in field {
        match byte {
            b' ' | b'-' => {}
            b':' => out.extend_from_slice(colon_replacement),
            other => out.push(other),
        }
    }
    out
}

pub fn sanitize_header(record: &ByteRecord, layout: &CleanerLayout) -> ByteRecord {
    record
        .iter()
        .map(|field| sanitize_header_field(field, layout.colon_replacement.as_bytes()))
        .collect()
}

/// Parse one physical line into a record. A blank line is a record with no fields.
pub fn parse_line(line: &[u8]) -> Result<ByteRecord, ReportError> {
    let mut record = ByteRecord::new();
    if line.is_empty() {
        return Ok(record);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line);
    reader.read_byte_record(&mut record)?;
    Ok(record)
}

/// Split a report into one record per physical line.
///
/// Row offsets count lines, blank ones included, so the header index matches
/// what the report generator laid out. Quoted fields spanning lines are not
/// supported; report files never contain them.
pub fn report_rows<R: BufRead>(reader: R) -> impl Iterator<Item = Result<ByteRecord, ReportError>> {
    reader.split(b'\n').map(|line| {
        let mut line = line?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        parse_line(&line)
    })
}

/// Apply the report layout to a stream of rows, writing the kept rows
pub fn clean_records<I, W>(
    records: I,
    writer: &mut CleanedWriter<W>,
    layout: &CleanerLayout,
) -> Result<CleanStats, ReportError>
where
    I: Iterator<Item = Result<ByteRecord, ReportError>>,
    W: Write,
{
    let mut stats = CleanStats::default();

    for (idx, result) in records.drop_last().enumerate() {
        let record = result?;

        if idx < layout.header_row {
            stats.preamble_skipped += 1;
        } else if idx == layout.header_row {
            let header = sanitize_header(&record, layout);
            debug!("Header: {:?}", header);
            writer.write_row(&header)?;
            stats.header_written = true;
        } else {
            writer.write_row(&record)?;
            stats.body_rows += 1;
        }
    }

    writer.flush()?;
    Ok(stats)
}

/// Clean a downloaded report file into `output`, replacing any previous output
pub fn clean_report_file(
    input: &Path,
    output: &Path,
    layout: &CleanerLayout,
) -> Result<CleanStats, ReportError> {
    info!("Cleaning report {:?} -> {:?}", input, output);

    let reader = BufReader::new(File::open(input)?);
    let mut writer = cleaned_writer(output)?;

    let stats = clean_records(report_rows(reader), &mut writer, layout)?;

    if !stats.header_written {
        warn!(
            "Report had no row at index {}; {:?} has no header",
            layout.header_row, output
        );
    }
    info!("Data formatted: {}", stats);

    Ok(stats)
}
