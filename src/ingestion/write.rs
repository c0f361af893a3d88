//! Write functions - persist pipeline output to the local filesystem

use crate::ingestion::error::ReportError;
use csv::ByteRecord;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

const LINE_TERMINATOR: u8 = b'\n';

/// Write a downloaded report verbatim, truncating any previous contents.
/// Returns the number of bytes written.
pub fn write_download(path: &Path, contents: &[u8]) -> Result<u64, ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    debug!("Wrote {} bytes to {:?}", contents.len(), path);
    Ok(contents.len() as u64)
}

/// Row writer for the cleaned report.
///
/// Rows with fields go through the csv writer (quoting as needed, bytes kept
/// as-is). A row with no fields is a blank line; the csv writer alone would
/// emit `""` for it.
pub struct CleanedWriter<W: Write> {
    out: W,
    row: Vec<u8>,
}

impl<W: Write> CleanedWriter<W> {
    pub fn new(out: W) -> Self {
        CleanedWriter {
            out,
            row: Vec::new(),
        }
    }

    pub fn write_row(&mut self, record: &ByteRecord) -> Result<(), ReportError> {
        if record.is_empty() {
            self.out.write_all(&[LINE_TERMINATOR])?;
            return Ok(());
        }

        let mut encoder = csv::WriterBuilder::new()
            .flexible(true)
            .terminator(csv::Terminator::Any(LINE_TERMINATOR))
            .from_writer(&mut self.row);
        encoder.write_byte_record(record)?;
        encoder.flush()?;
        drop(encoder);

        self.out.write_all(&self.row)?;
        self.row.clear();
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), ReportError> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Open the cleaned-report writer, truncating any previous output.
///
/// Rows end in `\n`, not the `\r\n` that spreadsheet-oriented CSV writers
/// default to; consumers comparing against older cleaned files will see that.
pub fn cleaned_writer(path: &Path) -> Result<CleanedWriter<BufWriter<File>>, ReportError> {
    let file = File::create(path)?;
    Ok(CleanedWriter::new(BufWriter::new(file)))
}
