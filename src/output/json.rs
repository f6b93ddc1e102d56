use std::io::{self, Write};

use super::Report;

/// Write the reports as a pretty-printed JSON array.
pub fn write_json(reports: &[Report], writer: &mut impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, reports).map_err(io::Error::other)?;
    writeln!(writer)
}
