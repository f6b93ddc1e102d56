use std::io::{self, Write};

use super::{Outcome, Report};

const LABEL_WIDTH: usize = 18;

fn render(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

/// Write the reports as aligned `operation  value` lines, one block per pid.
pub fn write_text(reports: &[Report], writer: &mut impl Write) -> io::Result<()> {
    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            writeln!(writer)?;
        }
        match (&report.error, report.ppid) {
            (Some(err), _) => {
                writeln!(writer, "pid {}: {err}", report.pid)?;
                continue;
            }
            (None, Some(ppid)) => writeln!(writer, "pid {} (ppid {ppid})", report.pid)?,
            (None, None) => writeln!(writer, "pid {}", report.pid)?,
        }

        for field in &report.fields {
            let shown = match &field.outcome {
                Outcome::Value { value } => render(value),
                Outcome::Unsupported => "unsupported".to_string(),
                Outcome::Error { message } => format!("error: {message}"),
            };
            writeln!(writer, "  {:<LABEL_WIDTH$} {shown}", field.operation)?;
        }
    }
    Ok(())
}
