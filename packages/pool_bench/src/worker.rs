//! Worker side of the process pool protocol.
//!
//! The protocol is line-based: the pool writes one decimal input per line and the worker answers
//! every input with one decimal result line, in order. The worker exits when its stdin closes.

use std::io::{self, BufRead, Write};

use crate::summation;

/// Serves workload requests until `reader` reaches end of input.
///
/// Blank lines are ignored. Any line that is not an unsigned integer aborts the loop with
/// [`io::ErrorKind::InvalidData`].
pub fn serve(reader: impl BufRead, mut writer: impl Write) -> io::Result<()> {
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        let input = line.parse::<u64>().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid workload input '{line}': {e}"),
            )
        })?;

        writeln!(writer, "{}", summation(input))?;

        // The pool waits for each answer before sending more work, so it must not sit in a buffer.
        writer.flush()?;
    }

    Ok(())
}

/// Serves workload requests on the standard streams of the current process.
// Process entry logic - exercised through the integration tests that launch real workers.
#[cfg_attr(test, mutants::skip)]
pub fn serve_stdio() -> io::Result<()> {
    serve(io::stdin().lock(), io::stdout().lock())
}
