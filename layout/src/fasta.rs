//! Single-record FASTA files: a `>` header line followed by one or more
//! sequence lines.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Read a FASTA file and return its sequence with header lines and line breaks removed.
pub fn read_sequence<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let text = fs::read_to_string(path)?;
    Ok(sequence_from_text(&text))
}

/// Strip header lines from FASTA `text` and join the remaining lines.
pub fn sequence_from_text(text: &str) -> String {
    let mut seq = String::with_capacity(text.len());
    for line in text.lines().filter(|line| !line.starts_with('>')) {
        seq.push_str(line.trim());
    }
    seq
}

/// Write one record. `description`, if any, follows the id on the header line,
/// so tools that key on the first header word still see just the id.
pub fn write_record<W: Write>(
    out: &mut W,
    id: &str,
    description: Option<&str>,
    seq: &str,
) -> io::Result<()> {
    match description {
        Some(desc) => writeln!(out, ">{id} {desc}")?,
        None => writeln!(out, ">{id}")?,
    }
    writeln!(out, "{seq}")
}
