//! File helpers for exporting generated sequences.

use std::fs::{create_dir_all, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::prng::LcgParams;

const SEPARATOR: &str = "--------------------";

/// Writes `sequence` to `path` as a parameter header followed by an
/// `index<TAB>value` table with 1-based indices.
pub fn write_sequence_report(
    path: impl AsRef<Path>,
    params: &LcgParams,
    sequence: &[u64],
) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    render_sequence_report(&mut writer, params, sequence)?;
    writer.flush()
}

/// Renders the report produced by [`write_sequence_report`] into any writer.
pub fn render_sequence_report<W: Write>(
    mut writer: W,
    params: &LcgParams,
    sequence: &[u64],
) -> io::Result<()> {
    writeln!(writer, "Modulus m = {}", params.m)?;
    writeln!(writer, "Multiplier a = {}", params.a)?;
    writeln!(writer, "Increment c = {}", params.c)?;
    writeln!(writer, "Seed x0 = {}", params.x0)?;
    writeln!(writer, "{SEPARATOR}")?;
    writeln!(writer, "Count = {}", sequence.len())?;
    writeln!(writer, "{SEPARATOR}")?;
    writeln!(writer, "Index\tValue")?;
    for (index, value) in sequence.iter().enumerate() {
        writeln!(writer, "{}\t{}", index + 1, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{render_sequence_report, write_sequence_report};
    use crate::prng::LcgParams;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn test_render_layout() {
        let mut out = Vec::new();
        render_sequence_report(&mut out, &LcgParams::new(100, 13, 7, 1), &[20, 67]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Modulus m = 100");
        assert_eq!(lines[3], "Seed x0 = 1");
        assert_eq!(lines[5], "Count = 2");
        assert_eq!(lines[7], "Index\tValue");
        assert_eq!(&lines[8..], &["1\t20", "2\t67"]);
    }

    #[test]
    fn test_write_sequence_report() {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let tmp_dir = std::env::temp_dir().join(format!("crypto_labs_test_{}", unique));
        let path = tmp_dir.join("nested").join("sequence.txt");
        write_sequence_report(&path, &LcgParams::REFERENCE, &[1, 2, 3]).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("Modulus m = 67108863\n"));
        assert!(contents.ends_with("3\t3\n"));
        fs::remove_dir_all(&tmp_dir).unwrap();
    }
}
