//! Row serialization for the output sink.

use std::io::Write;

use crate::Result;

/// Write one output record: the timestamp, then one value per channel, each
/// field with six decimal places and a trailing comma, newline-terminated.
/// The comma after the last value is part of the record format.
pub fn write_row(sink: &mut impl Write, timestamp: f64, values: &[f64]) -> Result<()> {
    write!(sink, "{:.6},", timestamp)?;
    for &value in values {
        write!(sink, "{:.6},", value)?;
    }
    writeln!(sink)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_row_format() {
        let mut sink = Vec::new();
        write_row(&mut sink, 0.001, &[0.5, -0.25]).unwrap();
        assert_eq!(sink, b"0.001000,0.500000,-0.250000,\n");
    }

    #[test]
    fn test_no_channels_still_emits_timestamp() {
        let mut sink = Vec::new();
        write_row(&mut sink, 2.5, &[]).unwrap();
        assert_eq!(sink, b"2.500000,\n");
    }
}
