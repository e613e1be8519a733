use serde::Serialize;

use super::stats::StatParseError;

/// Disk usage of a server's data directory and the filesystem holding it, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DiskSpaceInfo {
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl DiskSpaceInfo {
    /// Share of the filesystem taken by the data directory, `0.0` for an empty filesystem.
    pub fn usage_percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.total_bytes as f64 * 100.0
    }

    /// Combines the output of `du -sb <dir>` and `df -B1 <dir>`.
    ///
    /// An unreadable `du` size counts as zero. `df` output must contain a data row with at
    /// least the size, used and available columns; the row may be wrapped onto its own
    /// line after a long filesystem name.
    ///
    /// # Errors
    ///
    /// [`StatParseError::MalformedOutput`] if the `df` output has no usable data row.
    pub fn from_command_output(du_output: &str, df_output: &str) -> Result<Self, StatParseError> {
        let used_bytes = du_output
            .split_whitespace()
            .next()
            .and_then(|size| size.parse().ok())
            .unwrap_or(0);
        let (total_bytes, available_bytes) = parse_df_output(df_output)?;

        Ok(Self {
            used_bytes,
            total_bytes,
            available_bytes,
        })
    }
}

fn parse_df_output(output: &str) -> Result<(u64, u64), StatParseError> {
    let malformed = || StatParseError::MalformedOutput {
        what: "df",
        output: output.to_string(),
    };

    // Skip the header, then glue a wrapped filesystem name to its data row.
    let rows: Vec<&str> = output.lines().skip(1).collect();
    let fields: Vec<&str> = rows.iter().flat_map(|r| r.split_whitespace()).collect();
    // Columns: Filesystem 1B-blocks Used Available Use% Mounted-on
    match fields.as_slice() {
        [_, total, _, available, ..] => Ok((
            total.parse().map_err(|_| malformed())?,
            available.parse().map_err(|_| malformed())?,
        )),
        _ => Err(malformed()),
    }
}
