//! Read access to DETECT containers.
//!
//! A DETECT file is a tree of groups holding one-dimensional variables.
//! Groups are addressed by their slash-separated path from the root
//! (`"Info"`, `"SWOTDB/10"`).

pub mod memory;
pub mod nc_file;

pub use memory::{Column, MemorySource};
pub use nc_file::NcSource;

use crate::error::Result;

pub trait DetectSource {
    /// Human readable origin, used in log lines
    fn describe(&self) -> String;

    fn has_group(&self, path: &str) -> Result<bool>;

    /// Names of the direct child groups, in file order
    fn subgroups(&self, path: &str) -> Result<Vec<String>>;

    /// Names of the variables in a group, in declaration order
    fn variables(&self, path: &str) -> Result<Vec<String>>;

    fn read_f64(&self, path: &str, variable: &str) -> Result<Vec<f64>>;

    /// Integer view of a variable, one result per entry. Floating point
    /// values are truncated toward zero; a non-finite entry fails on its own.
    fn read_i64(&self, path: &str, variable: &str) -> Result<Vec<Result<i64>>>;

    /// Text view of a variable. Byte strings are decoded as UTF-8 and
    /// numeric entries are rendered as text.
    fn read_text(&self, path: &str, variable: &str) -> Result<Vec<Option<String>>>;
}

/// Join a parent group path and a child name
pub fn child_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{}/{}", parent, child)
    }
}

/// Decode a raw byte string, dropping NUL and space padding
pub(crate) fn decode_bytes(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\0', ' '])
        .to_string()
}

/// Truncating float-to-integer conversion, refusing NaN and infinities
pub(crate) fn truncate_to_i64(value: f64, variable: &str) -> Result<i64> {
    if !value.is_finite() {
        return Err(crate::error::AppError::InvalidData(format!(
            "Variable '{}' holds non-finite value {} where an integer is expected",
            variable, value
        )));
    }
    Ok(value.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_path() {
        assert_eq!(child_path("", "Info"), "Info");
        assert_eq!(child_path("SWOTDB", "10"), "SWOTDB/10");
    }

    #[test]
    fn test_decode_bytes_trims_padding() {
        assert_eq!(decode_bytes(b"Rhine\0\0\0"), "Rhine");
        assert_eq!(decode_bytes(b"Elbe   "), "Elbe");
        assert_eq!(decode_bytes("Dön".as_bytes()), "Dön");
    }

    #[test]
    fn test_truncate_to_i64() {
        assert_eq!(truncate_to_i64(12.9, "node_id").unwrap(), 12);
        assert_eq!(truncate_to_i64(-3.7, "node_id").unwrap(), -3);
        assert!(truncate_to_i64(f64::NAN, "node_id").is_err());
    }
}
