//! Input decoding helpers.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. Honours a byte order mark (UTF-8, UTF-16LE, UTF-16BE)
/// 2. Otherwise tries UTF-8
/// 3. Falls back to Windows-1252 (common in old Markdown exports)
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    if let Some((encoding, _)) = encoding_rs::Encoding::for_bom(bytes) {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, malformed) = encoding_rs::UTF_8.decode(bytes);
    if !malformed {
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Read a text file, decoding it with [`decode_text`].
pub fn read_text(path: impl AsRef<Path>) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(decode_text(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_text("héllo".as_bytes()), "héllo");
    }

    #[test]
    fn test_decode_strips_bom() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFabc"), "abc");
        assert_eq!(decode_text(b"\xFF\xFEa\x00b\x00"), "ab");
    }

    #[test]
    fn test_decode_windows_1252_fallback() {
        // 0xE9 is 'é' in Windows-1252 and invalid as lone UTF-8
        assert_eq!(decode_text(b"caf\xE9"), "café");
    }

    #[test]
    fn test_read_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        fs::write(&path, b"# Title\n").unwrap();
        assert_eq!(read_text(&path).unwrap(), "# Title\n");
        assert!(read_text(dir.path().join("missing.md")).is_err());
    }
}
