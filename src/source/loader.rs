//! File contents loading with a per-file size cap.

use std::io::Read;
use std::path::Path;

/// Read buffer size; bounds peak memory for large files.
const CHUNK_SIZE: usize = 1024 * 1024;

/// Human readable binary size, e.g. `1.5 MiB`.
pub fn format_size(bytes: u64) -> String {
    let adjusted =
        byte_unit::Byte::from_u64(bytes).get_appropriate_unit(byte_unit::UnitType::Binary);
    format!("{adjusted:.1}")
}

/// Load a file as text.
///
/// Never fails: files over `max_size_bytes` and unreadable files come back as a short
/// placeholder explaining why their contents are missing. Invalid UTF-8 is replaced
/// rather than rejected.
pub fn load(path: &Path, max_size_bytes: u64) -> String {
    let size = match std::fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            log::warn!("Failed to read {}: {e}", path.display());
            return unreadable_placeholder(&e);
        }
    };

    if size > max_size_bytes {
        log::info!(
            "Skipping contents of {} ({} exceeds {})",
            path.display(),
            format_size(size),
            format_size(max_size_bytes)
        );
        return oversize_placeholder(size, max_size_bytes);
    }

    match read_chunked(path, size) {
        Ok(contents) => contents,
        Err(e) => {
            log::warn!("Failed to read {}: {e}", path.display());
            unreadable_placeholder(&e)
        }
    }
}

fn read_chunked(path: &Path, size_hint: u64) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut contents: Vec<u8> = Vec::with_capacity(size_hint as usize);
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        match file.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => contents.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    // decode once at the end so multi-byte sequences split across chunks survive
    Ok(match String::from_utf8(contents) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

pub fn oversize_placeholder(size: u64, max_size_bytes: u64) -> String {
    format!(
        "// This file was skipped because it exceeds the size limit.\n// File size: {}\n// Maximum allowed size: {}",
        format_size(size),
        format_size(max_size_bytes)
    )
}

fn unreadable_placeholder(error: &std::io::Error) -> String {
    format!("// This file could not be read: {error}")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn loads_small_files_verbatim() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let path = dir.path().join("a.py");
        std::fs::write(&path, "print(\"hi\")\n# comment\n").expect("can write");
        assert_eq!(load(&path, 1_000_000), "print(\"hi\")\n# comment\n");
    }

    #[test]
    fn oversized_files_become_placeholders() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let path = dir.path().join("big.txt");
        std::fs::write(&path, "x".repeat(2 * 1024 * 1024)).expect("can write");

        let contents = load(&path, 1_000_000);
        assert_eq!(contents, oversize_placeholder(2 * 1024 * 1024, 1_000_000));
        assert!(contents.contains("MiB"));
        assert!(contents.contains("KiB"));
        assert!(!contents.contains("xxxx"));
    }

    #[test]
    fn reads_across_chunk_boundaries() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let path = dir.path().join("wide.txt");
        // put a multi-byte character right on the chunk boundary
        let mut text = "a".repeat(CHUNK_SIZE - 1);
        text.push('é');
        text.push_str("tail");
        std::fs::write(&path, &text).expect("can write");
        assert_eq!(load(&path, u64::MAX), text);
    }

    #[test]
    fn missing_files_become_placeholders() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let contents = load(&dir.path().join("gone.rs"), 1_000_000);
        assert!(contents.starts_with("// This file could not be read:"));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let path = dir.path().join("latin1.txt");
        std::fs::write(&path, b"caf\xe9\n").expect("can write");
        assert_eq!(load(&path, 1_000_000), "caf\u{fffd}\n");
    }
}
