// src/hash.rs

//! SHA-256 digests for source verification and file manifests.
//!
//! Digests are computed in-process (streaming, constant memory) rather than
//! by shelling out; hex output is lowercase and comparisons are
//! case-insensitive to match upstream checksum listings.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Compute the SHA-256 of a byte slice as lowercase hex
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Compute the SHA-256 of everything a reader yields
pub fn sha256_reader<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Compute the SHA-256 of a file's content
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    sha256_reader(&mut file)
}

/// Case-insensitive digest comparison
pub fn digests_match(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_bytes(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            sha256_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_reader_matches_bytes() {
        let data = b"streamed content, longer than one read call would need";
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(sha256_reader(&mut cursor).unwrap(), sha256_bytes(data));
    }

    #[test]
    fn test_digests_match_case_insensitive() {
        let digest = sha256_bytes(b"x");
        assert!(digests_match(&digest, &digest.to_uppercase()));
        assert!(!digests_match(&digest, &sha256_bytes(b"y")));
    }

    #[test]
    fn test_sha256_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data");
        std::fs::write(&path, b"hello world").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }
}
