use crate::error::PackageError;

use super::PackageKind;

pub const MAGIC: [u8; 4] = *b"MPAK";
pub const VERSION: u32 = 1;
pub const HEADER_LEN: usize = 24;

/// Decoded package header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u32,
    pub kind: u32,
    pub checksum: u32,
    pub length: u64,
}

impl Header {
    /// Read and validate the header of `bytes`, checking magic, version, kind,
    /// payload length and checksum in that order.
    pub fn validate(bytes: &[u8], expected: PackageKind) -> Result<Header, PackageError> {
        if bytes.len() < HEADER_LEN {
            return Err(PackageError::Truncated(bytes.len()));
        }

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        if magic != MAGIC {
            return Err(PackageError::BadMagic(magic));
        }

        let header = Header {
            version: read_u32(bytes, 4),
            kind: read_u32(bytes, 8),
            checksum: read_u32(bytes, 12),
            length: read_u64(bytes, 16),
        };

        if header.version != VERSION {
            return Err(PackageError::UnsupportedVersion {
                found: header.version,
                expected: VERSION,
            });
        }
        if header.kind != expected.to_raw() {
            return Err(PackageError::WrongKind {
                expected,
                found: header.kind,
            });
        }

        let payload = &bytes[HEADER_LEN..];
        if header.length != payload.len() as u64 {
            return Err(PackageError::LengthMismatch {
                declared: header.length,
                actual: payload.len() as u64,
            });
        }

        let computed = crc32fast::hash(payload);
        if computed != header.checksum {
            return Err(PackageError::ChecksumMismatch {
                stored: header.checksum,
                computed,
            });
        }

        Ok(header)
    }
}

/// Fill in the header of `out`, whose first [`HEADER_LEN`] bytes are reserved.
pub(super) fn seal(mut out: Vec<u8>, kind: PackageKind) -> Vec<u8> {
    let payload = &out[HEADER_LEN..];
    let checksum = crc32fast::hash(payload);
    let length = payload.len() as u64;

    out[0..4].copy_from_slice(&MAGIC);
    out[4..8].copy_from_slice(&VERSION.to_le_bytes());
    out[8..12].copy_from_slice(&kind.to_raw().to_le_bytes());
    out[12..16].copy_from_slice(&checksum.to_le_bytes());
    out[16..24].copy_from_slice(&length.to_le_bytes());
    out
}

/// Little-endian u32 at `at`. Callers bounds-check first.
pub(super) fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(raw)
}

/// Little-endian u64 at `at`. Callers bounds-check first.
pub(super) fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(raw)
}
