//! Compression codec for config payloads
//!
//! Configs are stored as gzip streams. Records written before compression
//! was introduced hold the raw serialized config instead, so decoding
//! sniffs the gzip magic bytes first:
//!
//! - no magic: the payload is legacy raw data and passes through unchanged
//! - magic present: the payload must decode completely, otherwise it is
//!   corrupt
//!
//! Decode failures are never downgraded to a passthrough.

use std::borrow::Cow;
use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use tracing::trace;

use crate::error::CodecError;

/// First two bytes of every gzip member (RFC 1952)
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Compression level used when none is configured
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Highest valid compression level
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Result of sniffing and decoding a stored payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Gzip framing was found and the stream decoded completely
    Decoded(Vec<u8>),
    /// No gzip framing; the payload is raw legacy data
    Passthrough,
    /// Gzip framing was found but the stream is truncated or invalid
    Corrupt(String),
}

/// Compress a payload at the default level
pub fn compress(payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    compress_with_level(payload, DEFAULT_COMPRESSION_LEVEL)
}

/// Compress a payload at the given level (0-9, clamped)
pub fn compress_with_level(payload: &[u8], level: u32) -> Result<Vec<u8>, CodecError> {
    let level = Compression::new(level.min(MAX_COMPRESSION_LEVEL));
    let mut encoder = GzEncoder::new(Vec::with_capacity(payload.len() / 2 + 32), level);
    encoder
        .write_all(payload)
        .map_err(|e| CodecError::Encoding(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| CodecError::Encoding(e.to_string()))?;

    trace!(
        raw_len = payload.len(),
        compressed_len = compressed.len(),
        "Compressed payload"
    );
    Ok(compressed)
}

/// Whether the payload starts with gzip framing
pub fn is_compressed(payload: &[u8]) -> bool {
    payload.starts_with(&GZIP_MAGIC)
}

/// Sniff a payload's format and decode it
///
/// Concatenated gzip members are decoded as one stream. Bytes trailing the
/// last member that are not themselves a gzip member make the payload
/// corrupt.
pub fn sniff(payload: &[u8]) -> DecodeOutcome {
    if !is_compressed(payload) {
        return DecodeOutcome::Passthrough;
    }

    let mut decoder = MultiGzDecoder::new(payload);
    let mut decoded = Vec::with_capacity(payload.len() * 2);
    match decoder.read_to_end(&mut decoded) {
        Ok(_) => DecodeOutcome::Decoded(decoded),
        Err(e) => DecodeOutcome::Corrupt(e.to_string()),
    }
}

/// Decompress a payload, passing legacy raw payloads through unchanged
pub fn decompress(payload: &[u8]) -> Result<Cow<'_, [u8]>, CodecError> {
    match sniff(payload) {
        DecodeOutcome::Decoded(bytes) => Ok(Cow::Owned(bytes)),
        DecodeOutcome::Passthrough => {
            trace!(len = payload.len(), "Payload is not compressed, passing through");
            Ok(Cow::Borrowed(payload))
        }
        DecodeOutcome::Corrupt(reason) => Err(CodecError::Corrupt(reason)),
    }
}
