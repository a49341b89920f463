//! Text-safe encoding of float sequences.
//!
//! A sequence is written as little-endian `f32` bytes, compressed with zlib-framed
//! deflate and then base64 encoded with the standard alphabet. The empty sequence
//! and the empty string map to each other.

use crate::error::{Result, SamplingError};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};

/// Encodes `values` into a compressed, ASCII-safe string.
pub fn encode_floats(values: &[f32]) -> Result<String> {
    if values.is_empty() {
        return Ok(String::new());
    }
    let mut raw = Vec::with_capacity(values.len() * 4);
    for &v in values {
        raw.write_f32::<LittleEndian>(v)?;
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw)?;
    let compressed = encoder.finish()?;
    Ok(BASE64.encode(compressed))
}

/// Decodes a string produced by [`encode_floats`].
pub fn decode_floats(encoded: &str) -> Result<Vec<f32>> {
    if encoded.is_empty() {
        return Ok(Vec::new());
    }
    let compressed = BASE64.decode(encoded)?;
    let mut raw = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .read_to_end(&mut raw)
        .map_err(|e| SamplingError::Decode(format!("inflate failed: {}", e)))?;
    if raw.len() % 4 != 0 {
        return Err(SamplingError::Decode(format!(
            "{} bytes is not a whole number of floats",
            raw.len()
        )));
    }
    let mut values = vec![0.0f32; raw.len() / 4];
    LittleEndian::read_f32_into(&raw, &mut values);
    Ok(values)
}
