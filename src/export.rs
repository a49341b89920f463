//! Fixed-layout binary export of a point cloud.
//!
//! ```text
//! u32 LE   size in bytes of the records that follow
//! N x      f32 LE x, y, z
//!          u8 r, g, b, 0
//! ```
//!
//! The size field is written as 0 first and patched once every record is out, so a
//! file with a 0 header and trailing bytes is an interrupted export, not an empty one.

use crate::error::{Result, SamplingError};
use crate::record::PointCloudRecord;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Bytes per exported point: three f32 coordinates, three color bytes and one pad byte.
pub const RECORD_SIZE: usize = 16;

/// Color written for every point when the source has no color column.
pub const DEFAULT_COLOR: [u8; 3] = [255, 255, 255];

/// Maps a normalized channel to a byte; out-of-range values saturate.
pub fn color_to_u8(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Streams `positions` (and `colors`, when non-empty) to `writer` and returns the
/// size of the record section written into the header.
pub fn write_points<W: Write + Seek>(writer: &mut W, positions: &[f32], colors: &[f32]) -> Result<u32> {
    if positions.len() % 3 != 0 {
        return Err(SamplingError::ShapeMismatch {
            field: "positions",
            expected: positions.len() - positions.len() % 3,
            actual: positions.len(),
        });
    }
    let count = positions.len() / 3;
    if !colors.is_empty() && colors.len() != count * 4 {
        return Err(SamplingError::ShapeMismatch {
            field: "colors",
            expected: count * 4,
            actual: colors.len(),
        });
    }
    let size = u32::try_from(count * RECORD_SIZE).map_err(|_| {
        SamplingError::InvalidConfig(format!("{} points do not fit the export header", count))
    })?;

    let header_at = writer.stream_position()?;
    writer.write_u32::<LittleEndian>(0)?;
    for i in 0..count {
        for &v in &positions[i * 3..i * 3 + 3] {
            writer.write_f32::<LittleEndian>(v)?;
        }
        let rgb = match colors.get(i * 4..i * 4 + 3) {
            Some(c) => [color_to_u8(c[0]), color_to_u8(c[1]), color_to_u8(c[2])],
            None => DEFAULT_COLOR,
        };
        writer.write_all(&rgb)?;
        writer.write_u8(0)?;
    }

    writer.seek(SeekFrom::Start(header_at))?;
    writer.write_u32::<LittleEndian>(size)?;
    writer.seek(SeekFrom::Start(header_at + 4 + u64::from(size)))?;
    Ok(size)
}

/// Writes the record's points to a new file at `path`.
pub fn export_record<P: AsRef<Path>>(record: &PointCloudRecord, path: P) -> Result<u32> {
    let path = path.as_ref();
    let positions = record.positions()?;
    let colors = record.colors()?;

    let mut writer = BufWriter::new(File::create(path)?);
    let size = write_points(&mut writer, positions, colors)?;
    writer.flush()?;

    tracing::info!(path = %path.display(), points = positions.len() / 3, bytes = size, "point cloud exported");
    Ok(size)
}

/// Header of an export file as read back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportHeader {
    /// The writer finished and recorded this many record bytes.
    Complete(u32),
    /// The header was never patched; the trailing records may be truncated.
    Incomplete,
}

/// Points read back from an export file.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportedPoints {
    pub header: ExportHeader,
    pub positions: Vec<f32>,
    /// Three bytes per point.
    pub colors: Vec<u8>,
}

impl ExportedPoints {
    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Reads an export stream. Only whole records are returned for an incomplete file.
pub fn read_points<R: Read>(reader: &mut R) -> Result<ExportedPoints> {
    let declared = reader.read_u32::<LittleEndian>()?;
    let mut body = Vec::new();
    reader.read_to_end(&mut body)?;

    let header = match declared {
        0 if !body.is_empty() => ExportHeader::Incomplete,
        size => {
            if size as usize != body.len() {
                return Err(SamplingError::Decode(format!(
                    "header declares {} record bytes, found {}",
                    size,
                    body.len()
                )));
            }
            ExportHeader::Complete(size)
        }
    };
    if header != ExportHeader::Incomplete && body.len() % RECORD_SIZE != 0 {
        return Err(SamplingError::Decode(format!(
            "{} record bytes is not a whole number of records",
            body.len()
        )));
    }

    let count = body.len() / RECORD_SIZE;
    let mut positions = Vec::with_capacity(count * 3);
    let mut colors = Vec::with_capacity(count * 3);
    for mut record in body.chunks_exact(RECORD_SIZE) {
        for _ in 0..3 {
            positions.push(record.read_f32::<LittleEndian>()?);
        }
        colors.extend_from_slice(&record[..3]);
    }
    Ok(ExportedPoints { header, positions, colors })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_color_conversion() {
        assert_eq!(color_to_u8(0.0), 0);
        assert_eq!(color_to_u8(1.0), 255);
        assert_eq!(color_to_u8(0.5), 128);
        assert_eq!(color_to_u8(-0.2), 0);
        assert_eq!(color_to_u8(3.0), 255);
    }

    #[test]
    fn test_layout() {
        let mut out = Cursor::new(Vec::new());
        let size = write_points(&mut out, &[1.0, 2.0, 3.0], &[1.0, 0.0, 0.5, 0.25]).unwrap();
        assert_eq!(size, 16);

        let bytes = out.into_inner();
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[0..4], &16u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[12..16], &3.0f32.to_le_bytes());
        assert_eq!(&bytes[16..20], &[255, 0, 128, 0]);
    }

    #[test]
    fn test_missing_colors_are_white() {
        let mut out = Cursor::new(Vec::new());
        write_points(&mut out, &[0.0; 6], &[]).unwrap();
        let points = read_points(&mut Cursor::new(out.into_inner())).unwrap();
        assert_eq!(points.header, ExportHeader::Complete(32));
        assert_eq!(points.colors, vec![255; 6]);
    }

    #[test]
    fn test_mismatched_colors_are_rejected() {
        let mut out = Cursor::new(Vec::new());
        let err = write_points(&mut out, &[0.0; 6], &[1.0; 4]).unwrap_err();
        assert!(matches!(err, SamplingError::ShapeMismatch { field: "colors", expected: 8, actual: 4 }));
    }

    #[test]
    fn test_unpatched_header_reads_as_incomplete() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
        bytes.extend_from_slice(&2.5f32.to_le_bytes());
        bytes.extend_from_slice(&3.5f32.to_le_bytes());
        bytes.extend_from_slice(&[1, 2, 3, 0]);
        bytes.extend_from_slice(&[9, 9]); // torn second record

        let points = read_points(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(points.header, ExportHeader::Incomplete);
        assert_eq!(points.positions, vec![1.5, 2.5, 3.5]);
        assert_eq!(points.colors, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_export() {
        let mut out = Cursor::new(Vec::new());
        assert_eq!(write_points(&mut out, &[], &[]).unwrap(), 0);
        let points = read_points(&mut Cursor::new(out.into_inner())).unwrap();
        assert_eq!(points.header, ExportHeader::Complete(0));
        assert!(points.is_empty());
    }

    #[test]
    fn test_header_mismatch_is_reported() {
        let mut bytes = 32u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0; 16]);
        assert!(matches!(read_points(&mut Cursor::new(bytes)), Err(SamplingError::Decode(_))));
    }
}
