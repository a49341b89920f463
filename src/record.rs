use crate::codec::{decode_floats, encode_floats};
use crate::error::{Result, SamplingError};
use crate::sampler::PointData;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;

/// One of the three columns of a [`PointCloudRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordField {
    Positions,
    Normals,
    Colors,
}

/// Columnar store of sampled points as persisted by a host entity.
///
/// Each column is held as an encoded string (see [`crate::codec`]) and decoded on
/// first read. The decoded column is kept until that column is written again.
/// Normals and colors are either absent (empty) or hold 3 and 4 values per point.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PointCloudRecord {
    positions: String,
    normals: String,
    colors: String,
    #[serde(skip)]
    decoded_positions: OnceCell<Vec<f32>>,
    #[serde(skip)]
    decoded_normals: OnceCell<Vec<f32>>,
    #[serde(skip)]
    decoded_colors: OnceCell<Vec<f32>>,
}

fn check_len(field: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(SamplingError::ShapeMismatch { field, expected, actual });
    }
    Ok(())
}

fn decoded<'a>(cell: &'a OnceCell<Vec<f32>>, encoded: &str) -> Result<&'a [f32]> {
    if let Some(values) = cell.get() {
        return Ok(values);
    }
    let values = decode_floats(encoded)?;
    Ok(cell.get_or_init(|| values))
}

fn primed(values: &[f32]) -> OnceCell<Vec<f32>> {
    OnceCell::from(values.to_vec())
}

impl PointCloudRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from previously persisted encoded columns. Nothing is decoded yet.
    pub fn from_encoded(positions: String, normals: String, colors: String) -> Self {
        Self {
            positions,
            normals,
            colors,
            ..Self::default()
        }
    }

    /// Replaces all three columns.
    ///
    /// Fails with [`SamplingError::ShapeMismatch`] unless `positions` holds whole
    /// points, `normals` (if given) matches it in length and `colors` (if given)
    /// holds four values per point. On failure the record is left untouched.
    pub fn set_raw_data(
        &mut self,
        positions: &[f32],
        normals: Option<&[f32]>,
        colors: Option<&[f32]>,
    ) -> Result<()> {
        if positions.len() % 3 != 0 {
            return Err(SamplingError::ShapeMismatch {
                field: "positions",
                expected: positions.len() - positions.len() % 3,
                actual: positions.len(),
            });
        }
        let count = positions.len() / 3;
        if let Some(normals) = normals {
            check_len("normals", positions.len(), normals.len())?;
        }
        if let Some(colors) = colors {
            check_len("colors", count * 4, colors.len())?;
        }

        // Encode everything before assigning so a failure cannot leave a partial write.
        let normals = normals.unwrap_or(&[]);
        let colors = colors.unwrap_or(&[]);
        let encoded_positions = encode_floats(positions)?;
        let encoded_normals = encode_floats(normals)?;
        let encoded_colors = encode_floats(colors)?;

        self.positions = encoded_positions;
        self.normals = encoded_normals;
        self.colors = encoded_colors;
        self.decoded_positions = primed(positions);
        self.decoded_normals = primed(normals);
        self.decoded_colors = primed(colors);
        Ok(())
    }

    /// Replaces the record with sampler output; empty normal or color columns are stored as absent.
    pub fn set_point_data(&mut self, data: &PointData) -> Result<()> {
        let normals = (!data.normals.is_empty()).then_some(data.normals.as_slice());
        let colors = (!data.colors.is_empty()).then_some(data.colors.as_slice());
        self.set_raw_data(&data.positions, normals, colors)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn positions(&self) -> Result<&[f32]> {
        decoded(&self.decoded_positions, &self.positions)
    }

    pub fn normals(&self) -> Result<&[f32]> {
        decoded(&self.decoded_normals, &self.normals)
    }

    pub fn colors(&self) -> Result<&[f32]> {
        decoded(&self.decoded_colors, &self.colors)
    }

    pub fn point_count(&self) -> Result<usize> {
        Ok(self.positions()?.len() / 3)
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }

    /// Encoded form of one column, as stored by the host.
    pub fn encoded(&self, field: RecordField) -> &str {
        match field {
            RecordField::Positions => &self.positions,
            RecordField::Normals => &self.normals,
            RecordField::Colors => &self.colors,
        }
    }

    /// Replaces one encoded column, dropping its decoded copy. Length invariants
    /// are not checked here; call [`PointCloudRecord::validate`] when needed.
    pub fn set_encoded(&mut self, field: RecordField, encoded: String) {
        let (slot, cell) = match field {
            RecordField::Positions => (&mut self.positions, &mut self.decoded_positions),
            RecordField::Normals => (&mut self.normals, &mut self.decoded_normals),
            RecordField::Colors => (&mut self.colors, &mut self.decoded_colors),
        };
        if *slot != encoded {
            *slot = encoded;
            *cell = OnceCell::new();
        }
    }

    /// Decodes every column and checks the length invariants between them.
    pub fn validate(&self) -> Result<()> {
        let positions = self.positions()?;
        if positions.len() % 3 != 0 {
            return Err(SamplingError::ShapeMismatch {
                field: "positions",
                expected: positions.len() - positions.len() % 3,
                actual: positions.len(),
            });
        }
        let normals = self.normals()?;
        if !normals.is_empty() {
            check_len("normals", positions.len(), normals.len())?;
        }
        let colors = self.colors()?;
        if !colors.is_empty() {
            check_len("colors", positions.len() / 3 * 4, colors.len())?;
        }
        Ok(())
    }
}
