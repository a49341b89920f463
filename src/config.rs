use crate::error::{Result, SamplingError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Point count used when a host has not chosen one.
pub const DEFAULT_POINT_COUNT: usize = 1024;
/// Lower end of the point count range offered to users.
pub const MIN_POINT_COUNT: usize = 128;
/// Largest point count a run accepts.
pub const MAX_POINT_COUNT: usize = 65536;
/// Granularity of the point count offered to users.
pub const POINT_COUNT_STEP: usize = 64;
/// Candidate points processed per sampler step.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// How sample points are distributed over the mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Area-weighted points on the surface.
    #[default]
    Surface,
    /// Points filling the enclosed volume.
    Volume,
    /// One point at the center of every face.
    FaceCenters,
}

impl FromStr for Strategy {
    type Err = SamplingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "surface" => Ok(Strategy::Surface),
            "volume" => Ok(Strategy::Volume),
            "face_centers" => Ok(Strategy::FaceCenters),
            other => Err(SamplingError::InvalidConfig(format!("unknown strategy '{}'", other))),
        }
    }
}

/// Which position a volume sample records once its candidate is found inside.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumePlacement {
    /// The interior candidate itself, paired with the normal where its ray leaves the mesh.
    #[default]
    Interior,
    /// The point where the candidate's ray leaves the mesh.
    ExitSurface,
}

/// Parameters of one sampling run. Any change invalidates a previously generated record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub count: usize,
    pub seed: i32,
    pub strategy: Strategy,
    pub chunk_size: usize,
    /// Volume runs stop as incomplete after this many candidates. `None` never gives up.
    pub max_attempts: Option<u64>,
    pub placement: VolumePlacement,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_POINT_COUNT,
            seed: 0,
            strategy: Strategy::Surface,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_attempts: None,
            placement: VolumePlacement::Interior,
        }
    }
}

impl SamplingConfig {
    pub fn new(count: usize, seed: i32, strategy: Strategy) -> Self {
        Self {
            count,
            seed,
            strategy,
            ..Self::default()
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_placement(mut self, placement: VolumePlacement) -> Self {
        self.placement = placement;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.count == 0 || self.count > MAX_POINT_COUNT {
            return Err(SamplingError::InvalidConfig(format!(
                "point count {} outside 1..={}",
                self.count, MAX_POINT_COUNT
            )));
        }
        if self.chunk_size == 0 {
            return Err(SamplingError::InvalidConfig("chunk size must be positive".into()));
        }
        Ok(())
    }

    /// The count clamped to the user-facing range and rounded to the nearest step.
    pub fn snapped_count(&self) -> usize {
        let clamped = self.count.clamp(MIN_POINT_COUNT, MAX_POINT_COUNT);
        let snapped = (clamped + POINT_COUNT_STEP / 2) / POINT_COUNT_STEP * POINT_COUNT_STEP;
        snapped.clamp(MIN_POINT_COUNT, MAX_POINT_COUNT)
    }

    /// Seed for the random number generator: the signed seed's bits, widened.
    pub fn rng_seed(&self) -> u64 {
        u64::from(self.seed as u32)
    }
}
