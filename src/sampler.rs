//! Incremental point sampling over a mesh snapshot.
//!
//! A [`Sampler`] is created from a mesh and a [`SamplingConfig`] and then driven by
//! repeated calls to [`Sampler::step`]. Each step does a bounded amount of work
//! (`chunk_size` candidates) and returns control to the host, which may cancel the
//! run between steps. The mesh is copied at construction, so edits made to it while
//! a run is in flight are never observed.
//!
//! Every random draw of a run comes from one `StdRng` seeded from the configured
//! seed, so the same mesh, count, seed and strategy always give the same points.

use crate::bvh::Bvh;
use crate::classifier::{Containment, RayParity};
use crate::config::{SamplingConfig, Strategy, VolumePlacement};
use crate::error::{Result, SamplingError};
use crate::geometry::{random_point_in_cube, random_point_on_polygon};
use crate::mesh::Mesh;
use crate::run::RunTicket;
use rand::prelude::*;
use rand::rngs::StdRng;

/// Scale applied to the mesh halfwidth to get the volume candidate cube.
pub const VOLUME_PADDING: f64 = 1.1;

/// Sampled points as flat columns: 3 position, 3 normal and 4 color values per point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointData {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub colors: Vec<f32>,
}

impl PointData {
    pub fn with_capacity(points: usize) -> Self {
        Self {
            positions: Vec::with_capacity(points * 3),
            normals: Vec::with_capacity(points * 3),
            colors: Vec::with_capacity(points * 4),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn push(&mut self, position: &[f64; 3], normal: &[f64; 3], color: &[f64; 4]) {
        self.positions.extend(position.iter().map(|&v| v as f32));
        self.normals.extend(normal.iter().map(|&v| v as f32));
        self.colors.extend(color.iter().map(|&v| v as f32));
    }

    pub fn position(&self, index: usize) -> [f32; 3] {
        let p = &self.positions[index * 3..index * 3 + 3];
        [p[0], p[1], p[2]]
    }

    fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.colors.clear();
    }
}

/// Per-axis `|coordinate| / halfwidth` with full alpha, a visual aid only.
pub fn diagnostic_color(point: &[f64; 3], halfwidth: f64) -> [f64; 4] {
    if !(halfwidth > 0.0) {
        return [0.0, 0.0, 0.0, 1.0];
    }
    [
        point[0].abs() / halfwidth,
        point[1].abs() / halfwidth,
        point[2].abs() / halfwidth,
        1.0,
    ]
}

fn report_degenerate(face: usize) {
    let err = SamplingError::DegenerateGeometry { face };
    tracing::error!(face, "{}", err);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplerState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Incomplete,
}

/// Outcome of one [`Sampler::step`].
#[derive(Debug, PartialEq)]
pub enum Step<'a> {
    /// More work remains; the data holds everything accepted so far.
    Partial(&'a PointData),
    /// The run finished with exactly the requested number of points.
    Done(&'a PointData),
    /// The run was cancelled or superseded; nothing may be committed.
    Cancelled,
    /// The attempt cap ran out before the target was met.
    Incomplete(&'a PointData),
}

#[derive(Debug)]
struct FaceSnapshot {
    vertices: Vec<[f64; 3]>,
    normal: [f64; 3],
    area: f64,
}

/// Sweeps the faces in order, consuming a sorted list of area targets.
#[derive(Debug)]
struct SurfaceJob {
    faces: Vec<FaceSnapshot>,
    targets: Vec<f64>,
    next_target: usize,
    face: usize,
    // Cumulative area of the faces before `face`.
    face_start: f64,
    last_positive: usize,
}

#[derive(Debug)]
struct VolumeJob {
    bvh: Bvh,
    containment: Box<dyn Containment>,
    cube_halfwidth: f64,
    attempts: u64,
}

#[derive(Debug)]
struct FaceCenterJob {
    centers: Vec<([f64; 3], [f64; 3])>,
    next: usize,
}

#[derive(Debug)]
enum Job {
    Surface(SurfaceJob),
    Volume(VolumeJob),
    FaceCenters(FaceCenterJob),
}

impl SurfaceJob {
    fn new(mesh: &Mesh, count: usize, rng: &mut StdRng) -> Result<Self> {
        let mut faces = Vec::with_capacity(mesh.face_count());
        let mut total = 0.0;
        let mut last_positive = None;
        for i in 0..mesh.face_count() {
            let area = mesh.face_area(i);
            if area > 0.0 {
                total += area;
                last_positive = Some(i);
            } else {
                report_degenerate(i);
            }
            faces.push(FaceSnapshot {
                vertices: mesh.face_vertices(i),
                normal: mesh.face_normal(i),
                area,
            });
        }
        let Some(last_positive) = last_positive else {
            return Err(SamplingError::EmptyMesh);
        };

        let mut targets: Vec<f64> = (0..count).map(|_| rng.gen_range(0.0..total)).collect();
        targets.sort_unstable_by(f64::total_cmp);

        Ok(Self {
            faces,
            targets,
            next_target: 0,
            face: 0,
            face_start: 0.0,
            last_positive,
        })
    }

    fn advance(&mut self, rng: &mut StdRng, data: &mut PointData, halfwidth: f64, budget: usize) {
        let mut produced = 0;
        while produced < budget && self.next_target < self.targets.len() {
            let target = self.targets[self.next_target];

            // Move to the face whose cumulative range holds the target. Rounding may
            // leave the target past the final sum, in which case the last face with
            // area takes it.
            while self.face < self.last_positive {
                let area = self.faces[self.face].area;
                if area > 0.0 && target < self.face_start + area {
                    break;
                }
                self.face_start += area;
                self.face += 1;
            }

            let face = &self.faces[self.face];
            let position = random_point_on_polygon(&face.vertices, rng).unwrap_or_else(|| {
                report_degenerate(self.face);
                face.vertices[0]
            });
            data.push(&position, &face.normal, &diagnostic_color(&position, halfwidth));

            self.next_target += 1;
            produced += 1;
        }
    }

    fn finished(&self) -> bool {
        self.next_target == self.targets.len()
    }
}

impl VolumeJob {
    fn advance(
        &mut self,
        rng: &mut StdRng,
        data: &mut PointData,
        config: &SamplingConfig,
        halfwidth: f64,
    ) {
        for _ in 0..config.chunk_size {
            if data.len() >= config.count || self.exhausted(config.max_attempts) {
                break;
            }
            self.attempts += 1;
            let candidate = random_point_in_cube(self.cube_halfwidth, rng);
            let Some(crossing) = self.containment.classify(&self.bvh, candidate) else {
                continue;
            };
            let position = match config.placement {
                VolumePlacement::Interior => candidate,
                VolumePlacement::ExitSurface => crossing.point,
            };
            data.push(&position, &crossing.normal, &diagnostic_color(&position, halfwidth));
        }
    }

    fn exhausted(&self, max_attempts: Option<u64>) -> bool {
        max_attempts.is_some_and(|max| self.attempts >= max)
    }
}

impl FaceCenterJob {
    fn new(mesh: &Mesh) -> Result<Self> {
        let centers: Vec<_> = (0..mesh.face_count())
            .filter(|&i| {
                let keep = mesh.face_area(i) > 0.0;
                if !keep {
                    report_degenerate(i);
                }
                keep
            })
            .map(|i| (mesh.face_center(i), mesh.face_normal(i)))
            .collect();
        if centers.is_empty() {
            return Err(SamplingError::EmptyMesh);
        }
        Ok(Self { centers, next: 0 })
    }

    fn advance(&mut self, data: &mut PointData, halfwidth: f64, budget: usize) {
        let end = (self.next + budget).min(self.centers.len());
        for (center, normal) in &self.centers[self.next..end] {
            data.push(center, normal, &diagnostic_color(center, halfwidth));
        }
        self.next = end;
    }

    fn finished(&self) -> bool {
        self.next == self.centers.len()
    }
}

/// Resumable sampling run over a snapshot of one mesh.
#[derive(Debug)]
pub struct Sampler {
    config: SamplingConfig,
    state: SamplerState,
    job: Job,
    data: PointData,
    rng: StdRng,
    halfwidth: f64,
    target: usize,
    ticket: Option<RunTicket>,
    cancel_requested: bool,
}

impl Sampler {
    /// Prepares a run. Surface targets are drawn and sorted here; no points are produced yet.
    ///
    /// Fails with [`SamplingError::InvalidConfig`] for a bad configuration and with
    /// [`SamplingError::EmptyMesh`] when the mesh has no area (surface, face centers)
    /// or no triangles (volume).
    pub fn new(mesh: &Mesh, config: SamplingConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.rng_seed());
        let halfwidth = mesh.bounding_halfwidth();

        let job = match config.strategy {
            Strategy::Surface => Job::Surface(SurfaceJob::new(mesh, config.count, &mut rng)?),
            Strategy::Volume => {
                let bvh = Bvh::from_mesh(mesh);
                if bvh.is_empty() {
                    return Err(SamplingError::EmptyMesh);
                }
                let reference = mesh.bounding_box().center();
                Job::Volume(VolumeJob {
                    bvh,
                    containment: Box::new(RayParity::new(reference)),
                    cube_halfwidth: halfwidth * VOLUME_PADDING,
                    attempts: 0,
                })
            }
            Strategy::FaceCenters => Job::FaceCenters(FaceCenterJob::new(mesh)?),
        };
        let target = match &job {
            Job::FaceCenters(job) => job.centers.len(),
            _ => config.count,
        };

        Ok(Self {
            data: PointData::with_capacity(target),
            config,
            state: SamplerState::Idle,
            job,
            rng,
            halfwidth,
            target,
            ticket: None,
            cancel_requested: false,
        })
    }

    /// Ties the run to a ticket; once the ticket is superseded the next step cancels.
    pub fn with_ticket(mut self, ticket: RunTicket) -> Self {
        self.ticket = Some(ticket);
        self
    }

    /// Replaces the inside/outside test used by volume sampling.
    pub fn with_containment(mut self, containment: Box<dyn Containment>) -> Self {
        self.set_containment(containment);
        self
    }

    /// Has no effect on surface and face-center runs.
    pub fn set_containment(&mut self, containment: Box<dyn Containment>) {
        if let Job::Volume(job) = &mut self.job {
            job.containment = containment;
        }
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    /// Points accepted so far.
    pub fn data(&self) -> &PointData {
        &self.data
    }

    /// Number of points the run will produce when it completes.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Volume candidates drawn so far; zero for other strategies.
    pub fn attempts(&self) -> u64 {
        match &self.job {
            Job::Volume(job) => job.attempts,
            _ => 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            SamplerState::Completed | SamplerState::Cancelled | SamplerState::Incomplete
        )
    }

    /// Requests cancellation; it takes effect at the next step.
    pub fn cancel(&mut self) {
        self.cancel_requested = true;
    }

    /// Performs one chunk of work.
    ///
    /// Cancellation and supersession are checked before the chunk starts. Finished
    /// samplers keep returning their final outcome.
    pub fn step(&mut self) -> Step<'_> {
        match self.state {
            SamplerState::Completed => return Step::Done(&self.data),
            SamplerState::Incomplete => return Step::Incomplete(&self.data),
            SamplerState::Cancelled => return Step::Cancelled,
            SamplerState::Idle | SamplerState::Running => {}
        }

        let superseded = self.ticket.as_ref().is_some_and(RunTicket::is_superseded);
        if self.cancel_requested || superseded {
            if superseded {
                tracing::warn!(accepted = self.data.len(), "sampling run superseded by a newer run");
            } else {
                tracing::warn!(accepted = self.data.len(), "sampling run cancelled");
            }
            self.data.clear();
            self.state = SamplerState::Cancelled;
            return Step::Cancelled;
        }
        self.state = SamplerState::Running;

        let chunk = self.config.chunk_size;
        let finished = match &mut self.job {
            Job::Surface(job) => {
                job.advance(&mut self.rng, &mut self.data, self.halfwidth, chunk);
                job.finished()
            }
            Job::Volume(job) => {
                job.advance(&mut self.rng, &mut self.data, &self.config, self.halfwidth);
                if job.exhausted(self.config.max_attempts) && self.data.len() < self.target {
                    tracing::warn!(
                        accepted = self.data.len(),
                        target = self.target,
                        attempts = job.attempts,
                        "volume sampling ran out of attempts"
                    );
                    self.state = SamplerState::Incomplete;
                    return Step::Incomplete(&self.data);
                }
                self.data.len() >= self.target
            }
            Job::FaceCenters(job) => {
                job.advance(&mut self.data, self.halfwidth, chunk);
                job.finished()
            }
        };
        tracing::debug!(accepted = self.data.len(), target = self.target, "sampler chunk");

        if finished {
            self.state = SamplerState::Completed;
            tracing::info!(
                points = self.data.len(),
                strategy = ?self.config.strategy,
                seed = self.config.seed,
                "sampling completed"
            );
            Step::Done(&self.data)
        } else {
            Step::Partial(&self.data)
        }
    }

    /// Steps until the run settles, mapping cancellation and exhaustion to errors.
    pub fn run_to_end(&mut self) -> Result<PointData> {
        loop {
            match self.step() {
                Step::Partial(_) => {}
                Step::Done(data) => return Ok(data.clone()),
                Step::Cancelled => return Err(SamplingError::Cancelled),
                Step::Incomplete(data) => {
                    let accepted = data.len();
                    return Err(SamplingError::Incomplete {
                        accepted,
                        target: self.target,
                        attempts: self.attempts(),
                    });
                }
            }
        }
    }
}

/// Samples `mesh` in one call.
pub fn sample(mesh: &Mesh, config: SamplingConfig) -> Result<PointData> {
    Sampler::new(mesh, config)?.run_to_end()
}
