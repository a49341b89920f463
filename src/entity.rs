use crate::config::SamplingConfig;
use crate::error::Result;
use crate::mesh::Mesh;
use crate::record::PointCloudRecord;
use crate::run::RunSlot;
use crate::sampler::{Sampler, Step};

/// What a [`PointCloudEntity::tick`] observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickStatus {
    /// No run is active.
    Idle,
    Running { accepted: usize, target: usize },
    /// The run finished and its points replaced the record.
    Committed { points: usize },
    Cancelled,
    /// The run gave up early; the record keeps its previous contents.
    Incomplete { accepted: usize, target: usize },
}

/// A host object owning a sampling configuration, its persisted record and at most
/// one active run.
///
/// Starting a run while another is active supersedes the older one, which never
/// commits. The record only ever holds the output of a completed run.
#[derive(Debug, Default)]
pub struct PointCloudEntity {
    config: SamplingConfig,
    record: PointCloudRecord,
    slot: RunSlot,
    active: Option<Sampler>,
}

impl PointCloudEntity {
    pub fn new(config: SamplingConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Restores an entity from a persisted configuration and record.
    pub fn from_parts(config: SamplingConfig, record: PointCloudRecord) -> Self {
        Self {
            config,
            record,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    pub fn record(&self) -> &PointCloudRecord {
        &self.record
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Starts sampling `mesh` with the current configuration, superseding any active run.
    /// On error the active run and the record are left untouched.
    pub fn request_sampling(&mut self, mesh: &Mesh) -> Result<()> {
        let sampler = Sampler::new(mesh, self.config.clone())?;
        self.start(sampler);
        Ok(())
    }

    /// Replaces the configuration. A changed configuration invalidates the current
    /// output, so a new run over `mesh` is started; returns whether that happened.
    /// If the run cannot start, the previous configuration is kept.
    pub fn set_config(&mut self, config: SamplingConfig, mesh: &Mesh) -> Result<bool> {
        if config == self.config {
            return Ok(false);
        }
        let sampler = Sampler::new(mesh, config.clone())?;
        self.config = config;
        self.start(sampler);
        Ok(true)
    }

    fn start(&mut self, sampler: Sampler) {
        let ticket = self.slot.begin();
        if self.active.take().is_some() {
            tracing::warn!(generation = ticket.generation(), "active sampling run superseded");
        }
        self.active = Some(sampler.with_ticket(ticket));
    }

    /// Cancels the active run, if any. The next tick reports the cancellation.
    pub fn cancel(&mut self) {
        self.slot.cancel_all();
    }

    /// Advances the active run by one chunk and commits its output when it completes.
    pub fn tick(&mut self) -> Result<TickStatus> {
        let Some(sampler) = self.active.as_mut() else {
            return Ok(TickStatus::Idle);
        };
        let target = sampler.target();
        let settled = match sampler.step() {
            Step::Partial(data) => {
                return Ok(TickStatus::Running { accepted: data.len(), target });
            }
            Step::Done(data) => self
                .record
                .set_point_data(data)
                .map(|()| TickStatus::Committed { points: data.len() }),
            Step::Cancelled => Ok(TickStatus::Cancelled),
            Step::Incomplete(data) => Ok(TickStatus::Incomplete { accepted: data.len(), target }),
        };
        self.active = None;
        settled
    }

    /// Ticks until the active run settles.
    pub fn run_to_end(&mut self) -> Result<TickStatus> {
        loop {
            match self.tick()? {
                TickStatus::Running { .. } => continue,
                status => return Ok(status),
            }
        }
    }
}
