//! # meshcloud
//!
//! `meshcloud` turns polygon meshes into point clouds. It is designed to be used in Rust
//! as well as compiled to WebAssembly (WASM), where a host application drives sampling
//! from its own timer and persists the result with its scene data.
//!
//! ## Features
//!
//! - **Surface sampling**: Area-weighted points on the mesh, each carrying its face normal.
//! - **Volume sampling**: Points inside closed meshes, classified with a signed ray-parity test over a BVH.
//! - **Incremental runs**: Sampling proceeds in bounded chunks that a host can interleave with other work and cancel.
//! - **Compact persistence**: Point columns are stored as base64-encoded, deflate-compressed float arrays.
//! - **Binary export**: A fixed little-endian record layout for downstream tools.
//!
//! ## Example
//!
//! See `demos/sample_cube.rs` for sampling a cube and exporting the result.
//!
//! ## Main Interface
//!
//! The primary entry point is the [`Sampler`] struct, created from a [`Mesh`] and a
//! [`SamplingConfig`]. [`PointCloudEntity`] wraps it with the at-most-one-run rule and a
//! [`PointCloudRecord`].

mod bounds;
mod bvh;
mod classifier;
pub mod codec;
mod config;
mod entity;
mod error;
pub mod export;
pub mod geometry;
mod mesh;
mod record;
mod run;
mod sampler;
pub mod wasm;

pub use bounds::BoundingBox;
pub use bvh::Bvh;
pub use bvh::RayHit;
pub use classifier::Containment;
pub use classifier::RayParity;
pub use classifier::SingleRay;
pub use classifier::SurfaceCrossing;
pub use config::SamplingConfig;
pub use config::Strategy;
pub use config::VolumePlacement;
pub use config::{DEFAULT_CHUNK_SIZE, DEFAULT_POINT_COUNT, MAX_POINT_COUNT, MIN_POINT_COUNT, POINT_COUNT_STEP};
pub use entity::PointCloudEntity;
pub use entity::TickStatus;
pub use error::{Result, SamplingError};
pub use mesh::Mesh;
pub use record::PointCloudRecord;
pub use record::RecordField;
pub use run::{RunSlot, RunTicket};
pub use sampler::{PointData, Sampler, SamplerState, Step};
pub use sampler::{diagnostic_color, sample, VOLUME_PADDING};
