//! JavaScript bindings. Hosts drive a [`MeshSamplerWASM`] from a timer, one `step` per
//! tick, and commit its output into a [`PointCloudRecordWASM`] they persist.

mod utils;

use crate::bvh::Bvh;
use crate::classifier::{Containment, SurfaceCrossing};
use crate::config::{SamplingConfig, Strategy};
use crate::error::SamplingError;
use crate::export::write_points;
use crate::mesh::Mesh;
use crate::record::{PointCloudRecord, RecordField};
use crate::sampler::{Sampler, SamplerState};
use js_sys::{Array, Function, Reflect};
use std::io::Cursor;
use utils::{parse_js_point, to_js_error};
use wasm_bindgen::prelude::*;

pub use utils::{default_chunk_size, point_count_range};

// --- Mesh ---

#[wasm_bindgen(js_name = Mesh)]
pub struct MeshWASM {
    inner: Mesh,
}

#[wasm_bindgen(js_class = Mesh)]
impl MeshWASM {
    /// Builds a mesh from flat vertex coordinates, per-face vertex counts and concatenated face indices.
    #[wasm_bindgen(constructor)]
    pub fn new(positions: &[f64], face_sizes: &[u32], indices: &[u32]) -> Result<MeshWASM, JsValue> {
        Mesh::from_flat(positions, face_sizes, indices)
            .map(|inner| MeshWASM { inner })
            .map_err(to_js_error)
    }

    pub fn cube(cx: f64, cy: f64, cz: f64, halfwidth: f64) -> MeshWASM {
        MeshWASM { inner: Mesh::cube([cx, cy, cz], halfwidth) }
    }

    pub fn tetrahedron(cx: f64, cy: f64, cz: f64, radius: f64) -> MeshWASM {
        MeshWASM { inner: Mesh::tetrahedron([cx, cy, cz], radius) }
    }

    pub fn octahedron(cx: f64, cy: f64, cz: f64, radius: f64) -> MeshWASM {
        MeshWASM { inner: Mesh::octahedron([cx, cy, cz], radius) }
    }

    #[wasm_bindgen(getter)]
    pub fn face_count(&self) -> usize {
        self.inner.face_count()
    }

    pub fn total_area(&self) -> f64 {
        self.inner.total_area()
    }

    pub fn volume(&self) -> f64 {
        self.inner.volume()
    }

    pub fn bounding_halfwidth(&self) -> f64 {
        self.inner.bounding_halfwidth()
    }
}

// --- Record ---

fn parse_field(field: &str) -> Result<RecordField, JsValue> {
    match field {
        "positions" => Ok(RecordField::Positions),
        "normals" => Ok(RecordField::Normals),
        "colors" => Ok(RecordField::Colors),
        other => Err(JsValue::from_str(&format!("unknown record field '{}'", other))),
    }
}

#[wasm_bindgen(js_name = PointCloudRecord)]
#[derive(Default)]
pub struct PointCloudRecordWASM {
    inner: PointCloudRecord,
}

#[wasm_bindgen(js_class = PointCloudRecord)]
impl PointCloudRecordWASM {
    #[wasm_bindgen(constructor)]
    pub fn new() -> PointCloudRecordWASM {
        Self::default()
    }

    /// Restores a record from the encoded strings a host persisted.
    #[wasm_bindgen(js_name = fromEncoded)]
    pub fn from_encoded(positions: String, normals: String, colors: String) -> PointCloudRecordWASM {
        PointCloudRecordWASM { inner: PointCloudRecord::from_encoded(positions, normals, colors) }
    }

    /// Empty `normals` or `colors` arrays are stored as absent.
    pub fn set_raw_data(&mut self, positions: &[f32], normals: &[f32], colors: &[f32]) -> Result<(), JsValue> {
        let normals = (!normals.is_empty()).then_some(normals);
        let colors = (!colors.is_empty()).then_some(colors);
        self.inner.set_raw_data(positions, normals, colors).map_err(to_js_error)
    }

    pub fn positions(&self) -> Result<Vec<f32>, JsValue> {
        self.inner.positions().map(<[f32]>::to_vec).map_err(to_js_error)
    }

    pub fn normals(&self) -> Result<Vec<f32>, JsValue> {
        self.inner.normals().map(<[f32]>::to_vec).map_err(to_js_error)
    }

    pub fn colors(&self) -> Result<Vec<f32>, JsValue> {
        self.inner.colors().map(<[f32]>::to_vec).map_err(to_js_error)
    }

    pub fn point_count(&self) -> Result<usize, JsValue> {
        self.inner.point_count().map_err(to_js_error)
    }

    pub fn encoded(&self, field: &str) -> Result<String, JsValue> {
        Ok(self.inner.encoded(parse_field(field)?).to_string())
    }

    pub fn set_encoded(&mut self, field: &str, value: String) -> Result<(), JsValue> {
        self.inner.set_encoded(parse_field(field)?, value);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// The binary export file contents, for hosts that save through the browser.
    pub fn export_bytes(&self) -> Result<Vec<u8>, JsValue> {
        let positions = self.inner.positions().map_err(to_js_error)?;
        let colors = self.inner.colors().map_err(to_js_error)?;
        let mut out = Cursor::new(Vec::with_capacity(4 + positions.len() / 3 * 16));
        write_points(&mut out, positions, colors).map_err(to_js_error)?;
        Ok(out.into_inner())
    }
}

// --- Sampler ---

#[wasm_bindgen(js_name = MeshSampler)]
pub struct MeshSamplerWASM {
    inner: Sampler,
}

#[wasm_bindgen(js_class = MeshSampler)]
impl MeshSamplerWASM {
    /// `strategy` is one of `"surface"`, `"volume"` or `"face_centers"`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        mesh: &MeshWASM,
        count: usize,
        seed: i32,
        strategy: &str,
        chunk_size: usize,
    ) -> Result<MeshSamplerWASM, JsValue> {
        let strategy: Strategy = strategy.parse().map_err(to_js_error)?;
        let config = SamplingConfig::new(count, seed, strategy).with_chunk_size(chunk_size);
        Sampler::new(&mesh.inner, config)
            .map(|inner| MeshSamplerWASM { inner })
            .map_err(to_js_error)
    }

    /// Replaces the volume inside test with a JS object exposing
    /// `classify(x, y, z) -> { point: [x, y, z], normal: [x, y, z] } | null`.
    #[wasm_bindgen(js_name = setContainment)]
    pub fn set_containment(&mut self, val: JsValue) {
        self.inner.set_containment(Box::new(JsContainment { val }));
    }

    /// Runs one chunk and returns the resulting state name.
    pub fn step(&mut self) -> String {
        self.inner.step();
        self.state()
    }

    pub fn cancel(&mut self) {
        self.inner.cancel();
    }

    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        match self.inner.state() {
            SamplerState::Idle => "idle",
            SamplerState::Running => "running",
            SamplerState::Completed => "completed",
            SamplerState::Cancelled => "cancelled",
            SamplerState::Incomplete => "incomplete",
        }
        .to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn accepted(&self) -> usize {
        self.inner.data().len()
    }

    #[wasm_bindgen(getter)]
    pub fn target(&self) -> usize {
        self.inner.target()
    }

    pub fn positions(&self) -> Vec<f32> {
        self.inner.data().positions.clone()
    }

    pub fn normals(&self) -> Vec<f32> {
        self.inner.data().normals.clone()
    }

    pub fn colors(&self) -> Vec<f32> {
        self.inner.data().colors.clone()
    }

    /// The binary export of the points accepted so far.
    pub fn export_bytes(&self) -> Result<Vec<u8>, JsValue> {
        let data = self.inner.data();
        let mut out = Cursor::new(Vec::with_capacity(4 + data.len() * 16));
        write_points(&mut out, &data.positions, &data.colors).map_err(to_js_error)?;
        Ok(out.into_inner())
    }

    /// Writes the finished output into `record`. Fails unless the run completed.
    pub fn commit(&self, record: &mut PointCloudRecordWASM) -> Result<(), JsValue> {
        if self.inner.state() != SamplerState::Completed {
            return Err(to_js_error(SamplingError::InvalidConfig(
                "only a completed run can be committed".into(),
            )));
        }
        record.inner.set_point_data(self.inner.data()).map_err(to_js_error)
    }
}

struct JsContainment {
    val: JsValue,
}

unsafe impl Send for JsContainment {}
unsafe impl Sync for JsContainment {}

impl std::fmt::Debug for JsContainment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JsContainment")
    }
}

impl Containment for JsContainment {
    fn classify(&self, _bvh: &Bvh, point: [f64; 3]) -> Option<SurfaceCrossing> {
        let func = Reflect::get(&self.val, &"classify".into())
            .and_then(|f| f.dyn_into::<Function>())
            .ok()?;
        let args = Array::of3(&point[0].into(), &point[1].into(), &point[2].into());
        let res = func.apply(&self.val, &args).ok()?;
        if res.is_null() || res.is_undefined() {
            return None;
        }
        let crossing_point = Reflect::get(&res, &"point".into()).ok()?;
        let normal = Reflect::get(&res, &"normal".into()).ok()?;
        Some(SurfaceCrossing {
            point: parse_js_point(&crossing_point)?,
            normal: parse_js_point(&normal)?,
        })
    }
}
