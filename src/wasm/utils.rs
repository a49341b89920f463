use crate::config::{DEFAULT_CHUNK_SIZE, DEFAULT_POINT_COUNT, MAX_POINT_COUNT, MIN_POINT_COUNT, POINT_COUNT_STEP};
use crate::error::SamplingError;
use wasm_bindgen::prelude::*;
use js_sys::Array;

#[wasm_bindgen(typescript_custom_section)]
const TS_CONSTANTS_CONFIG: &'static str = r#"
export const DEFAULT_POINT_COUNT = 1024;
export const MIN_POINT_COUNT = 128;
export const MAX_POINT_COUNT = 65536;
export const POINT_COUNT_STEP = 64;
export const DEFAULT_CHUNK_SIZE = 4096;
"#;

/// Point count bounds for host UI sliders: `[default, min, max, step]`.
#[wasm_bindgen(js_name = pointCountRange)]
pub fn point_count_range() -> Vec<u32> {
    [DEFAULT_POINT_COUNT, MIN_POINT_COUNT, MAX_POINT_COUNT, POINT_COUNT_STEP]
        .iter()
        .map(|&v| v as u32)
        .collect()
}

#[wasm_bindgen(js_name = defaultChunkSize)]
pub fn default_chunk_size() -> u32 {
    DEFAULT_CHUNK_SIZE as u32
}

pub fn to_js_error(err: SamplingError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

pub fn parse_js_point(val: &JsValue) -> Option<[f64; 3]> {
    let arr = val.dyn_ref::<Array>()?;
    if arr.length() < 3 {
        return None;
    }
    Some([arr.get(0).as_f64()?, arr.get(1).as_f64()?, arr.get(2).as_f64()?])
}
