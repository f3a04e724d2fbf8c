//! Detection of glTF files that ask for nearest-neighbour texture filtering.
//!
//! Pixel-art assets declare `NEAREST` samplers. Imported textures get no sampler
//! by default, so such files are detected up front and their textures receive an
//! explicit nearest/clamp sampler instead.

use std::{borrow::Cow, fs, path::Path};

use gltf::Glb;
use serde_json::Value;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_HEADER_LEN: u32 = 12;
/// `GL_NEAREST`
const FILTER_NEAREST: u64 = 9728;

/// The JSON part of a glTF file: the whole file for `.gltf`, the JSON chunk for `.glb`.
fn json_chunk(bytes: &[u8]) -> Option<Cow<'_, [u8]>> {
    if !bytes.starts_with(GLB_MAGIC) {
        return Some(Cow::Borrowed(bytes));
    }
    // `Glb::from_slice` subtracts the header size from the declared length unchecked.
    let declared = u32::from_le_bytes(bytes.get(8..12)?.try_into().ok()?);
    if declared < GLB_HEADER_LEN {
        log::debug!("GLB declares a length of {} bytes", declared);
        return None;
    }
    match Glb::from_slice(bytes) {
        Ok(glb) => Some(glb.json),
        Err(e) => {
            log::debug!("Sampler check: malformed GLB: {}", e);
            None
        }
    }
}

fn declares_nearest(json: &Value) -> bool {
    let Some(samplers) = json.get("samplers").and_then(Value::as_array) else {
        return false;
    };
    samplers.iter().any(|sampler| {
        ["magFilter", "minFilter"]
            .iter()
            .any(|key| sampler.get(key).and_then(Value::as_u64) == Some(FILTER_NEAREST))
    })
}

/// `true` if `path` is a glTF/GLB file with at least one sampler using `NEAREST`
/// as its mag or min filter. Every other outcome, including read and parse
/// failures, is `false`.
pub fn needs_nearest_sampler(path: &Path) -> bool {
    let is_gltf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gltf") || ext.eq_ignore_ascii_case("glb"));
    if !is_gltf {
        return false;
    }

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("Sampler check: cannot read {}: {}", path.display(), e);
            return false;
        }
    };
    let Some(chunk) = json_chunk(&bytes) else {
        return false;
    };
    match serde_json::from_slice::<Value>(&chunk) {
        Ok(json) => {
            let nearest = declares_nearest(&json);
            if nearest {
                log::info!("{} uses nearest filtering, forcing nearest samplers", path.display());
            }
            nearest
        }
        Err(e) => {
            log::debug!("Sampler check: {} is not valid JSON: {}", path.display(), e);
            false
        }
    }
}
