use std::path::Path;

use crate::{
    data_structures::scene_graph::Scene,
    error::{ImportError, Result},
};

/**
 * This module contains all logic for loading scenes and their raw data from external files.
 *
 * Each format has its own loader producing the same generic [`Scene`]; the
 * loader is picked from the file extension.
 */
pub mod gltf_loader;
pub mod mapped;
pub mod obj;
pub mod sampler;
pub mod xdmf;

/// The loaders this crate knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImporterKind {
    Gltf,
    Obj,
    Xdmf,
}

impl ImporterKind {
    /// Select a loader by extension (case-insensitive).
    pub fn for_path(path: &Path) -> Option<Self> {
        if xdmf::can_read(path) {
            return Some(Self::Xdmf);
        }
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "gltf" | "glb" => Some(Self::Gltf),
            "obj" => Some(Self::Obj),
            _ => None,
        }
    }

    pub fn load(self, path: &Path) -> Result<Scene> {
        match self {
            Self::Gltf => gltf_loader::load_gltf(path),
            Self::Obj => obj::load_obj(path),
            Self::Xdmf => xdmf::load_xdmf(path),
        }
    }
}

/// Load any supported file into a generic scene.
pub fn load_scene(path: &Path) -> Result<Scene> {
    if !path.exists() {
        return Err(ImportError::InputMissing(path.to_path_buf()));
    }
    let kind = ImporterKind::for_path(path)
        .ok_or_else(|| ImportError::UnsupportedFormat(path.to_path_buf()))?;
    log::debug!("Using {:?} importer for {}", kind, path.display());
    kind.load(path)
}
