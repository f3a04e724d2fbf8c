//! geom-playground
//!
//! Imports heterogeneous 3D scene files into one normalized scene document.
//! glTF/GLB and OBJ files as well as XDMF simulation grids are first read into a
//! generic scene graph, then converted into document entities (buffers, images,
//! textures, materials, meshes and objects). All imported models hang below one
//! scene root whose transform frames their combined bounds into a unit box.
//!
//! High-level modules
//! - `config`: options that steer an import
//! - `data_structures`: generic scene graph, document entities, models, bounds
//! - `error`: the error type of the import pipeline
//! - `import`: conversion of a generic scene into document entities
//! - `playground`: orchestration of multi-file imports and scene framing
//! - `resources`: format loaders and memory-mapped data access
//!

pub mod config;
pub mod data_structures;
pub mod error;
pub mod import;
pub mod playground;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use config::ImportOptions;
pub use error::{ImportError, Result};
pub use playground::{Playground, run};
