//! Data structures shared by the import pipeline.
//!
//! - `scene_graph` is the generic scene every loader produces
//! - `document` holds the normalized entities and the `Document` contract
//! - `memory` is an in-process document that records everything it receives
//! - `model` keeps per-file import state and its transform callbacks
//! - `transform` holds TRS transforms and matrix layout conversion
//! - `bounds` has bounding boxes and the framing transform
//! - `texture` prepares image payloads for documents

pub mod bounds;
pub mod document;
pub mod memory;
pub mod model;
pub mod scene_graph;
pub mod texture;
pub mod transform;
