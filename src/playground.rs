//! The orchestrator: document scaffolding, per-file import and scene framing.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::PoisonError,
};

use cgmath::{Matrix4, Point3, SquareMatrix, Vector3};
use instant::Instant;

use crate::{
    config::ImportOptions,
    data_structures::{
        bounds::{self, Aabb},
        document::{
            Document, LightData, LightId, LightType, ObjectData, ObjectId, ObjectUpdateData, names,
        },
        memory::MemoryDocument,
        model::ModelPtr,
    },
    error::Result,
    import::import_scene,
    resources::{self, sampler::needs_nearest_sampler},
};

/// Positions of the default lights. Both look at the origin.
const LIGHT_POSITIONS: [[f32; 3]; 2] = [[1.0, 1.0, 1.0], [1.0, 0.0, 0.0]];
const LIGHT_INTENSITY: f32 = 4.0;

/// Holds the document and every model imported into it.
///
/// Models are kept until the playground is dropped; their ids are handed out
/// sequentially and only consumed by imports that succeed.
#[derive(Debug)]
pub struct Playground<D: Document> {
    document: D,
    options: ImportOptions,
    lights: Vec<ObjectId>,
    collective_root: ObjectId,
    id_counter: i32,
    models: BTreeMap<i32, ModelPtr>,
}

impl<D: Document> Playground<D> {
    pub fn new(mut document: D, options: ImportOptions) -> Self {
        let lights = LIGHT_POSITIONS
            .iter()
            .map(|&position| create_light(&mut document, position.into()))
            .collect();

        let collective_root = document.create_object(ObjectData {
            name: Some("Scene Root".to_string()),
            tags: Some(vec![names::TAG_USER_HIDDEN.to_string()]),
            ..Default::default()
        });

        Self {
            document,
            options,
            lights,
            collective_root,
            id_counter: 0,
            models: BTreeMap::new(),
        }
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn lights(&self) -> &[ObjectId] {
        &self.lights
    }

    /// The object every model is parented to. Carries the framing transform.
    pub fn collective_root(&self) -> ObjectId {
        self.collective_root
    }

    pub fn models(&self) -> &BTreeMap<i32, ModelPtr> {
        &self.models
    }

    /// Import every file in order, then frame the result.
    pub fn load<P: AsRef<Path>>(&mut self, paths: impl IntoIterator<Item = P>) {
        let start = Instant::now();
        let mut loaded = 0usize;
        for path in paths {
            if self.add_model(path.as_ref()).is_some() {
                loaded += 1;
            }
        }
        log::info!("Loaded {} files in {:?}", loaded, start.elapsed());
        self.update_root_tf();
    }

    /// Import one file. Failures are logged and the file is skipped.
    pub fn add_model(&mut self, path: &Path) -> Option<i32> {
        log::info!("Adding {}", path.display());
        match self.make_model(path) {
            Ok(model) => {
                let id = self.id_counter;
                self.id_counter += 1;
                self.models.insert(id, model);
                Some(id)
            }
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                None
            }
        }
    }

    fn make_model(&mut self, path: &Path) -> Result<ModelPtr> {
        let scene = resources::load_scene(path)?;

        let options = ImportOptions {
            force_samplers_to_nearest: needs_nearest_sampler(path),
            ..self.options
        };
        let source_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(import_scene(
            &scene,
            &mut self.document,
            self.collective_root,
            self.id_counter,
            options,
            &source_dir,
        ))
    }

    /// Union of the bounds of every model. Empty when nothing has been imported.
    pub fn bounds(&self) -> Aabb {
        let boxes: Vec<Aabb> = self
            .models
            .values()
            .map(|m| m.lock().unwrap_or_else(PoisonError::into_inner).bounds)
            .collect();
        bounds::reduce(&boxes)
    }

    /// Scale and center everything under the scene root into a unit box around the
    /// origin. Returns the published transform, or `None` if there is nothing to frame.
    pub fn update_root_tf(&mut self) -> Option<Matrix4<f32>> {
        let bounds = self.bounds();
        let Some(transform) = bounds.framing_transform() else {
            log::debug!("No valid bounds, leaving the scene root untouched");
            return None;
        };
        log::debug!(
            "Framing bounds {:?}..{:?} with {:?}",
            bounds.min,
            bounds.max,
            transform
        );
        self.document.update_object(
            self.collective_root,
            ObjectUpdateData {
                transform: Some(transform),
            },
        );
        Some(transform)
    }
}

fn create_light<D: Document>(document: &mut D, position: Vector3<f32>) -> ObjectId {
    let light: LightId = document.create_light(LightData {
        color: [1.0, 1.0, 1.0],
        intensity: LIGHT_INTENSITY,
        light_type: LightType::Directional,
    });

    let eye = Point3::new(position.x, position.y, position.z);
    // `look_at_rh` is a view matrix; objects take world transforms, hence the inverse.
    let view = Matrix4::look_at_rh(eye, Point3::new(0.0, 0.0, 0.0), Vector3::unit_y());
    let transform = view
        .invert()
        .unwrap_or_else(|| Matrix4::from_translation(position));

    document.create_object(ObjectData {
        transform: Some(transform),
        lights: Some(vec![light]),
        tags: Some(vec![names::TAG_USER_HIDDEN.to_string()]),
        ..Default::default()
    })
}

/// Set up logging, import `files` into an in-memory document and frame them.
///
/// Fails only when not a single file could be imported.
pub fn run<P: AsRef<Path>>(
    options: ImportOptions,
    files: impl IntoIterator<Item = P>,
) -> anyhow::Result<Playground<MemoryDocument>> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let files: Vec<P> = files.into_iter().collect();
    let mut playground = Playground::new(MemoryDocument::new(), options);
    playground.load(&files);
    if playground.models().is_empty() {
        anyhow::bail!("none of the {} input files could be imported", files.len());
    }
    Ok(playground)
}
