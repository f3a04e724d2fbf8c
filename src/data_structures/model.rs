//! Per-file import state and the interactive transform callbacks bound to it.

use std::sync::{Arc, Mutex, Weak};

use cgmath::{Matrix4, Quaternion, Vector3};

use crate::data_structures::{
    bounds::Aabb,
    document::{Document, EntityCallbacks, ObjectId, ObjectUpdateData},
    transform::Transform,
};

/// Everything the orchestrator remembers about one imported file.
#[derive(Clone, Debug)]
pub struct Model {
    pub id: i32,
    /// Local TRS, edited by the presentation layer after import.
    pub transform: Transform,
    /// Bounds of every position of every mesh converted for this model.
    pub bounds: Aabb,
    /// First object created for the file. Receives the transform callbacks.
    pub object: Option<ObjectId>,
    /// Every other object created for the file: deeper hierarchy nodes and per-mesh objects.
    pub other_objects: Vec<ObjectId>,
}

pub type ModelPtr = Arc<Mutex<Model>>;

impl Model {
    pub fn new(id: i32) -> Self {
        Self {
            id,
            transform: Transform::default(),
            bounds: Aabb::EMPTY,
            object: None,
            other_objects: Vec::new(),
        }
    }

    pub fn recompute_transform(&self) -> Matrix4<f32> {
        self.transform.to_matrix()
    }

    /// Record a created object: the first becomes primary, the rest secondary.
    pub fn register_object(&mut self, object: ObjectId) {
        if self.object.is_none() {
            self.object = Some(object);
        } else {
            self.other_objects.push(object);
        }
    }

    pub fn into_shared(self) -> ModelPtr {
        Arc::new(Mutex::new(self))
    }
}

/// Transform callbacks for a model's primary object.
///
/// Only a weak reference to the model is kept. Once the owning collection drops
/// the model every callback silently does nothing.
pub struct ModelCallbacks {
    model: Weak<Mutex<Model>>,
}

impl ModelCallbacks {
    pub fn new(model: &ModelPtr) -> Self {
        Self {
            model: Arc::downgrade(model),
        }
    }

    /// Mutate the TRS, recompute and publish while the model stays locked, so no
    /// observer sees a transform that does not match the stored TRS.
    fn update_transform(
        &self,
        host: ObjectId,
        doc: &mut dyn Document,
        mutation: impl FnOnce(&mut Transform),
    ) {
        let Some(model) = self.model.upgrade() else {
            return;
        };
        let Ok(mut model) = model.lock() else {
            log::error!("Model behind object {:?} is poisoned, ignoring transform edit", host);
            return;
        };
        mutation(&mut model.transform);
        let transform = model.recompute_transform();
        log::debug!("Model {} transform now {:?}", model.id, transform);
        doc.update_object(
            host,
            ObjectUpdateData {
                transform: Some(transform),
            },
        );
    }
}

impl EntityCallbacks for ModelCallbacks {
    fn set_position(&self, host: ObjectId, doc: &mut dyn Document, position: Vector3<f32>) {
        log::debug!("set_position {:?}", position);
        self.update_transform(host, doc, |t| t.position = position);
    }

    fn set_rotation(&self, host: ObjectId, doc: &mut dyn Document, rotation: Quaternion<f32>) {
        log::debug!("set_rotation {:?}", rotation);
        self.update_transform(host, doc, |t| t.rotation = rotation);
    }

    fn set_scale(&self, host: ObjectId, doc: &mut dyn Document, scale: Vector3<f32>) {
        log::debug!("set_scale {:?}", scale);
        self.update_transform(host, doc, |t| t.scale = scale);
    }
}
