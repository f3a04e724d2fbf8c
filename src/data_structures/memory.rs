//! In-process [`Document`] that keeps every entity it is asked to create.
//!
//! It stands in for the remote presentation layer: ids are plain indices into
//! per-kind tables and transform edits are dispatched straight to the callbacks
//! registered on an object.

use std::sync::Arc;

use cgmath::{Quaternion, Vector3};

use crate::data_structures::document::*;

#[derive(Debug, Default)]
pub struct MemoryDocument {
    buffers: Vec<BufferData>,
    buffer_views: Vec<BufferViewData>,
    images: Vec<ImageData>,
    samplers: Vec<SamplerData>,
    textures: Vec<TextureData>,
    materials: Vec<MaterialData>,
    meshes: Vec<MeshSource<'static>>,
    objects: Vec<ObjectData>,
    lights: Vec<LightData>,
    updates: usize,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffers(&self) -> &[BufferData] {
        &self.buffers
    }

    pub fn buffer_views(&self) -> &[BufferViewData] {
        &self.buffer_views
    }

    pub fn images(&self) -> &[ImageData] {
        &self.images
    }

    pub fn samplers(&self) -> &[SamplerData] {
        &self.samplers
    }

    pub fn textures(&self) -> &[TextureData] {
        &self.textures
    }

    pub fn materials(&self) -> &[MaterialData] {
        &self.materials
    }

    pub fn meshes(&self) -> &[MeshSource<'static>] {
        &self.meshes
    }

    pub fn objects(&self) -> &[ObjectData] {
        &self.objects
    }

    pub fn lights(&self) -> &[LightData] {
        &self.lights
    }

    pub fn texture(&self, id: TextureId) -> Option<&TextureData> {
        self.textures.get(id.0 as usize)
    }

    pub fn material(&self, id: MaterialId) -> Option<&MaterialData> {
        self.materials.get(id.0 as usize)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&MeshSource<'static>> {
        self.meshes.get(id.0 as usize)
    }

    pub fn object(&self, id: ObjectId) -> Option<&ObjectData> {
        self.objects.get(id.0 as usize)
    }

    /// Objects whose parent is `parent`, in creation order.
    pub fn children_of(&self, parent: ObjectId) -> Vec<ObjectId> {
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, o)| o.parent == Some(parent))
            .map(|(i, _)| ObjectId(i as u32))
            .collect()
    }

    /// How many times [`Document::update_object`] has been called.
    pub fn update_count(&self) -> usize {
        self.updates
    }

    fn callbacks(&self, object: ObjectId) -> Option<Arc<dyn EntityCallbacks>> {
        self.object(object)?.callbacks.clone()
    }

    /// Deliver a position edit to the callbacks of `object`. Returns `false` if it has none.
    pub fn set_position(&mut self, object: ObjectId, position: Vector3<f32>) -> bool {
        match self.callbacks(object) {
            Some(cb) => {
                cb.set_position(object, self, position);
                true
            }
            None => false,
        }
    }

    pub fn set_rotation(&mut self, object: ObjectId, rotation: Quaternion<f32>) -> bool {
        match self.callbacks(object) {
            Some(cb) => {
                cb.set_rotation(object, self, rotation);
                true
            }
            None => false,
        }
    }

    pub fn set_scale(&mut self, object: ObjectId, scale: Vector3<f32>) -> bool {
        match self.callbacks(object) {
            Some(cb) => {
                cb.set_scale(object, self, scale);
                true
            }
            None => false,
        }
    }
}

fn next_id(len: usize) -> u32 {
    len as u32
}

impl Document for MemoryDocument {
    fn create_buffer(&mut self, data: BufferData) -> BufferId {
        let id = BufferId(next_id(self.buffers.len()));
        self.buffers.push(data);
        id
    }

    fn create_buffer_view(&mut self, data: BufferViewData) -> BufferViewId {
        let id = BufferViewId(next_id(self.buffer_views.len()));
        self.buffer_views.push(data);
        id
    }

    fn create_image(&mut self, data: ImageData) -> ImageId {
        let id = ImageId(next_id(self.images.len()));
        self.images.push(data);
        id
    }

    fn create_sampler(&mut self, data: SamplerData) -> SamplerId {
        let id = SamplerId(next_id(self.samplers.len()));
        self.samplers.push(data);
        id
    }

    fn create_texture(&mut self, data: TextureData) -> TextureId {
        let id = TextureId(next_id(self.textures.len()));
        self.textures.push(data);
        id
    }

    fn create_material(&mut self, data: MaterialData) -> MaterialId {
        let id = MaterialId(next_id(self.materials.len()));
        self.materials.push(data);
        id
    }

    fn create_mesh(&mut self, source: MeshSource<'_>) -> MeshId {
        let id = MeshId(next_id(self.meshes.len()));
        self.meshes.push(source.into_owned());
        id
    }

    fn create_object(&mut self, data: ObjectData) -> ObjectId {
        let id = ObjectId(next_id(self.objects.len()));
        self.objects.push(data);
        id
    }

    fn create_light(&mut self, data: LightData) -> LightId {
        let id = LightId(next_id(self.lights.len()));
        self.lights.push(data);
        id
    }

    fn update_object(&mut self, object: ObjectId, update: ObjectUpdateData) {
        let Some(target) = self.objects.get_mut(object.0 as usize) else {
            log::warn!("Update for unknown object {:?} ignored", object);
            return;
        };
        if let Some(transform) = update.transform {
            target.transform = Some(transform);
        }
        self.updates += 1;
    }
}
