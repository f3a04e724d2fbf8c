//! Normalized document entities and the contract of the document that owns them.
//!
//! The importer never holds entities directly. It asks a [`Document`] to create
//! them and keeps the returned ids, which may only be used in later creation calls.
//! Because an id can only be obtained by creating its entity first, the creation
//! order always follows the reference graph
//! (mesh → material → texture → image → buffer view → buffer).

use std::{borrow::Cow, fmt, sync::Arc};

use cgmath::{Matrix3, Matrix4, Quaternion, Vector3};

macro_rules! entity_id {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub u32);
        )*
    };
}

entity_id!(
    BufferId,
    BufferViewId,
    ImageId,
    SamplerId,
    TextureId,
    MaterialId,
    MeshId,
    ObjectId,
    LightId,
);

/// Well-known tag strings.
pub mod names {
    /// Marks an object that only exists to host geometry and should not be listed to users.
    pub const TAG_USER_HIDDEN: &str = "user_hidden";
}

#[derive(Clone, Debug, PartialEq)]
pub struct BufferData {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewType {
    Unknown,
    GeometryInfo,
    ImageInfo,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BufferViewData {
    pub source_buffer: BufferId,
    pub view_type: ViewType,
    pub offset: u64,
    pub length: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    pub name: String,
    pub source: BufferViewId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MagFilter {
    Nearest,
    Linear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MinFilter {
    Nearest,
    Linear,
    LinearMipmapLinear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplerMode {
    ClampToEdge,
    MirroredRepeat,
    Repeat,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SamplerData {
    pub mag_filter: MagFilter,
    pub min_filter: MinFilter,
    pub wrap_s: SamplerMode,
    pub wrap_t: SamplerMode,
}

impl SamplerData {
    /// Nearest filtering, clamped at the edges. Used for pixel-art style textures.
    pub fn nearest_clamped() -> Self {
        Self {
            mag_filter: MagFilter::Nearest,
            min_filter: MinFilter::Nearest,
            wrap_s: SamplerMode::ClampToEdge,
            wrap_t: SamplerMode::ClampToEdge,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextureData {
    pub name: String,
    pub image: ImageId,
    pub sampler: Option<SamplerId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextureRef {
    pub source: TextureId,
    pub transform: Matrix3<f32>,
    pub texture_coord_slot: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PbrInfo {
    /// Linear RGBA.
    pub base_color: [f32; 4],
    pub base_color_texture: Option<TextureRef>,
    pub metallic: f32,
    pub roughness: f32,
}

impl Default for PbrInfo {
    fn default() -> Self {
        Self {
            base_color: [1.0; 4],
            base_color_texture: None,
            metallic: 1.0,
            roughness: 1.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialData {
    pub name: Option<String>,
    pub pbr_info: PbrInfo,
    pub double_sided: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveType {
    Line,
    Triangle,
}

/// Geometry handed to [`Document::create_mesh`].
///
/// Positions and normals are borrowed from the source scene whenever their layout
/// already matches, so creating a mesh does not force a copy.
#[derive(Clone, Debug)]
pub struct MeshSource<'a> {
    pub material: MaterialId,
    pub positions: Cow<'a, [[f32; 3]]>,
    pub normals: Option<Cow<'a, [[f32; 3]]>>,
    pub colors: Option<Vec<[u8; 4]>>,
    /// UVs normalized to the full `u16` range.
    pub textures: Option<Vec<[u16; 2]>>,
    pub indices: Vec<u32>,
    pub primitive: PrimitiveType,
}

impl MeshSource<'_> {
    pub fn into_owned(self) -> MeshSource<'static> {
        MeshSource {
            material: self.material,
            positions: Cow::Owned(self.positions.into_owned()),
            normals: self.normals.map(|n| Cow::Owned(n.into_owned())),
            colors: self.colors,
            textures: self.textures,
            indices: self.indices,
            primitive: self.primitive,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightType {
    Directional,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LightData {
    pub color: [f32; 3],
    pub intensity: f32,
    pub light_type: LightType,
}

/// Receives transform edits the presentation layer makes to an object.
///
/// `host` is the object the callbacks were registered on. Implementations publish
/// their result through `doc`.
pub trait EntityCallbacks: Send + Sync {
    fn set_position(&self, host: ObjectId, doc: &mut dyn Document, position: Vector3<f32>);

    fn set_rotation(&self, host: ObjectId, doc: &mut dyn Document, rotation: Quaternion<f32>);

    fn set_scale(&self, host: ObjectId, doc: &mut dyn Document, scale: Vector3<f32>);
}

#[derive(Clone, Default)]
pub struct ObjectData {
    pub name: Option<String>,
    pub parent: Option<ObjectId>,
    /// Column-major transform relative to the parent.
    pub transform: Option<Matrix4<f32>>,
    pub mesh: Option<MeshId>,
    pub lights: Option<Vec<LightId>>,
    pub tags: Option<Vec<String>>,
    pub callbacks: Option<Arc<dyn EntityCallbacks>>,
}

impl ObjectData {
    pub fn is_hidden(&self) -> bool {
        self.tags
            .as_ref()
            .is_some_and(|tags| tags.iter().any(|t| t == names::TAG_USER_HIDDEN))
    }
}

impl fmt::Debug for ObjectData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectData")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("transform", &self.transform)
            .field("mesh", &self.mesh)
            .field("lights", &self.lights)
            .field("tags", &self.tags)
            .field("callbacks", &self.callbacks.is_some())
            .finish()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectUpdateData {
    pub transform: Option<Matrix4<f32>>,
}

/// The downstream document. Each creation call returns an id usable by later calls.
pub trait Document {
    fn create_buffer(&mut self, data: BufferData) -> BufferId;

    fn create_buffer_view(&mut self, data: BufferViewData) -> BufferViewId;

    fn create_image(&mut self, data: ImageData) -> ImageId;

    fn create_sampler(&mut self, data: SamplerData) -> SamplerId;

    fn create_texture(&mut self, data: TextureData) -> TextureId;

    fn create_material(&mut self, data: MaterialData) -> MaterialId;

    fn create_mesh(&mut self, source: MeshSource<'_>) -> MeshId;

    fn create_object(&mut self, data: ObjectData) -> ObjectId;

    fn create_light(&mut self, data: LightData) -> LightId;

    /// Republish parts of an existing object.
    fn update_object(&mut self, object: ObjectId, update: ObjectUpdateData);
}
