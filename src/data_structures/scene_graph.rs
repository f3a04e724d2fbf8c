//! Generic scene graph produced by every importer.
//!
//! Whatever the source format (glTF, OBJ or an XDMF grid), a loader hands back a
//! [`Scene`]: a node hierarchy with row-major transforms, a flat mesh table, a
//! material table and a table of textures embedded in the file. The scene importer
//! only ever reads this shape, so it does not need to know where a scene came from.

use std::collections::HashMap;

use bitflags::bitflags;

bitflags! {
    /// Which primitive kinds occur in a mesh's faces.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PrimitiveTypes: u32 {
        const POINT = 0x1;
        const LINE = 0x2;
        const TRIANGLE = 0x4;
        const POLYGON = 0x8;
    }
}

impl PrimitiveTypes {
    /// Classify a face by its index count.
    pub fn of_face(index_count: usize) -> Self {
        match index_count {
            0 => Self::empty(),
            1 => Self::POINT,
            2 => Self::LINE,
            3 => Self::TRIANGLE,
            _ => Self::POLYGON,
        }
    }
}

/// Identity matrix in row-major order.
pub const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// A node of the source hierarchy.
#[derive(Clone, Debug)]
pub struct Node {
    pub name: Option<String>,
    /// Transform relative to the parent, **row-major**: element `[r][c]` lives at `r * 4 + c`.
    pub transform: [f32; 16],
    /// Indices into [`Scene::meshes`].
    pub meshes: Vec<usize>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            transform: IDENTITY,
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new(None)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tangents: Option<Vec<[f32; 3]>>,
    /// Per-vertex color channels, RGBA in `0.0..=1.0`.
    pub colors: Vec<Vec<[f32; 4]>>,
    /// Per-vertex texture coordinate channels. The third component is unused for 2D maps.
    pub tex_coords: Vec<Vec<[f32; 3]>>,
    /// One index list per face.
    pub faces: Vec<Vec<u32>>,
    pub primitive_types: PrimitiveTypes,
    /// Index into [`Scene::materials`].
    pub material_index: usize,
}

impl Mesh {
    /// Build a triangle mesh from a flat index list. A trailing partial triangle is dropped.
    pub fn from_triangles(name: &str, positions: Vec<[f32; 3]>, indices: &[u32]) -> Self {
        let faces: Vec<Vec<u32>> = indices.chunks_exact(3).map(<[u32]>::to_vec).collect();
        let primitive_types = if faces.is_empty() {
            PrimitiveTypes::empty()
        } else {
            PrimitiveTypes::TRIANGLE
        };
        Self {
            name: name.to_string(),
            positions,
            faces,
            primitive_types,
            ..Default::default()
        }
    }

    /// Recompute [`Mesh::primitive_types`] from the faces.
    pub fn update_primitive_types(&mut self) {
        self.primitive_types = self
            .faces
            .iter()
            .fold(PrimitiveTypes::empty(), |acc, face| acc | PrimitiveTypes::of_face(face.len()));
    }

    pub fn has_tex_coords(&self, channel: usize) -> bool {
        self.tex_coords.get(channel).is_some_and(|c| !c.is_empty())
    }

    pub fn has_colors(&self, channel: usize) -> bool {
        self.colors.get(channel).is_some_and(|c| !c.is_empty())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialKey {
    Name,
    BaseColor,
    DiffuseColor,
    MetallicFactor,
    SpecularFactor,
    RoughnessFactor,
    GlossinessFactor,
    TwoSided,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MaterialProperty {
    Color([f32; 4]),
    Float(f32),
    Flag(bool),
    Text(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureType {
    BaseColor,
    Diffuse,
}

/// Loosely typed material: a bag of keyed properties plus texture slots.
///
/// Formats fill in whatever they know; readers ask for a key and fall back when
/// it is absent or of the wrong type.
#[derive(Clone, Debug, Default)]
pub struct Material {
    properties: HashMap<MaterialKey, MaterialProperty>,
    textures: HashMap<TextureType, Vec<String>>,
}

impl Material {
    pub fn set(&mut self, key: MaterialKey, value: MaterialProperty) -> &mut Self {
        self.properties.insert(key, value);
        self
    }

    /// Append a texture reference to a slot. Embedded textures use `*N`.
    pub fn add_texture(&mut self, ty: TextureType, path: impl Into<String>) -> &mut Self {
        self.textures.entry(ty).or_default().push(path.into());
        self
    }

    pub fn get(&self, key: MaterialKey) -> Option<&MaterialProperty> {
        self.properties.get(&key)
    }

    pub fn color(&self, key: MaterialKey) -> Option<[f32; 4]> {
        match self.get(key)? {
            MaterialProperty::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn float(&self, key: MaterialKey) -> Option<f32> {
        match self.get(key)? {
            MaterialProperty::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn flag(&self, key: MaterialKey) -> Option<bool> {
        match self.get(key)? {
            MaterialProperty::Flag(b) => Some(*b),
            MaterialProperty::Float(f) => Some(*f != 0.0),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self.get(MaterialKey::Name)? {
            MaterialProperty::Text(name) => Some(name),
            _ => None,
        }
    }

    pub fn texture_count(&self, ty: TextureType) -> usize {
        self.textures.get(&ty).map_or(0, Vec::len)
    }

    pub fn texture(&self, ty: TextureType, index: usize) -> Option<&str> {
        self.textures.get(&ty)?.get(index).map(String::as_str)
    }
}

/// A texture stored inside the model file.
#[derive(Clone, Debug, Default)]
pub struct EmbeddedTexture {
    /// Pixel width, or the byte length of `data` when compressed.
    pub width: u32,
    /// Pixel height. Zero means `data` holds a whole compressed image file.
    pub height: u32,
    /// Short format hint such as `png` or `jpg`. May be empty.
    pub format_hint: String,
    /// Compressed file bytes, or `width * height` BGRA8 texels.
    pub data: Vec<u8>,
}

impl EmbeddedTexture {
    pub fn compressed(format_hint: &str, data: Vec<u8>) -> Self {
        Self {
            width: data.len() as u32,
            height: 0,
            format_hint: format_hint.to_string(),
            data,
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.height == 0
    }
}

/// Resolve a `*N` reference into an index of the embedded texture table.
pub fn embedded_index(reference: &str) -> Option<usize> {
    reference.strip_prefix('*')?.parse().ok()
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub root: Node,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub textures: Vec<EmbeddedTexture>,
}
