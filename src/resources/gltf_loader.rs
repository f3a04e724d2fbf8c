//! glTF 2.0 (`.gltf` and `.glb`) to generic scene.
//!
//! Every glTF primitive becomes its own generic mesh; a node that references a
//! glTF mesh references all of that mesh's primitives. Images stored in buffer
//! views become embedded textures (`*N`), images referenced by URI stay paths
//! relative to the file.

use std::path::Path;

use gltf::{Gltf, buffer, image::Source, mesh::Mode};

use crate::{
    data_structures::{
        scene_graph::{
            EmbeddedTexture, Material, MaterialKey, MaterialProperty, Mesh, Node, Scene,
            TextureType,
        },
        transform::columns_to_row_major,
    },
    error::Result,
};

pub fn load_gltf(path: &Path) -> Result<Scene> {
    log::debug!("Loading glTF {}", path.display());
    let Gltf { document, blob } = Gltf::open(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let buffers = gltf::import_buffers(&document, Some(base), blob)?;

    let (textures, image_refs) = load_images(&document, &buffers);

    let mut materials: Vec<Material> = document
        .materials()
        .map(|m| convert_material(&m, &image_refs))
        .collect();
    let default_material = materials.len();
    let mut needs_default = false;

    let mut meshes = Vec::new();
    // Generic mesh indices of every glTF mesh, by glTF mesh index.
    let mut primitive_ranges = Vec::new();
    for mesh in document.meshes() {
        let start = meshes.len();
        for primitive in mesh.primitives() {
            let material_index = primitive.material().index().unwrap_or_else(|| {
                needs_default = true;
                default_material
            });
            match convert_primitive(&mesh, &primitive, &buffers) {
                Some(mut converted) => {
                    converted.material_index = material_index;
                    meshes.push(converted);
                }
                None => log::warn!(
                    "Skipping primitive {} of mesh {:?}: no positions",
                    primitive.index(),
                    mesh.name()
                ),
            }
        }
        primitive_ranges.push(start..meshes.len());
    }
    if needs_default {
        materials.push(Material::default());
    }

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());
    let mut roots: Vec<Node> = scene
        .map(|s| s.nodes().map(|n| convert_node(&n, &primitive_ranges)).collect())
        .unwrap_or_default();

    let root = if roots.len() == 1 {
        roots.remove(0)
    } else {
        let mut root = Node::new(None);
        root.children = roots;
        root
    };

    Ok(Scene {
        root,
        meshes,
        materials,
        textures,
    })
}

/// Collect embedded images and compute a texture path for every glTF image.
/// Images that cannot be referenced get `None`.
fn load_images(
    document: &gltf::Document,
    buffers: &[buffer::Data],
) -> (Vec<EmbeddedTexture>, Vec<Option<String>>) {
    let mut textures = Vec::new();
    let refs = document
        .images()
        .map(|image| match image.source() {
            Source::View { view, mime_type } => {
                let bytes = buffers
                    .get(view.buffer().index())
                    .and_then(|data| data.0.get(view.offset()..view.offset() + view.length()));
                let Some(bytes) = bytes else {
                    log::warn!("Image {} points outside of its buffer", image.index());
                    return None;
                };
                let hint = mime_type.rsplit('/').next().unwrap_or_default();
                textures.push(EmbeddedTexture::compressed(hint, bytes.to_vec()));
                Some(format!("*{}", textures.len() - 1))
            }
            Source::Uri { uri, .. } if uri.starts_with("data:") => {
                log::warn!("Data URI images are not supported (image {})", image.index());
                None
            }
            Source::Uri { uri, .. } => Some(uri.to_string()),
        })
        .collect();
    (textures, refs)
}

fn convert_material(material: &gltf::Material, image_refs: &[Option<String>]) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let mut out = Material::default();
    out.set(MaterialKey::BaseColor, MaterialProperty::Color(pbr.base_color_factor()))
        .set(MaterialKey::MetallicFactor, MaterialProperty::Float(pbr.metallic_factor()))
        .set(MaterialKey::RoughnessFactor, MaterialProperty::Float(pbr.roughness_factor()))
        .set(MaterialKey::TwoSided, MaterialProperty::Flag(material.double_sided()));
    if let Some(name) = material.name() {
        out.set(MaterialKey::Name, MaterialProperty::Text(name.to_string()));
    }
    if let Some(info) = pbr.base_color_texture() {
        let image = info.texture().source().index();
        if let Some(Some(path)) = image_refs.get(image) {
            out.add_texture(TextureType::BaseColor, path.clone());
        }
    }
    out
}

fn convert_primitive(
    mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    buffers: &[buffer::Data],
) -> Option<Mesh> {
    let reader = primitive.reader(|buffer| {
        buffers
            .get(buffer.index())
            .map(|data| data.0.as_slice())
    });
    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let mut out = Mesh {
        name: mesh.name().unwrap_or("mesh").to_string(),
        normals: reader.read_normals().map(|n| n.collect()),
        tangents: reader
            .read_tangents()
            .map(|t| t.map(|[x, y, z, _]| [x, y, z]).collect()),
        faces: faces_for_mode(primitive.mode(), &indices),
        positions,
        ..Default::default()
    };
    if let Some(colors) = reader.read_colors(0) {
        out.colors.push(colors.into_rgba_f32().collect());
    }
    if let Some(uvs) = reader.read_tex_coords(0) {
        out.tex_coords.push(uvs.into_f32().map(|[u, v]| [u, v, 0.0]).collect());
    }
    out.update_primitive_types();
    Some(out)
}

/// Split an index list into faces, unrolling strips, loops and fans.
fn faces_for_mode(mode: Mode, indices: &[u32]) -> Vec<Vec<u32>> {
    match mode {
        Mode::Points => indices.iter().map(|&i| vec![i]).collect(),
        Mode::Lines => indices.chunks_exact(2).map(<[u32]>::to_vec).collect(),
        Mode::LineStrip => indices.windows(2).map(<[u32]>::to_vec).collect(),
        Mode::LineLoop => {
            let mut faces: Vec<Vec<u32>> = indices.windows(2).map(<[u32]>::to_vec).collect();
            if let (Some(&first), Some(&last)) = (indices.first(), indices.last()) {
                if indices.len() > 2 {
                    faces.push(vec![last, first]);
                }
            }
            faces
        }
        Mode::Triangles => indices.chunks_exact(3).map(<[u32]>::to_vec).collect(),
        Mode::TriangleStrip => indices
            .windows(3)
            .enumerate()
            .map(|(i, w)| {
                if i % 2 == 0 {
                    vec![w[0], w[1], w[2]]
                } else {
                    vec![w[1], w[0], w[2]]
                }
            })
            .collect(),
        Mode::TriangleFan => match indices.split_first() {
            Some((&center, rest)) => rest.windows(2).map(|w| vec![center, w[0], w[1]]).collect(),
            None => Vec::new(),
        },
    }
}

fn convert_node(node: &gltf::Node, primitive_ranges: &[std::ops::Range<usize>]) -> Node {
    let mut out = Node::new(node.name().map(str::to_string));
    out.transform = columns_to_row_major(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        if let Some(range) = primitive_ranges.get(mesh.index()) {
            out.meshes.extend(range.clone());
        }
    }
    out.children = node
        .children()
        .map(|child| convert_node(&child, primitive_ranges))
        .collect();
    out
}
