use std::path::Path;

use crate::{
    data_structures::scene_graph::{
        Material, MaterialKey, MaterialProperty, Mesh, Node, Scene, TextureType,
    },
    error::Result,
};

/**
 * Wavefront OBJ (plus its .mtl) to generic scene.
 *
 * Every object of the file becomes one child node of the root with a single mesh.
 * Faces are triangulated and all attributes share one index, so positions, normals,
 * texture coordinates and colors line up per vertex.
 *
 * OBJ texture coordinates have their origin bottom-left; they are flipped to the
 * top-left origin used by glTF so both formats arrive in the same convention.
 */
pub fn load_obj(path: &Path) -> Result<Scene> {
    log::debug!("Loading OBJ {}", path.display());
    let (models, obj_materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )?;

    let mut materials: Vec<Material> = match obj_materials {
        Ok(materials) => materials.iter().map(convert_material).collect(),
        Err(e) => {
            log::warn!("Materials of {} could not be loaded: {}", path.display(), e);
            Vec::new()
        }
    };
    let default_material = materials.len();
    let mut needs_default = false;

    let mut root = Node::new(
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned()),
    );
    let mut meshes = Vec::with_capacity(models.len());
    for model in &models {
        let m = &model.mesh;
        if m.positions.is_empty() {
            log::warn!("Object {} in {} has no vertices", model.name, path.display());
            continue;
        }

        let material_index = match m.material_id {
            Some(id) if id < default_material => id,
            _ => {
                needs_default = true;
                default_material
            }
        };

        let mut mesh = Mesh::from_triangles(&model.name, triples(&m.positions), &m.indices);
        mesh.material_index = material_index;
        if !m.normals.is_empty() {
            mesh.normals = Some(triples(&m.normals));
        }
        if !m.vertex_color.is_empty() {
            mesh.colors.push(
                triples(&m.vertex_color)
                    .into_iter()
                    .map(|[r, g, b]| [r, g, b, 1.0])
                    .collect(),
            );
        }
        if !m.texcoords.is_empty() {
            mesh.tex_coords.push(
                m.texcoords
                    .chunks_exact(2)
                    .map(|uv| [uv[0], 1.0 - uv[1], 0.0])
                    .collect(),
            );
        }

        let mut node = Node::new(Some(model.name.clone()));
        node.meshes.push(meshes.len());
        root.children.push(node);
        meshes.push(mesh);
    }
    if needs_default {
        materials.push(Material::default());
    }

    Ok(Scene {
        root,
        meshes,
        materials,
        textures: Vec::new(),
    })
}

fn triples(flat: &[f32]) -> Vec<[f32; 3]> {
    flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
}

fn convert_material(m: &tobj::Material) -> Material {
    let mut out = Material::default();
    out.set(MaterialKey::Name, MaterialProperty::Text(m.name.clone()));
    if let Some([r, g, b]) = m.diffuse {
        let alpha = m.dissolve.unwrap_or(1.0);
        out.set(MaterialKey::DiffuseColor, MaterialProperty::Color([r, g, b, alpha]));
    }
    if let Some(texture) = &m.diffuse_texture {
        out.add_texture(TextureType::Diffuse, texture.clone());
    }
    out
}
