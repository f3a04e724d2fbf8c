//! Conversion of a generic [`Scene`] into document entities.
//!
//! The importer walks the node hierarchy depth-first. Every node becomes an
//! object; every mesh a node references becomes a hidden child object carrying
//! the converted mesh. Meshes are converted once per source mesh and textures
//! once per path, however often they are referenced.

use std::{
    borrow::Cow,
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError},
};

use cgmath::{Matrix3, SquareMatrix};

use crate::{
    config::ImportOptions,
    data_structures::{
        document::{
            BufferData, BufferViewData, Document, EntityCallbacks, ImageData, MaterialData,
            MaterialId, MeshId, MeshSource, ObjectData, ObjectId, PbrInfo, PrimitiveType,
            SamplerData, TextureData, TextureId, TextureRef, ViewType, names,
        },
        model::{Model, ModelCallbacks, ModelPtr},
        scene_graph::{
            Material, MaterialKey, Node, PrimitiveTypes, Scene, TextureType, embedded_index,
        },
        texture,
        transform::row_major_to_column_major,
    },
    error::{ImportError, Result},
};

/// Import `scene` below `root` as model `id`.
///
/// `source_dir` is the directory of the file the scene came from; external
/// texture paths are resolved against it.
pub fn import_scene(
    scene: &Scene,
    doc: &mut dyn Document,
    root: ObjectId,
    id: i32,
    options: ImportOptions,
    source_dir: &Path,
) -> ModelPtr {
    let model = Model::new(id).into_shared();
    {
        let mut guard = model.lock().unwrap_or_else(PoisonError::into_inner);
        let mut importer = SceneImporter {
            scene,
            doc,
            model: &mut guard,
            callbacks: Arc::new(ModelCallbacks::new(&model)),
            options,
            source_dir: source_dir.to_path_buf(),
            converted_meshes: HashMap::new(),
            converted_textures: HashMap::new(),
        };
        importer.process_import_tree(&scene.root, root);
        log::debug!(
            "Model {}: {} meshes, {} textures, bounds {:?}",
            id,
            importer.converted_meshes.len(),
            importer.converted_textures.len(),
            importer.model.bounds
        );
    }
    model
}

struct SceneImporter<'a> {
    scene: &'a Scene,
    doc: &'a mut dyn Document,
    model: &'a mut Model,
    callbacks: Arc<dyn EntityCallbacks>,
    options: ImportOptions,
    source_dir: PathBuf,
    converted_meshes: HashMap<usize, MeshId>,
    /// Failures are remembered too, so a broken texture is only reported once.
    converted_textures: HashMap<String, Option<TextureId>>,
}

impl SceneImporter<'_> {
    fn process_import_tree(&mut self, node: &Node, parent: ObjectId) {
        let is_primary = self.model.object.is_none();
        let object = self.doc.create_object(ObjectData {
            name: node.name.clone(),
            parent: Some(parent),
            transform: Some(row_major_to_column_major(&node.transform)),
            callbacks: is_primary.then(|| self.callbacks.clone()),
            ..Default::default()
        });
        self.model.register_object(object);

        for &mesh_index in &node.meshes {
            let Some(mesh) = self.import_mesh(mesh_index) else {
                continue;
            };
            let holder = self.doc.create_object(ObjectData {
                name: node.name.clone(),
                parent: Some(object),
                mesh: Some(mesh),
                tags: Some(vec![names::TAG_USER_HIDDEN.to_string()]),
                ..Default::default()
            });
            self.model.register_object(holder);
        }

        for child in &node.children {
            self.process_import_tree(child, object);
        }
    }

    fn import_mesh(&mut self, mesh_index: usize) -> Option<MeshId> {
        if let Some(&id) = self.converted_meshes.get(&mesh_index) {
            return Some(id);
        }
        let scene = self.scene;
        let Some(mesh) = scene.meshes.get(mesh_index) else {
            log::warn!("Node references missing mesh {}", mesh_index);
            return None;
        };

        for p in &mesh.positions {
            self.model.bounds.extend(p);
        }

        let material = self.import_material(mesh.material_index);

        let normals = mesh
            .normals
            .as_deref()
            .or(mesh.tangents.as_deref())
            .map(Cow::Borrowed);

        let colors = mesh.has_colors(0).then(|| {
            mesh.colors[0]
                .iter()
                .map(|c| c.map(|v| (v * 255.0) as u8))
                .collect()
        });

        let textures = mesh.has_tex_coords(0).then(|| {
            mesh.tex_coords[0]
                .iter()
                .map(|uv| [(uv[0] * 65535.0) as u16, (uv[1] * 65535.0) as u16])
                .collect()
        });

        let primitive = if mesh.primitive_types.contains(PrimitiveTypes::LINE)
            && !mesh.primitive_types.contains(PrimitiveTypes::TRIANGLE)
        {
            PrimitiveType::Line
        } else {
            PrimitiveType::Triangle
        };
        let per_face = match primitive {
            PrimitiveType::Line => 2,
            PrimitiveType::Triangle => 3,
        };

        let mut indices = Vec::with_capacity(mesh.faces.len() * per_face);
        for face in &mesh.faces {
            if face.len() < per_face {
                log::warn!(
                    "Skipping face with {} indices in mesh '{}' ({:?} needs {})",
                    face.len(),
                    mesh.name,
                    primitive,
                    per_face
                );
                continue;
            }
            indices.extend_from_slice(&face[..per_face]);
        }

        let id = self.doc.create_mesh(MeshSource {
            material,
            positions: Cow::Borrowed(mesh.positions.as_slice()),
            normals,
            colors,
            textures,
            indices,
            primitive,
        });
        self.converted_meshes.insert(mesh_index, id);
        Some(id)
    }

    fn import_material(&mut self, material_index: usize) -> MaterialId {
        let scene = self.scene;
        let fallback = Material::default();
        let material = scene.materials.get(material_index).unwrap_or_else(|| {
            log::warn!("Missing material {}, using defaults", material_index);
            &fallback
        });

        let base_color = material
            .color(MaterialKey::BaseColor)
            .or_else(|| material.color(MaterialKey::DiffuseColor))
            .unwrap_or([1.0; 4]);
        let metallic = material
            .float(MaterialKey::MetallicFactor)
            .or_else(|| material.float(MaterialKey::SpecularFactor))
            .unwrap_or(1.0);
        let roughness = material
            .float(MaterialKey::RoughnessFactor)
            .or_else(|| material.float(MaterialKey::GlossinessFactor))
            .unwrap_or(1.0);
        let double_sided = if self.options.double_sided {
            Some(true)
        } else {
            material.flag(MaterialKey::TwoSided)
        };

        let base_color_texture = find_texture_type(material)
            .and_then(|path| self.import_texture(path))
            .map(|source| TextureRef {
                source,
                transform: Matrix3::identity(),
                texture_coord_slot: 0,
            });

        self.doc.create_material(MaterialData {
            name: material.name().map(str::to_string),
            pbr_info: PbrInfo {
                base_color,
                base_color_texture,
                metallic,
                roughness,
            },
            double_sided,
        })
    }

    fn import_texture(&mut self, path: &str) -> Option<TextureId> {
        if let Some(known) = self.converted_textures.get(path) {
            return *known;
        }

        let prepared = match embedded_index(path) {
            Some(index) => self.prepare_embedded(index),
            None => self.prepare_external(path),
        };
        let id = match prepared {
            Ok(bytes) => Some(self.publish_texture(path, bytes)),
            Err(e) => {
                log::warn!("Dropping texture {}: {}", path, e);
                None
            }
        };
        self.converted_textures.insert(path.to_string(), id);
        id
    }

    fn prepare_embedded(&self, index: usize) -> Result<Vec<u8>> {
        let embedded = self.scene.textures.get(index).ok_or_else(|| {
            ImportError::ResourceUnavailable(format!("no embedded texture {index}"))
        })?;
        if embedded.is_compressed() {
            let hint = (!embedded.format_hint.is_empty()).then_some(embedded.format_hint.as_str());
            texture::from_bytes(&embedded.data, hint)
        } else {
            texture::from_bgra_texels(embedded.width, embedded.height, &embedded.data)
        }
    }

    fn prepare_external(&self, path: &str) -> Result<Vec<u8>> {
        let given = Path::new(path);
        let relative = self.source_dir.join(given);
        let resolved = if given.exists() {
            given
        } else if relative.exists() {
            relative.as_path()
        } else {
            return Err(ImportError::ResourceUnavailable(format!(
                "texture file {path} not found"
            )));
        };
        log::debug!("Loading texture {}", resolved.display());
        texture::from_path(resolved)
    }

    /// Create buffer, view, image, optional sampler and texture for one prepared image.
    fn publish_texture(&mut self, name: &str, bytes: Vec<u8>) -> TextureId {
        let length = bytes.len() as u64;
        let buffer = self.doc.create_buffer(BufferData {
            name: format!("Buffer for {name}"),
            bytes,
        });
        let view = self.doc.create_buffer_view(BufferViewData {
            source_buffer: buffer,
            view_type: ViewType::ImageInfo,
            offset: 0,
            length,
        });
        let image = self.doc.create_image(ImageData {
            name: name.to_string(),
            source: view,
        });
        let sampler = self
            .options
            .force_samplers_to_nearest
            .then(|| self.doc.create_sampler(SamplerData::nearest_clamped()));
        self.doc.create_texture(TextureData {
            name: name.to_string(),
            image,
            sampler,
        })
    }
}

/// The texture used as base color: the first base color slot, else the first diffuse slot.
fn find_texture_type(material: &Material) -> Option<&str> {
    [TextureType::BaseColor, TextureType::Diffuse]
        .into_iter()
        .find(|&ty| material.texture_count(ty) > 0)
        .and_then(|ty| material.texture(ty, 0))
}
