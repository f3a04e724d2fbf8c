use geom_playground::{
    ImportOptions, Matrix4, Playground, Vector3,
    data_structures::{
        document::{MagFilter, MeshId, ObjectData, ObjectId, SamplerData, ViewType},
        memory::MemoryDocument,
        scene_graph::{MaterialKey, TextureType},
    },
    resources::{load_scene, sampler::needs_nearest_sampler},
};

use crate::common::test_utils::*;

mod common;

fn named<'a>(doc: &'a MemoryDocument, name: &str) -> (ObjectId, &'a ObjectData) {
    doc.objects()
        .iter()
        .enumerate()
        .find(|(_, o)| o.name.as_deref() == Some(name) && o.mesh.is_none())
        .map(|(i, o)| (ObjectId(i as u32), o))
        .unwrap_or_else(|| panic!("no object named {name}"))
}

fn mesh_below(doc: &MemoryDocument, parent: ObjectId) -> MeshId {
    let children = doc.children_of(parent);
    assert_eq!(children.len(), 1);
    let holder = doc.object(children[0]).unwrap();
    assert!(holder.is_hidden());
    holder.mesh.unwrap()
}

#[test]
fn shared_meshes_and_textures_are_converted_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_textured_glb(dir.path(), "shared", GL_LINEAR);

    let mut playground = Playground::new(MemoryDocument::new(), ImportOptions::default());
    playground.add_model(&path).unwrap();
    let doc = playground.document();

    // Two glTF meshes, the first referenced by two nodes.
    assert_eq!(doc.meshes().len(), 2);
    let (first, _) = named(doc, "first");
    let (second, _) = named(doc, "second");
    let (third, _) = named(doc, "third");
    assert_ne!(first, second);
    assert_eq!(mesh_below(doc, first), mesh_below(doc, second));
    assert_ne!(mesh_below(doc, first), mesh_below(doc, third));

    // Two materials, one texture chain.
    assert_eq!(doc.materials().len(), 2);
    assert_eq!(doc.textures().len(), 1);
    assert_eq!(doc.images().len(), 1);
    assert_eq!(doc.buffer_views().len(), 1);
    assert_eq!(doc.buffers().len(), 1);
    assert!(doc.samplers().is_empty());
    let texture_refs: Vec<_> = doc
        .materials()
        .iter()
        .map(|m| m.pbr_info.base_color_texture.as_ref().unwrap().source)
        .collect();
    assert_eq!(texture_refs[0], texture_refs[1]);

    let buffer = &doc.buffers()[0];
    assert_eq!(buffer.name, "Buffer for *0");
    assert_eq!(buffer.bytes, tiny_png());
    let view = &doc.buffer_views()[0];
    assert_eq!(view.view_type, ViewType::ImageInfo);
    assert_eq!(view.offset, 0);
    assert_eq!(view.length, buffer.bytes.len() as u64);
    assert_eq!(doc.textures()[0].sampler, None);
}

#[test]
fn gltf_materials_keep_their_factors() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_textured_glb(dir.path(), "factors", GL_LINEAR);

    let mut playground = Playground::new(MemoryDocument::new(), ImportOptions::default());
    playground.add_model(&path).unwrap();
    let materials = playground.document().materials();

    let red = materials.iter().find(|m| m.name.as_deref() == Some("red")).unwrap();
    assert_eq!(red.pbr_info.base_color, [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(red.pbr_info.metallic, 0.0);
    assert_eq!(red.pbr_info.roughness, 0.5);
    assert_eq!(red.double_sided, Some(false));

    let blue = materials.iter().find(|m| m.name.as_deref() == Some("blue")).unwrap();
    assert_eq!(blue.pbr_info.metallic, 1.0);
    assert_eq!(blue.double_sided, Some(true));
}

#[test]
fn double_sided_option_overrides_materials() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_textured_glb(dir.path(), "forced", GL_LINEAR);

    let mut playground = Playground::new(MemoryDocument::new(), ImportOptions::new(true));
    playground.add_model(&path).unwrap();
    assert!(
        playground
            .document()
            .materials()
            .iter()
            .all(|m| m.double_sided == Some(true))
    );
}

#[test]
fn node_transforms_arrive_column_major() {
    let dir = tempfile::tempdir().unwrap();
    let glb = write_textured_glb(dir.path(), "moved", GL_LINEAR);
    let gltf = write_external_gltf(dir.path(), "placed");

    let mut playground = Playground::new(MemoryDocument::new(), ImportOptions::default());
    playground.load([&glb, &gltf]);
    assert_eq!(playground.models().len(), 2);
    let doc = playground.document();

    let (_, second) = named(doc, "second");
    assert_eq!(
        second.transform,
        Some(Matrix4::from_translation(Vector3::new(2.0, 0.0, 0.0)))
    );
    let (_, first) = named(doc, "first");
    assert_eq!(first.transform, Some(Matrix4::from_scale(1.0)));
    let (_, placed) = named(doc, "placed");
    assert_eq!(
        placed.transform,
        Some(Matrix4::from_translation(Vector3::new(0.0, 0.0, 3.0)))
    );
}

#[test]
fn external_gltf_textures_resolve_next_to_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_external_gltf(dir.path(), "outside");

    let mut playground = Playground::new(MemoryDocument::new(), ImportOptions::default());
    playground.add_model(&path).unwrap();
    let doc = playground.document();

    assert_eq!(doc.textures().len(), 1);
    assert_eq!(doc.textures()[0].name, "outside.png");
    assert_eq!(doc.buffers()[0].bytes, tiny_png());
    let mesh = &doc.meshes()[0];
    assert_eq!(mesh.indices, vec![0, 1, 2]);
    let material = doc.material(mesh.material).unwrap();
    assert!(material.pbr_info.base_color_texture.is_some());
}

#[test]
fn nearest_filtering_forces_samplers() {
    let dir = tempfile::tempdir().unwrap();
    let nearest = write_textured_glb(dir.path(), "pixel_art", GL_NEAREST);
    let smooth = write_textured_glb(dir.path(), "smooth", GL_LINEAR);
    assert!(needs_nearest_sampler(&nearest));
    assert!(!needs_nearest_sampler(&smooth));

    let mut playground = Playground::new(MemoryDocument::new(), ImportOptions::default());
    playground.add_model(&nearest).unwrap();
    let doc = playground.document();
    assert!(!doc.textures().is_empty());
    for texture in doc.textures() {
        let sampler = texture.sampler.expect("texture without sampler");
        assert_eq!(doc.samplers()[sampler.0 as usize], SamplerData::nearest_clamped());
    }
    assert_eq!(doc.samplers()[0].mag_filter, MagFilter::Nearest);

    // The decision is made per file.
    playground.add_model(&smooth).unwrap();
    let doc = playground.document();
    assert_eq!(doc.textures().len(), 2);
    assert_eq!(doc.textures()[1].sampler, None);
    assert_eq!(doc.samplers().len(), 1);
}

#[test]
fn obj_files_become_generic_scenes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_obj(dir.path(), "crate");

    let scene = load_scene(&path).unwrap();
    assert_eq!(scene.meshes.len(), 1);
    let mesh = &scene.meshes[0];
    assert_eq!(mesh.positions.len(), 3);
    assert_eq!(mesh.faces.len(), 1);
    assert_eq!(mesh.normals.as_ref().map(Vec::len), Some(3));
    assert!(mesh.has_tex_coords(0));
    // OBJ UVs are flipped to a top-left origin.
    assert_eq!(mesh.tex_coords[0][0], [0.0, 1.0, 0.0]);

    let material = &scene.materials[mesh.material_index];
    assert_eq!(material.name(), Some("wood"));
    assert_eq!(
        material.color(MaterialKey::DiffuseColor),
        Some([0.5, 0.25, 1.0, 1.0])
    );
    assert_eq!(material.texture(TextureType::Diffuse, 0), Some("wood.bmp"));
}

#[test]
fn obj_diffuse_maps_are_reencoded() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_obj(dir.path(), "barrel");

    let mut playground = Playground::new(MemoryDocument::new(), ImportOptions::default());
    playground.add_model(&path).unwrap();
    let doc = playground.document();

    let mesh = &doc.meshes()[0];
    assert!(mesh.normals.is_some());
    assert_eq!(mesh.textures.as_ref().map(Vec::len), Some(3));
    let material = doc.material(mesh.material).unwrap();
    assert_eq!(material.pbr_info.base_color, [0.5, 0.25, 1.0, 1.0]);
    assert!(material.pbr_info.base_color_texture.is_some());

    let png = &doc.buffers()[0].bytes;
    assert_eq!(image::guess_format(png).unwrap(), image::ImageFormat::Png);
    assert_eq!(doc.buffers()[0].name, "Buffer for wood.bmp");
}
