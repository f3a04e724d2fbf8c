#![allow(dead_code)]

use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde_json::{Value, json};

/// `magFilter` value glTF uses for nearest filtering.
pub const GL_NEAREST: u32 = 9728;
pub const GL_LINEAR: u32 = 9729;

pub fn ne_bytes_f32(values: impl IntoIterator<Item = f32>) -> Vec<u8> {
    values.into_iter().flat_map(f32::to_ne_bytes).collect()
}

pub fn ne_bytes_i32(values: impl IntoIterator<Item = i32>) -> Vec<u8> {
    values.into_iter().flat_map(i32::to_ne_bytes).collect()
}

/// A `DataItem` element pointing at `path`.
pub fn data_item(
    name: &str,
    data_type: &str,
    precision: u32,
    seek: u64,
    dims: &str,
    path: &str,
) -> String {
    format!(
        r#"<DataItem Name="{name}" Format="Binary" DataType="{data_type}" Precision="{precision}" Seek="{seek}" Dimensions="{dims}">{path}</DataItem>"#
    )
}

/// A `Grid` element with a time step, a topology and a geometry.
pub fn grid(topology_type: &str, elements: usize, conn_item: &str, coord_item: &str) -> String {
    format!(
        r#"<Grid Name="mesh" GridType="Uniform">
      <Time Value="0.0"/>
      <Topology TopologyType="{topology_type}" NumberOfElements="{elements}">
        {conn_item}
      </Topology>
      <Geometry GeometryType="XYZ">
        {coord_item}
      </Geometry>
    </Grid>"#
    )
}

pub fn xdmf_document(grids: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" ?>
<Xdmf Version="2.0">
  <Domain>
    {}
  </Domain>
</Xdmf>
"#,
        grids.join("\n    ")
    )
}

/// Write a single-grid XDMF file with 4-byte floats and ints next to its data files.
pub fn write_grid(dir: &Path, name: &str, positions: &[[f32; 3]], indices: &[i32]) -> PathBuf {
    let coord = format!("{name}_coord.bin");
    let conn = format!("{name}_conn.bin");
    fs::write(dir.join(&coord), ne_bytes_f32(positions.iter().flatten().copied())).unwrap();
    fs::write(dir.join(&conn), ne_bytes_i32(indices.iter().copied())).unwrap();

    let xml = xdmf_document(&[grid(
        "Triangle",
        indices.len() / 3,
        &data_item("Conn", "Int", 4, 0, &indices.len().to_string(), &conn),
        &data_item(
            "Coord",
            "Float",
            4,
            0,
            &format!("{} 3", positions.len()),
            &coord,
        ),
    )]);
    let path = dir.join(format!("{name}.xmf"));
    fs::write(&path, xml).unwrap();
    path
}

pub fn tiny_png() -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([200, 100, 50, 255])));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn tiny_bmp() -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255])));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Bmp).unwrap();
    out.into_inner()
}

fn pad_to_four(bytes: &mut Vec<u8>, fill: u8) {
    while bytes.len() % 4 != 0 {
        bytes.push(fill);
    }
}

/// Pack a JSON document and a binary chunk into a GLB container.
pub fn glb_container(json: &Value, bin: &[u8]) -> Vec<u8> {
    let mut json_bytes = serde_json::to_vec(json).unwrap();
    pad_to_four(&mut json_bytes, b' ');
    let mut bin_bytes = bin.to_vec();
    pad_to_four(&mut bin_bytes, 0);

    let total = 12 + 8 + json_bytes.len() + 8 + bin_bytes.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&json_bytes);
    out.extend_from_slice(&(bin_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(b"BIN\0");
    out.extend_from_slice(&bin_bytes);
    out
}

/// Triangle (0,0,0) (1,0,0) (0,1,0) followed by its `u16` indices, padded to 44 bytes.
fn triangle_bin() -> Vec<u8> {
    let mut bin = ne_bytes_f32([0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    for i in [0u16, 1, 2] {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    pad_to_four(&mut bin, 0);
    bin
}

fn triangle_accessors() -> Value {
    json!([
        {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
         "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
        {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}
    ])
}

/// A GLB with three nodes: `first` and `second` share mesh 0, `third` uses mesh 1.
/// Both meshes have their own material, and both materials use the same embedded PNG.
/// `second` is translated by (2, 0, 0).
pub fn write_textured_glb(dir: &Path, name: &str, mag_filter: u32) -> PathBuf {
    let png = tiny_png();
    let mut bin = triangle_bin();
    let image_offset = bin.len();
    bin.extend_from_slice(&png);

    let json = json!({
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": [0, 1, 2]}],
        "nodes": [
            {"name": "first", "mesh": 0},
            {"name": "second", "mesh": 0, "translation": [2.0, 0.0, 0.0]},
            {"name": "third", "mesh": 1}
        ],
        "meshes": [
            {"name": "tri_a", "primitives": [{"attributes": {"POSITION": 0}, "indices": 1, "material": 0}]},
            {"name": "tri_b", "primitives": [{"attributes": {"POSITION": 0}, "indices": 1, "material": 1}]}
        ],
        "materials": [
            {"name": "red", "pbrMetallicRoughness": {
                "baseColorFactor": [1.0, 0.0, 0.0, 1.0],
                "baseColorTexture": {"index": 0},
                "metallicFactor": 0.0,
                "roughnessFactor": 0.5
            }},
            {"name": "blue", "doubleSided": true, "pbrMetallicRoughness": {
                "baseColorFactor": [0.0, 0.0, 1.0, 1.0],
                "baseColorTexture": {"index": 0}
            }}
        ],
        "textures": [{"source": 0, "sampler": 0}],
        "samplers": [{"magFilter": mag_filter, "minFilter": 9987}],
        "images": [{"bufferView": 2, "mimeType": "image/png"}],
        "accessors": triangle_accessors(),
        "bufferViews": [
            {"buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962},
            {"buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963},
            {"buffer": 0, "byteOffset": image_offset, "byteLength": png.len()}
        ],
        "buffers": [{"byteLength": bin.len()}]
    });

    let path = dir.join(format!("{name}.glb"));
    fs::write(&path, glb_container(&json, &bin)).unwrap();
    path
}

/// A text glTF with an external buffer and an external PNG. The single node carries
/// a full matrix translating by (0, 0, 3).
pub fn write_external_gltf(dir: &Path, name: &str) -> PathBuf {
    let bin = triangle_bin();
    fs::write(dir.join(format!("{name}.bin")), &bin).unwrap();
    fs::write(dir.join(format!("{name}.png")), tiny_png()).unwrap();

    let json = json!({
        "asset": {"version": "2.0"},
        "scenes": [{"nodes": [0]}],
        "nodes": [{
            "name": "placed",
            "mesh": 0,
            "matrix": [1.0, 0.0, 0.0, 0.0,
                       0.0, 1.0, 0.0, 0.0,
                       0.0, 0.0, 1.0, 0.0,
                       0.0, 0.0, 3.0, 1.0]
        }],
        "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "indices": 1, "material": 0}]}],
        "materials": [{"pbrMetallicRoughness": {"baseColorTexture": {"index": 0}}}],
        "textures": [{"source": 0}],
        "images": [{"uri": format!("{name}.png")}],
        "accessors": triangle_accessors(),
        "bufferViews": [
            {"buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962},
            {"buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963}
        ],
        "buffers": [{"byteLength": bin.len(), "uri": format!("{name}.bin")}]
    });

    let path = dir.join(format!("{name}.gltf"));
    fs::write(&path, serde_json::to_vec_pretty(&json).unwrap()).unwrap();
    path
}

/// An OBJ triangle with normals and UVs whose material uses a BMP diffuse map.
pub fn write_obj(dir: &Path, name: &str) -> PathBuf {
    fs::write(dir.join("wood.bmp"), tiny_bmp()).unwrap();
    fs::write(
        dir.join(format!("{name}.mtl")),
        "newmtl wood\nKd 0.5 0.25 1.0\nd 1.0\nmap_Kd wood.bmp\n",
    )
    .unwrap();
    let obj = format!(
        "mtllib {name}.mtl\n\
         o tri\n\
         v 0 0 0\nv 2 0 0\nv 0 2 0\n\
         vt 0 0\nvt 1 0\nvt 0 1\n\
         vn 0 0 1\n\
         usemtl wood\n\
         f 1/1/1 2/2/1 3/3/1\n"
    );
    let path = dir.join(format!("{name}.obj"));
    fs::write(&path, obj).unwrap();
    path
}
