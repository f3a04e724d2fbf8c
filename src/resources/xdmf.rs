//! XDMF grid importer.
//!
//! Supports the subset needed to bring simulation output into a scene: a
//! `Domain` of `Grid`s, each with a `Time`, a triangle `Topology` and an `XYZ`
//! `Geometry` whose `DataItem`s point at raw binary arrays next to the document.
//!
//! ```xml
//! <Xdmf>
//!   <Domain>
//!     <Grid>
//!       <Time Value="0.5"/>
//!       <Topology TopologyType="Triangle" NumberOfElements="1">
//!         <DataItem Name="Conn" Format="Binary" DataType="Int" Precision="4" Seek="0" Dimensions="3">conn.bin</DataItem>
//!       </Topology>
//!       <Geometry GeometryType="XYZ">
//!         <DataItem Name="Coord" Format="Binary" DataType="Float" Precision="4" Seek="0" Dimensions="9">coord.bin</DataItem>
//!       </Geometry>
//!     </Grid>
//!   </Domain>
//! </Xdmf>
//! ```
//!
//! The result is an ordinary [`Scene`]: one root node holding one mesh per grid and
//! a single default material.

use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use walkdir::WalkDir;

use crate::{
    data_structures::scene_graph::{Material, Mesh, Node as SceneNode, Scene},
    error::{ImportError, Result},
    resources::mapped::{ElementKind, MappedArray},
};

pub const EXTENSION: &str = "xmf";

pub fn can_read(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(EXTENSION))
}

/// Load an XDMF document into a scene.
pub fn load_xdmf(path: &Path) -> Result<Scene> {
    log::debug!("Loading XMF {}", path.display());
    let text = std::fs::read_to_string(path)
        .map_err(|e| ImportError::decode(path, format!("unreadable file: {e}")))?;
    XdmfImporter::new(path).parse(&text)
}

/// Map `Format`/`Precision` of a `DataItem` to an element kind.
///
/// Unknown precisions fall back to the 4-byte kind of the same format, unknown
/// formats to 4-byte floats.
pub fn convert_data_type(format: &str, precision: i64) -> ElementKind {
    match (format, precision) {
        ("Float", 4) => ElementKind::Float32,
        ("Float", 8) => ElementKind::Float64,
        ("Int", 4) => ElementKind::Int32,
        ("Int", 8) => ElementKind::Int64,
        ("Float", _) => {
            log::warn!("Unsupported float precision {}, assuming 4 bytes", precision);
            ElementKind::Float32
        }
        ("Int", _) => {
            log::warn!("Unsupported int precision {}, assuming 4 bytes", precision);
            ElementKind::Int32
        }
        _ => {
            log::warn!("Unsupported format, expect badness: {} {}", format, precision);
            ElementKind::Float32
        }
    }
}

/// Total element count of a `Dimensions` attribute such as `"12 3"`.
fn parse_dimensions(dims: &str) -> Option<usize> {
    dims.split_whitespace()
        .map(|d| d.parse::<usize>().ok())
        .try_fold(1usize, |acc, d| Some(acc.saturating_mul(d?)))
        .filter(|_| !dims.trim().is_empty())
}

fn first_child<'a, 'input>(element: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    element.descendants().skip(1).find(|n| n.has_tag_name(tag))
}

struct XdmfImporter {
    file_path: PathBuf,
    directory: PathBuf,
}

impl XdmfImporter {
    fn new(file_path: &Path) -> Self {
        let directory = match file_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self {
            file_path: file_path.to_path_buf(),
            directory,
        }
    }

    fn error(&self, reason: impl Into<String>) -> ImportError {
        ImportError::decode(&self.file_path, reason)
    }

    fn parse(&self, text: &str) -> Result<Scene> {
        let document = Document::parse(text)
            .map_err(|e| self.error(format!("unable to read XML document: {e}")))?;

        let mut meshes = Vec::new();
        let mut failures = Vec::new();
        for domain in document
            .root_element()
            .children()
            .filter(|n| n.has_tag_name("Domain"))
        {
            log::debug!("Loading Domain...");
            for grid in domain.children().filter(|n| n.has_tag_name("Grid")) {
                match self.consume_grid(grid) {
                    Ok(mesh) => meshes.push(mesh),
                    Err(e) => {
                        log::warn!("Skipping grid: {}", e);
                        failures.push(e);
                    }
                }
            }
        }

        if meshes.is_empty() {
            return Err(failures
                .into_iter()
                .next()
                .unwrap_or_else(|| self.error("no Domain/Grid to import")));
        }

        let mut root = SceneNode::new(None);
        root.meshes = (0..meshes.len()).collect();
        Ok(Scene {
            root,
            meshes,
            materials: vec![Material::default()],
            textures: Vec::new(),
        })
    }

    fn consume_grid(&self, grid: Node) -> Result<Mesh> {
        log::debug!("Loading Grid...");
        let (Some(time), Some(topology), Some(geometry)) = (
            first_child(grid, "Time"),
            first_child(grid, "Topology"),
            first_child(grid, "Geometry"),
        ) else {
            return Err(self.error("grid is missing Time, Topology or Geometry"));
        };

        log::info!(
            "Importing XDMF at time {}",
            time.attribute("Value").unwrap_or("<unset>")
        );

        let (conn, expected) = self.consume_conn(topology)?;
        let geom = self.consume_geom(geometry)?;

        let positions = geom.to_vec3s();
        let indices = conn.to_indices();
        drop((conn, geom));

        let mesh = Mesh::from_triangles("imported", positions, &indices);
        let triangles = mesh.faces.len();
        if expected != triangles && expected != triangles * 3 {
            log::warn!(
                "Topology declares {} elements but {} triangles were decoded",
                expected,
                triangles
            );
        }
        log::debug!(
            "Grid mesh: {} positions, {} triangles",
            mesh.positions.len(),
            triangles
        );
        Ok(mesh)
    }

    /// Returns the connectivity array and the declared element count.
    fn consume_conn(&self, topology: Node) -> Result<(MappedArray, usize)> {
        if topology.attribute("TopologyType") != Some("Triangle") {
            return Err(self.error("topology type is not supported (triangles only)"));
        }

        let Some(count) = topology
            .attribute("NumberOfElements")
            .and_then(|n| n.trim().parse::<usize>().ok())
        else {
            return Err(self.error("missing number of topology elements"));
        };
        log::debug!("Connectivity count {}", count);

        let data_item = first_child(topology, "DataItem")
            .filter(|item| item.attribute("Name") == Some("Conn"))
            .ok_or_else(|| self.error("missing connectivity data"))?;

        let data = self.get_data(data_item)?;
        Ok((data, count))
    }

    fn consume_geom(&self, geometry: Node) -> Result<MappedArray> {
        if geometry.attribute("GeometryType") != Some("XYZ") {
            return Err(self.error("unknown geometry type (XYZ only)"));
        }

        let data_item = geometry
            .descendants()
            .filter(|n| n.has_tag_name("DataItem"))
            .find(|item| item.attribute("Name") == Some("Coord"))
            .ok_or_else(|| self.error("missing coordinate data"))?;

        self.get_data(data_item)
    }

    fn get_data(&self, item: Node) -> Result<MappedArray> {
        let format = item.attribute("Format").unwrap_or_default();
        let precision = item
            .attribute("Precision")
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(-1);
        let data_type = item.attribute("DataType").unwrap_or_default();
        let seek = item
            .attribute("Seek")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(0);
        let dims = item.attribute("Dimensions").and_then(parse_dimensions);

        log::info!(
            "Fetching data with format {} precision {} data type {} seek {} dims {:?}",
            format,
            precision,
            data_type,
            seek,
            dims
        );

        if format != "Binary" {
            return Err(self.error(format!("unsupported data format '{format}'")));
        }

        let reference = item.text().unwrap_or_default();
        let data_path = self
            .resolve_path(reference)
            .ok_or_else(|| self.error(format!("unable to find data file '{}'", reference.trim())))?;

        let mut data = MappedArray::open(&data_path, seek, None)
            .with_kind(convert_data_type(data_type, precision));
        if data.is_empty() {
            return Err(self.error(format!("no data mapped from {}", data_path.display())));
        }
        if let Some(dims) = dims {
            data.reset_span(dims);
        }
        log::debug!("Mapped {} bytes as {:?}", data.byte_len(), data.kind());
        Ok(data)
    }

    /// Use `path` if it exists, otherwise look for a file with the same name anywhere
    /// below the document's directory. The first hit in directory walk order wins.
    fn resolve_path(&self, path: &str) -> Option<PathBuf> {
        let path = Path::new(path.trim());
        if path.exists() {
            return Some(path.to_path_buf());
        }

        let file_name = path.file_name()?;
        log::info!(
            "Unable to find {} as given, looking for {:?} below {}",
            path.display(),
            file_name,
            self.directory.display()
        );

        let found = WalkDir::new(&self.directory)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .find(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
            .map(|entry| entry.into_path());

        if found.is_none() {
            log::error!("Unable to find {}. Bailing.", path.display());
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_types_map_to_element_kinds() {
        assert_eq!(convert_data_type("Float", 4), ElementKind::Float32);
        assert_eq!(convert_data_type("Float", 8), ElementKind::Float64);
        assert_eq!(convert_data_type("Int", 4), ElementKind::Int32);
        assert_eq!(convert_data_type("Int", 8), ElementKind::Int64);
        assert_eq!(convert_data_type("Float", 2), ElementKind::Float32);
        assert_eq!(convert_data_type("Int", -1), ElementKind::Int32);
        assert_eq!(convert_data_type("Char", 1), ElementKind::Float32);
    }

    #[test]
    fn dimensions_multiply_out() {
        assert_eq!(parse_dimensions("9"), Some(9));
        assert_eq!(parse_dimensions("12 3"), Some(36));
        assert_eq!(parse_dimensions(""), None);
        assert_eq!(parse_dimensions("3 x"), None);
    }

    #[test]
    fn only_xmf_is_claimed() {
        assert!(can_read(Path::new("a/b/mesh.xmf")));
        assert!(can_read(Path::new("MESH.XMF")));
        assert!(!can_read(Path::new("mesh.xdmf.bin")));
        assert!(!can_read(Path::new("mesh")));
    }
}
