use std::path::PathBuf;

use clap::Parser;
use geom_playground::{ImportOptions, playground};

/// Import 3D scenes and XDMF grids into one framed scene document.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Files to import (.gltf, .glb, .obj, .xmf)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Render every material double-sided
    #[arg(long)]
    double_sided: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let playground = playground::run(ImportOptions::new(args.double_sided), &args.files)?;

    let doc = playground.document();
    println!(
        "Imported {} of {} files: {} objects, {} meshes, {} materials, {} textures",
        playground.models().len(),
        args.files.len(),
        doc.objects().len(),
        doc.meshes().len(),
        doc.materials().len(),
        doc.textures().len()
    );
    let bounds = playground.bounds();
    if bounds.is_valid() {
        println!(
            "Bounds: ({}, {}, {}) .. ({}, {}, {})",
            bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
        );
    }
    Ok(())
}
