use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use surfview_bridge::{DisplayBridge, FnLoader, ViewerEndpoint, mesh_from_json, mesh_to_json};
use surfview_common::{Mesh, PointCloud};
use surfview_mesh::{Bounds, build_mesh_buffers, dedup_edges, sample_surface};
use surfview_render::{HeadlessHost, PresentationLoop, RetainedViewer};
use tracing_subscriber::EnvFilter;

/// Display target the headless host exposes.
const HEADLESS_TARGET: &str = "viewer";

#[derive(Parser)]
#[command(name = "surfview-cli", about = "CLI tool for surface viewer data")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Validate a mesh file and print its statistics
    Inspect {
        /// Mesh JSON file
        mesh: PathBuf,
    },
    /// List the distinct edges of a mesh file
    Edges {
        /// Mesh JSON file
        mesh: PathBuf,
        /// Only print the counts
        #[arg(long)]
        summary: bool,
    },
    /// Write the demo surface as a mesh file
    Sample {
        /// Output mesh JSON file
        #[arg(short, long)]
        output: PathBuf,
        /// Grid samples per side
        #[arg(short, long, default_value = "30")]
        resolution: u32,
        /// Also write the 5x5 sample lattice as a point file
        #[arg(long)]
        points: Option<PathBuf>,
    },
    /// Drive the retained viewer headlessly through the display bridge
    Show {
        /// Mesh JSON file
        mesh: PathBuf,
        /// Point JSON file (array of {x, y, z})
        #[arg(long)]
        points: Option<PathBuf>,
        /// Container id to attach to
        #[arg(long, default_value = HEADLESS_TARGET)]
        container: String,
        /// Frames to render
        #[arg(long, default_value = "1")]
        frames: u32,
        #[arg(long, default_value = "800")]
        width: u32,
        #[arg(long, default_value = "600")]
        height: u32,
    },
}

fn read_mesh(path: &Path) -> anyhow::Result<Mesh> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading mesh file {}", path.display()))?;
    mesh_from_json(&text).with_context(|| format!("parsing mesh file {}", path.display()))
}

fn read_points(path: &Path) -> anyhow::Result<PointCloud> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading point file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing point file {}", path.display()))
}

fn inspect(mesh: &Mesh) -> anyhow::Result<String> {
    let buffers = build_mesh_buffers(mesh)?;
    let edges = dedup_edges(&mesh.faces);

    let mut out = String::new();
    out.push_str(&format!(
        "vertices: {}\nfaces: {}\nindices: {}\n",
        mesh.vertex_count(),
        mesh.face_count(),
        buffers.index_count()
    ));
    out.push_str(&format!(
        "edges: {} (boundary {}, interior {})\n",
        edges.len(),
        edges.boundary(),
        edges.interior()
    ));
    match Bounds::from_points(&mesh.vertices) {
        Some(b) => {
            let c = b.center();
            out.push_str(&format!(
                "bounds: ({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})\ncenter: ({:.3}, {:.3}, {:.3})\n",
                b.min.x, b.min.y, b.min.z, b.max.x, b.max.y, b.max.z, c.x, c.y, c.z
            ));
        }
        None => out.push_str("bounds: empty\n"),
    }
    Ok(out)
}

fn list_edges(mesh: &Mesh, summary: bool) -> anyhow::Result<String> {
    surfview_mesh::validate_mesh(mesh)?;
    let edges = dedup_edges(&mesh.faces);
    let mut out = format!("{} distinct edges\n", edges.len());
    if !summary {
        for (key, count) in edges.iter_counted() {
            out.push_str(&format!("{} {} x{}\n", key.lo, key.hi, count));
        }
    }
    Ok(out)
}

fn write_sample(output: &Path, resolution: u32, points: Option<&Path>) -> anyhow::Result<Mesh> {
    let (mesh, lattice) = sample_surface(resolution, resolution)?;
    std::fs::write(output, mesh_to_json(&mesh)?)
        .with_context(|| format!("writing {}", output.display()))?;
    if let Some(path) = points {
        std::fs::write(path, serde_json::to_string_pretty(&lattice)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    tracing::info!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "wrote sample surface"
    );
    Ok(mesh)
}

async fn show(
    mesh: &Mesh,
    points: Option<&PointCloud>,
    container: &str,
    frames: u32,
    (width, height): (u32, u32),
) -> anyhow::Result<String> {
    let mut bridge = DisplayBridge::new(FnLoader::new(move || {
        Ok(ViewerEndpoint::new(RetainedViewer::new(
            HeadlessHost::new().with_target(HEADLESS_TARGET, width, height),
        )))
    }));

    if !bridge.init(container).await? {
        anyhow::bail!("container '{container}' not found");
    }
    bridge.display_mesh(mesh).await?;
    if let Some(points) = points {
        bridge.display_points(points).await?;
    }

    let endpoint = bridge.loaded().context("viewer module not loaded")?;
    let report = endpoint.with_viewer(|viewer| -> anyhow::Result<String> {
        let mut presentation = PresentationLoop::default();
        for _ in 0..frames {
            presentation.tick(viewer, Duration::from_millis(16), &[])?;
        }
        Ok(viewer.host().report())
    })?;

    bridge.dispose().await?;
    Ok(report)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("surfview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("mesh: {}", surfview_mesh::crate_info());
            println!("render: {}", surfview_render::crate_info());
            println!("input: {}", surfview_input::crate_info());
            println!("bridge: {}", surfview_bridge::crate_info());
        }
        Commands::Inspect { mesh } => {
            print!("{}", inspect(&read_mesh(&mesh)?)?);
        }
        Commands::Edges { mesh, summary } => {
            print!("{}", list_edges(&read_mesh(&mesh)?, summary)?);
        }
        Commands::Sample {
            output,
            resolution,
            points,
        } => {
            let mesh = write_sample(&output, resolution, points.as_deref())?;
            println!(
                "Wrote {} ({} vertices, {} faces)",
                output.display(),
                mesh.vertex_count(),
                mesh.face_count()
            );
        }
        Commands::Show {
            mesh,
            points,
            container,
            frames,
            width,
            height,
        } => {
            let mesh = read_mesh(&mesh)?;
            let points = points.as_deref().map(read_points).transpose()?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let report = runtime.block_on(show(
                &mesh,
                points.as_ref(),
                &container,
                frames,
                (width, height),
            ))?;
            print!("{report}");
        }
    }

    Ok(())
}
