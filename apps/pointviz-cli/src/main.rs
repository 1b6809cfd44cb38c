use std::path::PathBuf;
use std::thread;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pointviz::{add_default_controls, HeadlessWindow, PointViz, PublishStats, VizConfig, VizHandle};
use pointviz_common::{Mat4d, WindowCtx, IDENTITY4D};
use pointviz_input::key;
use pointviz_render::SoftwareRenderer;
use pointviz_scene::{Cloud, ColumnPoseTexture, Cuboid, Handle, Label};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pointviz-cli", about = "CLI tool for the point cloud visualizer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Visualizer settings as JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info
    Info,
    /// Stream a synthetic scan from a producer thread into a headless visualizer
    Demo {
        /// Scans to publish
        #[arg(short, long, default_value = "100")]
        frames: u32,
        /// Columns per scan
        #[arg(long, default_value = "512")]
        width: usize,
        /// Rows (beams) per scan
        #[arg(long, default_value = "16")]
        height: usize,
        /// Print publish statistics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the encoded column-pose texels for a sweeping sensor
    Poses {
        /// Number of columns
        #[arg(short, long, default_value = "4")]
        width: usize,
        /// Sensor travel along x over one sweep, in metres
        #[arg(short, long, default_value = "1.0")]
        travel: f32,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<VizConfig> {
    let Some(path) = path else {
        return Ok(VizConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

/// Unit rays fanned in azimuth across columns and in elevation across rows,
/// in the planar `3n` layout.
fn scan_directions(w: usize, h: usize) -> Vec<f32> {
    let n = w * h;
    let mut dir = vec![0.0; 3 * n];
    for row in 0..h {
        let elevation = (row as f32 / h.max(2) as f32 - 0.5) * 0.5;
        for col in 0..w {
            let azimuth = col as f32 / w as f32 * std::f32::consts::TAU;
            let i = row * w + col;
            dir[i] = elevation.cos() * azimuth.cos();
            dir[n + i] = elevation.cos() * azimuth.sin();
            dir[2 * n + i] = elevation.sin();
        }
    }
    dir
}

/// Per-column poses for a sensor moving `travel` metres along x during one
/// sweep and yawing slightly: planar rotation (`9w`) and translation (`3w`).
fn sweep_poses(w: usize, travel: f32, yaw: f32) -> (Vec<f32>, Vec<f32>) {
    let mut rotation = vec![0.0; 9 * w];
    let mut translation = vec![0.0; 3 * w];
    for v in 0..w {
        let t = v as f32 / w.max(1) as f32;
        let (s, c) = (yaw * t).sin_cos();
        let m = [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]];
        for (row, values) in m.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                rotation[(3 * row + col) * w + v] = *value;
            }
        }
        translation[v] = travel * t;
    }
    (rotation, translation)
}

/// Synthetic range in millimetres for point `i` of scan `frame`: a sawtooth
/// between 2 m and 7 m that shifts by 7 points per scan.
fn scan_range(i: usize, frame: u32) -> u32 {
    let phase = (i as u64 + u64::from(frame) * 7) % 500;
    2000 + phase as u32 * 10
}

fn translation_x(x: f64) -> Mat4d {
    let mut m = IDENTITY4D;
    m[12] = x;
    m
}

fn produce(handle: VizHandle, cloud: Handle<Cloud>, label: Handle<Label>, frames: u32, w: usize, h: usize) {
    let (rotation, translation) = sweep_poses(w, 0.5, 0.05);
    let mut range = vec![0u32; w * h];
    for frame in 0..frames {
        for (i, r) in range.iter_mut().enumerate() {
            *r = scan_range(i, frame);
        }
        let key: Vec<f32> = range.iter().map(|r| (*r % 1000) as f32 / 1000.0).collect();
        {
            let mut cloud = cloud.lock();
            if let Err(e) = cloud.set_range(&range) {
                tracing::error!(error = %e, "range rejected");
                return;
            }
            if let Err(e) = cloud.set_key(&key) {
                tracing::error!(error = %e, "key rejected");
                return;
            }
            if let Err(e) = cloud.set_column_poses(&rotation, &translation) {
                tracing::error!(error = %e, "column poses rejected");
                return;
            }
            cloud.set_pose(translation_x(frame as f64 * 0.5));
        }
        label.lock().set_text(format!("scan {frame}"));
        while !handle.update() {
            thread::yield_now();
        }
        tracing::debug!(frame, "scan published");
    }
}

/// What a demo run leaves behind, printed with `--json`.
#[derive(Debug, Serialize, Deserialize)]
struct DemoReport {
    scans: u32,
    stats: PublishStats,
    window: WindowCtx,
}

fn run_demo(config: VizConfig, frames: u32, w: usize, h: usize, json: bool) -> anyhow::Result<DemoReport> {
    let window = HeadlessWindow::new(&config);
    let events = window.event_sender();
    let mut viz = PointViz::new(config, window, SoftwareRenderer::new())?;
    add_default_controls(&mut viz);

    let n = w * h;
    let cloud = Handle::new(Cloud::structured(w, h, &scan_directions(w, h), &vec![0.0; 3 * n], IDENTITY4D)?);
    let label = Handle::new(Label::new_2d("scan", 0.0, 1.0, false));
    let cuboid = Handle::new(Cuboid::new(IDENTITY4D, [0.2, 0.6, 1.0, 0.5]));
    viz.add_cloud(&cloud);
    viz.add_label(&label);
    viz.add_cuboid(&cuboid);
    viz.target_display().enable_rings(true);

    // a little orbiting while the scan streams
    events.key(key::A, 0);
    events.scroll(0.0, 1.0);

    let handle = viz.handle();
    let producer = thread::spawn(move || produce(handle, cloud, label, frames, w, h));
    viz.set_visible(true);
    while viz.running() && !producer.is_finished() {
        viz.run_once()?;
    }
    // draw whatever the last publish left behind
    viz.run_once()?;
    viz.set_visible(false);
    if producer.join().is_err() {
        anyhow::bail!("producer thread panicked");
    }

    let report = DemoReport {
        scans: frames,
        stats: viz.stats(),
        window: *viz.window_ctx(),
    };
    let stats = report.stats;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let frame = viz.renderer().last_frame();
        println!("Demo: {frames} scans of {w}x{h}");
        println!(
            "Published: {}, skipped: {}, frames drawn: {}",
            stats.published, stats.skipped, stats.frames
        );
        println!(
            "Last frame: clouds={}, points={}, cuboids={}, labels={}, rings={}",
            frame.clouds.len(),
            frame.clouds.iter().map(|c| c.points.len()).sum::<usize>(),
            frame.cuboids.len(),
            frame.labels.len(),
            frame.rings.len()
        );
        println!("Field uploads: {}", viz.renderer().total_uploads());
        let camera = viz.camera();
        println!(
            "Camera: yaw={} pitch={} log_distance={}",
            camera.yaw_decidegrees(),
            camera.pitch_decidegrees(),
            camera.log_distance()
        );
    }
    Ok(report)
}

fn print_poses(w: usize, travel: f32) -> anyhow::Result<()> {
    let (rotation, translation) = sweep_poses(w, travel, 0.0);
    let texture = ColumnPoseTexture::encode(w, &rotation, &translation)?;
    println!("Column poses: width={w}, texture {}x{}", w, ColumnPoseTexture::ROWS);
    for row in 0..ColumnPoseTexture::ROWS {
        let texels: Vec<String> = (0..w)
            .map(|col| {
                let [r, g, b] = texture.texel(row, col);
                format!("({r:.3}, {g:.3}, {b:.3})")
            })
            .collect();
        println!("  row {row}: {}", texels.join(" "));
    }
    for v in 0..w {
        let s = ColumnPoseTexture::texel_center(v, w);
        println!("  column {v}: s={s:.4} -> column {}", texture.column_index(s));
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("pointviz-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("viz: {}", pointviz::crate_info());
            println!("scene: {}", pointviz_scene::crate_info());
            println!("render: {}", pointviz_render::crate_info());
            println!("input: {}", pointviz_input::crate_info());
            println!("common: {}", pointviz_common::crate_info());
        }
        Commands::Demo {
            frames,
            width,
            height,
            json,
        } => {
            let config = load_config(cli.config.as_ref())?;
            tracing::info!(name = %config.name, frames, width, height, "starting demo");
            let report = run_demo(config, frames, width, height, json)?;
            tracing::info!(published = report.stats.published, frames = report.stats.frames, "demo finished");
        }
        Commands::Poses { width, travel } => {
            if width == 0 {
                anyhow::bail!("width must be at least 1");
            }
            print_poses(width, travel)?;
        }
    }

    Ok(())
}
