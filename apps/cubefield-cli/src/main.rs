use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use cubefield_animate::{
    CameraView, FrameUpdater, MeshSink, NullSink, RecordingSink, UpdateStats, UpdaterConfig,
};
use cubefield_common::{FieldConfig, FrameToggles, GridCoord, Platform, TransformBuffer};
use cubefield_tools::{InstanceInspector, StatsOverlay, StatsSnapshot};
use glam::{Mat4, Vec3};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cubefield-cli", about = "CLI tool for cube field operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Profile {
    Desktop,
    Compact,
}

impl From<Profile> for Platform {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Desktop => Platform::Desktop,
            Profile::Compact => Platform::Compact,
        }
    }
}

#[derive(Args)]
struct FieldArgs {
    /// Hardware profile that sizes the field
    #[arg(long, value_enum, default_value = "compact")]
    profile: Profile,

    /// Override instances per axis (must be odd)
    #[arg(long)]
    side: Option<u32>,

    /// Field config JSON; takes precedence over --profile
    #[arg(long)]
    config: Option<PathBuf>,
}

impl FieldArgs {
    fn resolve(&self) -> anyhow::Result<FieldConfig> {
        let mut config = match &self.config {
            Some(path) => FieldConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => FieldConfig::for_platform(self.profile.into()),
        };
        if let Some(side) = self.side {
            config.side_count = side;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Generate a field layout and inspect it
    Layout {
        #[command(flatten)]
        field: FieldArgs,
        /// Show the instance at this buffer index
        #[arg(long)]
        index: Option<usize>,
        /// Show the instance at this 1-indexed grid coordinate
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        coord: Option<Vec<u32>>,
    },
    /// Run headless update frames from the field centre and report stats
    Simulate {
        #[command(flatten)]
        field: FieldArgs,
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        frames: u32,
        /// Seconds per frame
        #[arg(long, default_value = "0.016")]
        dt: f32,
        /// Run with rotation disabled
        #[arg(long)]
        idle: bool,
        /// Override the culling distance as a fraction of the far plane
        #[arg(long)]
        cull_fraction: Option<f32>,
        /// Record patches and report how many blocks reached the sink
        #[arg(long)]
        record: bool,
    },
    /// Write a field config JSON file
    Config {
        /// Output path
        path: PathBuf,
        #[arg(long, value_enum, default_value = "desktop")]
        profile: Profile,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("cubefield-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", cubefield_common::crate_info());
            println!("layout: {}", cubefield_layout::crate_info());
            println!("animate: {}", cubefield_animate::crate_info());
            println!("tools: {}", cubefield_tools::crate_info());
            let desktop = FieldConfig::desktop();
            let compact = FieldConfig::compact();
            println!(
                "profiles: desktop={} instances, compact={} instances",
                desktop.instance_count(),
                compact.instance_count()
            );
        }
        Commands::Layout {
            field,
            index,
            coord,
        } => {
            let config = field.resolve()?;
            let buffer = cubefield_layout::generate_field(&config, &Mat4::IDENTITY);
            println!(
                "{}",
                InstanceInspector::summary(&config, &buffer, &UpdateStats::idle(buffer.instance_count()))
            );
            for line in inspect_lines(&buffer, config.side_count, index, coord.as_deref())? {
                println!("{line}");
            }
        }
        Commands::Simulate {
            field,
            frames,
            dt,
            idle,
            cull_fraction,
            record,
        } => {
            let mut config = field.resolve()?;
            if let Some(fraction) = cull_fraction {
                config.culling_fraction = fraction;
                config.validate()?;
            }
            let toggles = FrameToggles {
                rotation_enabled: !idle,
                stats_visible: true,
            };
            let report = if record {
                let mut sink = RecordingSink::new();
                let report = simulate(&config, frames, dt, &toggles, &mut sink);
                println!(
                    "Sink: {} uploads, {} patches ({} in last pass), {} flushes",
                    sink.uploads(),
                    sink.patch_total(),
                    sink.patches().len(),
                    sink.flushes()
                );
                report
            } else {
                simulate(&config, frames, dt, &toggles, &mut NullSink)
            };
            for line in report {
                println!("{line}");
            }
        }
        Commands::Config { path, profile } => {
            write_config(&path, profile)?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}

fn inspect_lines(
    buffer: &TransformBuffer,
    side: u32,
    index: Option<usize>,
    coord: Option<&[u32]>,
) -> anyhow::Result<Vec<String>> {
    let mut out = Vec::new();
    if let Some(index) = index {
        match InstanceInspector::inspect(buffer, side, index) {
            Some(info) => out.push(info.to_string()),
            None => bail!("index {index} outside field of {} instances", buffer.instance_count()),
        }
    }
    if let Some(&[x, y, z]) = coord {
        let coord = GridCoord::new(x, y, z);
        match InstanceInspector::inspect_coord(buffer, side, coord) {
            Some(info) => out.push(info.to_string()),
            None => bail!("coordinate ({x}, {y}, {z}) outside grid of side {side}"),
        }
    }
    Ok(out)
}

/// Run `frames` update passes from the field centre, looking along +Z.
fn simulate<S: MeshSink>(
    config: &FieldConfig,
    frames: u32,
    dt: f32,
    toggles: &FrameToggles,
    sink: &mut S,
) -> Vec<String> {
    let mut buffer = cubefield_layout::generate_field(config, &Mat4::IDENTITY);
    sink.upload_all(buffer.as_slice());

    let eye = config.field_center();
    let camera = CameraView::look_at(
        eye,
        eye + Vec3::Z,
        45.0_f32.to_radians(),
        16.0 / 9.0,
        0.1,
        config.camera_far(),
    );
    let mut updater = FrameUpdater::new(UpdaterConfig::from_field(config));

    let mut total_updated = 0usize;
    let mut last = UpdateStats::idle(buffer.instance_count());
    for _ in 0..frames {
        last = updater.update(&mut buffer, &camera, toggles, dt, sink);
        total_updated += last.updated;
    }

    let timer = updater.timer();
    tracing::info!(
        frames,
        instances = buffer.instance_count(),
        total_updated,
        avg = ?timer.average(),
        max = ?timer.max(),
        "simulation finished"
    );
    let snapshot = StatsSnapshot {
        fps: 0.0,
        instances: buffer.instance_count(),
        camera_position: eye,
        update: last,
        update_average: timer.average(),
    };
    let mut lines = StatsOverlay::new().lines(&snapshot, toggles);
    lines.push(format!(
        "Frames: {frames} Total updated: {total_updated} Pass time: avg {:?} min {:?} max {:?}",
        timer.average(),
        timer.min(),
        timer.max()
    ));
    lines
}

fn write_config(path: &Path, profile: Profile) -> anyhow::Result<()> {
    let config = FieldConfig::for_platform(profile.into());
    config
        .save(path)
        .with_context(|| format!("writing config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> FieldConfig {
        FieldConfig {
            side_count: 5,
            ..FieldConfig::compact()
        }
    }

    #[test]
    fn idle_simulation_updates_nothing() {
        let toggles = FrameToggles::default();
        let mut sink = RecordingSink::new();
        let lines = simulate(&tiny(), 3, 0.016, &toggles, &mut sink);
        assert!(sink.patches().is_empty());
        assert!(lines.iter().any(|l| l.contains("Total updated: 0")));
    }

    #[test]
    fn rotating_simulation_reaches_the_sink() {
        let toggles = FrameToggles {
            rotation_enabled: true,
            stats_visible: true,
        };
        let mut sink = RecordingSink::new();
        simulate(&tiny(), 2, 0.016, &toggles, &mut sink);
        assert_eq!(sink.uploads(), 1);
        assert_eq!(sink.flushes(), 2);
        assert!(!sink.patches().is_empty());
        assert_eq!(sink.patch_total(), 2 * sink.patches().len());
    }

    #[test]
    fn inspect_by_coord_and_index() {
        let config = tiny();
        let buffer = cubefield_layout::generate_field(&config, &Mat4::IDENTITY);
        let lines = inspect_lines(&buffer, 5, Some(0), Some(&[1, 1, 2])).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Instance #0 "));
        assert!(lines[1].starts_with("Instance #1 "));
    }

    #[test]
    fn inspect_out_of_range_fails() {
        let config = tiny();
        let buffer = cubefield_layout::generate_field(&config, &Mat4::IDENTITY);
        assert!(inspect_lines(&buffer, 5, Some(125), None).is_err());
        assert!(inspect_lines(&buffer, 5, None, Some(&[6, 1, 1])).is_err());
    }

    #[test]
    fn config_command_writes_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("field.json");
        write_config(&path, Profile::Compact).unwrap();
        assert_eq!(FieldConfig::load(&path).unwrap(), FieldConfig::compact());
    }
}
