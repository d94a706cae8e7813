//! camtrap_track - Track moving objects through a batch of camera-trap videos.
//!
//! Reads a JSON manifest of videos, streams them in chronological order
//! through the configured transforms, detector and tracker, and writes one
//! JSON line per finished object.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use camtrap_track::{
    CoreConfig, DefaultBackend, FinishedObject, VideoAnalysis, VideoCollection, VideoDescriptor,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Track moving objects through camera-trap videos"
)]
struct Args {
    /// JSON array of videos: id, path, date, time and optionally fps and duration.
    #[arg(long)]
    manifest: PathBuf,

    /// Core configuration (TOML). Defaults apply when omitted.
    #[arg(long, env = "CAMTRAP_CONFIG")]
    config: Option<PathBuf>,

    /// Where to write finished objects as JSON lines; stdout when omitted.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn write_object(out: &mut impl Write, object: &FinishedObject) -> Result<()> {
    serde_json::to_writer(&mut *out, object).context("failed to serialize object")?;
    out.write_all(b"\n").context("failed to write output")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => CoreConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => CoreConfig::default(),
    };

    let manifest = File::open(&args.manifest)
        .with_context(|| format!("failed to open manifest {}", args.manifest.display()))?;
    let videos: Vec<VideoDescriptor> = serde_json::from_reader(io::BufReader::new(manifest))
        .with_context(|| format!("invalid manifest {}", args.manifest.display()))?;
    let collection = VideoCollection::new(videos);

    log::info!("camtrap_track starting");
    log::info!("  Videos: {}", collection.len());
    log::info!("  Skip frames: {}", config.loader.skip_n_frames);
    log::info!("  Max disappeared: {}", config.tracker.max_disappeared);

    let mut out: BufWriter<Box<dyn Write>> = BufWriter::new(match &args.output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("failed to create output {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    });

    let mut analysis = VideoAnalysis::from_config(collection, Arc::new(DefaultBackend), &config)?;

    let mut write_error = None;
    let summary = analysis.run(|report| {
        for object in &report.finished {
            if write_error.is_none() {
                write_error = write_object(&mut out, object).err();
            }
        }
    })?;
    if let Some(e) = write_error {
        return Err(e);
    }
    for object in &summary.flushed {
        write_object(&mut out, object)?;
    }
    out.flush().context("failed to flush output")?;

    log::info!(
        "Done: {} frames, {} objects",
        summary.frames,
        summary.retired + summary.flushed.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_config_argument_reads_environment() {
        let command = Args::command();
        let config = command
            .get_arguments()
            .find(|arg| arg.get_id() == "config")
            .unwrap();
        assert_eq!(config.get_env(), Some(std::ffi::OsStr::new("CAMTRAP_CONFIG")));

        let args = Args::try_parse_from([
            "camtrap_track",
            "--manifest",
            "videos.json",
            "--config",
            "core.toml",
        ])
        .unwrap();
        assert_eq!(args.manifest, PathBuf::from("videos.json"));
        assert_eq!(args.config, Some(PathBuf::from("core.toml")));
        assert!(args.output.is_none());
    }
}
