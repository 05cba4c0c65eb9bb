/*!
# Lathser

Turns a rendered silhouette image into a job file for Epilog laser cutters.

## Features

- Contour tracing of the silhouette's pixel boundary
- Ramer-Douglas-Peucker simplification of the traced outline
- Vector cutting and raster engraving jobs for Fusion and Helix devices
- Plain-text or JSON export of the traced polylines
- TOML configuration file for device and pipeline settings

## Usage

### Cut the outline of an image
```bash
lathser cut silhouette.png -o job.prn
```

### Engrave an image
```bash
lathser engrave photo.png -o job.prn
```

### Export the traced polylines
```bash
lathser outline silhouette.png --json
```

### Generate a configuration file
```bash
lathser config -o lathser.toml
```
*/

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lathser_core::export::{write_polylines, write_polylines_json};
use lathser_core::{encode_to_vec, DeviceKind, Document, JobSettings};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod pipeline;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "lathser")]
#[command(about = "Silhouette tracing and Epilog laser cutter job generation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "lathser.toml", global = true)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Trace an image's outline and write a vector cutting job
    Cut {
        /// Silhouette image (PNG, BMP or PNM)
        input: PathBuf,

        #[command(flatten)]
        job: JobArgs,
    },

    /// Write a raster engraving job for an image
    Engrave {
        /// Image to engrave (PNG, BMP or PNM)
        input: PathBuf,

        #[command(flatten)]
        job: JobArgs,
    },

    /// Trace an image's outline and print the polylines
    Outline {
        /// Silhouette image (PNG, BMP or PNM)
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit JSON instead of plain text
        #[arg(long)]
        json: bool,

        /// Simplification tolerance in pixels (overrides the config file)
        #[arg(short, long)]
        epsilon: Option<f64>,
    },

    /// Generate configuration file
    Config {
        /// Output path for configuration file
        #[arg(short, long, default_value = "lathser.toml")]
        output: PathBuf,
    },
}

/// Options shared by the job-writing subcommands
#[derive(clap::Args)]
struct JobArgs {
    /// Output job file
    #[arg(short, long, default_value = "out.prn")]
    output: PathBuf,

    /// Target device (overrides the config file)
    #[arg(short, long, value_enum)]
    device: Option<DeviceArg>,

    /// Job title shown on the device (defaults to the input file name)
    #[arg(short, long)]
    title: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum DeviceArg {
    Fusion,
    Helix,
}

impl From<DeviceArg> for DeviceKind {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Fusion => DeviceKind::Fusion,
            DeviceArg::Helix => DeviceKind::Helix,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log to stderr to keep stdout clean for exported polylines
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    match cli.command {
        Commands::Cut { input, job } => {
            let config = AppConfig::load_or_default(&cli.config)?;
            run_cut(&input, &job, config)
        }

        Commands::Engrave { input, job } => {
            let config = AppConfig::load_or_default(&cli.config)?;
            run_engrave(&input, &job, config)
        }

        Commands::Outline {
            input,
            output,
            json,
            epsilon,
        } => {
            let config = AppConfig::load_or_default(&cli.config)?;
            run_outline(&input, output.as_deref(), json, epsilon, config)
        }

        Commands::Config { output } => generate_config_file(output),
    }
}

/// Apply command-line overrides to the configured job settings
fn job_settings(args: &JobArgs, config: &AppConfig) -> JobSettings {
    let mut settings = config.job.clone();
    if let Some(device) = args.device {
        settings.device = device.into();
    }
    settings
}

fn job_title(args: &JobArgs, input: &Path) -> String {
    args.title.clone().unwrap_or_else(|| {
        input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled-1".to_string())
    })
}

/// Trace, simplify and place the outline, then write a cutting job
fn run_cut(input: &Path, args: &JobArgs, config: AppConfig) -> Result<()> {
    let settings = job_settings(args, &config);
    println!("🔍 Tracing {}", input.display());

    let gray = pipeline::load_gray(input, config.pipeline.invert)?;
    let bitmap = pipeline::to_bitmap(gray)?;
    let doc = pipeline::cut_document(&job_title(args, input), &bitmap, &config.pipeline, &settings)?;

    write_job(&doc, &settings, &args.output)
}

/// Write a raster engraving job for the image
fn run_engrave(input: &Path, args: &JobArgs, config: AppConfig) -> Result<()> {
    let settings = job_settings(args, &config);
    println!("🖼️ Rasterizing {}", input.display());

    let gray = pipeline::load_gray(input, config.pipeline.invert)?;
    let doc = pipeline::engrave_document(&job_title(args, input), &gray, &config.pipeline, &settings)?;

    write_job(&doc, &settings, &args.output)
}

/// Encode in memory first; the output file is only touched once the job is accepted
fn write_job(doc: &Document, settings: &JobSettings, output: &Path) -> Result<()> {
    let bytes = encode_to_vec(doc, settings)
        .with_context(|| format!("Failed to encode job for {}", output.display()))?;
    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write job file: {}", output.display()))?;

    println!(
        "✅ Wrote {} job ({} bytes) to {}",
        settings.device.as_str(),
        bytes.len(),
        output.display()
    );
    Ok(())
}

/// Trace and simplify, then print the polylines
fn run_outline(
    input: &Path,
    output: Option<&Path>,
    json: bool,
    epsilon: Option<f64>,
    config: AppConfig,
) -> Result<()> {
    let epsilon = epsilon.unwrap_or(config.pipeline.epsilon);

    let gray = pipeline::load_gray(input, config.pipeline.invert)?;
    let bitmap = pipeline::to_bitmap(gray)?;
    let paths = pipeline::outline_paths(&bitmap, epsilon)?;
    info!("📐 {} polyline(s) from {}", paths.len(), input.display());

    let out: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    if json {
        write_polylines_json(&paths, out)?;
    } else {
        write_polylines(&paths, out)?;
    }
    Ok(())
}

/// Generate a default configuration file
fn generate_config_file(output_path: PathBuf) -> Result<()> {
    let config = AppConfig::new();
    config.save_to_file(&output_path)?;

    println!("✅ Generated configuration file: {}", output_path.display());
    println!("📝 Edit the file to customize settings, then run:");
    println!("   lathser --config {} cut <image>", output_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lathser_core::{Cut, CutParams, Point2};

    fn single_cut(params: CutParams) -> Document {
        let mut doc = Document::new("job");
        doc.add_cut(Cut::with_points(
            params,
            vec![Point2::new(0.0, 0.0), Point2::new(100.0, 100.0)],
        ));
        doc
    }

    #[test]
    fn test_rejected_job_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("job.prn");
        std::fs::write(&output, b"previous good job").unwrap();

        let result = write_job(&single_cut(CutParams::new(4, 150, 50)), &JobSettings::fusion(), &output);

        assert!(result.is_err());
        assert_eq!(std::fs::read(&output).unwrap(), b"previous good job");
    }

    #[test]
    fn test_accepted_job_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("job.prn");
        std::fs::write(&output, b"previous good job").unwrap();

        let doc = single_cut(CutParams::default());
        write_job(&doc, &JobSettings::fusion(), &output).unwrap();

        let expected = encode_to_vec(&doc, &JobSettings::fusion()).unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), expected);
    }
}
