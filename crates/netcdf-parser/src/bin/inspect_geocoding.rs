//! Infer the geocoding of a product and print it as JSON.
//!
//! Optionally writes the product's coordinate fields as CDL, which `ncgen`
//! can turn into a NetCDF file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geo_common::{BoundingBox, RasterDimension};
use geocoding::{
    plan_geocoding_output, DeclarationPlan, GeocodingConfig, GeocodingWriter, InferredGeocoding,
    Orientation,
};
use netcdf_parser::{
    dump_netcdf, inspect_document, inspect_vgt_header, read_cdl_file, read_vgt_header, CdlWriter,
    Inspection,
};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Convention the written coordinate fields follow.
const OUTPUT_CONVENTIONS: &str = "CF-1.4";

#[derive(Parser, Debug)]
#[command(name = "inspect-geocoding")]
#[command(about = "Infer and print the geocoding of a raster product")]
struct Args {
    #[command(subcommand)]
    command: Source,

    /// Write the coordinate fields to this CDL file
    #[arg(long, global = true)]
    write_cdl: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Source {
    /// NetCDF file, described through `ncdump`
    Netcdf { path: PathBuf },
    /// CDL text as printed by `ncdump`
    Cdl { path: PathBuf },
    /// SPOT VGT log-volume header
    VgtHeader { path: PathBuf },
    /// NetCDF file, read through libnetcdf
    #[cfg(feature = "native")]
    Native { path: PathBuf },
}

#[derive(Serialize)]
struct Report<'a> {
    #[serde(flatten)]
    inspection: &'a Inspection,
    geographic_bounds: Option<BoundingBox>,
    output_plan: Option<DeclarationPlan>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr);
    if args.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    let config = GeocodingConfig::from_env().validated()?;
    info!(
        search_radius = config.pixel_search_radius,
        parallel = config.parallel_sampling,
        "Loaded configuration"
    );

    let inspection = match &args.command {
        Source::Netcdf { path } => inspect_document(&dump_netcdf(path)?, &config)?,
        Source::Cdl { path } => inspect_document(&read_cdl_file(path)?, &config)?,
        Source::VgtHeader { path } => {
            let header = read_vgt_header(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            inspect_vgt_header(&header)
        }
        #[cfg(feature = "native")]
        Source::Native { path } => {
            let source = netcdf_parser::NativeSource::open(path)?;
            netcdf_parser::inspect_native(&source, &config)?
        }
    };

    let report = Report {
        geographic_bounds: inspection.geographic_bounds(),
        output_plan: inspection.output_plan(),
        inspection: &inspection,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(out) = &args.write_cdl {
        let inferred = inspection
            .inferred
            .as_ref()
            .context("nothing to write without a geocoding")?;
        write_coordinates(&inspection.product, inspection.dimension, inferred, &config, out)?;
    }

    Ok(())
}

fn write_coordinates(
    name: &str,
    dimension: RasterDimension,
    inferred: &InferredGeocoding,
    config: &GeocodingConfig,
    out: &Path,
) -> Result<()> {
    let orientation: Orientation =
        plan_geocoding_output(&inferred.geocoding, dimension).output_orientation();
    let writer = GeocodingWriter::new(&inferred.geocoding, dimension, orientation, config.clone())?;

    let mut cdl = CdlWriter::new(name)
        .with_global_attribute("Conventions", OUTPUT_CONVENTIONS)
        .with_global_attribute("title", name);
    writer.declare(&mut cdl)?;
    writer.write(&mut cdl)?;
    cdl.write_to(out)?;

    info!(path = %out.display(), fields = writer.plan().fields().len(), "Wrote coordinate fields");
    Ok(())
}
