//! CLI for buffering GeoJSON vectors without overlap.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use geoutils::diagnostics::BufferObserver;
use geoutils::io::{read_geojson, write_geojson};
use geoutils::{BufferContext, BufferOptions, Crs, GeoError, TieBreak, Vector};
use log::{error, info};

#[derive(Parser)]
#[command(name = "geoutils")]
#[command(about = "Buffer vector geometries without overlapping each other")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Compute one non-overlapping buffer per geometry
    Buffer {
        /// Input GeoJSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output GeoJSON file. Writes to stdout if not specified
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Buffer distance, in metres unless --no-metric is given
        #[arg(short, long)]
        distance: f64,

        /// CRS of the input coordinates
        #[arg(long, default_value = "EPSG:4326")]
        crs: Crs,

        /// Buffer in the input CRS units instead of the local UTM zone.
        /// Needed for CRSs other than WGS84 and UTM unless built with `proj`
        #[arg(long)]
        no_metric: bool,

        /// Identity kept by pieces touching several geometries: first, nearest
        #[arg(long, default_value_t = TieBreak::FirstMatch)]
        tie_break: TieBreak,

        /// Draw the intermediate stages into this SVG file
        #[arg(long)]
        plot: Option<PathBuf>,
    },
    /// Print the total bounds of a GeoJSON file
    Bounds {
        /// Input GeoJSON file
        #[arg(short, long)]
        input: PathBuf,

        /// CRS of the input coordinates
        #[arg(long, default_value = "EPSG:4326")]
        crs: Crs,

        /// Express the bounds in this CRS
        #[arg(long)]
        to: Option<Crs>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        },
    }
}

fn run(command: Command) -> Result<(), GeoError> {
    match command {
        Command::Buffer {
            input,
            output,
            distance,
            crs,
            no_metric,
            tie_break,
            plot,
        } => {
            let vector = read_geojson(&input, crs)?;
            let options = BufferOptions {
                buffer_size: distance,
                metric: !no_metric,
                tie_break,
            };

            let mut observer = plot.map(plotter);
            let mut context = BufferContext::default();
            if let Some(observer) = observer.as_mut() {
                context.observer = Some(&mut **observer);
            }
            let buffered = vector.buffer_without_overlap_with(&options, &mut context)?;
            info!("{} buffers from {} geometries", buffered.len(), vector.len());

            match output {
                Some(path) => write_geojson(&buffered, path),
                None => print(&buffered),
            }
        },
        Command::Bounds { input, crs, to } => {
            let vector = read_geojson(&input, crs)?;
            let bounds = match to {
                Some(out_crs) => {
                    vector.get_bounds_projected(&out_crs, 21, geoutils::projection::default_transform())?
                },
                None => vector.bounds().ok_or(GeoError::EmptyCollection)?,
            };
            println!(
                "{} {} {} {}",
                bounds.min().x,
                bounds.min().y,
                bounds.max().x,
                bounds.max().y
            );
            Ok(())
        },
    }
}

fn print(vector: &Vector) -> Result<(), GeoError> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", vector.to_geojson_string())?;
    Ok(())
}

#[cfg(feature = "svg-io")]
fn plotter(path: PathBuf) -> Box<dyn BufferObserver> {
    Box::new(geoutils::diagnostics::SvgPlotter::new(path))
}

#[cfg(not(feature = "svg-io"))]
fn plotter(path: PathBuf) -> Box<dyn BufferObserver> {
    log::warn!("built without svg-io, logging stages instead of drawing {}", path.display());
    Box::new(geoutils::diagnostics::LogObserver)
}
