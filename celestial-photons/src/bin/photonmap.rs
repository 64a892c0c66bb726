use anyhow::Context;
use celestial_core::constants::SQDEG_PER_SR;
use celestial_core::SkyDir;
use celestial_healpix::HealPixel;
use celestial_photons::{EnergyBinning, Photon, PhotonMap, DEFAULT_TABLE};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Parser)]
#[command(name = "photonmap")]
#[command(about = "Build and query multi-resolution photon maps")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print binning and per-band totals of a stored map
    Info {
        /// FITS file holding the map
        file: PathBuf,
        /// Table (EXTNAME) holding the map
        #[arg(long, default_value = DEFAULT_TABLE)]
        table: String,
    },
    /// List pixel counts within a radius of a direction
    Extract {
        /// FITS file holding the map
        file: PathBuf,
        /// Right ascension in degrees
        ra: f64,
        /// Declination in degrees
        #[arg(allow_negative_numbers = true)]
        dec: f64,
        /// Search radius in degrees (180 or more for the whole sky)
        #[arg(long, default_value = "1.0")]
        radius: f64,
        /// Fold finer pixels into this level (default: the map's first level)
        #[arg(long, conflicts_with_all = ["select_level", "level", "include_all"])]
        summary_level: Option<u8>,
        /// Report only pixels stored at exactly this level
        #[arg(long, conflicts_with_all = ["level", "include_all"])]
        select_level: Option<u8>,
        /// Single-level view at this level (default: the map's first level)
        #[arg(long)]
        level: Option<u8>,
        /// With the single-level view, also list empty pixels
        #[arg(long)]
        include_all: bool,
        /// Table (EXTNAME) holding the map
        #[arg(long, default_value = DEFAULT_TABLE)]
        table: String,
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Bin an event list into a map and write it
    Bin {
        /// Text file of `ra dec energy` lines (whitespace or comma separated, `#` comments)
        events: PathBuf,
        /// Output FITS file
        output: PathBuf,
        /// Lower edge of the first energy band, MeV
        #[arg(long, default_value = "100")]
        emin: f64,
        /// Ratio between consecutive band edges
        #[arg(long, default_value = "2.35")]
        eratio: f64,
        /// Number of energy bands
        #[arg(long, default_value = "8")]
        levels: u8,
        /// Pixel level of the first band
        #[arg(long, default_value = "6")]
        minlevel: u8,
        /// Map name stored with the table
        #[arg(long)]
        name: Option<String>,
        /// Table (EXTNAME) to write
        #[arg(long, default_value = DEFAULT_TABLE)]
        table: String,
        /// Append to an existing file instead of replacing it; fails if the table exists
        #[arg(long)]
        no_clobber: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(match cli.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default tracing subscriber failed")?;

    match cli.command {
        Commands::Info { file, table } => {
            let map = load(&file, &table)?;
            print!("{}", map);
        }
        Commands::Extract {
            file,
            ra,
            dec,
            radius,
            summary_level,
            select_level,
            level,
            include_all,
            table,
            format,
        } => {
            let map = load(&file, &table)?;
            let dir = SkyDir::from_radec_deg(ra, dec);
            let (cells, total) = if level.is_some() || include_all {
                map.extract_level(&dir, radius, level, include_all)
            } else {
                map.extract(&dir, radius, summary_level, select_level)
            };

            match format {
                OutputFormat::Table => print_table(&dir, &cells, total),
                OutputFormat::Json => print_json(&dir, &cells)?,
                OutputFormat::Csv => print_csv(&dir, &cells),
            }
        }
        Commands::Bin {
            events,
            output,
            emin,
            eratio,
            levels,
            minlevel,
            name,
            table,
            no_clobber,
        } => {
            let binning = EnergyBinning::new(emin, eratio, levels, minlevel)?;
            let mut map = PhotonMap::new(binning);
            map.set_name(name.unwrap_or_else(|| file_stem(&events)));

            let photons = read_events(&events)?;
            map.extend(&photons);
            info!(
                events = photons.len(),
                pixels = map.pixel_count(),
                "binned event list"
            );

            map.write(&output, &table, !no_clobber)
                .with_context(|| format!("writing {}", output.display()))?;
            print!("{}", map);
        }
    }

    Ok(())
}

fn load(file: &Path, table: &str) -> anyhow::Result<PhotonMap> {
    PhotonMap::read(file, table)
        .with_context(|| format!("reading table {} from {}", table, file.display()))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photonmap".to_string())
}

fn read_events(path: &Path) -> anyhow::Result<Vec<Photon>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut photons = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();
        let [ra, dec, energy] = fields[..] else {
            anyhow::bail!(
                "{}:{}: expected `ra dec energy`, found {} fields",
                path.display(),
                n + 1,
                fields.len()
            );
        };
        let parse = |field: &str, what: &str| -> anyhow::Result<f64> {
            field.parse().with_context(|| {
                format!("{}:{}: invalid {} '{}'", path.display(), n + 1, what, field)
            })
        };
        let dir = SkyDir::from_radec_deg(parse(ra, "ra")?, parse(dec, "dec")?);
        photons.push(Photon::new(dir, parse(energy, "energy")?));
    }
    Ok(photons)
}

fn print_table(centre: &SkyDir, cells: &[(HealPixel, u64)], total: u64) {
    for (i, (pixel, count)) in cells.iter().enumerate() {
        let dir = pixel.dir();
        println!(
            "{:6}: {:>14} RA={:10.5}° Dec={:+9.5}° Dist={:.4}° Count={} Density={:.3}/deg²",
            i + 1,
            pixel.to_string(),
            dir.ra(),
            dir.dec(),
            dir.separation_deg(centre),
            count,
            *count as f64 / (pixel.area() * SQDEG_PER_SR)
        );
    }

    if cells.is_empty() {
        println!("No pixels found within the search radius.");
    } else {
        println!("\nPixels: {}  Photons: {}", cells.len(), total);
    }
}

#[derive(serde::Serialize)]
struct JsonCell {
    level: u8,
    index: u64,
    ra_deg: f64,
    dec_deg: f64,
    distance_deg: f64,
    count: u64,
}

fn print_json(centre: &SkyDir, cells: &[(HealPixel, u64)]) -> anyhow::Result<()> {
    let rows: Vec<JsonCell> = cells
        .iter()
        .map(|(pixel, count)| {
            let dir = pixel.dir();
            JsonCell {
                level: pixel.level(),
                index: pixel.index(),
                ra_deg: dir.ra(),
                dec_deg: dir.dec(),
                distance_deg: dir.separation_deg(centre),
                count: *count,
            }
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn print_csv(centre: &SkyDir, cells: &[(HealPixel, u64)]) {
    println!("level,index,ra_deg,dec_deg,distance_deg,count");
    for (pixel, count) in cells {
        let dir = pixel.dir();
        println!(
            "{},{},{},{},{},{}",
            pixel.level(),
            pixel.index(),
            dir.ra(),
            dir.dec(),
            dir.separation_deg(centre),
            count
        );
    }
}
