use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use rayon::iter::{IntoParallelRefIterator as _, ParallelIterator as _};
use serde::Serialize;
use thiserror::Error;

use env_model::{
    extract_constraints, find_connection_opportunities, ConnectionConfig, ConnectionOpportunity,
    EngineeringConstraint, EnvironmentModel, EnvironmentModeler, ModelInput, ModelerConfig,
    NoopImageAnalyzer,
};
use pcd_core::{
    pointcloud::point::{load_from_array, PointCloud, RawPoint, SourceMeta},
    PcdError,
};

#[derive(Parser, Debug)]
#[command(
    name = "Environment Modeler",
    about = "Builds a structured environment model from point cloud scans",
    author = "MIERUNE Inc.",
    version = "0.0.1"
)]
struct Cli {
    /// JSON arrays of {x, y, z, r?, g?, b?} points in millimetres
    #[arg(short, long, required = true, num_args = 1.., value_name = "FILE")]
    input: Vec<PathBuf>,

    #[arg(short, long, required = true, value_name = "FILE")]
    output: PathBuf,

    /// Modeler settings as JSON; missing fields keep their defaults
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// Also report connection opportunities between attachment points
    #[arg(long, default_value_t = false)]
    connections: bool,

    #[arg(long, default_value_t = 20000.0)]
    max_distance: f64,

    #[arg(long, default_value_t = false)]
    require_clear_path: bool,
}

#[derive(Debug, Error)]
enum AppError {
    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid points in {path:?}: {source}")]
    Points { path: PathBuf, source: PcdError },
}

#[derive(Debug, Serialize)]
struct Report {
    model: EnvironmentModel,
    constraints: Vec<EngineeringConstraint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    connections: Option<Vec<ConnectionOpportunity>>,
}

fn open(path: &Path) -> Result<BufReader<File>, AppError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn load_config(path: &Path) -> Result<ModelerConfig, AppError> {
    serde_json::from_reader(open(path)?).map_err(|source| AppError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn read_cloud(path: &Path) -> Result<PointCloud, AppError> {
    let raw: Vec<RawPoint> = serde_json::from_reader(open(path)?).map_err(|source| {
        AppError::Json {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let id = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("cloud")
        .to_string();
    let meta = SourceMeta::new(id, path.display().to_string());

    load_from_array(&raw, meta).map_err(|source| AppError::Points {
        path: path.to_path_buf(),
        source,
    })
}

fn write_report(path: &Path, report: &Report) -> Result<(), AppError> {
    let io_error = |source| AppError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
    serde_json::to_writer_pretty(&mut writer, report).map_err(|source| AppError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(io_error)
}

fn run(args: Cli) -> Result<(), AppError> {
    let start = std::time::Instant::now();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ModelerConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    log::info!("start reading...");
    let start_local = std::time::Instant::now();
    let clouds = args
        .input
        .par_iter()
        .map(|path| read_cloud(path))
        .collect::<Result<Vec<_>, _>>()?;
    let point_count: usize = clouds.iter().map(PointCloud::len).sum();
    log::info!(
        "finish reading {} clouds ({} points) in {:?}",
        clouds.len(),
        point_count,
        start_local.elapsed()
    );

    log::info!("start modeling...");
    let start_local = std::time::Instant::now();
    let modeler = EnvironmentModeler::new(config, Box::new(NoopImageAnalyzer));
    let model = modeler.build_model(&ModelInput {
        clouds,
        images: Vec::new(),
    });
    log::info!("finish modeling in {:?}", start_local.elapsed());

    let connections = if args.connections {
        log::info!("start connection analysis...");
        let start_local = std::time::Instant::now();
        let connection_config = ConnectionConfig::default()
            .with_max_distance(args.max_distance)
            .with_require_clear_path(args.require_clear_path);
        let opportunities = find_connection_opportunities(&model, &connection_config);
        log::info!(
            "finish connection analysis: {} opportunities in {:?}",
            opportunities.len(),
            start_local.elapsed()
        );
        Some(opportunities)
    } else {
        None
    };

    let report = Report {
        constraints: extract_constraints(&model),
        model,
        connections,
    };

    log::info!("write report: {:?}", args.output);
    write_report(&args.output, &report)?;

    log::info!("Elapsed: {:?}", start.elapsed());
    Ok(())
}

fn main() {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        .init();

    let args = Cli::parse();

    log::info!("input files: {:?}", args.input);
    log::info!("output file: {:?}", args.output);
    if let Some(config) = &args.config {
        log::info!("config: {:?}", config);
    }

    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
    log::info!("Finish processing");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_points_and_names_cloud_after_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lobby.json");
        fs::write(
            &path,
            r#"[{"x": 0, "y": 0, "z": 0}, {"x": 1000, "y": 500, "z": 250, "r": 255}]"#,
        )
        .unwrap();

        let cloud = read_cloud(&path).unwrap();
        assert_eq!(cloud.id(), "lobby");
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.bounds().max, [1000.0, 500.0, 250.0]);
        assert!(cloud.points()[1].color.is_some());
    }

    #[test]
    fn non_finite_points_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        // 1e999 overflows to infinity when parsed.
        fs::write(&path, r#"[{"x": 0, "y": 1e999, "z": 0}]"#).unwrap();

        let result = read_cloud(&path);
        assert!(matches!(
            result,
            Err(AppError::Points { .. }) | Err(AppError::Json { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = read_cloud(Path::new("/nonexistent/scan.json"));
        assert!(matches!(result, Err(AppError::Io { .. })));
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"surfaces": {"seed": 11}, "conditioning": {"voxel_size": 25.0}}"#)
            .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.surfaces.seed, 11);
        assert_eq!(config.conditioning.voxel_size, Some(25.0));
        assert_eq!(config.obstacles.confidence, 0.6);
    }

    #[test]
    fn report_is_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scan.json");
        let output = dir.path().join("out").join("model.json");
        let points: Vec<RawPoint> = (0..20)
            .flat_map(|i| (0..20).map(move |j| (i as f64 * 100.0, j as f64 * 100.0)))
            .map(|(x, y)| RawPoint::new(x, y, 0.0))
            .collect();
        fs::write(&input, serde_json::to_string(&points).unwrap()).unwrap();

        let args = Cli::parse_from([
            "envmodel",
            "--input",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--connections",
        ]);
        run(args).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["model"]["metadata"]["point_count"], 400);
        assert!(written["connections"].is_array());
        assert!(written["constraints"].is_array());
    }
}
