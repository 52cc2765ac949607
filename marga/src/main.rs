//! Marga command line
//!
//! ```text
//! marga plan --map map.yaml --start 10,30 --goal 70,30 --paths 3 --svg out.svg
//! marga roadmap --map map.yaml
//! ```

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use marga::io::{SvgConfig, SvgRenderer, load_map};
use marga::{GraphNode, GridSnapshot, MargaError, PlannerConfig, PlanningEngine, Result};

/// Voronoi roadmap planner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan routes between two points
    Plan(PlanArgs),
    /// Build the roadmap and print its statistics
    Roadmap(MapArgs),
}

#[derive(Args, Debug)]
struct MapArgs {
    /// Map YAML file (ROS map_server format)
    #[arg(short, long)]
    map: PathBuf,

    /// Planner configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write an SVG of the result
    #[arg(long)]
    svg: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PlanArgs {
    #[command(flatten)]
    map: MapArgs,

    /// Start point as x,y
    #[arg(short, long, value_parser = parse_point, allow_hyphen_values = true)]
    start: GraphNode,

    /// Goal point as x,y
    #[arg(short, long, value_parser = parse_point, allow_hyphen_values = true)]
    goal: GraphNode,

    /// Number of routes
    #[arg(short = 'k', long, default_value_t = 1)]
    paths: usize,

    /// Points are map meters instead of grid pixels
    #[arg(long)]
    world: bool,
}

fn parse_point(s: &str) -> std::result::Result<GraphNode, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got '{}'", s))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad x '{}': {}", x, e))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad y '{}': {}", y, e))?;
    Ok(GraphNode::new(x, y))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("marga=info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Plan(args) => run_plan(args),
        Command::Roadmap(args) => run_roadmap(args),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<PlannerConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            PlannerConfig::load(path)
        }
        None if Path::new("marga.toml").exists() => {
            info!("Loading configuration from marga.toml");
            PlannerConfig::load(Path::new("marga.toml"))
        }
        None => Ok(PlannerConfig::default()),
    }
}

fn build_engine(args: &MapArgs) -> Result<(PlanningEngine, GridSnapshot)> {
    let config = load_config(args.config.as_deref())?;
    let grid = load_map(&args.map)?;
    let engine = PlanningEngine::try_new(config)?;
    engine.try_map_to_graph(grid.clone())?;
    Ok((engine, grid))
}

fn render<'a>(engine: &PlanningEngine, grid: &'a GridSnapshot) -> SvgRenderer<'a> {
    let config = SvgConfig {
        occupied_threshold: engine.config().occupancy_threshold,
        ..SvgConfig::default()
    };
    let centroids = engine
        .obstacle_centroids()
        .iter()
        .map(|c| GraphNode::new(c.re, c.im))
        .collect();
    SvgRenderer::new(grid, config)
        .with_edges(engine.edges())
        .with_disconnected(engine.disconnected_nodes())
        .with_centroids(centroids)
}

fn run_roadmap(args: MapArgs) -> Result<()> {
    let (engine, grid) = build_engine(&args)?;
    if let Some(stats) = engine.stats() {
        println!("occupied sites:  {}", stats.occupied_sites);
        println!("anchor sites:    {}", stats.anchor_sites);
        println!("diagram edges:   {}", stats.diagram_edges);
        println!("pruned edges:    {}", stats.pruned_edges);
        println!("nodes:           {}", stats.nodes);
        println!("edges:           {}", stats.edges);
        println!("reconnections:   {}", stats.reconnections);
        println!("obstacles:       {}", stats.obstacles);
        println!("elapsed:         {:.1} ms", stats.elapsed_ms);
    }

    if let Some(out) = &args.svg {
        render(&engine, &grid).save(out)?;
        info!("Wrote {}", out.display());
    }
    Ok(())
}

fn run_plan(args: PlanArgs) -> Result<()> {
    let (engine, grid) = build_engine(&args.map)?;

    let (start, goal) = if args.world {
        (grid.world_to_pixel(args.start), grid.world_to_pixel(args.goal))
    } else {
        (args.start, args.goal)
    };

    let set = engine.plan(start, goal, args.paths).map_err(MargaError::from)?;
    if !set.all_found {
        warn!(
            "Only {} of {} routes are in distinct classes",
            set.paths.len(),
            args.paths.max(1)
        );
    }

    let resolution = grid.resolution();
    for (i, path) in set.paths.iter().enumerate() {
        println!(
            "route {}: {} samples, {:.2} m",
            i,
            path.len(),
            path.length() * resolution
        );
    }

    if let Some(out) = &args.map.svg {
        render(&engine, &grid).with_paths(set.paths).save(out)?;
        info!("Wrote {}", out.display());
    }
    Ok(())
}
