use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use geojson::{Feature, FeatureCollection, Geometry};
use meridian_routing::{
    config::RoutingConfig,
    geopoint::GeoPoint,
    isochrone::isochrone_request::IsochroneRequest,
    map_matching::map_match_request::MapMatchRequest,
    matrix::matrix_request::MatrixRequest,
    meridian::Meridian,
    routing::{routing_path::RoutingPath, routing_request::RouteRequest},
    weighting::registry::WeightingRegistry,
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::info;

use crate::settings;

#[derive(Args)]
pub struct QueryArgs {
    /// Graph directory holding graph.bin and the hierarchies
    #[arg(short, long)]
    graph: PathBuf,

    /// JSON request file
    #[arg(short, long)]
    request: PathBuf,

    /// Output file, stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy)]
pub enum QueryKind {
    Route,
    Matrix,
    Isochrone,
    Match,
}

fn read_request<T: DeserializeOwned>(args: &QueryArgs) -> Result<T, anyhow::Error> {
    let content = std::fs::read_to_string(&args.request)
        .with_context(|| format!("cannot read request {}", args.request.display()))?;
    let request = serde_json::from_str(&content)
        .with_context(|| format!("invalid request {}", args.request.display()))?;
    Ok(request)
}

fn path_json(path: &RoutingPath) -> Value {
    json!({
        "weight": path.weight(),
        "time": path.time(),
        "distance": path.distance().value(),
        "edges": path.edges(),
        "geometry": path.to_geojson(),
    })
}

pub fn run(kind: QueryKind, args: QueryArgs, config: RoutingConfig) -> Result<(), anyhow::Error> {
    let generation = settings::load_generation(&args.graph, &config)?;
    let engine = Meridian::new(config, WeightingRegistry::default(), generation)?;

    let output = match kind {
        QueryKind::Route => {
            let request: RouteRequest = read_request(&args)?;
            let response = engine.route(&request)?;
            info!(
                algorithm = response.algorithm.name(),
                nodes_visited = response.nodes_visited,
                duration = ?response.duration,
                "route"
            );

            let mut output = path_json(&response.path);
            output["algorithm"] = json!(response.algorithm.name());
            output["nodes_visited"] = json!(response.nodes_visited);
            output
        }
        QueryKind::Matrix => {
            let request: MatrixRequest = read_request(&args)?;
            let response = engine.matrix(&request)?;
            info!(
                used_ch = response.used_ch,
                visited_nodes = response.visited_nodes,
                duration = ?response.duration,
                "matrix"
            );

            json!({
                "weights": response.matrix.weights(),
                "times": response.matrix.times(),
                "distances": response.matrix.distances(),
                "used_ch": response.used_ch,
            })
        }
        QueryKind::Isochrone => {
            let request: IsochroneRequest = read_request(&args)?;
            let result = engine.isochrone(&request)?;
            info!(
                bands = result.bands.len(),
                visited_nodes = result.visited_nodes,
                duration = ?result.duration,
                "isochrone"
            );

            serde_json::to_value(result.to_geojson())?
        }
        QueryKind::Match => {
            let request: MapMatchRequest = read_request(&args)?;
            let result = engine.map_match(&request)?;
            info!(
                matched = result.matched.len(),
                unmatched = result.unmatched.len(),
                sequences = result.sequences,
                "map match"
            );

            let matched: Vec<Value> = result
                .matched
                .iter()
                .map(|observation| {
                    json!({
                        "index": observation.index,
                        "edge": observation.edge_id,
                        "lat": observation.point.lat,
                        "lon": observation.point.lon,
                        "distance": observation.distance.value(),
                    })
                })
                .collect();
            let legs = FeatureCollection {
                bbox: None,
                features: result.path.legs().iter().map(|leg| leg_feature(leg.points())).collect(),
                foreign_members: None,
            };

            json!({
                "matched": matched,
                "unmatched": result.unmatched,
                "edges": result.edges,
                "sequences": result.sequences,
                "legs": legs,
            })
        }
    };

    let rendered = serde_json::to_string_pretty(&output)?;
    match args.output {
        Some(path) => std::fs::write(&path, rendered)
            .with_context(|| format!("cannot write {}", path.display()))?,
        None => println!("{}", rendered),
    }

    Ok(())
}

fn leg_feature(points: &[GeoPoint]) -> Feature {
    let coordinates = points.iter().map(|point| vec![point.lon, point.lat]).collect();
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::LineString(coordinates))),
        id: None,
        properties: None,
        foreign_members: None,
    }
}
