use crate::config::AppConfig;
use crate::filter::{partition, SeaLevelQuery, ThresholdMode};
use crate::info::{affected_text, city_info, rate_text};
use crate::lookup::CityIndex;
use crate::render::{render_map, MapFigure};
use crate::types::{Selection, Variant, WorkingTable};
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub struct AppState {
    pub table: WorkingTable,
    pub index: CityIndex,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig, table: WorkingTable) -> Self {
        let index = CityIndex::build(&table);
        Self { table, index, config }
    }

    fn query(&self, year: i32, rate: f64) -> SeaLevelQuery {
        SeaLevelQuery::new(year, self.config.model.base_year, rate)
    }

    fn mode(&self) -> ThresholdMode {
        self.config.model.threshold_mode
    }
}

#[derive(Deserialize)]
pub struct MapParams {
    year: i32,
    rate: f64,
}

#[derive(Deserialize)]
pub struct RateParams {
    rate: f64,
}

#[derive(Deserialize)]
pub struct CityParams {
    year: i32,
    rate: f64,
    label: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    elevation: Option<f64>,
}

impl CityParams {
    fn selection(&self) -> Option<Selection> {
        Some(Selection {
            label: self.label.clone()?,
            latitude: self.lat?,
            longitude: self.lon?,
            elevation: self.elevation?,
        })
    }
}

#[derive(Deserialize)]
pub struct PointParams {
    lat: f64,
    lon: f64,
}

fn bad_request(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

/// Query extraction accepts `NaN` and `inf`; the filter and the R-tree do not.
fn require_finite(values: &[(&str, f64)]) -> Result<(), Response> {
    match values.iter().find(|(_, v)| !v.is_finite()) {
        Some((name, v)) => Err(bad_request(format!("{} must be a finite number, got {}", name, v))),
        None => Ok(()),
    }
}

#[derive(Serialize)]
pub struct MarkdownResponse {
    markdown: String,
}

#[derive(Serialize)]
pub struct QueryResponse {
    selection: Selection,
    population: Option<f64>,
    attributes: BTreeMap<String, String>,
    distance_m: f64,
}

#[derive(Serialize)]
pub struct SliderSpec<T> {
    min: T,
    max: T,
    step: T,
    value: T,
    marks: Vec<T>,
}

#[derive(Serialize)]
pub struct ControlsResponse {
    variant: Variant,
    threshold_mode: ThresholdMode,
    year: SliderSpec<i32>,
    rate: SliderSpec<f64>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let mut api = Router::new()
        .route("/api/controls", get(controls_handler))
        .route("/api/map", get(map_handler))
        .route("/api/rate_text", get(rate_text_handler))
        .route("/api/affected", get(affected_handler))
        .route("/api/query", get(query_handler));

    if state.table.variant() == Variant::Population {
        api = api.route("/api/city", get(city_handler));
    }

    let static_service = ServeDir::new(&state.config.server.static_dir);
    let web_service = ServeDir::new(&state.config.server.web_dir);

    api.nest_service("/static", static_service)
        .fallback_service(web_service)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: AppConfig, table: WorkingTable) -> Result<()> {
    if config.model.threshold_mode == ThresholdMode::Legacy {
        warn!("Legacy threshold mode: map layers and city panel may disagree near the sea level");
    }

    info!("Building spatial index for {} cities...", table.len());
    let state = Arc::new(AppState::new(config, table));

    let server = &state.config.server;
    let addr = SocketAddr::from((server.host, server.port));
    info!("Starting server on http://{}", addr);

    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn controls_handler(State(state): State<Arc<AppState>>) -> Json<ControlsResponse> {
    let model = &state.config.model;
    let rate_marks = (1..=model.rate_max.floor() as i32).map(f64::from).collect();

    Json(ControlsResponse {
        variant: state.table.variant(),
        threshold_mode: model.threshold_mode,
        year: SliderSpec {
            min: model.year_min,
            max: model.year_max,
            step: 1,
            value: model.year_default,
            marks: model.year_marks.clone(),
        },
        rate: SliderSpec {
            min: model.rate_min,
            max: model.rate_max,
            step: model.rate_step,
            value: model.rate_default,
            marks: rate_marks,
        },
    })
}

async fn map_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MapParams>,
) -> Result<Json<MapFigure>, Response> {
    require_finite(&[("rate", params.rate)])?;

    let query = state.query(params.year, params.rate);
    let split = partition(&state.table, &query, state.mode());
    Ok(Json(render_map(&split, &query, &state.config.map)))
}

async fn rate_text_handler(
    Query(params): Query<RateParams>,
) -> Result<Json<MarkdownResponse>, Response> {
    require_finite(&[("rate", params.rate)])?;

    Ok(Json(MarkdownResponse {
        markdown: rate_text(params.rate),
    }))
}

async fn affected_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MapParams>,
) -> Result<Json<MarkdownResponse>, Response> {
    require_finite(&[("rate", params.rate)])?;

    let query = state.query(params.year, params.rate);
    let split = partition(&state.table, &query, state.mode());
    Ok(Json(MarkdownResponse {
        markdown: affected_text(&split),
    }))
}

async fn city_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CityParams>,
) -> Result<Json<MarkdownResponse>, Response> {
    let coordinates = [("lat", params.lat), ("lon", params.lon), ("elevation", params.elevation)];
    let mut checked = vec![("rate", params.rate)];
    checked.extend(coordinates.iter().filter_map(|(name, v)| v.map(|v| (*name, v))));
    require_finite(&checked)?;

    let query = state.query(params.year, params.rate);
    let selection = params.selection();

    city_info(selection.as_ref(), &query, state.mode())
        .map(|markdown| Json(MarkdownResponse { markdown }))
        .map_err(|e| bad_request(e.to_string()))
}

async fn query_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PointParams>,
) -> Result<Json<Option<QueryResponse>>, Response> {
    require_finite(&[("lat", params.lat), ("lon", params.lon)])?;

    let hit = state.index.nearest(&state.table, params.lat, params.lon);

    Ok(Json(hit.map(|(city, distance_m)| QueryResponse {
        selection: Selection::from(city),
        population: city.population,
        attributes: city.attributes.clone(),
        distance_m,
    })))
}
