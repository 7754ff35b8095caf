use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::dataset::MatchTable;
use crate::error::AggregationError;
use crate::models::{
    ApiResponse, CorrelationResult, Distribution, HeadToHeadRecord, MatchRecord, Overview, Scope,
    Season, SeasonValue, TTestResult, TeamComparison, TeamProfile, TeamValue, ZTestResult,
};
use crate::services::{
    champions_goals_test, compare_teams, distribution, head_to_head_record, home_advantage_test,
    overview, resolve_team, season_trend, shots_goals_correlation, team_profile, teams, top_teams,
    Metric,
};

const DEFAULT_TOP_TEAMS: usize = 15;
const MAX_TOP_TEAMS: usize = 100;

type Table = &'static MatchTable;
type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

pub async fn serve(table: Table, port: u16) -> anyhow::Result<()> {
    let app = create_router().with_state(table);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("plstats API server listening on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

fn create_router() -> Router<Table> {
    Router::new()
        .route("/health", get(health_check))
        .route("/overview", get(overview_handler))
        .route("/seasons/{metric}", get(seasons_handler))
        .route("/distribution/{metric}", get(distribution_handler))
        .route("/teams", get(teams_handler))
        .route("/teams/top/{metric}", get(top_teams_handler))
        .route("/teams/{name}", get(team_handler))
        .route("/head-to-head/{team}/{opponent}", get(head_to_head_handler))
        .route("/compare/{first}/{second}", get(compare_handler))
        .route("/tests/champions", get(champions_test_handler))
        .route("/tests/home-advantage", get(home_advantage_handler))
        .route("/tests/correlation", get(correlation_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Query parameters shared by every analysis endpoint.
#[derive(Debug, Default, Deserialize)]
struct SliceQuery {
    scope: Option<Scope>,
    from: Option<Season>,
    limit: Option<usize>,
}

impl SliceQuery {
    fn scope(&self) -> Scope {
        self.scope.unwrap_or_default()
    }

    fn rows(&self, table: Table) -> Vec<&'static MatchRecord> {
        table.select_from(self.scope(), self.from)
    }
}

fn respond<T: Serialize>(result: Result<T, AggregationError>) -> ApiResult<T> {
    match result {
        Ok(data) => Ok(Json(ApiResponse::success(data))),
        Err(e) => {
            let status = match e {
                AggregationError::UnknownTeam { .. } => StatusCode::NOT_FOUND,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            };
            tracing::warn!("Request rejected: {}", e);
            Err((status, Json(ApiResponse::error(e.to_string()))))
        }
    }
}

// Health check endpoint
async fn health_check(State(table): State<Table>) -> Json<ApiResponse<String>> {
    Json(ApiResponse::success(format!("plstats is serving {} matches", table.len())))
}

// GET /overview
async fn overview_handler(State(table): State<Table>, Query(params): Query<SliceQuery>) -> ApiResult<Overview> {
    respond(overview(&params.rows(table)))
}

// GET /seasons/{metric} - Per-season trend of a metric
async fn seasons_handler(
    State(table): State<Table>,
    Path(metric): Path<Metric>,
    Query(params): Query<SliceQuery>,
) -> ApiResult<Vec<SeasonValue>> {
    respond(season_trend(&params.rows(table), metric))
}

// GET /distribution/{metric}
async fn distribution_handler(
    State(table): State<Table>,
    Path(metric): Path<Metric>,
    Query(params): Query<SliceQuery>,
) -> ApiResult<Distribution> {
    respond(distribution(&params.rows(table), metric))
}

// GET /teams
async fn teams_handler(State(table): State<Table>, Query(params): Query<SliceQuery>) -> ApiResult<Vec<String>> {
    respond(Ok(teams(&params.rows(table))))
}

// GET /teams/top/{metric} - Team ranking, home and away merged
async fn top_teams_handler(
    State(table): State<Table>,
    Path(metric): Path<Metric>,
    Query(params): Query<SliceQuery>,
) -> ApiResult<Vec<TeamValue>> {
    let limit = params.limit.unwrap_or(DEFAULT_TOP_TEAMS).min(MAX_TOP_TEAMS);
    respond(top_teams(&params.rows(table), metric, limit))
}

// GET /teams/{name} - Team profile
async fn team_handler(
    State(table): State<Table>,
    Path(name): Path<String>,
    Query(params): Query<SliceQuery>,
) -> ApiResult<TeamProfile> {
    let rows = params.rows(table);
    let detailed = params.scope() == Scope::Detailed;
    respond(resolve_team(&rows, &name).and_then(|team| team_profile(&rows, &team, detailed)))
}

// GET /head-to-head/{team}/{opponent}
async fn head_to_head_handler(
    State(table): State<Table>,
    Path((team, opponent)): Path<(String, String)>,
    Query(params): Query<SliceQuery>,
) -> ApiResult<HeadToHeadRecord> {
    let rows = params.rows(table);
    respond(resolve_team(&rows, &team).and_then(|team| {
        let opponent = resolve_team(&rows, &opponent)?;
        Ok(head_to_head_record(&rows, &team, &opponent))
    }))
}

// GET /compare/{first}/{second}
async fn compare_handler(
    State(table): State<Table>,
    Path((first, second)): Path<(String, String)>,
    Query(params): Query<SliceQuery>,
) -> ApiResult<TeamComparison> {
    let rows = params.rows(table);
    let detailed = params.scope() == Scope::Detailed;
    respond(resolve_team(&rows, &first).and_then(|first| {
        let second = resolve_team(&rows, &second)?;
        compare_teams(&rows, &first, &second, detailed)
    }))
}

// GET /tests/champions - Welch t-test on home goals
async fn champions_test_handler(State(table): State<Table>, Query(params): Query<SliceQuery>) -> ApiResult<TTestResult> {
    respond(champions_goals_test(&params.rows(table)))
}

// GET /tests/home-advantage - Two-proportion z-test
async fn home_advantage_handler(State(table): State<Table>, Query(params): Query<SliceQuery>) -> ApiResult<ZTestResult> {
    respond(home_advantage_test(&params.rows(table)))
}

// GET /tests/correlation - Shots on target vs goals
async fn correlation_handler(
    State(table): State<Table>,
    Query(params): Query<SliceQuery>,
) -> ApiResult<CorrelationResult> {
    respond(shots_goals_correlation(&params.rows(table)))
}
