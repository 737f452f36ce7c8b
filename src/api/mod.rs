use std::sync::Arc;

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;

use crate::{
    TripPlannerError,
    currency::CurrencyRate,
    map::MapView,
    models::{DownloadArtifact, ItineraryResult, TransportPreference, TripRequest, WeatherForecast},
    planner::{TripPlan, TripPlanner},
};

const INDEX_HTML: &str = include_str!("../../frontend/index.html");

#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<TripPlanner>,
}

#[derive(Serialize)]
pub struct ApiOptions {
    pub currencies: Vec<CurrencyRate>,
    pub transport_modes: Vec<TransportPreference>,
}

#[derive(Serialize)]
pub struct ApiPlan {
    pub result: ItineraryResult,
    pub budget_summary: String,
    pub currency_converted: bool,
    pub weather: Option<WeatherForecast>,
    pub weather_available: bool,
    pub weather_summary: Option<String>,
    pub map: Option<MapView>,
    pub notices: Vec<String>,
    pub download: DownloadArtifact,
}

impl TryFrom<TripPlan> for ApiPlan {
    type Error = TripPlannerError;

    fn try_from(plan: TripPlan) -> Result<Self, Self::Error> {
        Ok(Self {
            budget_summary: plan.budget_summary(),
            weather_summary: plan.weather_summary(),
            weather_available: plan.weather.is_some_and(|w| w.is_available()),
            download: plan.to_artifact()?,
            currency_converted: plan.currency_converted,
            weather: plan.weather,
            map: plan.map,
            notices: plan.notices,
            result: plan.result,
        })
    }
}

/// Every failure of the API, answered with a `{ "error": .. }` body
pub enum ApiError {
    Planner(TripPlannerError),
    /// The request body was not a well-formed trip request
    Body(JsonRejection),
}

impl From<TripPlannerError> for ApiError {
    fn from(err: TripPlannerError) -> Self {
        Self::Planner(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Planner(err) => {
                let status = match &err {
                    TripPlannerError::Validation { .. } => StatusCode::BAD_REQUEST,
                    TripPlannerError::Generation { .. } => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                tracing::warn!("Request failed with {}: {}", status, err);
                (status, err.user_message())
            }
            ApiError::Body(rejection) => {
                tracing::warn!("Rejected request body: {}", rejection.body_text());
                (rejection.status(), rejection.body_text())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/options", get(get_options))
        .route("/plan", post(create_plan))
        .with_state(state)
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn get_options(State(state): State<AppState>) -> Json<ApiOptions> {
    Json(ApiOptions {
        currencies: state.planner.converter().table().entries(),
        transport_modes: TransportPreference::ALL.to_vec(),
    })
}

async fn create_plan(
    State(state): State<AppState>,
    payload: Result<Json<TripRequest>, JsonRejection>,
) -> Result<Json<ApiPlan>, ApiError> {
    let Json(request) = payload?;
    let plan = state.planner.plan(request).await?;
    Ok(Json(ApiPlan::try_from(plan)?))
}
