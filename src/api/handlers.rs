//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::AppState;
use super::types::{
    ErrorResponse, FilterQuery, ForecastQuery, ForecastResponse, InsufficientHistoryResponse,
    SummaryResponse,
};
use crate::consumption::ConsumptionPoint;
use crate::forecast::{DEFAULT_HORIZON_DAYS, MIN_HISTORY_POINTS};
use crate::model::MeterId;
use crate::queries;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse { error: message }),
    )
}

/// Returns summary statistics and the anomaly gauge for the filtered
/// series.
///
/// `GET /summary` → 200 + `SummaryResponse` JSON
/// `GET /summary?facility=1,2&utility=Water&start=...&end=...` → filtered
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let filter = query.to_filter().map_err(bad_request)?;
    let stats = queries::summary_stats_for(&state.store, &filter);
    let anomaly = queries::anomaly_indicator_for(&state.store, &filter);
    Ok(Json(SummaryResponse { stats, anomaly }))
}

/// Returns the derived consumption series for the filtered readings.
///
/// `GET /series` → 200 + `Vec<ConsumptionPoint>` JSON; an empty match is
/// an empty array, never an error.
pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<ConsumptionPoint>>, ApiError> {
    let filter = query.to_filter().map_err(bad_request)?;
    Ok(Json(queries::consumption_series(&state.store, &filter)))
}

/// Returns the forecast bundle for one meter.
///
/// `GET /forecast/{meter_id}` → 200 + `ForecastResponse` JSON
/// `GET /forecast/{meter_id}?horizon=N` → N-day horizon
/// Unknown meter → 404; too little history → 200 +
/// `InsufficientHistoryResponse`.
pub async fn get_forecast(
    State(state): State<Arc<AppState>>,
    Path(meter_id): Path<MeterId>,
    Query(query): Query<ForecastQuery>,
) -> Result<Response, ApiError> {
    let horizon = query.horizon.unwrap_or(DEFAULT_HORIZON_DAYS);

    let forecast = queries::forecast_for(&state.store, meter_id, horizon).map_err(|e| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })?;

    match forecast {
        Some(fc) => Ok(Json(ForecastResponse::from_forecast(meter_id, horizon, fc)).into_response()),
        None => {
            let reading_count = state
                .store
                .readings_for(meter_id)
                .map(|r| r.len())
                .unwrap_or(0);
            Ok(Json(InsufficientHistoryResponse {
                insufficient_history: true,
                reading_count,
                required: MIN_HISTORY_POINTS,
            })
            .into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;
    use crate::model::{Reading, UtilityType};
    use crate::store::ReadingStore;
    use time::Duration;
    use time::macros::date;

    /// Store with one 40-day linear electricity meter (id 1) and one
    /// 5-reading water meter (id 2).
    fn make_test_state() -> Arc<AppState> {
        let mut store = ReadingStore::new();
        let f = store.add_facility("Site", "Central", 500);
        let elec = store.add_meter(f, UtilityType::Electricity).unwrap();
        let water = store.add_meter(f, UtilityType::Water).unwrap();
        let mut value = 1000.0;
        for i in 0..40 {
            if i > 0 {
                value += 5.0 + 2.0 * f64::from(i);
            }
            store
                .add_reading(Reading {
                    meter_id: elec,
                    date: date!(2024 - 01 - 01) + Duration::days(i64::from(i)),
                    value,
                    cost: 1.0,
                })
                .unwrap();
        }
        for i in 0..5 {
            store
                .add_reading(Reading {
                    meter_id: water,
                    date: date!(2024 - 01 - 01) + Duration::days(i64::from(i)),
                    value: 100.0 + 10.0 * f64::from(i),
                    cost: 2.0,
                })
                .unwrap();
        }
        Arc::new(AppState { store })
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = router(make_test_state());
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap();
        (status, json)
    }

    #[tokio::test]
    async fn summary_returns_stats_and_anomaly() {
        let (status, json) = get_json("/summary").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["stats"]["total_consumption"].is_number());
        assert_eq!(json["stats"]["count"], 45);
        assert!(json["anomaly"]["band"].is_string());
        assert_eq!(json["anomaly"]["baseline"], 250.0);
    }

    #[tokio::test]
    async fn series_honors_utility_filter() {
        let (status, json) = get_json("/series?utility=Water").await;
        assert_eq!(status, StatusCode::OK);
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| r["utility"] == "Water"));
    }

    #[tokio::test]
    async fn series_with_bad_filter_returns_400() {
        let (status, json) = get_json("/series?utility=gas").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json.get("error").is_some());
    }

    #[tokio::test]
    async fn series_with_unmatched_filter_is_empty_array() {
        let (status, json) = get_json("/series?facility=99").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn forecast_returns_bundle_for_long_meter() {
        let (status, json) = get_json("/forecast/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["meter_id"], 1);
        assert_eq!(json["predicted"].as_array().map(Vec::len), Some(30));
        assert!(json["accuracy"].as_f64().unwrap() > 0.999);
    }

    #[tokio::test]
    async fn forecast_honors_horizon_param() {
        let (status, json) = get_json("/forecast/1?horizon=7").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["predicted"].as_array().map(Vec::len), Some(7));
    }

    #[tokio::test]
    async fn forecast_short_meter_reports_insufficient_history() {
        let (status, json) = get_json("/forecast/2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["insufficient_history"], true);
        assert_eq!(json["reading_count"], 5);
        assert_eq!(json["required"], 30);
    }

    #[tokio::test]
    async fn forecast_unknown_meter_returns_404() {
        let (status, json) = get_json("/forecast/99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json.get("error").is_some());
    }
}
