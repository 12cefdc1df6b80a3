use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::Response,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::{
    errors::{ApiError, ServiceError},
    handlers::{
        common::{created_response, map_service_error, message_response, parse_id, success_response},
        AppState,
    },
    models::{DayRecord, DayRecordBundle, EntryPatch, RawRow, ZoneEntryInput, ZoneKind},
    services::series::parse_window_size,
};

/// Save body for kinds that track day records.
#[derive(Debug, Deserialize)]
pub struct DaySaveRequest {
    pub entries: Vec<RawRow>,
    #[serde(rename = "prevuDays", default)]
    pub planned_days: Vec<DayRecord>,
    #[serde(rename = "realiseDays", default)]
    pub realized_days: Vec<DayRecord>,
    #[serde(rename = "suppDays", default)]
    pub supplementary_days: Vec<DayRecord>,
}

/// Save body for kinds that only submit rows.
#[derive(Debug, Deserialize)]
pub struct TabularSaveRequest {
    pub data: Vec<RawRow>,
}

/// `POST /save` body, decoded according to the zone kind.
#[derive(Debug)]
pub enum SaveRequest {
    WithDays(DaySaveRequest),
    Tabular(TabularSaveRequest),
}

/// `PUT /sessions/:id` body, decoded according to the zone kind.
#[derive(Debug)]
pub enum SessionUpdateRequest {
    /// `{ entries: [plannedDays, realisedDays, suppDays] }`
    DayLists(Vec<Vec<DayRecord>>),
    /// `{ entries: ZoneEntry[] }`
    Entries(Vec<ZoneEntryInput>),
}

#[derive(Debug, Deserialize)]
struct EntriesBody<T> {
    entries: T,
}

fn decode<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body)
        .map_err(|e| ServiceError::ValidationError(format!("Invalid data format: {}", e)).into())
}

impl SaveRequest {
    pub fn decode(kind: ZoneKind, body: Value) -> Result<Self, ApiError> {
        if kind.profile().day_records {
            decode(body).map(SaveRequest::WithDays)
        } else {
            decode(body).map(SaveRequest::Tabular)
        }
    }

    pub fn into_parts(self) -> (Vec<RawRow>, DayRecordBundle) {
        match self {
            SaveRequest::WithDays(req) => (
                req.entries,
                DayRecordBundle {
                    planned: req.planned_days,
                    realized: req.realized_days,
                    supplementary: req.supplementary_days,
                },
            ),
            SaveRequest::Tabular(req) => (req.data, DayRecordBundle::default()),
        }
    }
}

impl SessionUpdateRequest {
    pub fn decode(kind: ZoneKind, body: Value) -> Result<Self, ApiError> {
        if kind.profile().day_records {
            decode::<EntriesBody<Vec<Vec<DayRecord>>>>(body)
                .map(|b| SessionUpdateRequest::DayLists(b.entries))
        } else {
            decode::<EntriesBody<Vec<ZoneEntryInput>>>(body)
                .map(|b| SessionUpdateRequest::Entries(b.entries))
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub message: String,
    pub session_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeriesQuery {
    pub zone: Option<String>,
    pub weeks: Option<String>,
}

async fn save_session(
    State(state): State<AppState>,
    Extension(kind): Extension<ZoneKind>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let (rows, days) = SaveRequest::decode(kind, body)?.into_parts();

    let snapshot = state
        .services
        .snapshots
        .save(kind, rows, days)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(SaveResponse {
        message: "Session saved successfully".to_string(),
        session_id: snapshot.id,
    }))
}

async fn list_sessions(
    State(state): State<AppState>,
    Extension(kind): Extension<ZoneKind>,
) -> Result<Response, ApiError> {
    let sessions = state
        .services
        .snapshots
        .list(kind)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(sessions))
}

async fn latest_session(
    State(state): State<AppState>,
    Extension(kind): Extension<ZoneKind>,
) -> Result<Response, ApiError> {
    let session = state
        .services
        .snapshots
        .latest(kind)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(session))
}

async fn get_session(
    State(state): State<AppState>,
    Extension(kind): Extension<ZoneKind>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id, "Session")?;
    let session = state
        .services
        .snapshots
        .get(kind, id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(session))
}

async fn update_session(
    State(state): State<AppState>,
    Extension(kind): Extension<ZoneKind>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id, "Session")?;
    let Json(body) = body?;

    let snapshots = &state.services.snapshots;
    let updated = match SessionUpdateRequest::decode(kind, body)? {
        SessionUpdateRequest::DayLists(lists) => {
            snapshots.replace_day_records(kind, id, lists).await
        }
        SessionUpdateRequest::Entries(entries) => snapshots.replace_entries(kind, id, entries).await,
    }
    .map_err(map_service_error)?;

    Ok(success_response(updated))
}

async fn delete_session(
    State(state): State<AppState>,
    Extension(kind): Extension<ZoneKind>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id, "Session")?;
    state
        .services
        .snapshots
        .delete(kind, id)
        .await
        .map_err(map_service_error)?;
    Ok(message_response("Session deleted successfully"))
}

async fn zone_series(
    State(state): State<AppState>,
    Extension(kind): Extension<ZoneKind>,
    Query(query): Query<SeriesQuery>,
) -> Result<Response, ApiError> {
    let zone = query
        .zone
        .filter(|zone| !zone.trim().is_empty())
        .ok_or_else(|| {
            ServiceError::InvalidArgument("Zone and weeks are required parameters.".to_string())
        })?;
    let window_size = parse_window_size(query.weeks.as_deref())?;

    let series = state
        .services
        .series
        .extract_for_kind(kind, &zone, window_size)
        .await
        .map_err(map_service_error)?;

    info!(kind = %kind, zone = %zone, periods = series.len(), "Series extracted");
    Ok(success_response(series))
}

async fn update_entry(
    State(state): State<AppState>,
    Extension(kind): Extension<ZoneKind>,
    Path(id): Path<String>,
    body: Result<Json<EntryPatch>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id, "Entry")?;
    let Json(patch) = body?;

    let updated = state
        .services
        .snapshots
        .update_entry(kind, id, patch)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(updated))
}

async fn delete_entry(
    State(state): State<AppState>,
    Extension(kind): Extension<ZoneKind>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id, "Entry")?;
    state
        .services
        .snapshots
        .delete_entry(kind, id)
        .await
        .map_err(map_service_error)?;
    Ok(message_response("Entry deleted successfully"))
}

/// Routes shared by every zone kind. The kind is supplied as an
/// `Extension<ZoneKind>` layer by the caller.
pub fn zone_routes() -> Router<AppState> {
    Router::new()
        .route("/save", post(save_session))
        .route("/sessions", get(list_sessions))
        .route("/sessions/latest", get(latest_session))
        .route(
            "/sessions/:id",
            get(get_session).put(update_session).delete(delete_session),
        )
        .route("/entries", get(zone_series))
        .route("/entries/:id", put(update_entry).delete(delete_entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zone1_save_body_keeps_day_lists() {
        let body = json!({
            "entries": [{"zone": "A", "couvPrev": 1, "couvReal": 1, "couvSupp": 1}],
            "prevuDays": [{"day": "lundi", "zone1": "A"}],
            "realiseDays": [],
            "suppDays": []
        });
        let (rows, days) = SaveRequest::decode(ZoneKind::Zone1, body)
            .unwrap()
            .into_parts();
        assert_eq!(rows.len(), 1);
        assert_eq!(days.planned[0].zone1.as_deref(), Some("A"));
    }

    #[test]
    fn tabular_kinds_require_a_data_list() {
        assert!(SaveRequest::decode(ZoneKind::Zone2, json!({"data": []})).is_ok());
        assert!(SaveRequest::decode(ZoneKind::Zone2, json!({"data": "rows"})).is_err());
        assert!(SaveRequest::decode(ZoneKind::Zone3, json!({"entries": []})).is_err());
    }

    #[test]
    fn session_update_shape_follows_kind() {
        let lists = json!({"entries": [[], [], []]});
        assert!(matches!(
            SessionUpdateRequest::decode(ZoneKind::Zone1, lists.clone()).unwrap(),
            SessionUpdateRequest::DayLists(l) if l.len() == 3
        ));
        assert!(SessionUpdateRequest::decode(ZoneKind::Zone2, lists).is_err());
    }
}
