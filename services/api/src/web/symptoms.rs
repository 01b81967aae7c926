//! services/api/src/web/symptoms.rs
//!
//! Handlers for reading a ZIP's symptom history and recording new reports.

use crate::error::{ApiError, ErrorBody};
use crate::web::extract::ApiJson;
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use outbreak_core::{day_index, merge_daily_report, SymptomCounts, ZipRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// A daily symptom report: `zipCode` plus one integer field per reported symptom.
#[derive(Deserialize)]
pub struct PostSymptomsRequest {
    #[serde(rename = "zipCode")]
    pub zip_code: Option<Value>,
    #[serde(flatten)]
    pub counts: serde_json::Map<String, Value>,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// ZIP codes may arrive as strings or as bare numbers.
fn zip_from_value(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(zip) if !zip.trim().is_empty() => Some(zip.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /symptoms/{zip} - The stored record for a ZIP code
#[utoipa::path(
    get,
    path = "/symptoms/{zip}",
    params(("zip" = String, Path, description = "The ZIP code.")),
    responses(
        (status = 200, description = "The ZIP record with its day entries"),
        (status = 404, description = "Unknown ZIP", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn get_symptoms_handler(
    State(state): State<Arc<AppState>>,
    Path(zip): Path<String>,
) -> Result<Json<ZipRecord>, ApiError> {
    let record = state.db.get_zip_record(&zip).await?;
    Ok(Json(record))
}

/// POST /postSymptoms - Add today's counts to a ZIP
#[utoipa::path(
    post,
    path = "/postSymptoms",
    request_body(content_type = "application/json", description = "`zipCode` plus `<symptom>: count` fields."),
    responses(
        (status = 200, description = "Report recorded", body = MessageResponse),
        (status = 400, description = "Missing zipCode", body = ErrorBody),
        (status = 404, description = "Unknown ZIP", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn post_symptoms_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<PostSymptomsRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let zip = zip_from_value(req.zip_code)
        .ok_or_else(|| ApiError::Validation("zipCode is required".to_string()))?;

    let (counts, ignored) = SymptomCounts::from_report(&req.counts);
    if !ignored.is_empty() {
        warn!(zip = %zip, ?ignored, "Ignoring unrecognised report fields");
    }

    // Held until the merged entries are written back.
    let _guard = state.report_locks.lock(&zip).await;

    let mut record = state.db.get_zip_record(&zip).await?;
    let outcome = merge_daily_report(&mut record.entries, &counts, day_index(Utc::now()))?;
    state.db.save_zip_entries(&zip, &record.entries).await?;

    info!(zip = %zip, ?outcome, "Processed symptom report");
    Ok(Json(MessageResponse::new("success")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::testing::{
        send, send_raw, test_app, FakeTextGenerator, FakeZipMetadata, InMemoryDb,
    };
    use axum::http::StatusCode;
    use outbreak_core::{DayEntry, Symptom};
    use serde_json::json;

    fn entry(day: i64, fever: u64) -> DayEntry {
        let mut symptoms = SymptomCounts::new();
        symptoms.set(Symptom::Fever, fever);
        DayEntry { day, symptoms }
    }

    fn today() -> i64 {
        day_index(Utc::now())
    }

    #[tokio::test]
    async fn get_symptoms_returns_the_record() {
        let db = InMemoryDb::default().with_zip("91344", Some(52450), vec![entry(100, 5)]);
        let app = test_app(db, FakeTextGenerator::default(), FakeZipMetadata::default());

        let (status, body) = send(&app.router, "GET", "/symptoms/91344", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["zip"], "91344");
        assert_eq!(body["population"], 52450);
        assert_eq!(body["entries"][0]["day"], 100);
        assert_eq!(body["entries"][0]["symptoms"]["fever"], 5);
        assert_eq!(body["entries"][0]["symptoms"]["cough"], 0);
    }

    #[tokio::test]
    async fn get_symptoms_unknown_zip_is_404() {
        let app = test_app(
            InMemoryDb::default(),
            FakeTextGenerator::default(),
            FakeZipMetadata::default(),
        );
        let (status, body) = send(&app.router, "GET", "/symptoms/00000", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].as_str().unwrap().contains("00000"));
    }

    #[tokio::test]
    async fn report_on_the_same_day_increments_todays_entry() {
        let db = InMemoryDb::default().with_zip("91344", Some(100), vec![entry(today(), 5)]);
        let app = test_app(db, FakeTextGenerator::default(), FakeZipMetadata::default());

        let (status, body) = send(
            &app.router,
            "POST",
            "/postSymptoms",
            Some(json!({ "zipCode": "91344", "fever": 3, "cough": 1 })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "success");

        let record = app.db.zips.lock().unwrap()["91344"].clone();
        assert_eq!(record.entries.len(), 1);
        assert_eq!(record.entries[0].symptoms.get(Symptom::Fever), 8);
        assert_eq!(record.entries[0].symptoms.get(Symptom::Cough), 1);
        assert_eq!(record.entries[0].symptoms.get(Symptom::Rash), 0);
    }

    #[tokio::test]
    async fn report_on_a_new_day_appends_an_entry() {
        let db = InMemoryDb::default().with_zip("91344", Some(100), vec![entry(today() - 1, 5)]);
        let app = test_app(db, FakeTextGenerator::default(), FakeZipMetadata::default());

        let (status, _) = send(
            &app.router,
            "POST",
            "/postSymptoms",
            Some(json!({ "zipCode": 91344, "fever": 3, "hiccups": 40 })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let record = app.db.zips.lock().unwrap()["91344"].clone();
        assert_eq!(record.entries, vec![entry(today() - 1, 5), entry(today(), 3)]);
    }

    #[tokio::test]
    async fn unknown_symptom_keys_are_never_stored() {
        let db = InMemoryDb::default().with_zip("94110", None, Vec::new());
        let app = test_app(db, FakeTextGenerator::default(), FakeZipMetadata::default());

        send(
            &app.router,
            "POST",
            "/postSymptoms",
            Some(json!({ "zipCode": "94110", "hiccups": 2, "rash": 1 })),
        )
        .await;

        let (_, body) = send(&app.router, "GET", "/symptoms/94110", None).await;
        let symptoms = body["entries"][0]["symptoms"].as_object().unwrap();
        assert_eq!(symptoms.len(), Symptom::COUNT);
        assert!(!symptoms.contains_key("hiccups"));
        assert_eq!(symptoms["rash"], 1);
    }

    #[tokio::test]
    async fn report_for_unknown_zip_is_404_and_creates_nothing() {
        let app = test_app(
            InMemoryDb::default(),
            FakeTextGenerator::default(),
            FakeZipMetadata::default(),
        );

        let (status, _) = send(
            &app.router,
            "POST",
            "/postSymptoms",
            Some(json!({ "zipCode": "12345", "fever": 1 })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(app.db.zips.lock().unwrap().is_empty());
        assert_eq!(app.report_locks.tracked_zips(), 0);
    }

    #[tokio::test]
    async fn many_unknown_zips_leave_no_locks_behind() {
        let app = test_app(
            InMemoryDb::default(),
            FakeTextGenerator::default(),
            FakeZipMetadata::default(),
        );

        for i in 0..200 {
            let (status, _) = send(
                &app.router,
                "POST",
                "/postSymptoms",
                Some(json!({ "zipCode": format!("bogus-{}", i), "fever": 1 })),
            )
            .await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
        assert_eq!(app.report_locks.tracked_zips(), 0);
    }

    #[tokio::test]
    async fn malformed_report_body_is_a_json_400() {
        let app = test_app(
            InMemoryDb::default(),
            FakeTextGenerator::default(),
            FakeZipMetadata::default(),
        );

        let (status, body) =
            send_raw(&app.router, "POST", "/postSymptoms", Some("not json".to_string())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("JSON"));
    }

    #[tokio::test]
    async fn report_without_zip_code_is_400() {
        let app = test_app(
            InMemoryDb::default(),
            FakeTextGenerator::default(),
            FakeZipMetadata::default(),
        );

        let (status, body) =
            send(&app.router, "POST", "/postSymptoms", Some(json!({ "fever": 1 }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "zipCode is required");
    }

    #[tokio::test]
    async fn concurrent_reports_for_one_zip_are_all_counted() {
        let db = InMemoryDb::default().with_zip("91344", Some(100), Vec::new());
        let app = test_app(db, FakeTextGenerator::default(), FakeZipMetadata::default());

        let reports = (0..20).map(|_| {
            let router = app.router.clone();
            tokio::spawn(async move {
                send(
                    &router,
                    "POST",
                    "/postSymptoms",
                    Some(json!({ "zipCode": "91344", "fever": 1 })),
                )
                .await
            })
        });
        for report in reports.collect::<Vec<_>>() {
            assert_eq!(report.await.unwrap().0, StatusCode::OK);
        }
        assert_eq!(app.report_locks.tracked_zips(), 0);

        let record = app.db.zips.lock().unwrap()["91344"].clone();
        let fever: u64 = record
            .entries
            .iter()
            .map(|entry| entry.symptoms.get(Symptom::Fever))
            .sum();
        assert_eq!(fever, 20);
    }

    #[test]
    fn zip_codes_accept_strings_and_numbers() {
        assert_eq!(zip_from_value(Some(json!(" 91344 "))), Some("91344".to_string()));
        assert_eq!(zip_from_value(Some(json!(91344))), Some("91344".to_string()));
        assert_eq!(zip_from_value(Some(json!(""))), None);
        assert_eq!(zip_from_value(Some(json!(null))), None);
        assert_eq!(zip_from_value(None), None);
    }
}
