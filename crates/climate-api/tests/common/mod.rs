//! Shared fixtures for HTTP API tests.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use climate_api::{create_router, ClimateStore};
use http_body_util::BodyExt;
use rusqlite::{params, Connection};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Write a dataset fixture and build a router over it.
/// Returns (Router, TempDir) so the tempdir stays alive.
pub fn seed_router(
    measurements: &[(&str, &str, Option<f64>, f64)],
    stations: &[(&str, &str)],
) -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("climate.sqlite");
    let conn = Connection::open(&db_path).unwrap();
    conn.execute_batch(
        "CREATE TABLE measurement (
            id      INTEGER PRIMARY KEY,
            station TEXT NOT NULL,
            date    TEXT NOT NULL,
            prcp    REAL,
            tobs    REAL NOT NULL
        );
        CREATE TABLE station (
            id      INTEGER PRIMARY KEY,
            station TEXT NOT NULL UNIQUE,
            name    TEXT NOT NULL
        );",
    )
    .unwrap();
    for (station, date, prcp, tobs) in measurements {
        conn.execute(
            "INSERT INTO measurement (station, date, prcp, tobs) VALUES (?1, ?2, ?3, ?4)",
            params![station, date, prcp, tobs],
        )
        .unwrap();
    }
    for (station, name) in stations {
        conn.execute(
            "INSERT INTO station (station, name) VALUES (?1, ?2)",
            params![station, name],
        )
        .unwrap();
    }
    drop(conn);

    let store = ClimateStore::open(&db_path).unwrap();
    (create_router(Arc::new(store)), dir)
}

/// Issue an in-process GET request and return status + raw body.
pub async fn get(router: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

/// Issue an in-process GET request and parse the body as JSON.
pub async fn get_json(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, body) = get(router, uri).await;
    let value = serde_json::from_slice(&body).unwrap();
    (status, value)
}
