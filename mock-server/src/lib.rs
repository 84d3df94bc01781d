use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub type Record = Map<String, Value>;

/// Records per resource name, in insertion order.
pub type Db = Arc<RwLock<HashMap<String, Vec<Record>>>>;

pub const DEFAULT_PER_PAGE: usize = 20;

pub fn app() -> Router {
    let db: Db = Arc::default();
    Router::new()
        .route("/api/{resource}", get(list_records).post(create_record))
        .route("/api/{resource}/search", get(search_records))
        .route(
            "/api/{resource}/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Match {
    Exact,
    Contains,
}

async fn list_records(
    State(db): State<Db>,
    Path(resource): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<Vec<Record>> {
    let db = db.read().await;
    let records = db.get(&resource).map(Vec::as_slice).unwrap_or_default();
    Json(select(records, &params, Match::Exact))
}

async fn search_records(
    State(db): State<Db>,
    Path(resource): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<Vec<Record>> {
    let db = db.read().await;
    let records = db.get(&resource).map(Vec::as_slice).unwrap_or_default();
    Json(select(records, &params, Match::Contains))
}

async fn create_record(
    State(db): State<Db>,
    Path(resource): Path<String>,
    Json(mut record): Json<Record>,
) -> (StatusCode, Json<Record>) {
    if record.get("id").is_none_or(Value::is_null) {
        record.insert("id".to_string(), Value::from(Uuid::new_v4().to_string()));
    }
    debug!(%resource, id = %record["id"], "created record");
    db.write()
        .await
        .entry(resource)
        .or_default()
        .push(record.clone());
    (StatusCode::CREATED, Json(record))
}

async fn get_record(
    State(db): State<Db>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Json<Record>, StatusCode> {
    let db = db.read().await;
    db.get(&resource)
        .and_then(|records| records.iter().find(|r| has_id(r, &id)))
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_record(
    State(db): State<Db>,
    Path((resource, id)): Path<(String, String)>,
    Json(changes): Json<Record>,
) -> Result<Json<Record>, StatusCode> {
    let mut db = db.write().await;
    let record = db
        .get_mut(&resource)
        .and_then(|records| records.iter_mut().find(|r| has_id(r, &id)))
        .ok_or(StatusCode::NOT_FOUND)?;
    for (key, value) in changes {
        if key != "id" {
            record.insert(key, value);
        }
    }
    Ok(Json(record.clone()))
}

async fn delete_record(
    State(db): State<Db>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Json<Record>, StatusCode> {
    let mut db = db.write().await;
    let records = db.get_mut(&resource).ok_or(StatusCode::NOT_FOUND)?;
    let index = records
        .iter()
        .position(|r| has_id(r, &id))
        .ok_or(StatusCode::NOT_FOUND)?;
    debug!(%resource, %id, "deleted record");
    Ok(Json(records.remove(index)))
}

/// Apply filters, `sort` and `page`/`per_page` to a resource's records.
fn select(records: &[Record], params: &[(String, String)], mode: Match) -> Vec<Record> {
    let mut page = 1;
    let mut per_page = DEFAULT_PER_PAGE;
    let mut sort = None;
    let mut filters = Vec::new();
    for (key, value) in params {
        match key.as_str() {
            "page" => page = value.parse().unwrap_or(1).max(1),
            "per_page" => per_page = value.parse().unwrap_or(DEFAULT_PER_PAGE).max(1),
            "sort" if !value.is_empty() => sort = Some(value.as_str()),
            "sort" => {}
            _ => filters.push((key.as_str(), value.as_str())),
        }
    }

    let mut selected: Vec<&Record> = records
        .iter()
        .filter(|record| {
            filters.iter().all(|(key, wanted)| {
                record.get(*key).map(text).is_some_and(|actual| match mode {
                    Match::Exact => actual == *wanted,
                    Match::Contains => actual.to_lowercase().contains(&wanted.to_lowercase()),
                })
            })
        })
        .collect();

    if let Some(sort) = sort {
        let (field, descending) = match sort.strip_prefix('-') {
            Some(field) => (field, true),
            None => (sort, false),
        };
        selected.sort_by(|a, b| {
            let ordering = compare(a.get(field), b.get(field));
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }

    selected
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .cloned()
        .collect()
}

fn has_id(record: &Record, id: &str) -> bool {
    record.get("id").is_some_and(|value| text(value) == id)
}

/// A field value as it would appear in a URL.
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => text(x).cmp(&text(y)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
