use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct List {
    pub id: String,
    pub name: String,
    pub color: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Completed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub list_id: String,
    pub body: String,
    pub status: Status,
    pub created: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct CreateList {
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "#4e8fef".to_string()
}

#[derive(Deserialize)]
pub struct CreateItem {
    pub body: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct UpdateItem {
    pub body: Option<String>,
    pub status: Option<Status>,
}

#[derive(Default)]
pub struct Store {
    /// Lists in creation order.
    lists: Vec<List>,
    items: HashMap<String, Item>,
    last_created: i64,
}

impl Store {
    /// Creation stamps are wall-clock milliseconds, bumped to stay strictly
    /// increasing so items created in the same millisecond still sort.
    fn next_created(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        self.last_created = now.max(self.last_created + 1);
        self.last_created
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/lists", get(list_lists).post(create_list))
        .route("/lists/{id}/items", get(list_items).post(create_item))
        .route("/items/{id}", put(update_item).delete(delete_item))
        .route("/session", delete(sign_out))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_lists(State(db): State<Db>) -> Json<Vec<List>> {
    let store = db.read().await;
    Json(store.lists.clone())
}

async fn create_list(State(db): State<Db>, Json(input): Json<CreateList>) -> (StatusCode, Json<List>) {
    let list = List {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        color: input.color,
    };
    db.write().await.lists.push(list.clone());
    tracing::info!(list = %list.id, "list created");
    (StatusCode::CREATED, Json(list))
}

/// Items come back in storage order, not creation order.
async fn list_items(State(db): State<Db>, Path(list_id): Path<String>) -> Result<Json<Vec<Item>>, StatusCode> {
    let store = db.read().await;
    if !store.lists.iter().any(|list| list.id == list_id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let items = store
        .items
        .values()
        .filter(|item| item.list_id == list_id)
        .cloned()
        .collect();
    Ok(Json(items))
}

async fn create_item(
    State(db): State<Db>,
    Path(list_id): Path<String>,
    Json(input): Json<CreateItem>,
) -> Result<(StatusCode, Json<Item>), StatusCode> {
    let mut store = db.write().await;
    if !store.lists.iter().any(|list| list.id == list_id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let item = Item {
        id: Uuid::new_v4().to_string(),
        list_id,
        body: input.body,
        status: Status::Pending,
        created: store.next_created(),
        due_date: input.due_date,
    };
    store.items.insert(item.id.clone(), item.clone());
    tracing::debug!(item = %item.id, list = %item.list_id, "item created");
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update_item(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<UpdateItem>,
) -> Result<Json<Item>, StatusCode> {
    let mut store = db.write().await;
    let item = store.items.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(body) = input.body {
        item.body = body;
    }
    if let Some(status) = input.status {
        item.status = status;
    }
    Ok(Json(item.clone()))
}

async fn delete_item(State(db): State<Db>, Path(id): Path<String>) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    store
        .items
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn sign_out() -> StatusCode {
    tracing::info!("session signed out");
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_serializes_without_missing_due_date() {
        let item = Item {
            id: "i1".to_string(),
            list_id: "l1".to_string(),
            body: "Test".to_string(),
            status: Status::Pending,
            created: 7,
            due_date: None,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["created"], 7);
        assert!(json.get("due_date").is_none());
    }

    #[test]
    fn create_list_defaults_color() {
        let input: CreateList = serde_json::from_str(r#"{"name":"Home"}"#).unwrap();
        assert_eq!(input.name, "Home");
        assert_eq!(input.color, "#4e8fef");
    }

    #[test]
    fn create_item_rejects_missing_body() {
        let result: Result<CreateItem, _> = serde_json::from_str(r#"{"due_date":null}"#);
        assert!(result.is_err());
    }

    #[test]
    fn create_item_parses_due_date() {
        let input: CreateItem =
            serde_json::from_str(r#"{"body":"pay rent","due_date":"2020-09-21T15:05:00Z"}"#).unwrap();
        assert_eq!(input.due_date.unwrap().timestamp(), 1_600_700_700);
    }

    #[test]
    fn update_item_all_fields_optional() {
        let input: UpdateItem = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.body.is_none());
        assert!(input.status.is_none());
    }

    #[test]
    fn update_item_rejects_unknown_status() {
        let result: Result<UpdateItem, _> = serde_json::from_str(r#"{"status":"archived"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn created_stamps_strictly_increase() {
        let mut store = Store::default();
        let first = store.next_created();
        let second = store.next_created();
        assert!(second > first);
    }
}
