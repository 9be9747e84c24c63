//! Stateless HTTP request builder and response parser for the list store.
//!
//! # Design
//! `StoreClient` holds only a `base_url`. Each store operation is split into
//! a `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`. The session keeps track of which parse
//! method belongs to which outstanding request; the client itself carries no
//! state between calls.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{ItemPatch, ItemRecord, ItemStatus, ListRecord, NewItem, NewList};

/// Characters escaped when an opaque id is placed in a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'?')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Synchronous, stateless client for the document store.
#[derive(Debug, Clone)]
pub struct StoreClient {
    base_url: String,
}

impl StoreClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.extend(utf8_percent_encode(segment, SEGMENT));
        }
        url
    }

    pub fn build_fetch_lists(&self) -> HttpRequest {
        HttpRequest::empty(HttpMethod::Get, self.url(&["lists"]))
    }

    pub fn build_create_list(&self, input: &NewList) -> Result<HttpRequest, ApiError> {
        HttpRequest::json(HttpMethod::Post, self.url(&["lists"]), input)
    }

    pub fn build_fetch_items(&self, list_id: &str) -> HttpRequest {
        HttpRequest::empty(HttpMethod::Get, self.url(&["lists", list_id, "items"]))
    }

    pub fn build_create_item(&self, list_id: &str, input: &NewItem) -> Result<HttpRequest, ApiError> {
        HttpRequest::json(HttpMethod::Post, self.url(&["lists", list_id, "items"]), input)
    }

    pub fn build_update_status(&self, item_id: &str, status: ItemStatus) -> Result<HttpRequest, ApiError> {
        let patch = ItemPatch {
            status: Some(status),
            ..ItemPatch::default()
        };
        HttpRequest::json(HttpMethod::Put, self.url(&["items", item_id]), &patch)
    }

    pub fn build_update_body(&self, item_id: &str, body: &str) -> Result<HttpRequest, ApiError> {
        let patch = ItemPatch {
            body: Some(body.to_string()),
            ..ItemPatch::default()
        };
        HttpRequest::json(HttpMethod::Put, self.url(&["items", item_id]), &patch)
    }

    pub fn build_delete_item(&self, item_id: &str) -> HttpRequest {
        HttpRequest::empty(HttpMethod::Delete, self.url(&["items", item_id]))
    }

    pub fn build_sign_out(&self) -> HttpRequest {
        HttpRequest::empty(HttpMethod::Delete, self.url(&["session"]))
    }

    pub fn parse_fetch_lists(&self, response: HttpResponse) -> Result<Vec<ListRecord>, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_create_list(&self, response: HttpResponse) -> Result<ListRecord, ApiError> {
        parse_json(response, 201)
    }

    pub fn parse_fetch_items(&self, response: HttpResponse) -> Result<Vec<ItemRecord>, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_create_item(&self, response: HttpResponse) -> Result<ItemRecord, ApiError> {
        parse_json(response, 201)
    }

    /// The store echoes the updated record; the engine only needs to know
    /// that the write landed.
    pub fn parse_update_item(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 200)
    }

    pub fn parse_delete_item(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }

    pub fn parse_sign_out(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse, expected: u16) -> Result<T, ApiError> {
    check_status(&response, expected)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> StoreClient {
        StoreClient::new("http://localhost:3000")
    }

    #[test]
    fn build_fetch_lists_produces_correct_request() {
        let req = client().build_fetch_lists();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/lists");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn trailing_slash_is_dropped_from_base_url() {
        let client = StoreClient::new("http://localhost:3000/");
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.build_fetch_lists().path, "http://localhost:3000/lists");
    }

    #[test]
    fn build_fetch_items_nests_under_list() {
        let req = client().build_fetch_items("groceries");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/lists/groceries/items");
    }

    #[test]
    fn opaque_ids_are_percent_encoded() {
        let req = client().build_delete_item("a/b c");
        assert_eq!(req.path, "http://localhost:3000/items/a%2Fb%20c");
    }

    #[test]
    fn build_update_status_sends_only_status() {
        let req = client().build_update_status("x", ItemStatus::Completed).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "http://localhost:3000/items/x");
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"status": "completed"}));
    }

    #[test]
    fn build_update_body_sends_only_body() {
        let req = client().build_update_body("x", "new text").unwrap();
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["body"], "new text");
        assert!(body.get("status").is_none());
    }

    #[test]
    fn build_create_item_without_due_date() {
        let input = NewItem {
            body: "Buy milk".to_string(),
            due_date: None,
        };
        let req = client().build_create_item("l1", &input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/lists/l1/items");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"body": "Buy milk"}));
    }

    #[test]
    fn build_sign_out_deletes_session() {
        let req = client().build_sign_out();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.path, "http://localhost:3000/session");
    }

    #[test]
    fn parse_fetch_items_success() {
        let response = HttpResponse::new(
            200,
            r#"[{"id":"i1","list_id":"l1","body":"Test","status":"completed","created":3}]"#,
        );
        let items = client().parse_fetch_items(response).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].status, ItemStatus::Completed);
        assert_eq!(items[0].created, 3);
    }

    #[test]
    fn parse_fetch_items_not_found() {
        let err = client().parse_fetch_items(HttpResponse::new(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn parse_create_list_wrong_status() {
        let err = client()
            .parse_create_list(HttpResponse::new(500, "internal error"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 500, .. }));
    }

    #[test]
    fn parse_update_item_ignores_echoed_record() {
        assert!(client().parse_update_item(HttpResponse::new(200, "{}")).is_ok());
    }

    #[test]
    fn parse_delete_item_success_and_missing() {
        assert!(client().parse_delete_item(HttpResponse::new(204, "")).is_ok());
        let err = client().parse_delete_item(HttpResponse::new(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = StoreClient::new("http://localhost:3000/");
        assert_eq!(client.build_fetch_lists().path, "http://localhost:3000/lists");
    }

    #[test]
    fn parse_fetch_lists_bad_json() {
        let err = client()
            .parse_fetch_lists(HttpResponse::new(200, "not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }
}
