use axum::http::{self, Request, StatusCode};
use axum::routing::RouterIntoService;
use http_body_util::BodyExt;
use mock_server::{app, Item, List, Status};
use tower::{Service, ServiceExt};

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

async fn send(app: &mut RouterIntoService<String>, request: Request<String>) -> axum::response::Response {
    ServiceExt::ready(app).await.unwrap().call(request).await.unwrap()
}

// --- lists ---

#[tokio::test]
async fn lists_start_empty() {
    let resp = app().oneshot(empty_request("GET", "/lists")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let lists: Vec<List> = body_json(resp).await;
    assert!(lists.is_empty());
}

#[tokio::test]
async fn create_list_returns_201() {
    let resp = app()
        .oneshot(json_request("POST", "/lists", r##"{"name":"Home","color":"#bb2b2b"}"##))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let list: List = body_json(resp).await;
    assert_eq!(list.name, "Home");
    assert_eq!(list.color, "#bb2b2b");
}

#[tokio::test]
async fn create_list_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/lists", r#"{"title":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- items ---

#[tokio::test]
async fn items_of_unknown_list_is_404() {
    let resp = app()
        .oneshot(empty_request("GET", "/lists/nope/items"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_item_in_unknown_list_is_404() {
    let resp = app()
        .oneshot(json_request("POST", "/lists/nope/items", r#"{"body":"x"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_item_not_found() {
    let resp = app()
        .oneshot(json_request("PUT", "/items/nope", r#"{"body":"x"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_item_not_found() {
    let resp = app().oneshot(empty_request("DELETE", "/items/nope")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sign_out_returns_204() {
    let resp = app().oneshot(empty_request("DELETE", "/session")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

// --- full lifecycle ---

#[tokio::test]
async fn list_and_item_lifecycle() {
    let mut app = app().into_service();

    // create a list
    let resp = send(&mut app, json_request("POST", "/lists", r#"{"name":"Chores"}"#)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let list: List = body_json(resp).await;

    // two items, the second with a due date
    let uri = format!("/lists/{}/items", list.id);
    let resp = send(&mut app, json_request("POST", &uri, r#"{"body":"Walk dog"}"#)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let first: Item = body_json(resp).await;
    assert_eq!(first.status, Status::Pending);
    assert_eq!(first.list_id, list.id);
    assert!(first.due_date.is_none());

    let resp = send(
        &mut app,
        json_request("POST", &uri, r#"{"body":"Pay rent","due_date":"2020-10-01T09:00:00Z"}"#),
    )
    .await;
    let second: Item = body_json(resp).await;
    assert!(second.created > first.created);
    assert!(second.due_date.is_some());

    // fetch items of the list
    let resp = send(&mut app, empty_request("GET", &uri)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let items: Vec<Item> = body_json(resp).await;
    assert_eq!(items.len(), 2);

    // update status only
    let item_uri = format!("/items/{}", first.id);
    let resp = send(&mut app, json_request("PUT", &item_uri, r#"{"status":"completed"}"#)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Item = body_json(resp).await;
    assert_eq!(updated.body, "Walk dog");
    assert_eq!(updated.status, Status::Completed);

    // update body only
    let resp = send(&mut app, json_request("PUT", &item_uri, r#"{"body":"Walk cat"}"#)).await;
    let updated: Item = body_json(resp).await;
    assert_eq!(updated.body, "Walk cat");
    assert_eq!(updated.status, Status::Completed);

    // delete
    let resp = send(&mut app, empty_request("DELETE", &item_uri)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // delete again: 404
    let resp = send(&mut app, empty_request("DELETE", &item_uri)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // one item left
    let resp = send(&mut app, empty_request("GET", &uri)).await;
    let items: Vec<Item> = body_json(resp).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, second.id);

    // the list is listed
    let resp = send(&mut app, empty_request("GET", "/lists")).await;
    let lists: Vec<List> = body_json(resp).await;
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].name, "Chores");
    assert_eq!(lists[0].color, "#4e8fef");
}
