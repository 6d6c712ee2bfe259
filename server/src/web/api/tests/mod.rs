
use crate::auth_session::SessionToken;
use crate::data_store::store_mock::StoreMock;
use crate::web::api::configure_app;
use crate::web::AppState;
use actix_web::{test, web, App};
use std::sync::Arc;

const APP_SECRET: &str = "123456";

fn session_header(user_id: i32) -> (String, String) {
    (
        "X-SESSION-TOKEN".to_string(),
        SessionToken::new(user_id).as_string(APP_SECRET),
    )
}

#[actix_web::test]
async fn test_list_events() {
    let data_store_mock = StoreMock::default();
    sample_data::fill_sample_data(&data_store_mock);
    let state = AppState {
        store: Arc::new(data_store_mock),
        secret: APP_SECRET.to_string(),
    };
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/events")
        .append_header(session_header(sample_data::PLAIN_USER_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    // The soft-deleted event is not listed.
    assert_eq!(body["count"], 3);
    assert_eq!(body["countFiltered"], 3);
    let names: Vec<&str> = body["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["name"].as_str().unwrap())
        .collect();
    // Default order is by name, ascending.
    assert_eq!(names, vec!["Autumn Fair", "Book Club", "Winter Market"]);
}

#[actix_web::test]
async fn test_list_events_requires_session() {
    let data_store_mock = StoreMock::default();
    sample_data::fill_sample_data(&data_store_mock);
    let state = AppState {
        store: Arc::new(data_store_mock),
        secret: APP_SECRET.to_string(),
    };
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/events").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    let req = test::TestRequest::get()
        .uri("/api/v1/events")
        .append_header(("X-SESSION-TOKEN", "not a valid token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn test_list_events_info_filter() {
    let data_store_mock = StoreMock::default();
    sample_data::fill_sample_data(&data_store_mock);
    let state = AppState {
        store: Arc::new(data_store_mock),
        secret: APP_SECRET.to_string(),
    };
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    // "fair" matches "Autumn Fair" by name, "floor" matches "Winter Market" by notes.
    let req = test::TestRequest::get()
        .uri("/api/v1/events?filters%5Binfo%5D=fair%7Cfloor")
        .append_header(session_header(sample_data::PLAIN_USER_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["count"], 3);
    assert_eq!(body["countFiltered"], 2);
    let names: Vec<&str> = body["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Autumn Fair", "Winter Market"]);
}

#[actix_web::test]
async fn test_list_events_pagination() {
    let data_store_mock = StoreMock::default();
    sample_data::fill_sample_data(&data_store_mock);
    let state = AppState {
        store: Arc::new(data_store_mock),
        secret: APP_SECRET.to_string(),
    };
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/events?size=2&page=1&sort=name")
        .append_header(session_header(sample_data::PLAIN_USER_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["countFiltered"], 3);
    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Winter Market");

    // A non-numeric page number is rejected before hitting the store.
    let req = test::TestRequest::get()
        .uri("/api/v1/events?page=one")
        .append_header(session_header(sample_data::PLAIN_USER_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_list_events_ignores_unknown_filter() {
    let data_store_mock = StoreMock::default();
    sample_data::fill_sample_data(&data_store_mock);
    let state = AppState {
        store: Arc::new(data_store_mock),
        secret: APP_SECRET.to_string(),
    };
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    // A filter key we don't know is dropped, not treated as an error or as a
    // filter matching nothing.
    let req = test::TestRequest::get()
        .uri("/api/v1/events?filters%5Blocation%5D=zzz")
        .append_header(session_header(sample_data::PLAIN_USER_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["count"], 3);
    assert_eq!(body["countFiltered"], 3);
    assert_eq!(body["rows"].as_array().unwrap().len(), 3);
}

#[actix_web::test]
async fn test_list_events_repeated_query_is_stable() {
    let data_store_mock = StoreMock::default();
    sample_data::fill_sample_data(&data_store_mock);
    let state = AppState {
        store: Arc::new(data_store_mock),
        secret: APP_SECRET.to_string(),
    };
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    // Without intervening writes, the same listing request yields the exact same
    // response body, including row order.
    let uri = "/api/v1/events?filters%5Binfo%5D=fair%7Cfloor&sort=name&direction=desc&page=0&size=2";
    let req = test::TestRequest::get()
        .uri(uri)
        .append_header(session_header(sample_data::PLAIN_USER_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let first_body = test::read_body(resp).await;

    let req = test::TestRequest::get()
        .uri(uri)
        .append_header(session_header(sample_data::PLAIN_USER_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let second_body = test::read_body(resp).await;
    assert_eq!(first_body, second_body);

    let body: serde_json::Value = serde_json::from_slice(&first_body).unwrap();
    assert_eq!(body["countFiltered"], 2);
    let names: Vec<&str> = body["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Winter Market", "Autumn Fair"]);
}

#[actix_web::test]
async fn test_create_and_get_event() {
    let data_store_mock = StoreMock::default();
    sample_data::fill_sample_data(&data_store_mock);
    let state = AppState {
        store: Arc::new(data_store_mock),
        secret: APP_SECRET.to_string(),
    };
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .append_header(session_header(sample_data::CONTRIBUTOR_ID))
        .set_json(serde_json::json!({
            "name": "Summer Picnic",
            "location": "Riverside",
            "start": "2025-06-21T12:00:00Z",
            "end": "2025-06-21T16:00:00Z",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let created: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(created["name"], "Summer Picnic");
    assert_eq!(created["creatorId"], sample_data::CONTRIBUTOR_ID);
    let event_id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/events/{}", event_id))
        .append_header(session_header(sample_data::PLAIN_USER_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let fetched: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(fetched["name"], "Summer Picnic");
    assert_eq!(fetched["location"], "Riverside");
}

#[actix_web::test]
async fn test_create_event_name_conflicts() {
    let data_store_mock = StoreMock::default();
    sample_data::fill_sample_data(&data_store_mock);
    let state = AppState {
        store: Arc::new(data_store_mock),
        secret: APP_SECRET.to_string(),
    };
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    let create_request = |name: &str| {
        test::TestRequest::post()
            .uri("/api/v1/events")
            .append_header(session_header(sample_data::CONTRIBUTOR_ID))
            .set_json(serde_json::json!({
                "name": name,
                "start": "2025-06-21T12:00:00Z",
                "end": "2025-06-21T16:00:00Z",
            }))
            .to_request()
    };

    let resp = test::call_service(&app, create_request("Autumn Fair")).await;
    assert_eq!(resp.status(), 400);

    // Soft-deleted events keep their name reserved.
    let resp = test::call_service(&app, create_request("Retired Gala")).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_create_event_validation_and_permissions() {
    let data_store_mock = StoreMock::default();
    sample_data::fill_sample_data(&data_store_mock);
    let state = AppState {
        store: Arc::new(data_store_mock),
        secret: APP_SECRET.to_string(),
    };
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .append_header(session_header(sample_data::CONTRIBUTOR_ID))
        .set_json(serde_json::json!({
            "name": "",
            "start": "2025-06-21T12:00:00Z",
            "end": "2025-06-21T16:00:00Z",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["errors"][0]["field"], "name");

    // A plain user must not create events.
    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .append_header(session_header(sample_data::PLAIN_USER_ID))
        .set_json(serde_json::json!({
            "name": "Unauthorized Event",
            "start": "2025-06-21T12:00:00Z",
            "end": "2025-06-21T16:00:00Z",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn test_get_event_not_existing() {
    let data_store_mock = StoreMock::default();
    sample_data::fill_sample_data(&data_store_mock);
    let state = AppState {
        store: Arc::new(data_store_mock),
        secret: APP_SECRET.to_string(),
    };
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/events/4711")
        .append_header(session_header(sample_data::PLAIN_USER_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    // The soft-deleted sample event behaves like a missing one.
    let req = test::TestRequest::get()
        .uri("/api/v1/events/4")
        .append_header(session_header(sample_data::PLAIN_USER_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_update_event_info() {
    let data_store_mock = StoreMock::default();
    sample_data::fill_sample_data(&data_store_mock);
    let state = AppState {
        store: Arc::new(data_store_mock),
        secret: APP_SECRET.to_string(),
    };
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    let req = test::TestRequest::put()
        .uri("/api/v1/events/1")
        .append_header(session_header(sample_data::CONTRIBUTOR_ID))
        .set_json(serde_json::json!({
            "location": "Harbour Front",
            "notes": "Moved because of construction work.",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let updated: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(updated["location"], "Harbour Front");
    assert_eq!(updated["name"], "Autumn Fair");

    // Renaming to another event's name is a conflict.
    let req = test::TestRequest::put()
        .uri("/api/v1/events/1")
        .append_header(session_header(sample_data::CONTRIBUTOR_ID))
        .set_json(serde_json::json!({"name": "Book Club"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_update_foreign_event() {
    let data_store_mock = StoreMock::default();
    sample_data::fill_sample_data(&data_store_mock);
    let state = AppState {
        store: Arc::new(data_store_mock),
        secret: APP_SECRET.to_string(),
    };
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    // Event 3 was created by the other contributor.
    let req = test::TestRequest::put()
        .uri("/api/v1/events/3")
        .append_header(session_header(sample_data::CONTRIBUTOR_ID))
        .set_json(serde_json::json!({"location": "Somewhere else"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    // Admins may edit any event.
    let req = test::TestRequest::put()
        .uri("/api/v1/events/3")
        .append_header(session_header(sample_data::ADMIN_ID))
        .set_json(serde_json::json!({"location": "Reading Room"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn test_update_single_field() {
    let data_store_mock = StoreMock::default();
    sample_data::fill_sample_data(&data_store_mock);
    let state = AppState {
        store: Arc::new(data_store_mock),
        secret: APP_SECRET.to_string(),
    };
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    let req = test::TestRequest::put()
        .uri("/api/v1/events/1/flag_enabled")
        .append_header(session_header(sample_data::CONTRIBUTOR_ID))
        .set_json(serde_json::json!({"value": true}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let updated: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(updated["flagEnabled"], true);

    let req = test::TestRequest::put()
        .uri("/api/v1/events/1/shoe_size")
        .append_header(session_header(sample_data::CONTRIBUTOR_ID))
        .set_json(serde_json::json!({"value": 42}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let req = test::TestRequest::put()
        .uri("/api/v1/events/1/flag_enabled")
        .append_header(session_header(sample_data::CONTRIBUTOR_ID))
        .set_json(serde_json::json!({"value": "yes"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_delete_event() {
    let data_store_mock = StoreMock::default();
    sample_data::fill_sample_data(&data_store_mock);
    let state = AppState {
        store: Arc::new(data_store_mock),
        secret: APP_SECRET.to_string(),
    };
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    // Deleting someone else's event is forbidden for contributors.
    let req = test::TestRequest::delete()
        .uri("/api/v1/events/3")
        .append_header(session_header(sample_data::CONTRIBUTOR_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    let req = test::TestRequest::delete()
        .uri("/api/v1/events/1")
        .append_header(session_header(sample_data::CONTRIBUTOR_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get()
        .uri("/api/v1/events/1")
        .append_header(session_header(sample_data::PLAIN_USER_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    // The name stays reserved after the soft delete.
    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .append_header(session_header(sample_data::CONTRIBUTOR_ID))
        .set_json(serde_json::json!({
            "name": "Autumn Fair",
            "start": "2025-06-21T12:00:00Z",
            "end": "2025-06-21T16:00:00Z",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_check_name() {
    let data_store_mock = StoreMock::default();
    sample_data::fill_sample_data(&data_store_mock);
    let state = AppState {
        store: Arc::new(data_store_mock),
        secret: APP_SECRET.to_string(),
    };
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/events/check-name?name=Spring%20Concert")
        .append_header(session_header(sample_data::CONTRIBUTOR_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["available"], true);

    let req = test::TestRequest::get()
        .uri("/api/v1/events/check-name?name=Retired%20Gala")
        .append_header(session_header(sample_data::CONTRIBUTOR_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["available"], false);
}

#[actix_web::test]
async fn test_check_name_throttled() {
    let data_store_mock = StoreMock::default();
    sample_data::fill_sample_data(&data_store_mock);
    let state = AppState {
        store: Arc::new(data_store_mock),
        secret: APP_SECRET.to_string(),
    };
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    for i in 0..5 {
        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/events/check-name?name=Try%20{}", i))
            .append_header(session_header(sample_data::CONTRIBUTOR_ID))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }
    let req = test::TestRequest::get()
        .uri("/api/v1/events/check-name?name=One%20Too%20Many")
        .append_header(session_header(sample_data::CONTRIBUTOR_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 429);
}

#[actix_web::test]
async fn test_login_and_current_session() {
    let data_store_mock = StoreMock::default();
    sample_data::fill_sample_data(&data_store_mock);
    let state = AppState {
        store: Arc::new(data_store_mock),
        secret: APP_SECRET.to_string(),
    };
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/sessions")
        .set_json(serde_json::json!({
            "userName": sample_data::CONTRIBUTOR_NAME,
            "password": sample_data::CONTRIBUTOR_PASSWORD,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["user"]["userName"], sample_data::CONTRIBUTOR_NAME);
    assert_eq!(body["user"]["role"], "contributor");
    let token = body["sessionToken"].as_str().unwrap().to_owned();

    let req = test::TestRequest::get()
        .uri("/api/v1/sessions/current")
        .append_header(("X-SESSION-TOKEN".to_string(), token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["id"], sample_data::CONTRIBUTOR_ID);

    let req = test::TestRequest::post()
        .uri("/api/v1/sessions")
        .set_json(serde_json::json!({
            "userName": sample_data::CONTRIBUTOR_NAME,
            "password": "wrong password",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn test_disabled_account_rejected() {
    let data_store_mock = StoreMock::default();
    sample_data::fill_sample_data(&data_store_mock);
    let state = AppState {
        store: Arc::new(data_store_mock),
        secret: APP_SECRET.to_string(),
    };
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    // A disabled account cannot log in, even with the correct password.
    let req = test::TestRequest::post()
        .uri("/api/v1/sessions")
        .set_json(serde_json::json!({
            "userName": sample_data::DISABLED_USER_NAME,
            "password": sample_data::DISABLED_USER_PASSWORD,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    // Previously issued session tokens stop being accepted.
    let req = test::TestRequest::get()
        .uri("/api/v1/events")
        .append_header(session_header(sample_data::DISABLED_USER_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn test_internal_error_response() {
    let data_store_mock = StoreMock::default();
    sample_data::fill_sample_data(&data_store_mock);
    data_store_mock.data.lock().unwrap().next_error = Some(
        crate::data_store::StoreError::ConnectionError("connection lost".to_string()),
    );
    let state = AppState {
        store: Arc::new(data_store_mock),
        secret: APP_SECRET.to_string(),
    };
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/events")
        .append_header(session_header(sample_data::PLAIN_USER_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["httpCode"], 500);
}
