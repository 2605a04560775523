//! Route-level tests driven through the router

use axum::http::{header, StatusCode};
use booktoshare_server::{
    api,
    error::AppError,
    models::volume::{VolumeDetail, VolumeSummary},
};
use serde_json::json;

use crate::common::{cookie, json, location, MockCatalog, TestApp};

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new(MockCatalog::new());
    let response = app.get("/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_favicon_is_served() {
    let app = TestApp::new(MockCatalog::new());
    let response = app.get("/favicon.ico", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
}

#[tokio::test]
async fn test_protected_route_redirects_to_login() {
    let app = TestApp::new(MockCatalog::new());

    let response = app.get("/add_book", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2Fadd_book");

    let response = app.get("/search?q=dune", None).await;
    assert_eq!(location(&response), "/login?next=%2Fsearch%3Fq%3Ddune");

    let response = app.get("/", Some("booktoshare_session=forged")).await;
    assert_eq!(location(&response), "/login?next=%2F");
}

#[tokio::test]
async fn test_register_login_logout() {
    let app = TestApp::new(MockCatalog::new());

    let response = app
        .post_form(
            "/register",
            "username=alice&email=alice%40example.org&password=secret1&password2=secret1",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    let flash = cookie(&response, api::FLASH_COOKIE).expect("flash cookie");

    let response = app.get("/login", Some(&flash)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = json(response).await;
    assert_eq!(page["form"], "login");
    assert_eq!(
        page["flashes"],
        json!(["Congratulations, you are now a registered user!"])
    );

    let response = app
        .post_form("/login?next=%2Fadd_book", "username=alice&password=secret1", None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/add_book");
    let session = cookie(&response, api::SESSION_COOKIE).expect("session cookie");

    let response = app.get("/", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let items = json(response).await;
    assert_eq!(items["own_items"], json!([]));
    assert_eq!(items["controlled_items"], json!([]));

    // Signed-in users are sent away from the login and register forms
    let response = app.get("/login", Some(&session)).await;
    assert_eq!(location(&response), "/index");
    let response = app.get("/register", Some(&session)).await;
    assert_eq!(location(&response), "/index");

    let response = app.get("/logout", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/index");

    let response = app.get("/", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2F");
}

#[tokio::test]
async fn test_register_reports_field_errors() {
    let app = TestApp::new(MockCatalog::new());
    app.sign_up("alice").await;

    let response = app
        .post_form(
            "/register",
            "username=alice&email=alice%40example.org&password=secret1&password2=secret1",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let page = json(response).await;
    assert_eq!(page["form"], "register");
    assert!(page["errors"]["username"].is_array());
    assert!(page["errors"]["email"].is_array());

    let response = app
        .post_form(
            "/register",
            "username=bob&email=not-an-email&password=secret1&password2=other12",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let page = json(response).await;
    assert!(page["errors"]["email"].is_array());
    assert!(page["errors"]["password2"].is_array());
}

#[tokio::test]
async fn test_bad_credentials_flash_generic_message() {
    let app = TestApp::new(MockCatalog::new());
    app.sign_up("alice").await;

    for body in ["username=alice&password=wrong", "username=nobody&password=wrong"] {
        let response = app.post_form("/login", body, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
        assert!(cookie(&response, api::SESSION_COOKIE).is_none());

        let flash = cookie(&response, api::FLASH_COOKIE).expect("flash cookie");
        let page = json(app.get("/login", Some(&flash)).await).await;
        assert_eq!(page["flashes"], json!(["Invalid username or password"]));
    }
}

#[tokio::test]
async fn test_login_ignores_offsite_next() {
    let app = TestApp::new(MockCatalog::new());
    app.sign_up("alice").await;

    let response = app
        .post_form(
            "/login?next=https%3A%2F%2Fevil.example%2F",
            "username=alice&password=secret1",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/index");
}

#[tokio::test]
async fn test_login_ignores_next_with_control_characters() {
    let app = TestApp::new(MockCatalog::new());
    app.sign_up("alice").await;

    for next in ["%2Fa%0Ab", "%2Fa%0D%0ASet-Cookie%3A+x%3Dy", "%2Fa%00"] {
        let response = app
            .post_form(
                &format!("/login?next={}", next),
                "username=alice&password=secret1",
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/index");
    }
}

#[tokio::test]
async fn test_register_rejects_blank_username() {
    let app = TestApp::new(MockCatalog::new());

    let response = app
        .post_form(
            "/register",
            "username=+++&email=blank%40example.org&password=secret1&password2=secret1",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let page = json(response).await;
    assert!(page["errors"]["username"].is_array());

    let response = app.post_form("/login", "username=+&password=secret1", None).await;
    assert_eq!(location(&response), "/login");
    assert!(cookie(&response, api::SESSION_COOKIE).is_none());
}

#[tokio::test]
async fn test_remember_me_sets_persistent_cookie() {
    let app = TestApp::new(MockCatalog::new());
    app.sign_up("alice").await;

    let response = app
        .post_form("/login", "username=alice&password=secret1&remember_me=y", None)
        .await;
    let set_cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(api::SESSION_COOKIE))
        .expect("session cookie")
        .to_string();
    assert!(set_cookie.contains("Max-Age="));
    assert!(set_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_add_book_with_and_without_item() {
    let app = TestApp::new(MockCatalog::new());
    let session = app.sign_up("alice").await;

    let response = app.get("/add_book", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["form"], "add_book");

    let response = app
        .post_form("/add_book", "title=T&subtitle=S&add_item=y", Some(&session))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(app.store.book_count(), 1);
    assert_eq!(app.store.item_count(), 1);

    let response = app
        .post_form("/add_book", "title=T2&subtitle=S", Some(&session))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.store.book_count(), 2);
    assert_eq!(app.store.item_count(), 1);

    let items = json(app.get("/index", Some(&session)).await).await;
    let own = items["own_items"].as_array().unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0]["title"], "T");
    assert_eq!(own[0]["subtitle"], "S");
    assert_eq!(own[0]["owner"], "alice");
}

#[tokio::test]
async fn test_add_book_rejects_blank_title() {
    let app = TestApp::new(MockCatalog::new());
    let session = app.sign_up("alice").await;

    let response = app
        .post_form("/add_book", "title=+++&add_item=y", Some(&session))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let page = json(response).await;
    assert!(page["errors"]["title"].is_array());
    assert_eq!(app.store.book_count(), 0);
}

#[tokio::test]
async fn test_search_without_results() {
    let mut catalog = MockCatalog::new();
    catalog
        .expect_search()
        .withf(|query| query == "dune")
        .times(2)
        .returning(|_| Ok(Vec::new()));
    let app = TestApp::new(catalog);
    let session = app.sign_up("alice").await;

    let response = app.get("/search?q=dune", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await, json!({"query": "dune", "items": []}));

    let response = app.post_form("/search", "query=dune", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["items"], json!([]));
}

#[tokio::test]
async fn test_search_relays_catalog_items() {
    let mut catalog = MockCatalog::new();
    catalog.expect_search().returning(|_| {
        Ok(vec![serde_json::from_value::<VolumeSummary>(json!({
            "id": "B1hSG45JCX4C",
            "volumeInfo": {"title": "Dune", "authors": ["Frank Herbert"]}
        }))
        .unwrap()])
    });
    let app = TestApp::new(catalog);
    let session = app.sign_up("alice").await;

    let body = json(app.get("/search?q=herbert", Some(&session)).await).await;
    assert_eq!(body["items"][0]["id"], "B1hSG45JCX4C");
    assert_eq!(body["items"][0]["volumeInfo"]["title"], "Dune");
}

#[tokio::test]
async fn test_search_form_without_query() {
    let app = TestApp::new(MockCatalog::new());
    let session = app.sign_up("alice").await;

    let response = app.get("/search", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["form"], "search");

    let response = app.post_form("/search", "query=+", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_google_volume() {
    let mut catalog = MockCatalog::new();
    catalog
        .expect_get_volume()
        .withf(|id| id == "missing")
        .returning(|id| Err(AppError::NotFound(format!("Volume {} not found", id))));
    let app = TestApp::new(catalog);
    let session = app.sign_up("alice").await;

    let response = app.get("/google_volume/missing", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_book_from_google_volume() {
    let mut catalog = MockCatalog::new();
    catalog
        .expect_get_volume()
        .withf(|id| id == "B1hSG45JCX4C")
        .times(2)
        .returning(|id| {
            Ok(serde_json::from_value::<VolumeDetail>(json!({
                "id": id,
                "volumeInfo": {"title": "Dune", "subtitle": "Deluxe Edition"}
            }))
            .unwrap())
        });
    let app = TestApp::new(catalog);
    let alice = app.sign_up("alice").await;
    let bob = app.sign_up("bob").await;

    let response = app
        .post_form("/google_volume/B1hSG45JCX4C", "add_item=y", Some(&alice))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = app
        .post_form("/google_volume/B1hSG45JCX4C", "add_item=y", Some(&bob))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // Same volume, one catalog entry, two copies
    assert_eq!(app.store.book_count(), 1);
    assert_eq!(app.store.item_count(), 2);

    let items = json(app.get("/", Some(&bob)).await).await;
    assert_eq!(items["own_items"][0]["title"], "Dune");
    assert_eq!(items["own_items"][0]["subtitle"], "Deluxe Edition");
    assert_eq!(items["own_items"][0]["google_id"], "B1hSG45JCX4C");
}

#[tokio::test]
async fn test_catalog_outage_is_bad_gateway() {
    let mut catalog = MockCatalog::new();
    catalog
        .expect_search()
        .returning(|_| Err(AppError::ExternalService("catalog request timed out".into())));
    let app = TestApp::new(catalog);
    let session = app.sign_up("alice").await;

    let response = app.get("/search?q=dune", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_lend_and_return_item() {
    let app = TestApp::new(MockCatalog::new());
    let alice = app.sign_up("alice").await;
    let bob = app.sign_up("bob").await;

    app.post_form("/add_book", "title=Dune&add_item=y", Some(&alice))
        .await;
    let items = json(app.get("/", Some(&alice)).await).await;
    let item_id = items["own_items"][0]["id"].as_i64().unwrap();

    // Only the owner lends
    let response = app
        .post_form(&format!("/items/{}/lend", item_id), "borrower=alice", Some(&bob))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .post_form(&format!("/items/{}/lend", item_id), "borrower=bob", Some(&alice))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let held = json(app.get("/", Some(&bob)).await).await;
    assert_eq!(held["controlled_items"][0]["id"].as_i64(), Some(item_id));
    assert_eq!(held["controlled_items"][0]["controller"], "bob");

    let response = app
        .post_form(&format!("/items/{}/lend", item_id), "borrower=bob", Some(&alice))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .post_form(&format!("/items/{}/return", item_id), "", Some(&bob))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let history = json(
        app.get(&format!("/items/{}/history", item_id), Some(&alice))
            .await,
    )
    .await;
    let events: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["event"].as_str().unwrap())
        .collect();
    assert_eq!(events, vec!["acquired", "lent", "returned"]);

    let held = json(app.get("/", Some(&bob)).await).await;
    assert_eq!(held["controlled_items"], json!([]));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = TestApp::new(MockCatalog::new());
    let response = app.get("/api-docs/openapi.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let doc = json(response).await;
    assert!(doc["paths"]["/search"].is_object());
}
