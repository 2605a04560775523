//! Shared helpers for the integration tests

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use mockall::mock;
use serde_json::Value;
use tower::ServiceExt;

use booktoshare_server::{
    api,
    config::AppConfig,
    error::AppResult,
    models::volume::{VolumeDetail, VolumeSummary},
    repository::{MemoryStore, Repository},
    services::{catalog::CatalogApi, Services},
    AppState,
};

mock! {
    pub Catalog {}

    #[async_trait]
    impl CatalogApi for Catalog {
        async fn search(&self, query: &str) -> AppResult<Vec<VolumeSummary>>;
        async fn get_volume(&self, id: &str) -> AppResult<VolumeDetail>;
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
}

impl TestApp {
    pub fn new(catalog: MockCatalog) -> Self {
        let store = MemoryStore::new();
        let config = AppConfig::default();
        let services = Services::new(Repository::in_memory(store.clone()), &config, Arc::new(catalog));
        let router = api::router(AppState {
            config: Arc::new(config),
            services: Arc::new(services),
        });
        Self { router, store }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::get(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    /// Register through the form and return the session cookie of a fresh login
    pub async fn sign_up(&self, username: &str) -> String {
        let body = format!(
            "username={u}&email={u}%40example.org&password=secret1&password2=secret1",
            u = username
        );
        let response = self.post_form("/register", &body, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        self.sign_in(username, "secret1").await
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> String {
        let body = format!("username={}&password={}", username, password);
        let response = self.post_form("/login", &body, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        cookie(&response, api::SESSION_COOKIE).expect("session cookie")
    }
}

/// `name=value` of a cookie set by `response`, when it is not a removal
pub fn cookie(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::trim)
        .find(|pair| {
            pair.split_once('=')
                .is_some_and(|(n, value)| n == name && !value.is_empty())
        })
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

pub async fn json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
