#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use rsi_api::{create_api_router, ApiConfig, AppState, FrontDoorConfig};
use rsi_test_utils::{fixtures, Catalog, InMemoryStore};
use serde_json::Value;
use tower::ServiceExt;

/// A router over an in-memory store, plus handles the tests poke at.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub catalog: Catalog,
    pub state: AppState,
}

pub fn test_config(environment: &str) -> ApiConfig {
    ApiConfig {
        environment: environment.to_string(),
        front_doors: FrontDoorConfig {
            api_data_ttl: Duration::ZERO,
            vercel_ttl: Duration::from_secs(300),
            cpanel_ttl: Duration::from_secs(60),
        },
        ..ApiConfig::default()
    }
}

pub fn test_app_with(environment: &str) -> TestApp {
    let (store, catalog) = fixtures::memory_catalog();
    let config = test_config(environment);
    let state = AppState::new(catalog.clone(), &config);
    let router = create_api_router(state.clone(), &config, false);
    TestApp {
        router,
        store,
        catalog,
        state,
    }
}

pub fn test_app() -> TestApp {
    test_app_with("development")
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None).await
    }
}
