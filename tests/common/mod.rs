#![allow(dead_code)]

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use notes_api::{app, config, AppState};

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register a fresh user and log in, returning the access token
    pub async fn login_new_user(&self) -> Result<String> {
        let email = format!("user-{}@example.com", Uuid::new_v4().simple());
        let password = "Sup3rSecret";

        let res = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

        let body: Value = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?
            .json()
            .await?;

        body["data"]["accessToken"]
            .as_str()
            .map(str::to_string)
            .context("login response without access token")
    }

    /// POST /notes as `token`, returning the created note
    pub async fn create_note(&self, token: &str, title: &str) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/notes"))
            .bearer_auth(token)
            .json(&json!({ "title": title, "content": format!("{} content", title), "color": 16711680 }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "create failed: {}", res.status());

        let body: Value = res.json().await?;
        Ok(body["data"].clone())
    }
}

/// Start the full router on a free port with in-memory storage.
/// The server lives as long as the calling test's runtime.
pub async fn start_server() -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let router = app(AppState::in_memory(), config::config());
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            eprintln!("test server stopped: {}", e);
        }
    });

    Ok(TestServer {
        port,
        base_url,
        client: reqwest::Client::new(),
    })
}
