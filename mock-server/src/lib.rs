use std::collections::BTreeMap;
use std::time::Duration;

use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// How long `/slow` waits before answering.
pub const SLOW_DELAY: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Greeting {
    pub firstname: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/get", get(get_message))
        .route("/post", post(post_message))
        .route("/delete", delete(delete_message))
        .route("/regulardata", get(regular_data))
        .route("/lowdata", get(low_data))
        .route("/headers", get(echo_headers))
        .route("/status/{code}", get(status))
        .route("/slow", get(slow))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn get_message() -> Json<Message> {
    Json(Message::new("GET response"))
}

async fn post_message(Json(input): Json<Greeting>) -> Json<Message> {
    Json(Message::new(&format!("POST response for {}", input.firstname)))
}

async fn delete_message() -> Json<Message> {
    Json(Message::new("DELETE response"))
}

async fn regular_data() -> Json<Message> {
    Json(Message::new("Regular data response"))
}

async fn low_data() -> Json<Message> {
    Json(Message::new("Low data response"))
}

/// Echo request headers as a JSON object with lowercase names.
async fn echo_headers(headers: HeaderMap) -> Json<BTreeMap<String, String>> {
    Json(
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect(),
    )
}

async fn status(Path(code): Path<u16>) -> Result<Json<Message>, StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    if status == StatusCode::OK {
        return Ok(Json(Message::new("status 200")));
    }
    Err(status)
}

async fn slow() -> Json<Message> {
    tokio::time::sleep(SLOW_DELAY).await;
    Json(Message::new("slow response"))
}
