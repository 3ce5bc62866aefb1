//! Minimal HTTP/1.1 stand-in for the two Immich endpoints ppdl uses.
//!
//! `POST /api/search/metadata` returns the configured pages (page number read
//! from the JSON body); `GET /api/assets/{id}/original` returns the asset's
//! bytes. Every request must carry the right `x-api-key`, otherwise 401.
//! Each response closes the connection.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const API_KEY: &str = "test-key";

#[derive(Debug, Clone)]
pub struct MockAsset {
    pub id: String,
    pub file_name: String,
    /// `localDateTime` as sent by the server.
    pub local_date_time: String,
    pub body: Vec<u8>,
    /// Serve these bytes instead of `body` (checksum still describes `body`).
    pub served: Option<Vec<u8>>,
    /// Answer downloads with this status instead.
    pub status: Option<u16>,
}

impl MockAsset {
    pub fn new(id: &str, file_name: &str, local_date_time: &str) -> Self {
        Self {
            id: id.to_string(),
            file_name: file_name.to_string(),
            local_date_time: local_date_time.to_string(),
            body: format!("image data for {}", id).into_bytes(),
            served: None,
            status: None,
        }
    }

    pub fn corrupted(mut self) -> Self {
        let mut bad = self.body.clone();
        bad.reverse();
        self.served = Some(bad);
        self
    }

    pub fn failing(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "type": "IMAGE",
            "checksum": STANDARD.encode(Sha1::digest(&self.body)),
            "createdAt": "2025-02-01T10:00:00.000Z",
            "fileCreatedAt": "2024-12-31T23:30:00.000Z",
            "localDateTime": self.local_date_time,
            "originalFileName": self.file_name,
            "originalPath": format!("upload/library/admin/{}", self.file_name),
            "isFavorite": false,
        })
    }
}

#[derive(Default)]
struct State {
    pages: Vec<Vec<MockAsset>>,
    assets: HashMap<String, MockAsset>,
    search_bodies: Mutex<Vec<Value>>,
    downloads: Mutex<Vec<String>>,
    fail_search_page: Option<u64>,
}

pub struct ImmichServer {
    /// API base, e.g. `http://127.0.0.1:12345/api`.
    pub base_url: String,
    state: Arc<State>,
}

impl ImmichServer {
    /// Serve `pages` in order; page `n` (1-based) is `pages[n - 1]`.
    pub fn start(pages: Vec<Vec<MockAsset>>) -> Self {
        Self::start_with(pages, None)
    }

    /// Like `start`, but the search for `fail_page` answers 500.
    pub fn start_with(pages: Vec<Vec<MockAsset>>, fail_page: Option<u64>) -> Self {
        let assets = pages
            .iter()
            .flatten()
            .map(|a| (a.id.clone(), a.clone()))
            .collect();
        let state = Arc::new(State {
            pages,
            assets,
            fail_search_page: fail_page,
            ..State::default()
        });
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&shared);
                thread::spawn(move || handle(stream, &state));
            }
        });
        Self {
            base_url: format!("http://127.0.0.1:{}/api", port),
            state,
        }
    }

    /// JSON bodies of every search request, in arrival order.
    pub fn search_bodies(&self) -> Vec<Value> {
        self.state.search_bodies.lock().unwrap().clone()
    }

    /// Asset ids of every download request, in arrival order.
    pub fn downloads(&self) -> Vec<String> {
        self.state.downloads.lock().unwrap().clone()
    }
}

struct Request {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = std::str::from_utf8(&data[..header_end]).ok()?;
    let mut lines = head.lines();
    let mut start = lines.next()?.split_whitespace();
    let method = start.next()?.to_string();
    let path = start.next()?.to_string();
    let headers: HashMap<String, String> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    let len = headers
        .get("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = data[header_end..].to_vec();
    while body.len() < len {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
    }
    Some(Request {
        method,
        path,
        headers,
        body,
    })
}

fn respond(stream: &mut TcpStream, status: &str, content_type: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

fn handle(mut stream: TcpStream, state: &State) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let Some(req) = read_request(&mut stream) else {
        return;
    };

    if req.headers.get("x-api-key").map(String::as_str) != Some(API_KEY) {
        respond(&mut stream, "401 Unauthorized", "application/json", br#"{"message":"Invalid API key"}"#);
        return;
    }

    if req.method == "POST" && req.path == "/api/search/metadata" {
        let Ok(query) = serde_json::from_slice::<Value>(&req.body) else {
            respond(&mut stream, "400 Bad Request", "application/json", b"{}");
            return;
        };
        let page = query["page"].as_u64().unwrap_or(1);
        state.search_bodies.lock().unwrap().push(query);
        if state.fail_search_page == Some(page) {
            respond(&mut stream, "500 Internal Server Error", "application/json", b"{}");
            return;
        }
        let items: Vec<Value> = state
            .pages
            .get((page as usize).wrapping_sub(1))
            .map(|p| p.iter().map(MockAsset::to_json).collect())
            .unwrap_or_default();
        let next_page = if (page as usize) < state.pages.len() {
            Value::String((page + 1).to_string())
        } else {
            Value::Null
        };
        let body = json!({
            "albums": { "total": 0, "count": 0, "items": [], "facets": [] },
            "assets": {
                "total": items.len(),
                "count": items.len(),
                "items": items,
                "facets": [],
                "nextPage": next_page,
            }
        });
        respond(&mut stream, "200 OK", "application/json", body.to_string().as_bytes());
        return;
    }

    if req.method == "GET" {
        let id = req
            .path
            .strip_prefix("/api/assets/")
            .and_then(|rest| rest.strip_suffix("/original"));
        if let Some(id) = id {
            state.downloads.lock().unwrap().push(id.to_string());
            match state.assets.get(id) {
                Some(asset) => match asset.status {
                    Some(code) => respond(&mut stream, &format!("{} Error", code), "text/plain", b"failed"),
                    None => {
                        let bytes = asset.served.as_ref().unwrap_or(&asset.body);
                        respond(&mut stream, "200 OK", "application/octet-stream", bytes);
                    }
                },
                None => respond(&mut stream, "404 Not Found", "application/json", b"{}"),
            }
            return;
        }
    }

    respond(&mut stream, "404 Not Found", "application/json", b"{}");
}
