//! HTTP scoring API.
//!
//! A small single-threaded server that scores individual images on demand:
//! `POST /api/send` takes `{"image_data": "<base64>"}`, runs the detector
//! and answers `{"detections": [...]}` with confidences rounded to three
//! decimals. Malformed payloads answer 400, detector failures 500, both with
//! the same envelope carrying an `error` field so callers always get JSON.
//!
//! Responses carry permissive CORS headers and `OPTIONS` preflights are
//! accepted, since the expected caller is a browser page.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::detect::{aggregate, Detector};
use crate::frame::Frame;
use crate::nutrition::NutritionTable;

/// Upper bound on a request; base64 of a large camera JPEG fits comfortably.
const MAX_REQUEST_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub addr: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8000".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct SendRequest {
    image_data: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ApiDetection {
    pub candy: String,
    pub confidence: f64,
    pub bbox: [i32; 4],
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ScoreResponse {
    pub detections: Vec<ApiDetection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Detector plus filtering parameters, shared by the server loop.
pub struct ScoreService {
    detector: Box<dyn Detector>,
    threshold: f32,
    table: NutritionTable,
}

/// Client-side fault: the payload could not be turned into an image.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct RequestError(String);

impl ScoreService {
    pub fn new(detector: Box<dyn Detector>, threshold: f32, table: NutritionTable) -> Self {
        Self {
            detector,
            threshold,
            table,
        }
    }

    /// Decode, detect, filter. `RequestError` inside the `anyhow` chain
    /// distinguishes bad payloads from detector faults.
    pub fn detect_and_score(&mut self, body: &[u8]) -> Result<Vec<ApiDetection>> {
        let request: SendRequest = serde_json::from_slice(body)
            .map_err(|e| anyhow!(RequestError(format!("invalid request body: {}", e))))?;
        let image_bytes = base64::engine::general_purpose::STANDARD
            .decode(request.image_data.trim())
            .map_err(|e| anyhow!(RequestError(format!("invalid base64 image data: {}", e))))?;
        let image = image::load_from_memory(&image_bytes)
            .map_err(|e| anyhow!(RequestError(format!("undecodable image: {}", e))))?
            .to_rgb8();

        let frame = Frame::new(image, 1);
        let raw = self.detector.infer(&frame).context("detector failed")?;
        let (kept, _counts) = aggregate(raw, self.threshold, &self.table);

        let detections = kept
            .into_iter()
            .map(|detection| {
                log::info!(
                    "api detection: {} at {:.3}",
                    detection.class_label,
                    detection.confidence
                );
                ApiDetection {
                    candy: detection.class_label,
                    confidence: round3(detection.confidence),
                    bbox: detection.bbox.as_array(),
                }
            })
            .collect();
        Ok(detections)
    }
}

fn round3(confidence: f32) -> f64 {
    (confidence as f64 * 1000.0).round() / 1000.0
}

#[derive(Debug)]
pub struct ApiHandle {
    pub addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl ApiHandle {
    pub fn stop(mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            join.join()
                .map_err(|_| anyhow!("api server thread panicked"))?;
        }
        Ok(())
    }
}

pub struct ApiServer {
    cfg: ApiConfig,
    service: ScoreService,
}

impl ApiServer {
    pub fn new(cfg: ApiConfig, service: ScoreService) -> Self {
        Self { cfg, service }
    }

    pub fn spawn(self) -> Result<ApiHandle> {
        let configured_addr: SocketAddr = self.cfg.addr.parse()?;
        let listener = TcpListener::bind(configured_addr)?;
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_thread = shutdown.clone();
        let mut service = self.service;
        let join = std::thread::spawn(move || {
            if let Err(err) = run_api(listener, &mut service, shutdown_thread) {
                log::error!("scoring api stopped: {}", err);
            }
        });

        Ok(ApiHandle {
            addr,
            shutdown,
            join: Some(join),
        })
    }
}

fn run_api(
    listener: TcpListener,
    service: &mut ScoreService,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        match listener.accept() {
            Ok((stream, _)) => {
                if let Err(err) = handle_connection(stream, service) {
                    log::warn!("scoring api request rejected: {}", err);
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(50));
                continue;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn handle_connection(mut stream: TcpStream, service: &mut ScoreService) -> Result<()> {
    let request = read_request(&mut stream)?;

    if request.method == "OPTIONS" {
        write_json_response(&mut stream, 200, "{}")?;
        return Ok(());
    }
    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/health") => {
            write_json_response(&mut stream, 200, r#"{"status":"ok"}"#)?;
        }
        ("POST", "/api/send") => {
            let response = match service.detect_and_score(&request.body) {
                Ok(detections) => (
                    200,
                    ScoreResponse {
                        detections,
                        error: None,
                    },
                ),
                Err(err) => {
                    let status = if err.is::<RequestError>() { 400 } else { 500 };
                    log::warn!("scoring request failed ({}): {}", status, err);
                    (
                        status,
                        ScoreResponse {
                            detections: Vec::new(),
                            error: Some(err.to_string()),
                        },
                    )
                }
            };
            let payload = serde_json::to_string(&response.1)?;
            write_json_response(&mut stream, response.0, &payload)?;
        }
        _ => {
            write_json_response(&mut stream, 404, r#"{"error":"not_found"}"#)?;
        }
    }
    Ok(())
}

fn read_request(stream: &mut TcpStream) -> Result<HttpRequest> {
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    let mut buf = [0u8; 4096];
    let mut data = Vec::new();
    let header_end = loop {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            break data
                .windows(4)
                .position(|w| w == b"\r\n\r\n")
                .ok_or_else(|| anyhow!("connection closed mid-request"))?;
        }
        data.extend_from_slice(&buf[..n]);
        if data.len() > MAX_REQUEST_BYTES {
            return Err(anyhow!("request too large"));
        }
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let header_text = String::from_utf8_lossy(&data[..header_end]).to_string();
    let mut lines = header_text.split("\r\n");
    let request_line = lines.next().ok_or_else(|| anyhow!("empty request"))?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().ok_or_else(|| anyhow!("missing method"))?;
    let raw_path = parts.next().ok_or_else(|| anyhow!("missing path"))?;
    let mut headers = HashMap::new();
    for line in lines {
        if let Some((k, v)) = line.split_once(':') {
            headers.insert(k.trim().to_lowercase(), v.trim().to_string());
        }
    }

    let content_length: usize = headers
        .get("content-length")
        .map(|v| v.parse())
        .transpose()
        .context("invalid content-length header")?
        .unwrap_or(0);
    if content_length > MAX_REQUEST_BYTES {
        return Err(anyhow!("request too large"));
    }

    let mut body = data[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            return Err(anyhow!("connection closed mid-body"));
        }
        body.extend_from_slice(&buf[..n]);
        if body.len() > MAX_REQUEST_BYTES {
            return Err(anyhow!("request too large"));
        }
    }
    body.truncate(content_length);

    let path = raw_path.split('?').next().unwrap_or(raw_path).to_string();
    Ok(HttpRequest {
        method: method.to_string(),
        path,
        body,
    })
}

fn write_json_response(stream: &mut TcpStream, status: u16, body: &str) -> Result<()> {
    let status_line = match status {
        200 => "HTTP/1.1 200 OK",
        400 => "HTTP/1.1 400 Bad Request",
        404 => "HTTP/1.1 404 Not Found",
        405 => "HTTP/1.1 405 Method Not Allowed",
        _ => "HTTP/1.1 500 Internal Server Error",
    };
    let header = format!(
        "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {len}\r\nAccess-Control-Allow-Origin: *\r\nAccess-Control-Allow-Methods: GET, POST, OPTIONS\r\nAccess-Control-Allow-Headers: Content-Type\r\nCache-Control: no-store\r\n\r\n",
        status_line = status_line,
        len = body.len()
    );
    stream.write_all(header.as_bytes())?;
    stream.write_all(body.as_bytes())?;
    Ok(())
}

#[derive(Debug)]
struct HttpRequest {
    method: String,
    path: String,
    body: Vec<u8>,
}
