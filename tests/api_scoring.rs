//! Scoring API behavior over a real loopback socket.

use std::io::{Read, Write};
use std::net::TcpStream;

use base64::Engine;

use candy_kernel::api::{ApiConfig, ApiServer, ScoreResponse, ScoreService};
use candy_kernel::detect::{BBox, Detection, StubDetector};
use candy_kernel::NutritionTable;

fn spawn_server(detections: Vec<Detection>) -> candy_kernel::api::ApiHandle {
    let service = ScoreService::new(
        Box::new(StubDetector::with_detections(detections)),
        0.5,
        NutritionTable::builtin(),
    );
    ApiServer::new(
        ApiConfig {
            addr: "127.0.0.1:0".to_string(),
        },
        service,
    )
    .spawn()
    .expect("spawn api server")
}

fn http_post(addr: std::net::SocketAddr, path: &str, body: &[u8]) -> (u16, Vec<u8>) {
    let mut stream = TcpStream::connect(addr).expect("connect to api");
    let header = format!(
        "POST {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(header.as_bytes()).expect("write request");
    stream.write_all(body).expect("write body");

    let mut response = Vec::new();
    stream.read_to_end(&mut response).expect("read response");
    let text = String::from_utf8_lossy(&response);
    let status: u16 = text
        .split_whitespace()
        .nth(1)
        .expect("status code")
        .parse()
        .expect("numeric status");
    let body_start = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("header terminator")
        + 4;
    (status, response[body_start..].to_vec())
}

fn image_payload() -> Vec<u8> {
    let image = image::RgbImage::from_pixel(24, 24, image::Rgb([250, 120, 0]));
    let mut png = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .expect("encode png");
    let encoded = base64::engine::general_purpose::STANDARD.encode(&png);
    serde_json::to_vec(&serde_json::json!({ "image_data": encoded })).expect("payload")
}

#[test]
fn valid_image_returns_filtered_detections() {
    let handle = spawn_server(vec![
        Detection {
            class_id: 1,
            class_label: "Gems".to_string(),
            confidence: 0.91234,
            bbox: BBox::new(1, 2, 20, 22),
        },
        Detection {
            class_id: 2,
            class_label: "Kit_Kat".to_string(),
            confidence: 0.3,
            bbox: BBox::new(5, 5, 10, 10),
        },
    ]);

    let (status, body) = http_post(handle.addr, "/api/send", &image_payload());
    assert_eq!(status, 200);
    let response: ScoreResponse = serde_json::from_slice(&body).expect("json body");
    assert!(response.error.is_none());
    assert_eq!(response.detections.len(), 1, "below-threshold detection dropped");
    assert_eq!(response.detections[0].candy, "Gems");
    assert_eq!(response.detections[0].confidence, 0.912);
    assert_eq!(response.detections[0].bbox, [1, 2, 20, 22]);

    handle.stop().expect("stop api server");
}

#[test]
fn malformed_payload_answers_400_with_an_error_envelope() {
    let handle = spawn_server(Vec::new());

    let (status, body) = http_post(handle.addr, "/api/send", b"{\"image_data\": \"@@@\"}");
    assert_eq!(status, 400);
    let response: ScoreResponse = serde_json::from_slice(&body).expect("json body");
    assert!(response.detections.is_empty());
    assert!(response.error.expect("error message").contains("base64"));

    handle.stop().expect("stop api server");
}

#[test]
fn unknown_paths_answer_404() {
    let handle = spawn_server(Vec::new());
    let (status, _) = http_post(handle.addr, "/api/other", b"{}");
    assert_eq!(status, 404);
    handle.stop().expect("stop api server");
}
