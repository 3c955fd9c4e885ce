#![allow(clippy::float_cmp)]

use super::*;
use canvas::doc::Shape;

fn client(base: &str) -> AnnotationClient {
    AnnotationClient::new(base, HttpTimeouts::default()).unwrap()
}

// =============================================================================
// parse_annotation
// =============================================================================

#[test]
fn parse_annotation_with_rect_and_polygon() {
    let json = serde_json::json!({
        "shapes": [
            { "label": "car", "points": [[10, 10], [50, 30]] },
            { "label": "roof", "points": [[0, 0], [4.5, 0], [2, 3]] }
        ]
    })
    .to_string();
    let ann = parse_annotation(&json).unwrap();
    assert_eq!(ann.shapes.len(), 2);
    assert_eq!(ann.shapes[0], Shape::new("car", vec![[10.0, 10.0], [50.0, 30.0]]));
    assert_eq!(ann.shapes[1].points[1], [4.5, 0.0]);
}

#[test]
fn parse_annotation_empty_default() {
    assert!(parse_annotation(r#"{"shapes": []}"#).unwrap().is_empty());
    assert!(parse_annotation("{}").unwrap().is_empty());
}

#[test]
fn parse_annotation_missing_label_is_empty_string() {
    let ann = parse_annotation(r#"{"shapes": [{"points": [[1, 2], [3, 4]]}]}"#).unwrap();
    assert_eq!(ann.shapes[0].label, "");
}

#[test]
fn parse_annotation_rejects_garbage() {
    assert!(matches!(parse_annotation("<html>"), Err(ClientError::Parse(_))));
    assert!(matches!(parse_annotation(r#"{"shapes": [{"points": "nope"}]}"#), Err(ClientError::Parse(_))));
}

// =============================================================================
// parse_save_ack
// =============================================================================

#[test]
fn save_ack_success() {
    assert!(parse_save_ack(r#"{"status": "success"}"#).is_ok());
}

#[test]
fn save_ack_other_status_is_rejected() {
    let err = parse_save_ack(r#"{"status": "error"}"#).unwrap_err();
    assert!(matches!(err, ClientError::SaveRejected(ref s) if s == "error"));
}

#[test]
fn save_ack_missing_status_is_rejected() {
    assert!(matches!(parse_save_ack("{}"), Err(ClientError::SaveRejected(_))));
}

#[test]
fn save_ack_not_json() {
    assert!(matches!(parse_save_ack("OK"), Err(ClientError::Parse(_))));
}

#[test]
fn save_request_wire_shape() {
    let ann = Annotation { shapes: vec![Shape::new("car", vec![[200.0, 200.0], [600.0, 400.0]])] };
    let body = serde_json::to_value(SaveRequest { filename: "street.jpg", annotation: &ann }).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "filename": "street.jpg",
            "annotation": { "shapes": [ { "label": "car", "points": [[200, 200], [600, 400]] } ] }
        })
    );
}

#[test]
fn save_request_writes_whole_pixels_as_integers() {
    let ann = Annotation { shapes: vec![Shape::new("car", vec![[200.0, 200.0], [600.0, 400.0]])] };
    let text = serde_json::to_string(&SaveRequest { filename: "street.jpg", annotation: &ann }).unwrap();
    assert_eq!(text, r#"{"filename":"street.jpg","annotation":{"shapes":[{"label":"car","points":[[200,200],[600,400]]}]}}"#);
}

// =============================================================================
// URLs
// =============================================================================

#[test]
fn endpoint_joins_segments() {
    let c = client("http://127.0.0.1:5000");
    assert_eq!(c.endpoint(&["load_annotation", "a.jpg"]).unwrap().as_str(), "http://127.0.0.1:5000/load_annotation/a.jpg");
}

#[test]
fn endpoint_keeps_base_path() {
    let c = client("http://host/annotator/");
    assert_eq!(c.endpoint(&["save"]).unwrap().as_str(), "http://host/annotator/save");
}

#[test]
fn endpoint_encodes_filename() {
    let c = client("http://host");
    let url = c.endpoint(&["image", "my photo#1?.jpg"]).unwrap();
    assert_eq!(url.as_str(), "http://host/image/my%20photo%231%3F.jpg");
}

#[test]
fn endpoint_encodes_slash_in_filename() {
    let c = client("http://host");
    let url = c.endpoint(&["image", "../etc/passwd"]).unwrap();
    assert_eq!(url.path_segments().map(Iterator::count), Some(2));
}

#[test]
fn new_rejects_bad_base_url() {
    assert!(matches!(AnnotationClient::new("not a url", HttpTimeouts::default()), Err(ClientError::InvalidBaseUrl(_))));
    assert!(matches!(
        AnnotationClient::new("mailto:someone@example.com", HttpTimeouts::default()),
        Err(ClientError::InvalidBaseUrl(_))
    ));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn retryable_classification() {
    assert!(ClientError::Request("timeout".into()).retryable());
    assert!(ClientError::Status { status: 503, body: String::new() }.retryable());
    assert!(ClientError::Status { status: 429, body: String::new() }.retryable());
    assert!(!ClientError::Status { status: 404, body: String::new() }.retryable());
    assert!(!ClientError::Parse("x".into()).retryable());
    assert!(!ClientError::SaveRejected("error".into()).retryable());
}

#[tokio::test]
async fn upload_missing_file_is_io_error() {
    let c = client("http://127.0.0.1:9");
    let err = c.upload(Path::new("/definitely/not/here.png"), None).await.unwrap_err();
    assert!(matches!(err, ClientError::Io { ref path, .. } if path.ends_with("here.png")));
}
