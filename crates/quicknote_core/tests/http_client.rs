use quicknote_core::{ApiError, ClientConfig, HttpNotesApi, NoteDraft, NoteId, NotesApi};
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Request line, headers (lowercased names) and body seen by the responder.
struct Captured {
    request_line: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl Captured {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Serves exactly one HTTP response and returns what the client sent.
fn serve_once(status_line: &'static str, response_body: &'static str) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
            }
        }

        let length = headers
            .iter()
            .find(|(name, _)| name == "content-length")
            .and_then(|(_, value)| value.parse::<usize>().ok())
            .unwrap_or(0);
        let mut request_body = vec![0_u8; length];
        reader.read_exact(&mut request_body).unwrap();

        let mut stream = stream;
        write!(
            stream,
            "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{response_body}",
            response_body.len()
        )
        .unwrap();
        stream.flush().unwrap();

        Captured {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: String::from_utf8(request_body).unwrap(),
        }
    });

    (base, handle)
}

fn api_for(base: &str) -> HttpNotesApi {
    let config = ClientConfig::new(Some(base), "/tmp/unused")
        .with_request_timeout(Duration::from_secs(5));
    HttpNotesApi::new(&config).unwrap()
}

#[test]
fn list_sends_get_with_json_headers() {
    let (base, server) = serve_once("HTTP/1.1 200 OK", r#"[{"id":1,"title":"A","content":""}]"#);

    let payload = api_for(&base).list_notes().unwrap();
    let captured = server.join().unwrap();

    assert_eq!(payload, json!([{"id": 1, "title": "A", "content": ""}]));
    assert_eq!(captured.request_line, "GET /notes HTTP/1.1");
    assert_eq!(captured.header("accept"), Some("application/json"));
    assert_eq!(captured.header("content-type"), Some("application/json"));
}

#[test]
fn create_posts_title_and_content() {
    let (base, server) = serve_once(
        "HTTP/1.1 201 Created",
        r#"{"id":"7","title":"Hello","content":"World"}"#,
    );

    let draft = NoteDraft::new(" Hello ", "World").unwrap();
    let payload = api_for(&base).create_note(&draft).unwrap();
    let captured = server.join().unwrap();

    assert_eq!(payload["id"], json!("7"));
    assert_eq!(captured.request_line, "POST /notes HTTP/1.1");
    let sent: Value = serde_json::from_str(&captured.body).unwrap();
    assert_eq!(sent, json!({"title": "Hello", "content": "World"}));
}

#[test]
fn update_puts_to_encoded_id_path() {
    let (base, server) = serve_once("HTTP/1.1 200 OK", r#"{"id":"a b","title":"T","content":""}"#);

    let draft = NoteDraft::new("T", "").unwrap();
    api_for(&base)
        .update_note(&NoteId::from("a b"), &draft)
        .unwrap();
    let captured = server.join().unwrap();

    assert_eq!(captured.request_line, "PUT /notes/a%20b HTTP/1.1");
}

#[test]
fn delete_with_empty_body_yields_null() {
    let (base, server) = serve_once("HTTP/1.1 200 OK", "");

    let payload = api_for(&base).delete_note(&NoteId::from(3_i64)).unwrap();
    let captured = server.join().unwrap();

    assert_eq!(payload, Value::Null);
    assert_eq!(captured.request_line, "DELETE /notes/3 HTTP/1.1");
}

#[test]
fn non_success_status_carries_parsed_body() {
    let (base, server) = serve_once("HTTP/1.1 422 Unprocessable Entity", r#"{"error":"bad"}"#);

    let err = api_for(&base).list_notes().unwrap_err();
    server.join().unwrap();

    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 422);
            assert_eq!(body, json!({"error": "bad"}));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = api_for(&base).list_notes().unwrap_err();
    assert_eq!(err.code(), "TRANSPORT");
}
