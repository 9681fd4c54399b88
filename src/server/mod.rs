use std::io::{Read, Write};
use std::net::TcpListener;

use tracing::{info, warn};

pub mod api;
pub mod routes;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const BIND_ENV_VAR: &str = "RANKSIM_BIND";

/// Largest request body accepted; a few thousand members fit comfortably.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
const MAX_HEADER_BYTES: usize = 64 * 1024;

pub fn bind_addr_from_env() -> String {
    std::env::var(BIND_ENV_VAR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
}

pub fn run_server(bind_addr: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_addr)?;
    println!("ranksim server listening on http://{bind_addr}");

    for stream in listener.incoming() {
        match stream {
            Ok(mut stream) => {
                if let Err(err) = handle_connection(&mut stream) {
                    warn!(target: "ranksim::server", error = %err, "request error");
                }
            }
            Err(err) => warn!(target: "ranksim::server", error = %err, "connection failed"),
        }
    }

    Ok(())
}

fn header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

enum Incoming {
    Closed,
    HeaderTooLarge,
    Request { head: String, body: String },
}

/// Read until the header block is complete, then until the declared body length.
fn read_request(stream: &mut impl Read) -> std::io::Result<Incoming> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 16_384];

    let body_start = loop {
        let bytes_read = stream.read(&mut chunk)?;
        if bytes_read == 0 {
            if buffer.is_empty() {
                return Ok(Incoming::Closed);
            }
            break buffer.len();
        }
        buffer.extend_from_slice(&chunk[..bytes_read]);
        if let Some(end) = header_end(&buffer) {
            break end;
        }
        if buffer.len() > MAX_HEADER_BYTES {
            return Ok(Incoming::HeaderTooLarge);
        }
    };
    let head = String::from_utf8_lossy(&buffer[..body_start]).into_owned();
    let wanted = body_start + content_length(&head).min(MAX_BODY_BYTES);
    while buffer.len() < wanted {
        let bytes_read = stream.read(&mut chunk)?;
        if bytes_read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..bytes_read]);
    }
    let body = String::from_utf8_lossy(&buffer[body_start..buffer.len().min(wanted)]).into_owned();
    Ok(Incoming::Request { head, body })
}

fn handle_connection<S: Read + Write>(stream: &mut S) -> std::io::Result<()> {
    let (head, body) = match read_request(stream)? {
        Incoming::Closed => return Ok(()),
        Incoming::HeaderTooLarge => {
            warn!(target: "ranksim::server", limit = MAX_HEADER_BYTES, "request header too large");
            let response = routes::error_response(431, "Request Header Fields Too Large", "request header too large");
            stream.write_all(response.to_http_string().as_bytes())?;
            return stream.flush();
        }
        Incoming::Request { head, body } => (head, body),
    };

    let mut request_parts = head.lines().next().unwrap_or_default().split_whitespace();
    let method = request_parts.next().unwrap_or("GET");
    let path = request_parts.next().unwrap_or("/");

    let response = routes::route_request(method, path, &body);
    info!(
        target: "ranksim::server",
        method,
        path,
        status = response.status_code,
        "request handled"
    );
    stream.write_all(response.to_http_string().as_bytes())?;
    stream.flush()?;
    Ok(())
}
