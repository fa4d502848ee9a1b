pub mod socket;

pub use socket::SocketAgentAsync;

use std::io;

// Firecracker answers are small; this is the read chunk size, not a limit.
pub(crate) const MAX_BUFFER_SIZE: usize = 1024;

const MAX_HEADERS: usize = 64;

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) version: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: &str, path: &str, body: Option<String>) -> Self {
        let mut headers = vec![
            ("Host".to_string(), "localhost".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        HttpRequest {
            method: method.into(),
            path: path.into(),
            version: "HTTP/1.1".into(),
            headers,
            body,
        }
    }
}

/// Serialize an HTTP request, adding `Content-Length` when a body is present.
pub fn serialize_request(request: &HttpRequest) -> String {
    // method uri version
    let mut request_str = format!(
        "{} {} {}\r\n",
        request.method, request.path, request.version
    );

    for (key, value) in &request.headers {
        request_str.push_str(&format!("{}: {}\r\n", key, value));
    }

    if let Some(body) = &request.body {
        request_str.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }

    // empty line splitting headers and body
    request_str.push_str("\r\n");

    if let Some(body) = &request.body {
        request_str.push_str(body);
    }

    request_str
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Try to parse one complete response from the front of `buf`.
///
/// Returns `Ok(None)` while more bytes are needed, otherwise the response
/// and the number of bytes it occupied.
pub fn parse_response(buf: &[u8]) -> io::Result<Option<(HttpResponse, usize)>> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut res = httparse::Response::new(&mut headers);

    let body_start = match res
        .parse(buf)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("bad response: {e}")))?
    {
        httparse::Status::Partial => return Ok(None),
        httparse::Status::Complete(n) => n,
    };

    let status = res
        .code
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing status code"))?;

    let mut content_length = 0usize;
    for h in res.headers.iter() {
        if h.name.eq_ignore_ascii_case("content-length") {
            content_length = std::str::from_utf8(h.value)
                .ok()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidData, "bad content-length header")
                })?;
        } else if h.name.eq_ignore_ascii_case("transfer-encoding") {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "chunked responses are not supported",
            ));
        }
    }

    let total = body_start + content_length;
    if buf.len() < total {
        return Ok(None);
    }

    Ok(Some((
        HttpResponse {
            status,
            body: buf[body_start..total].to_vec(),
        },
        total,
    )))
}
