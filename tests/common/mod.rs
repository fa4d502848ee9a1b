#![allow(dead_code)]
//! In-process stand-in for the Firecracker API, served over a Unix socket.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;

pub const AFTER_START: &str =
    "The requested operation is not supported after starting the microVM.";
pub const BEFORE_START: &str =
    "The requested operation is not supported before starting the microVM.";

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
}

impl Recorded {
    pub fn endpoint(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[derive(Debug)]
pub struct MockState {
    pub started: bool,
    /// `GET /instance` answers "Not started" this many times after start.
    pub polls_until_running: usize,
    pub boot_source: Option<Value>,
    pub drives: HashMap<String, Value>,
    pub ifaces: HashMap<String, Value>,
    pub machine_config: Value,
    pub vsock: Option<Value>,
    pub mmds: Option<Value>,
    /// Answer `400` with this message on the given `METHOD /path`.
    pub reject: Option<(String, String)>,
    /// Apply `reject` only once the instance is started.
    pub reject_after_start: bool,
    pub requests: Vec<Recorded>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            started: false,
            polls_until_running: 0,
            boot_source: None,
            drives: HashMap::new(),
            ifaces: HashMap::new(),
            machine_config: json!({
                "vcpu_count": 1,
                "mem_size_mib": 128,
                "smt": false,
                "track_dirty_pages": false
            }),
            vsock: None,
            mmds: Some(json!({})),
            reject: None,
            reject_after_start: false,
            requests: Vec::new(),
        }
    }
}

pub struct MockFirecracker {
    pub socket: PathBuf,
    pub state: Arc<Mutex<MockState>>,
    server: JoinHandle<()>,
    _dir: Option<tempfile::TempDir>,
}

impl MockFirecracker {
    pub fn start() -> Self {
        Self::start_with(MockState::default())
    }

    pub fn start_with(state: MockState) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("firecracker.socket");
        let mut mock = Self::bind(&socket, state);
        mock._dir = Some(dir);
        mock
    }

    /// Serve on a caller chosen path.
    pub fn bind(socket: &Path, state: MockState) -> Self {
        let listener = UnixListener::bind(socket).unwrap();
        let state = Arc::new(Mutex::new(state));
        let shared = Arc::clone(&state);
        let server = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&shared)));
            }
        });
        Self {
            socket: socket.to_path_buf(),
            state,
            server,
            _dir: None,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    /// `METHOD /path` of every request that is not a GET.
    pub fn mutations(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter(|r| r.method != "GET")
            .map(Recorded::endpoint)
            .collect()
    }
}

impl Drop for MockFirecracker {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn serve(mut stream: UnixStream, state: Arc<Mutex<MockState>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let (method, path, body, consumed) = loop {
            if let Some(parsed) = parse_request(&buf) {
                break parsed;
            }
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        };
        buf.drain(..consumed);

        let (status, body) = handle(&mut state.lock().unwrap(), &method, &path, &body);
        let reason = match status {
            200 => "OK",
            204 => "No Content",
            404 => "Not Found",
            _ => "Bad Request",
        };
        let response = match body {
            Some(body) => format!(
                concat!(
                    "HTTP/1.1 {} {}\r\nServer: Firecracker API\r\n",
                    "Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{}"
                ),
                status,
                reason,
                body.len(),
                body
            ),
            None => format!("HTTP/1.1 {status} {reason}\r\nServer: Firecracker API\r\n\r\n"),
        };
        if stream.write_all(response.as_bytes()).await.is_err() {
            return;
        }
    }
}

fn parse_request(buf: &[u8]) -> Option<(String, String, Vec<u8>, usize)> {
    let mut headers = [httparse::EMPTY_HEADER; 16];
    let mut req = httparse::Request::new(&mut headers);
    let head_len = match req.parse(buf).ok()? {
        httparse::Status::Complete(len) => len,
        httparse::Status::Partial => return None,
    };
    let content_length = req
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("content-length"))
        .and_then(|h| std::str::from_utf8(h.value).ok()?.trim().parse().ok())
        .unwrap_or(0usize);
    if buf.len() < head_len + content_length {
        return None;
    }
    Some((
        req.method?.to_string(),
        req.path?.to_string(),
        buf[head_len..head_len + content_length].to_vec(),
        head_len + content_length,
    ))
}

fn fault(status: u16, message: impl AsRef<str>) -> (u16, Option<String>) {
    (
        status,
        Some(json!({ "fault_message": message.as_ref() }).to_string()),
    )
}

fn ok(value: &Value) -> (u16, Option<String>) {
    (200, Some(value.to_string()))
}

const NO_CONTENT: (u16, Option<String>) = (204, None);

fn handle(state: &mut MockState, method: &str, path: &str, body: &[u8]) -> (u16, Option<String>) {
    let body: Option<Value> = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice(body) {
            Ok(value) => Some(value),
            Err(e) => return fault(400, format!("Invalid JSON: {e}")),
        }
    };
    state.requests.push(Recorded {
        method: method.to_string(),
        path: path.to_string(),
        body: body.clone(),
    });

    if let Some((endpoint, message)) = &state.reject {
        let armed = state.started || !state.reject_after_start;
        if armed && *endpoint == format!("{method} {path}") {
            return fault(400, message);
        }
    }

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    let body = body.unwrap_or(Value::Null);
    match (method, segments.as_slice()) {
        ("GET", [""]) => ok(&json!({ "firecracker_version": "1.7.0" })),
        ("GET", ["instance"]) => {
            let running = if state.started && state.polls_until_running == 0 {
                true
            } else {
                if state.started {
                    state.polls_until_running -= 1;
                }
                false
            };
            ok(&json!({
                "app_name": "Firecracker",
                "id": "anonymous-instance",
                "state": if running { "Running" } else { "Not started" },
                "vmm_version": "1.7.0"
            }))
        }
        ("GET", ["machine-config"]) => ok(&state.machine_config.clone()),
        ("GET", ["mmds"]) => match &state.mmds {
            Some(mmds) => ok(&mmds.clone()),
            None => fault(400, "The MMDS data store is not initialized."),
        },
        ("PUT", ["boot-source"]) => {
            if state.started {
                return fault(400, AFTER_START);
            }
            state.boot_source = Some(body);
            NO_CONTENT
        }
        ("PUT", ["drives", id]) => {
            if state.started {
                return fault(400, AFTER_START);
            }
            if body["drive_id"] != *id {
                return fault(400, "The id from the path does not match the id from the body!");
            }
            let is_root = body["is_root_device"].as_bool().unwrap_or(false);
            let other_root = state
                .drives
                .iter()
                .any(|(other, d)| other.as_str() != *id && d["is_root_device"] == true);
            if is_root && other_root {
                return fault(400, "A root block device already exists!");
            }
            state.drives.insert(id.to_string(), body);
            NO_CONTENT
        }
        ("PATCH", ["drives", id]) => {
            let Some(object) = body.as_object() else {
                return fault(400, "Invalid JSON body");
            };
            if object
                .keys()
                .any(|k| k != "drive_id" && k != "path_on_host" && k != "rate_limiter")
            {
                return fault(400, "Unknown field in partial drive update");
            }
            let Some(drive) = state.drives.get_mut(*id) else {
                return fault(400, format!("Invalid block device ID: {id}"));
            };
            if let Some(path) = object.get("path_on_host") {
                drive["path_on_host"] = path.clone();
            }
            NO_CONTENT
        }
        ("PUT", ["network-interfaces", id]) => {
            if state.started {
                return fault(400, AFTER_START);
            }
            if body["iface_id"] != *id {
                return fault(400, "The id from the path does not match the id from the body!");
            }
            state.ifaces.insert(id.to_string(), body);
            NO_CONTENT
        }
        ("PUT", ["machine-config"]) => {
            if state.started {
                return fault(400, AFTER_START);
            }
            let vcpus = body["vcpu_count"].as_u64().unwrap_or(0);
            if vcpus == 0 || vcpus > 32 || (vcpus > 1 && vcpus % 2 == 1) {
                return fault(400, format!("Invalid vCPU number: {vcpus}"));
            }
            state.machine_config = body;
            NO_CONTENT
        }
        ("PUT", ["vsock", id]) => {
            if state.started {
                return fault(400, AFTER_START);
            }
            if body["vsock_id"] != *id {
                return fault(400, "The id from the path does not match the id from the body!");
            }
            state.vsock = Some(body);
            NO_CONTENT
        }
        ("PUT", ["actions"]) => match body["action_type"].as_str() {
            Some("InstanceStart") => {
                if state.started {
                    return fault(400, AFTER_START);
                }
                if state.boot_source.is_none() {
                    return fault(400, "Cannot start microvm without kernel configuration.");
                }
                state.started = true;
                NO_CONTENT
            }
            Some("BlockDeviceRescan") => {
                if !state.started {
                    return fault(400, BEFORE_START);
                }
                let id = body["payload"].as_str().unwrap_or_default();
                if !state.drives.contains_key(id) {
                    return fault(400, format!("Invalid block device ID: {id}"));
                }
                NO_CONTENT
            }
            other => fault(400, format!("Unsupported action: {other:?}")),
        },
        _ => fault(
            404,
            format!("Invalid request method and/or path: {method} {path}."),
        ),
    }
}
