//! In-process stand-in for a Toxiproxy server, speaking the same routes and
//! status codes over the `Transport` seam.

#![allow(dead_code)]

use http::{Method, StatusCode};
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use toxiproxy_client::{Client, Reply, Result, Transport};

#[derive(Debug)]
struct FakeProxy {
    proxy: Map<String, Value>,
    toxics: Vec<Map<String, Value>>,
}

impl FakeProxy {
    fn name(&self) -> &str {
        self.proxy["name"].as_str().unwrap_or_default()
    }

    fn to_json(&self) -> Value {
        let mut proxy = self.proxy.clone();
        proxy.insert("toxics".into(), Value::Array(self.toxics_json()));
        Value::Object(proxy)
    }

    fn toxics_json(&self) -> Vec<Value> {
        self.toxics.iter().cloned().map(Value::Object).collect()
    }

    fn toxic_index(&self, name: &str) -> Option<usize> {
        self.toxics.iter().position(|t| t["name"] == name)
    }
}

#[derive(Debug, Default)]
pub struct FakeToxiproxy {
    proxies: Mutex<Vec<FakeProxy>>,
    requests: Mutex<Vec<(Method, String)>>,
}

impl FakeToxiproxy {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Method and path of every request served so far.
    pub fn requests(&self) -> Vec<(Method, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// Stores `toxic` on `proxy` as-is, bypassing the normal create route.
    pub fn insert_raw_toxic(&self, proxy: &str, toxic: Value) {
        let mut proxies = self.proxies.lock().unwrap();
        let proxy = proxies
            .iter_mut()
            .find(|p| p.name() == proxy)
            .expect("proxy exists");
        proxy.toxics.push(toxic.as_object().cloned().unwrap_or_default());
    }

    fn route(&self, method: &Method, path: &str, body: Option<Value>) -> Reply {
        let mut proxies = self.proxies.lock().unwrap();
        let decoded: Vec<String> = path
            .trim_start_matches('/')
            .split('/')
            .map(percent_decode)
            .collect();
        let segments: Vec<&str> = decoded.iter().map(String::as_str).collect();

        match (method.as_str(), segments.as_slice()) {
            ("GET", ["version"]) => Reply::new(StatusCode::OK, "2.5.0\n"),
            ("POST", ["reset"]) => {
                for proxy in proxies.iter_mut() {
                    proxy.proxy.insert("enabled".into(), json!(true));
                    proxy.toxics.clear();
                }
                Reply::new(StatusCode::NO_CONTENT, "")
            }
            ("POST", ["populate"]) => {
                let mut created = Vec::new();
                for pack in body.and_then(|b| b.as_array().cloned()).unwrap_or_default() {
                    let pack = proxy_from(pack);
                    let name = pack["name"].clone();
                    match proxies.iter_mut().find(|p| p.proxy["name"] == name) {
                        Some(existing) => existing.proxy = pack,
                        None => proxies.push(FakeProxy {
                            proxy: pack,
                            toxics: vec![],
                        }),
                    }
                    let proxy = proxies.iter().find(|p| p.proxy["name"] == name).unwrap();
                    created.push(proxy.to_json());
                }
                ok(StatusCode::CREATED, json!({ "proxies": created }))
            }
            ("GET", ["proxies"]) => {
                let map: Map<String, Value> = proxies
                    .iter()
                    .map(|p| (p.name().to_owned(), p.to_json()))
                    .collect();
                ok(StatusCode::OK, Value::Object(map))
            }
            ("POST", ["proxies"]) => {
                let pack = proxy_from(body.unwrap_or_default());
                if proxies.iter().any(|p| p.proxy["name"] == pack["name"]) {
                    return error(StatusCode::CONFLICT, "proxy already exists");
                }
                let proxy = FakeProxy {
                    proxy: pack,
                    toxics: vec![],
                };
                let reply = ok(StatusCode::CREATED, proxy.to_json());
                proxies.push(proxy);
                reply
            }
            (_, ["proxies", name, rest @ ..]) => {
                let index = match proxies.iter().position(|p| p.name() == *name) {
                    Some(index) => index,
                    None => return error(StatusCode::NOT_FOUND, "proxy not found"),
                };
                match (method.as_str(), rest) {
                    ("GET", []) => ok(StatusCode::OK, proxies[index].to_json()),
                    ("POST", []) => {
                        let proxy = &mut proxies[index];
                        if let Some(Value::Object(update)) = body {
                            for key in &["listen", "upstream", "enabled"] {
                                if let Some(value) = update.get(*key) {
                                    proxy.proxy.insert((*key).into(), value.clone());
                                }
                            }
                        }
                        ok(StatusCode::OK, proxy.to_json())
                    }
                    ("DELETE", []) => {
                        proxies.remove(index);
                        Reply::new(StatusCode::NO_CONTENT, "")
                    }
                    (method, ["toxics", toxic_path @ ..]) => {
                        toxic_route(&mut proxies[index], method, toxic_path, body)
                    }
                    _ => error(StatusCode::METHOD_NOT_ALLOWED, "unsupported"),
                }
            }
            _ => error(StatusCode::NOT_FOUND, "no such route"),
        }
    }
}

fn toxic_route(proxy: &mut FakeProxy, method: &str, path: &[&str], body: Option<Value>) -> Reply {
    match (method, path) {
        ("GET", []) => ok(StatusCode::OK, Value::Array(proxy.toxics_json())),
        ("POST", []) => {
            let toxic = toxic_from(body.unwrap_or_default());
            if proxy.toxic_index(toxic["name"].as_str().unwrap_or_default()).is_some() {
                return error(StatusCode::CONFLICT, "toxic already exists");
            }
            proxy.toxics.push(toxic.clone());
            ok(StatusCode::OK, Value::Object(toxic))
        }
        (method, [name]) => {
            let index = match proxy.toxic_index(name) {
                Some(index) => index,
                None => return error(StatusCode::NOT_FOUND, "toxic not found"),
            };
            match method {
                "GET" => ok(StatusCode::OK, Value::Object(proxy.toxics[index].clone())),
                "POST" => {
                    // Name and stream are fixed once the toxic exists.
                    let toxic = &mut proxy.toxics[index];
                    if let Some(Value::Object(update)) = body {
                        for key in &["toxicity", "attributes"] {
                            if let Some(value) = update.get(*key) {
                                toxic.insert((*key).into(), value.clone());
                            }
                        }
                    }
                    ok(StatusCode::OK, Value::Object(toxic.clone()))
                }
                "DELETE" => {
                    proxy.toxics.remove(index);
                    Reply::new(StatusCode::NO_CONTENT, "")
                }
                _ => error(StatusCode::METHOD_NOT_ALLOWED, "unsupported"),
            }
        }
        _ => error(StatusCode::NOT_FOUND, "no such route"),
    }
}

fn proxy_from(pack: Value) -> Map<String, Value> {
    let mut proxy = pack.as_object().cloned().unwrap_or_default();
    proxy.entry("enabled").or_insert(json!(true));
    proxy
}

fn toxic_from(pack: Value) -> Map<String, Value> {
    let mut toxic = pack.as_object().cloned().unwrap_or_default();
    toxic.entry("stream").or_insert(json!("downstream"));
    toxic.entry("toxicity").or_insert(json!(1.0));
    toxic.entry("attributes").or_insert(json!({}));
    let unnamed = toxic
        .get("name")
        .and_then(Value::as_str)
        .map_or(true, str::is_empty);
    if unnamed {
        let name = format!(
            "{}_{}",
            toxic["type"].as_str().unwrap_or_default(),
            toxic["stream"].as_str().unwrap_or_default()
        );
        toxic.insert("name".into(), json!(name));
    }
    toxic
}

fn percent_decode(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escaped = bytes
            .get(i + 1..i + 3)
            .filter(|_| bytes[i] == b'%')
            .and_then(|hex| std::str::from_utf8(hex).ok())
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());
        match escaped {
            Some(byte) => {
                out.push(byte);
                i += 3;
            }
            None => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    String::from_utf8(out).expect("utf-8 path segment")
}

fn ok(status: StatusCode, value: Value) -> Reply {
    Reply::new(status, value.to_string())
}

fn error(status: StatusCode, title: &str) -> Reply {
    Reply::new(status, json!({ "error": title, "status": status.as_u16() }).to_string())
}

impl Transport for FakeToxiproxy {
    fn request(&self, method: Method, path: &str, body: Option<String>) -> Result<Reply> {
        self.requests
            .lock()
            .unwrap()
            .push((method.clone(), path.to_owned()));
        let body: Option<Value> = match body {
            Some(body) => Some(serde_json::from_str(&body)?),
            None => None,
        };
        Ok(self.route(&method, path, body))
    }

    fn is_alive(&self) -> bool {
        true
    }
}

pub fn fake_client() -> (Client, Arc<FakeToxiproxy>) {
    let server = FakeToxiproxy::new();
    (Client::with_transport(server.clone()), server)
}
