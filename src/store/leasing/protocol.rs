//! Response bodies of the leasing service API.

use serde::Deserialize;
use serde_json::Value;

/// `POST token` response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Request body leasing `count` members of `pool`.
pub fn lease_request(pool: &str, count: u32) -> Value {
    let mut body = serde_json::Map::new();
    body.insert(pool.to_string(), Value::String(count.to_string()));
    Value::Object(body)
}

/// Fully qualified hostname granted for `pool` in a `POST vm` response.
///
/// `hostname` may be a single name or a list; the first entry is used.
/// Without a domain the bare hostname is returned.
pub fn leased_hostname(pool: &str, body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let entry = value.get(pool)?;

    let hostname = match entry.get("hostname")? {
        Value::String(name) => name.clone(),
        Value::Array(names) => names.first()?.as_str()?.to_string(),
        _ => return None,
    };
    if hostname.is_empty() {
        return None;
    }

    match entry
        .get("domain")
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
    {
        Some(domain) => Some(format!("{}.{}", hostname, domain)),
        None => Some(hostname),
    }
}

/// Lifecycle state of `vm` in a `GET vm/:name` response.
pub fn vm_state(vm: &str, body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get(vm)?
        .get("state")?
        .as_str()
        .map(str::to_string)
}
