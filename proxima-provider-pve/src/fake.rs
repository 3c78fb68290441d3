//! In-memory stand-in for the cluster API, used by tests

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use proxima_core::provider::{ErrorKind, ProviderError, ProviderResult};
use serde_json::{Value, json};

use crate::client::{HttpMethod, Transport};

#[derive(Default)]
struct FakeState {
    aliases: BTreeMap<String, Value>,
    mappings: Vec<Value>,
    requests: Vec<(HttpMethod, String)>,
    fail_next: Option<ErrorKind>,
}

/// Emulates the alias and SDN mapping endpoints
#[derive(Default)]
pub(crate) struct FakeCluster {
    state: Mutex<FakeState>,
}

impl FakeCluster {
    /// Every request received so far
    pub(crate) fn requests(&self) -> Vec<(HttpMethod, String)> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Make the next request fail with the given kind
    pub(crate) fn fail_next(&self, kind: ErrorKind) {
        self.state.lock().unwrap().fail_next = Some(kind);
    }

    /// Remove an alias behind the provider's back
    pub(crate) fn drop_alias(&self, name: &str) {
        self.state.lock().unwrap().aliases.remove(name);
    }

    pub(crate) fn alias(&self, name: &str) -> Option<Value> {
        self.state.lock().unwrap().aliases.get(name).cloned()
    }

    pub(crate) fn alias_names(&self) -> Vec<String> {
        self.state.lock().unwrap().aliases.keys().cloned().collect()
    }

    pub(crate) fn mapping_count(&self) -> usize {
        self.state.lock().unwrap().mappings.len()
    }

    /// Remove every mapping behind the provider's back
    pub(crate) fn drop_mappings(&self) {
        self.state.lock().unwrap().mappings.clear();
    }
}

fn field<'a>(body: Option<&'a Value>, key: &str) -> Option<&'a str> {
    body.and_then(|b| b.get(key)).and_then(Value::as_str)
}

fn same_mapping(entry: &Value, zone: &str, vnet: &str, ip: &str) -> bool {
    entry["zone"] == zone && entry["vnet"] == vnet && entry["ip"] == ip
}

impl FakeState {
    fn alias_request(
        &mut self,
        method: HttpMethod,
        name: Option<&str>,
        body: Option<&Value>,
    ) -> ProviderResult<Value> {
        match (method, name) {
            (HttpMethod::Post, None) => {
                let name = field(body, "name").unwrap_or_default().to_string();
                if self.aliases.contains_key(&name) {
                    return Err(ProviderError::api(format!("alias '{}' already exists", name)));
                }
                let mut alias = json!({
                    "name": name,
                    "cidr": field(body, "cidr").unwrap_or_default(),
                    "digest": "d1",
                });
                if let Some(comment) = field(body, "comment").filter(|c| !c.is_empty()) {
                    alias["comment"] = json!(comment);
                }
                self.aliases.insert(name, alias);
                Ok(Value::Null)
            }
            (HttpMethod::Get, Some(name)) => self
                .aliases
                .get(name)
                .cloned()
                .ok_or_else(|| ProviderError::not_found(format!("no such alias '{}'", name))),
            (HttpMethod::Put, Some(name)) => {
                let Some(mut alias) = self.aliases.remove(name) else {
                    return Err(ProviderError::not_found(format!("no such alias '{}'", name)));
                };
                let target = field(body, "rename").unwrap_or(name).to_string();
                if target != name && self.aliases.contains_key(&target) {
                    self.aliases.insert(name.to_string(), alias);
                    return Err(ProviderError::api(format!("alias '{}' already exists", target)));
                }
                alias["name"] = json!(target);
                if let Some(cidr) = field(body, "cidr") {
                    alias["cidr"] = json!(cidr);
                }
                if let Some(comment) = field(body, "comment") {
                    if comment.is_empty() {
                        if let Some(object) = alias.as_object_mut() {
                            object.remove("comment");
                        }
                    } else {
                        alias["comment"] = json!(comment);
                    }
                }
                self.aliases.insert(target, alias);
                Ok(Value::Null)
            }
            (HttpMethod::Delete, Some(name)) => self
                .aliases
                .remove(name)
                .map(|_| Value::Null)
                .ok_or_else(|| ProviderError::not_found(format!("no such alias '{}'", name))),
            _ => Err(ProviderError::api("unsupported alias request")),
        }
    }

    fn mapping_request(
        &mut self,
        method: HttpMethod,
        vnet: &str,
        body: Option<&Value>,
    ) -> ProviderResult<Value> {
        let zone = field(body, "zone").unwrap_or_default();
        let ip = field(body, "ip").unwrap_or_default();
        let position = self
            .mappings
            .iter()
            .position(|e| same_mapping(e, zone, vnet, ip));

        match (method, position) {
            (HttpMethod::Post, Some(_)) => Err(ProviderError::api(format!(
                "IP '{}' already exists in vnet '{}'",
                ip, vnet
            ))),
            (HttpMethod::Post, None) => {
                self.mappings.push(json!({
                    "zone": zone,
                    "vnet": vnet,
                    "ip": ip,
                    "mac": field(body, "mac"),
                    "subnet": "10.0.0.0/24",
                }));
                Ok(Value::Null)
            }
            (HttpMethod::Put, Some(i)) => {
                self.mappings[i]["mac"] = json!(field(body, "mac"));
                Ok(Value::Null)
            }
            (HttpMethod::Delete, Some(i)) => {
                self.mappings.remove(i);
                Ok(Value::Null)
            }
            (HttpMethod::Put | HttpMethod::Delete, None) => Err(ProviderError::not_found(
                format!("IP '{}' does not exist in vnet '{}'", ip, vnet),
            )),
            _ => Err(ProviderError::api("unsupported mapping request")),
        }
    }
}

#[async_trait]
impl Transport for FakeCluster {
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> ProviderResult<Value> {
        let mut state = self.state.lock().unwrap();
        state.requests.push((method, path.to_string()));

        if let Some(kind) = state.fail_next.take() {
            return Err(ProviderError::new(kind, "connection reset by peer"));
        }

        let segments: Vec<&str> = path.split('/').collect();
        match segments.as_slice() {
            ["cluster", "firewall", "aliases"] => state.alias_request(method, None, body),
            ["cluster", "firewall", "aliases", name] => state.alias_request(method, Some(*name), body),
            ["cluster", "sdn", "vnets", vnet, "ips"] => state.mapping_request(method, *vnet, body),
            ["cluster", "sdn", "ipams", _, "status"] if method == HttpMethod::Get => {
                Ok(Value::Array(state.mappings.clone()))
            }
            _ => Err(ProviderError::api(format!("unsupported path: {}", path))),
        }
    }
}
