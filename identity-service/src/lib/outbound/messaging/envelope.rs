use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// String header bag carried alongside every bus message.
pub type Headers = BTreeMap<String, String>;

/// Prefix reserved for headers owned by the transport.
pub const TRANSPORT_HEADER_PREFIX: &str = "kafka_";

pub fn is_transport_header(key: &str) -> bool {
    key.starts_with(TRANSPORT_HEADER_PREFIX)
}

/// Per-request header bag, threaded explicitly through outbound calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    headers: Headers,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from inbound headers, dropping transport headers.
    pub fn from_headers(headers: Headers) -> Self {
        Self {
            headers: headers
                .into_iter()
                .filter(|(key, _)| !is_transport_header(key))
                .collect(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if !is_transport_header(&key) {
            self.headers.insert(key, value.into());
        }
        self
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }
}

/// Per-call options for [`crate::outbound::messaging::Bus::send`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusOptions {
    pub headers: Headers,
}

impl BusOptions {
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// Wire envelope: the caller's message plus its headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub value: Value,
    #[serde(default, skip_serializing_if = "Headers::is_empty")]
    pub headers: Headers,
}

impl MessageEnvelope {
    /// Wrap `value`, starting from the request context's headers.
    pub fn new(value: Value, context: &RequestContext) -> Self {
        Self {
            value,
            headers: context.headers().clone(),
        }
    }

    /// Add `headers` without overriding keys already present.
    ///
    /// Transport headers are never accepted from callers.
    pub fn merge_headers(&mut self, headers: &Headers) {
        for (key, value) in headers {
            if is_transport_header(key) {
                continue;
            }
            self.headers
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}
