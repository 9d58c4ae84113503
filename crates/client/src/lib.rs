//! Roster paged fetch client: executes a [`PageDescriptor`] against a list items
//! endpoint and normalizes the reply into a [`PageResult`].
//!
//! One GET per call. No retry, backoff or caching; every failure goes back to the caller.

#![forbid(unsafe_code)]

use std::time::Instant;

use roster_core::{PageDescriptor, PageResult, Record, Skill};
use serde::Deserialize;
use tracing::{info, warn};

pub mod config;
pub mod error;
pub mod transport;

pub use config::ClientConfig;
pub use error::ClientError;
pub use transport::{HttpTransport, ListTransport, TransportResponse};
pub use url::Url;

#[derive(Deserialize)]
struct ItemsEnvelope {
    value: Vec<serde_json::Value>,
}

/// Decode a `{ "value": [...] }` body into skill records, in server order.
pub fn decode_page(body: &[u8]) -> Result<Vec<Record>, ClientError> {
    let env: ItemsEnvelope = serde_json::from_slice(body).map_err(|e| ClientError::ParseFailed(e.to_string()))?;
    let mut out = Vec::with_capacity(env.value.len());
    for (i, item) in env.value.into_iter().enumerate() {
        let skill = Skill::from_value(item).map_err(|e| ClientError::ParseFailed(format!("item {}: {}", i, e)))?;
        out.push(skill.to_record());
    }
    Ok(out)
}

/// Full page heuristic: more pages are assumed iff the server filled the requested size.
pub fn page_is_full(requested: Option<u32>, returned: usize) -> bool {
    matches!(requested, Some(n) if n > 0 && returned == n as usize)
}

pub struct ListClient<T = HttpTransport> {
    transport: T,
    items_url: Url,
}

impl ListClient<HttpTransport> {
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::with_transport(config, HttpTransport::new(config)?)
    }
}

impl<T: ListTransport> ListClient<T> {
    pub fn with_transport(config: &ClientConfig, transport: T) -> Result<Self, ClientError> {
        Ok(Self { transport, items_url: config.items_url()? })
    }

    pub fn items_url(&self) -> &Url { &self.items_url }

    /// Items URL with the serialized descriptor as its query string.
    pub fn request_url(&self, descriptor: &PageDescriptor) -> Url {
        let mut url = self.items_url.clone();
        let qs = roster_query::to_query_string(descriptor);
        url.set_query(if qs.is_empty() { None } else { Some(&qs) });
        url
    }

    pub async fn fetch(&self, descriptor: &PageDescriptor) -> Result<PageResult, ClientError> {
        let t0 = Instant::now();
        let url = self.request_url(descriptor);
        info!(url = %url, "client: fetch start");
        metrics::counter!("client_fetch_total", 1u64);
        let res = self.fetch_url(&url, descriptor.page_size).await;
        metrics::histogram!("client_fetch_ms", t0.elapsed().as_secs_f64() * 1_000.0);
        match &res {
            Ok(page) => {
                metrics::histogram!("client_page_records", page.records.len() as f64);
                info!(records = page.records.len(), has_next = page.has_next, took_ms = %t0.elapsed().as_millis(), "client: fetch ok");
            }
            Err(e) => {
                metrics::counter!("client_fetch_errors_total", 1u64, "kind" => e.kind());
                warn!(error = %e, took_ms = %t0.elapsed().as_millis(), "client: fetch failed");
            }
        }
        res
    }

    async fn fetch_url(&self, url: &Url, page_size: Option<u32>) -> Result<PageResult, ClientError> {
        let resp = self.transport.get(url).await?;
        if !resp.is_success() {
            return Err(ClientError::RequestFailed { status: resp.status, status_text: resp.status_text });
        }
        let records = decode_page(&resp.body)?;
        let has_next = page_is_full(page_size, records.len());
        let total_count = Some(records.len());
        Ok(PageResult { records, has_next, total_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StaticTransport {
        resp: TransportResponse,
        seen: Mutex<Vec<String>>,
    }

    impl StaticTransport {
        fn ok(body: serde_json::Value) -> Self {
            Self::with(200, "OK", body.to_string().into_bytes())
        }
        fn with(status: u16, text: &str, body: Vec<u8>) -> Self {
            Self { resp: TransportResponse { status, status_text: text.into(), body }, seen: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait::async_trait]
    impl ListTransport for StaticTransport {
        async fn get(&self, url: &Url) -> Result<TransportResponse, ClientError> {
            self.seen.lock().unwrap().push(url.to_string());
            Ok(self.resp.clone())
        }
    }

    fn items(n: usize) -> serde_json::Value {
        let v: Vec<serde_json::Value> = (0..n)
            .map(|i| serde_json::json!({
                "Id": i, "Title": format!("Skill {}", i), "Created": "2024-01-01T00:00:00Z",
                "Modified": "2024-01-02T00:00:00Z", "Author": { "Title": "Ada", "Email": "ada@example.com" }
            }))
            .collect();
        serde_json::json!({ "value": v })
    }

    fn client(t: StaticTransport) -> ListClient<StaticTransport> {
        ListClient::with_transport(&ClientConfig::new("https://x.example.com/sites/hr"), t).unwrap()
    }

    fn descriptor(page_size: Option<u32>) -> PageDescriptor {
        PageDescriptor { page_size, order_by: Some("Modified desc".into()), ..Default::default() }
    }

    #[tokio::test]
    async fn short_page_has_no_next() {
        let c = client(StaticTransport::ok(items(8)));
        let page = c.fetch(&descriptor(Some(10))).await.unwrap();
        assert_eq!(page.records.len(), 8);
        assert!(!page.has_next);
        assert_eq!(page.total_count, Some(8));
    }

    #[tokio::test]
    async fn full_page_assumes_next() {
        let c = client(StaticTransport::ok(items(10)));
        let page = c.fetch(&descriptor(Some(10))).await.unwrap();
        assert!(page.has_next);
        assert_eq!(page.records[0].resolve("Author.Title"), Some(&serde_json::json!("Ada")));
        assert_eq!(page.records[9].id(), Some(9));
    }

    #[tokio::test]
    async fn no_page_size_never_has_next() {
        let c = client(StaticTransport::ok(items(0)));
        let page = c.fetch(&descriptor(None)).await.unwrap();
        assert!(page.is_empty());
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn request_carries_serialized_query() {
        let c = client(StaticTransport::ok(items(1)));
        let d = PageDescriptor { skip: Some(20), ..descriptor(Some(10)) };
        c.fetch(&d).await.unwrap();
        let seen = c.transport.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].starts_with("https://x.example.com/sites/hr/_api/web/lists/getbytitle('SkillsLibrary')/items?"));
        assert!(seen[0].ends_with("$orderby=Modified%20desc&$top=10&$skip=20"), "{}", seen[0]);
    }

    #[tokio::test]
    async fn non_success_is_request_failed() {
        let c = client(StaticTransport::with(503, "Service Unavailable", b"busy".to_vec()));
        let err = c.fetch(&descriptor(Some(5))).await.unwrap_err();
        assert_eq!(err, ClientError::RequestFailed { status: 503, status_text: "Service Unavailable".into() });
    }

    #[tokio::test]
    async fn malformed_body_is_parse_failed() {
        let c = client(StaticTransport::with(200, "OK", b"{not json".to_vec()));
        assert!(matches!(c.fetch(&descriptor(Some(5))).await, Err(ClientError::ParseFailed(_))));
        let c = client(StaticTransport::ok(serde_json::json!({ "value": [{ "Title": "no id" }] })));
        match c.fetch(&descriptor(Some(5))).await {
            Err(ClientError::ParseFailed(msg)) => assert!(msg.starts_with("item 0:"), "{}", msg),
            other => panic!("unexpected: {:?}", other),
        }
        let c = client(StaticTransport::ok(serde_json::json!({ "d": { "results": [] } })));
        assert!(matches!(c.fetch(&descriptor(Some(5))).await, Err(ClientError::ParseFailed(_))));
    }

    #[test]
    fn full_page_heuristic() {
        assert!(page_is_full(Some(10), 10));
        assert!(!page_is_full(Some(10), 8));
        assert!(!page_is_full(Some(0), 0));
        assert!(!page_is_full(None, 3));
    }
}
