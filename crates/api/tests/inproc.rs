use std::sync::Mutex;

use roster_api::{InProcApi, RosterApi, RosterError, SearchRequest};
use roster_client::{ClientConfig, ClientError, ListClient, ListTransport, TransportResponse, Url};
use roster_core::{FieldMapping, FieldMappingEntry};
use roster_query::{QueryBuilder, QueryParams};
use roster_view::{ResultsView, ViewOptions};

/// Serves canned responses in order.
struct ScriptedTransport {
    replies: Mutex<Vec<TransportResponse>>,
}

impl ScriptedTransport {
    fn new(mut replies: Vec<TransportResponse>) -> Self {
        replies.reverse();
        Self { replies: Mutex::new(replies) }
    }
}

#[async_trait::async_trait]
impl ListTransport for ScriptedTransport {
    async fn get(&self, _url: &Url) -> Result<TransportResponse, ClientError> {
        self.replies
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| ClientError::Transport("no scripted reply".into()))
    }
}

fn ok(n: usize, offset: usize) -> TransportResponse {
    let items: Vec<serde_json::Value> = (0..n)
        .map(|i| serde_json::json!({
            "Id": offset + i,
            "Title": format!("Python {}", offset + i),
            "Level": "Expert",
            "Created": "2024-01-01T00:00:00Z",
            "Modified": "2024-01-01T00:00:00Z",
            "Author": { "Title": "Ada", "Email": "ada@example.com" }
        }))
        .collect();
    TransportResponse { status: 200, status_text: "OK".into(), body: serde_json::json!({ "value": items }).to_string().into_bytes() }
}

fn make_api(replies: Vec<TransportResponse>) -> InProcApi<ScriptedTransport> {
    let cfg = ClientConfig::new("https://x.example.com/sites/hr");
    let client = ListClient::with_transport(&cfg, ScriptedTransport::new(replies)).unwrap();
    InProcApi::with_parts(QueryBuilder::default(), client)
}

fn request() -> SearchRequest {
    SearchRequest {
        params: QueryParams { search: Some("python".into()), page_size: Some(2), page_number: Some(1), ..Default::default() },
        fields: FieldMapping::new(vec![
            FieldMappingEntry::new("Title", "title", "Title", true),
            FieldMappingEntry::new("Level", "level", "Level", false),
        ]),
        view: ViewOptions::default(),
    }
}

#[tokio::test]
async fn search_builds_fetches_and_shapes() {
    let api = make_api(vec![ok(2, 0)]);
    let resp = api.search(request()).await.unwrap();
    assert_eq!(resp.descriptor.filter.as_deref(), Some("(substringof('python',Title))"));
    assert!(resp.page.has_next);
    match &resp.view {
        ResultsView::Cards { result_count, cards, .. } => {
            assert_eq!(*result_count, Some(2));
            assert_eq!(cards[0].title, "Python 0");
            assert_eq!(cards[1].level.as_deref(), Some("Expert"));
            assert_eq!(cards[1].author.as_deref(), Some("Ada"));
        }
        other => panic!("unexpected view: {:?}", other),
    }
    assert!(resp.meta.request_url.contains("$filter="));
}

#[tokio::test]
async fn fetch_page_offsets_by_page_size() {
    let api = make_api(vec![ok(2, 0), ok(1, 2)]);
    let first = api.search(request()).await.unwrap();
    let second = api.fetch_page(request(), 2).await.unwrap();
    assert!(first.page.has_next);
    assert!(!second.page.has_next);
    assert_eq!(second.descriptor.skip, Some(2));
    assert_eq!(second.page.records[0].id(), Some(2));
}

#[test]
fn plan_is_repeatable_and_offline() {
    let api = make_api(vec![]);
    let req = request();
    let a = api.plan(&req.params, &req.fields).unwrap();
    let b = api.plan(&req.params, &req.fields).unwrap();
    assert_eq!(a, b);
    assert!(a.url.starts_with("https://x.example.com/sites/hr/_api/web/lists/getbytitle('SkillsLibrary')/items?$select="));
}

#[tokio::test]
async fn errors_map_to_api_taxonomy() {
    let api = make_api(vec![TransportResponse { status: 401, status_text: "Unauthorized".into(), body: Vec::new() }]);
    assert_eq!(api.search(request()).await.unwrap_err(), RosterError::Request("request failed: 401 Unauthorized".into()));

    let api = make_api(vec![TransportResponse { status: 200, status_text: "OK".into(), body: b"[]".to_vec() }]);
    assert!(matches!(api.search(request()).await.unwrap_err(), RosterError::Decode(_)));

    let mut bad = request();
    bad.params.filter = Some("Level eq 'A') or (1 eq 1".into());
    let api = make_api(vec![]);
    assert!(matches!(api.search(bad).await.unwrap_err(), RosterError::Validation(_)));
}

#[tokio::test]
async fn transport_fault_is_request_error() {
    // nothing scripted: the transport itself fails after planning succeeds
    let api = make_api(vec![]);
    match api.search(request()).await {
        Err(RosterError::Request(msg)) => assert!(msg.starts_with("transport:"), "{}", msg),
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_site_is_request_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let cfg = ClientConfig::new(&format!("http://127.0.0.1:{}", port)).with_timeouts(500, 1_000);
    let api = InProcApi::new(&cfg).unwrap();
    assert!(matches!(api.search(request()).await, Err(RosterError::Request(_))));
}
