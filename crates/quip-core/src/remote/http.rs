//! JSON-over-HTTP gateway for posts-shaped collections (e.g. JSONPlaceholder)

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{Ack, RemoteGateway};
use crate::config::{normalize_endpoint, SyncSettings};
use crate::error::{Error, Result};
use crate::models::{QuoteId, QuoteRecord, Snapshot};
use crate::util::unix_millis_now;

/// `userId` sent with pushed records
const PUSH_USER_ID: u64 = 1;
const FALLBACK_CATEGORY: &str = "remote";

#[derive(Clone)]
pub struct HttpGateway {
    endpoint: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpGateway")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HttpGateway {
    /// Build a gateway whose requests are bounded by the configured timeout
    pub fn new(settings: &SyncSettings) -> Result<Self> {
        let endpoint = normalize_endpoint(&settings.endpoint)?;
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;
        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn pull(&self) -> Result<Snapshot> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Transport(describe_status(status, &body)));
        }

        let records = parse_remote_items(&body, unix_millis_now())?;
        tracing::debug!("Pulled {} quotes from {}", records.len(), self.endpoint);
        Ok(records)
    }

    async fn push(&self, record: &QuoteRecord) -> Result<Ack> {
        let payload = PushBody {
            title: &record.text,
            body: &record.text,
            category: &record.category,
            user_id: PUSH_USER_ID,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transport(describe_status(status, &body)));
        }

        Ok(Ack {
            status: status.as_u16(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServerId {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerItem {
    id: ServerId,
    title: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    user_id: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PushBody<'a> {
    title: &'a str,
    body: &'a str,
    category: &'a str,
    user_id: u64,
}

/// Decode a server response into remote records.
///
/// The whole payload is rejected when any item is malformed. Every record is
/// stamped with `pulled_at`.
pub fn parse_remote_items(payload: &str, pulled_at: i64) -> Result<Snapshot> {
    let items: Vec<ServerItem> = serde_json::from_str(payload)
        .map_err(|error| Error::Transport(format!("invalid collection JSON: {error}")))?;

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| item.into_record(pulled_at, index))
        .collect()
}

impl ServerItem {
    fn into_record(self, pulled_at: i64, index: usize) -> Result<QuoteRecord> {
        let id = match self.id {
            ServerId::Number(id) => QuoteId::from(id),
            ServerId::Text(id) if !id.trim().is_empty() => QuoteId::from(id.trim()),
            ServerId::Text(_) => {
                return Err(Error::Transport(format!("item {index} has an empty id")));
            }
        };

        let text = self.title.trim();
        if text.is_empty() {
            return Err(Error::Transport(format!("item {id} has an empty title")));
        }

        let category = self
            .category
            .map(|category| category.trim().to_string())
            .filter(|category| !category.is_empty())
            .or_else(|| self.user_id.map(|user_id| format!("user-{user_id}")))
            .unwrap_or_else(|| FALLBACK_CATEGORY.to_string());

        Ok(QuoteRecord::remote(id, text, category, pulled_at))
    }
}

/// Longest slice of a response body quoted in an error
const ERROR_BODY_CHARS: usize = 180;

fn describe_status(status: StatusCode, body: &str) -> String {
    let trimmed = body.trim().chars().take(ERROR_BODY_CHARS).collect::<String>();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Origin;
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn parse_maps_posts_shape() {
        let payload = r#"[
            {"userId": 1, "id": 1, "title": "sunt aut facere", "body": "quia et suscipit"},
            {"userId": 2, "id": 2, "title": "qui est esse", "category": "Wisdom"}
        ]"#;

        let records = parse_remote_items(payload, 99).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, Some(QuoteId::from(1)));
        assert_eq!(records[0].text, "sunt aut facere");
        assert_eq!(records[0].category, "user-1");
        assert_eq!(records[0].updated_at, 99);
        assert_eq!(records[0].origin, Origin::Remote);
        assert_eq!(records[1].category, "Wisdom");
    }

    #[test]
    fn parse_accepts_string_ids_and_missing_grouping() {
        let records = parse_remote_items(r#"[{"id": "abc", "title": "T"}]"#, 0).unwrap();
        assert_eq!(records[0].id, Some(QuoteId::from("abc")));
        assert_eq!(records[0].category, FALLBACK_CATEGORY);
    }

    #[test]
    fn parse_is_all_or_nothing() {
        let payload = r#"[{"id": 1, "title": "fine"}, {"id": 2, "title": "   "}]"#;
        assert!(matches!(
            parse_remote_items(payload, 0),
            Err(Error::Transport(_))
        ));

        assert!(matches!(
            parse_remote_items(r#"[{"id": 1}]"#, 0),
            Err(Error::Transport(_))
        ));
        assert!(matches!(
            parse_remote_items(r#"{"id": 1, "title": "x"}"#, 0),
            Err(Error::Transport(_))
        ));
    }

    #[test]
    fn gateway_rejects_invalid_endpoint() {
        let settings = SyncSettings {
            endpoint: "example.com/posts".to_string(),
            ..SyncSettings::default()
        };
        assert!(matches!(HttpGateway::new(&settings), Err(Error::Config(_))));
    }

    /// Serve a single canned HTTP response and return the endpoint URL
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{address}/posts")
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut request = Vec::new();
        let mut buffer = [0u8; 1024];
        loop {
            let read = socket.read(&mut buffer).await.unwrap();
            if read == 0 {
                return;
            }
            request.extend_from_slice(&buffer[..read]);
            let text = String::from_utf8_lossy(&request).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + content_length {
                    return;
                }
            }
        }
    }

    fn gateway_for(endpoint: String, timeout_secs: u64) -> HttpGateway {
        HttpGateway::new(&SyncSettings {
            endpoint,
            timeout_secs,
            ..SyncSettings::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn pull_decodes_collection() {
        let endpoint = serve_once("200 OK", r#"[{"userId": 3, "id": 7, "title": "Hello"}]"#).await;
        let gateway = gateway_for(endpoint, 4);

        let records = gateway.pull().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, Some(QuoteId::from(7)));
        assert_eq!(records[0].category, "user-3");
    }

    #[tokio::test]
    async fn pull_maps_http_errors_to_transport() {
        let endpoint = serve_once("503 Service Unavailable", r#"{"error":"down"}"#).await;
        let gateway = gateway_for(endpoint, 4);

        let error = gateway.pull().await.unwrap_err();
        assert!(matches!(error, Error::Transport(message) if message.contains("503")));
    }

    #[tokio::test]
    async fn push_returns_status() {
        let endpoint = serve_once("201 Created", r#"{"id": 101}"#).await;
        let gateway = gateway_for(endpoint, 4);

        let ack = gateway.push(&QuoteRecord::new("A", "X")).await.unwrap();
        assert_eq!(ack, Ack { status: 201 });
    }

    #[tokio::test]
    async fn pull_times_out_instead_of_hanging() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        });

        let gateway = gateway_for(format!("http://{address}/posts"), 1);
        assert!(matches!(gateway.pull().await, Err(Error::Transport(_))));
    }
}
