use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use pulse_core::ports::{Embedder, EmbeddingError, EmbeddingOutput};

pub const DEFAULT_REMOTE_MODEL: &str = "external-api-model";

/// Configuration for the remote embedding service.
#[derive(Debug, Clone)]
pub struct HttpEmbedderConfig {
    pub base_url: String,
    /// Upper bound for a whole request, connect to last byte.
    pub timeout: Duration,
    /// Model name recorded when the service does not report one.
    pub default_model: String,
}

impl Default for HttpEmbedderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4075".to_string(),
            timeout: Duration::from_secs(30),
            default_model: DEFAULT_REMOTE_MODEL.to_string(),
        }
    }
}

impl HttpEmbedderConfig {
    /// Read `EMBEDDING_SERVICE_URL` and `EMBEDDING_TIMEOUT_SECS`.
    /// `None` when no service URL is set.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("EMBEDDING_SERVICE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())?;

        Some(Self {
            base_url,
            timeout: Duration::from_secs(
                std::env::var("EMBEDDING_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            ..Self::default()
        })
    }
}

#[derive(Serialize)]
struct PostEmbeddingRequest<'a> {
    title: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostEmbeddingResponse {
    post_embeddings: Vec<f32>,
    model: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchEmbeddingResponse {
    search_embeddings: Vec<f32>,
    model: Option<String>,
}

/// Client for the external embedding service.
///
/// Every request is bounded by the configured timeout. Dropping the
/// returned future aborts the request.
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: HttpEmbedderConfig,
}

impl HttpEmbedder {
    pub fn new(config: HttpEmbedderConfig) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmbeddingError::Transport(e.to_string()))?;

        tracing::info!(
            url = %config.base_url,
            timeout_secs = config.timeout.as_secs(),
            "Embedding service client configured"
        );

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn output(
        &self,
        vector: Vec<f32>,
        model: Option<String>,
    ) -> Result<EmbeddingOutput, EmbeddingError> {
        validate_vector(&vector)?;
        Ok(EmbeddingOutput {
            vector,
            model: model.unwrap_or_else(|| self.config.default_model.clone()),
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<EmbeddingOutput, EmbeddingError> {
        let request = self
            .client
            .get(self.endpoint("generate-search-embeddings"))
            .query(&[("searchKey", text)]);

        let body: SearchEmbeddingResponse = send_json(request).await?;
        self.output(body.search_embeddings, body.model)
    }

    async fn embed_post(
        &self,
        title: &str,
        content: &str,
    ) -> Result<EmbeddingOutput, EmbeddingError> {
        let request = self
            .client
            .post(self.endpoint("generate-embeddings"))
            .json(&PostEmbeddingRequest { title, content });

        let body: PostEmbeddingResponse = send_json(request).await?;
        self.output(body.post_embeddings, body.model)
    }

    fn model_name(&self) -> &str {
        &self.config.default_model
    }
}

async fn send_json<T>(request: reqwest::RequestBuilder) -> Result<T, EmbeddingError>
where
    T: serde::de::DeserializeOwned,
{
    let response = request.send().await.map_err(request_err)?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "Embedding service returned an error");
        return Err(EmbeddingError::Status(status.as_u16()));
    }

    response.json::<T>().await.map_err(|e| {
        if e.is_timeout() {
            EmbeddingError::Timeout
        } else {
            EmbeddingError::Malformed(e.to_string())
        }
    })
}

fn request_err(err: reqwest::Error) -> EmbeddingError {
    if err.is_timeout() {
        EmbeddingError::Timeout
    } else {
        EmbeddingError::Transport(err.to_string())
    }
}

/// A usable vector is non-empty and entirely finite.
pub fn validate_vector(vector: &[f32]) -> Result<(), EmbeddingError> {
    if vector.is_empty() {
        return Err(EmbeddingError::Malformed("empty vector".to_string()));
    }
    if let Some(index) = vector.iter().position(|v| !v.is_finite()) {
        return Err(EmbeddingError::Malformed(format!(
            "non-finite value at index {index}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Read one HTTP request off the socket: headers plus a
    /// content-length body.
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        let header_end = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);

        while buf.len() < header_end + content_length {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Serve a single canned response and hand back the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            request
        });

        (base_url, handle)
    }

    fn embedder(base_url: String, timeout: Duration) -> HttpEmbedder {
        HttpEmbedder::new(HttpEmbedderConfig {
            base_url,
            timeout,
            ..HttpEmbedderConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_embeds_post_with_reported_model() {
        let (base_url, server) =
            serve_once("200 OK", r#"{"postEmbeddings":[0.5,0.25,-1.0],"model":"minilm"}"#).await;

        let output = embedder(base_url, Duration::from_secs(5))
            .embed_post("Art", "Gallery opening")
            .await
            .unwrap();

        assert_eq!(output.vector, vec![0.5_f32, 0.25, -1.0]);
        assert_eq!(output.model, "minilm");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /generate-embeddings "));
        assert!(request.contains(r#""title":"Art""#));
        assert!(request.contains(r#""content":"Gallery opening""#));
    }

    #[tokio::test]
    async fn test_embeds_query_with_default_model() {
        let (base_url, server) = serve_once("200 OK", r#"{"searchEmbeddings":[1.0,0.0]}"#).await;

        let output = embedder(base_url, Duration::from_secs(5))
            .embed("art show")
            .await
            .unwrap();

        assert_eq!(output.vector, vec![1.0_f32, 0.0]);
        assert_eq!(output.model, DEFAULT_REMOTE_MODEL);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /generate-search-embeddings?searchKey=art"));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (base_url, _server) = serve_once("503 Service Unavailable", "{}").await;

        let err = embedder(base_url, Duration::from_secs(5))
            .embed("anything")
            .await
            .unwrap_err();

        assert!(matches!(err, EmbeddingError::Status(503)));
    }

    #[tokio::test]
    async fn test_empty_vector_is_malformed() {
        let (base_url, _server) = serve_once("200 OK", r#"{"searchEmbeddings":[]}"#).await;

        let err = embedder(base_url, Duration::from_secs(5))
            .embed("anything")
            .await
            .unwrap_err();

        assert!(matches!(err, EmbeddingError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_unexpected_body_is_malformed() {
        let (base_url, _server) = serve_once("200 OK", r#"{"vectors":[1.0]}"#).await;

        let err = embedder(base_url, Duration::from_secs(5))
            .embed("anything")
            .await
            .unwrap_err();

        assert!(matches!(err, EmbeddingError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let _server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _ = read_request(&mut stream).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let err = embedder(base_url, Duration::from_millis(200))
            .embed("anything")
            .await
            .unwrap_err();

        assert!(matches!(err, EmbeddingError::Timeout));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = embedder(base_url, Duration::from_secs(5))
            .embed_post("title", "content")
            .await
            .unwrap_err();

        assert!(matches!(err, EmbeddingError::Transport(_)));
    }

    #[test]
    fn test_rejects_non_finite_values() {
        assert!(validate_vector(&[0.1, f32::NAN]).is_err());
        assert!(validate_vector(&[f32::INFINITY]).is_err());
        assert!(validate_vector(&[0.1, -0.2]).is_ok());
    }
}
