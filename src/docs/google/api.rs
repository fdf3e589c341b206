/// Google Docs API 调用模块
///
/// 只暴露用到的两个端点：`documents.create` 与 `documents.batchUpdate`
use async_trait::async_trait;
use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::config::DEFAULT_DOCS_BASE_URL;
use crate::docs::google::error::RemoteCallError;
use crate::docs::google::types::{
    BatchUpdateRequest, BatchUpdateResponse, CreateDocumentRequest, Document, DocumentRef,
    GoogleErrorEnvelope, Request,
};
use crate::utils::http_client;

/// Docs 服务接口
#[async_trait]
pub trait DocsApi: Send + Sync {
    /// 创建空白文档，返回服务端分配的文档 ID
    async fn create_document(&self, title: &str) -> Result<DocumentRef, RemoteCallError>;

    /// 对文档批量执行编辑操作（服务端原子应用）
    async fn batch_update(
        &self,
        document_id: &str,
        requests: &[Request],
    ) -> Result<(), RemoteCallError>;
}

/// Docs API HTTP 客户端
pub struct DocsApiClient {
    access_token: String,
    base_url: String,
}

impl DocsApiClient {
    /// 创建新的 Docs API 客户端
    ///
    /// # Arguments
    /// * `access_token` - 有效的 Access Token
    pub fn new(access_token: String) -> Self {
        Self::with_base_url(access_token, DEFAULT_DOCS_BASE_URL)
    }

    /// 指定 API 地址（测试或代理）
    pub fn with_base_url(access_token: String, base_url: impl Into<String>) -> Self {
        Self {
            access_token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn documents_url(&self) -> String {
        format!("{}/v1/documents", self.base_url)
    }
}

#[async_trait]
impl DocsApi for DocsApiClient {
    async fn create_document(&self, title: &str) -> Result<DocumentRef, RemoteCallError> {
        tracing::debug!("正在创建文档: {}", title);

        let response = http_client::get_client()
            .post(self.documents_url())
            .bearer_auth(&self.access_token)
            .json(&CreateDocumentRequest { title })
            .send()
            .await?;

        let document: Document = parse_response(response).await?;

        let document_id = document
            .document_id
            .filter(|id| !id.is_empty())
            .ok_or(RemoteCallError::MissingDocumentId)?;

        tracing::info!("✅ 文档已创建: {}", document_id);

        Ok(DocumentRef {
            document_id,
            title: document.title,
        })
    }

    async fn batch_update(
        &self,
        document_id: &str,
        requests: &[Request],
    ) -> Result<(), RemoteCallError> {
        tracing::debug!("batchUpdate {}: {} 个操作", document_id, requests.len());

        let url = format!("{}/{}:batchUpdate", self.documents_url(), document_id);

        let response = http_client::get_client()
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&BatchUpdateRequest { requests })
            .send()
            .await?;

        let reply: BatchUpdateResponse = parse_response(response).await?;
        tracing::debug!("batchUpdate 完成: {} 个回复", reply.replies.len());

        Ok(())
    }
}

/// 检查状态码并解析响应体
///
/// 非 2xx 时尝试解析 Google 错误体 `{"error": {...}}`
async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, RemoteCallError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let (message, reason) = match serde_json::from_str::<GoogleErrorEnvelope>(&body) {
            Ok(envelope) => (
                envelope.error.message.unwrap_or_else(|| body.clone()),
                envelope.error.status,
            ),
            Err(_) => (body, None),
        };

        if status == 401 {
            tracing::warn!("Docs API 返回 401：Access Token 无效或已过期");
        } else if status == 403 {
            tracing::warn!("Docs API 返回 403：权限不足或 API 未启用");
        }

        return Err(RemoteCallError::Api {
            status: status.as_u16(),
            message,
            reason,
        });
    }

    serde_json::from_str(&body).map_err(|e| RemoteCallError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_base_url_trailing_slash() {
        let client = DocsApiClient::with_base_url("token".to_string(), "http://localhost:9000/");
        assert_eq!(client.documents_url(), "http://localhost:9000/v1/documents");

        let client = DocsApiClient::new("token".to_string());
        assert_eq!(
            client.documents_url(),
            "https://docs.googleapis.com/v1/documents"
        );
    }

    #[tokio::test]
    async fn test_create_document() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/documents"))
            .and(header("authorization", "Bearer ya29.test"))
            .and(body_json(serde_json::json!({ "title": "Test" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "documentId": "abc123",
                "title": "Test",
                "revisionId": "rev-1"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = DocsApiClient::with_base_url("ya29.test".to_string(), mock_server.uri());
        let document = client.create_document("Test").await.unwrap();

        assert_eq!(document.document_id, "abc123");
        assert_eq!(document.title.as_deref(), Some("Test"));
    }

    #[tokio::test]
    async fn test_create_document_without_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/documents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Test"
            })))
            .mount(&mock_server)
            .await;

        let client = DocsApiClient::with_base_url("ya29.test".to_string(), mock_server.uri());
        let result = client.create_document("Test").await;

        assert!(matches!(result, Err(RemoteCallError::MissingDocumentId)));
    }

    #[tokio::test]
    async fn test_batch_update_insert_text() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/documents/abc123:batchUpdate"))
            .and(header("authorization", "Bearer ya29.test"))
            .and(body_json(serde_json::json!({
                "requests": [
                    { "insertText": { "location": { "index": 1 }, "text": "Hello" } }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "documentId": "abc123",
                "replies": [{}],
                "writeControl": { "requiredRevisionId": "rev-2" }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = DocsApiClient::with_base_url("ya29.test".to_string(), mock_server.uri());
        client
            .batch_update("abc123", &[Request::insert_text(1, "Hello")])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_api_error_envelope() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/documents/abc123:batchUpdate"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {
                    "code": 429,
                    "message": "Quota exceeded for quota metric 'Write requests'",
                    "status": "RESOURCE_EXHAUSTED"
                }
            })))
            .mount(&mock_server)
            .await;

        let client = DocsApiClient::with_base_url("ya29.test".to_string(), mock_server.uri());
        let err = client
            .batch_update("abc123", &[Request::insert_text(1, "Hello")])
            .await
            .unwrap_err();

        match err {
            RemoteCallError::Api {
                status,
                message,
                reason,
            } => {
                assert_eq!(status, 429);
                assert!(message.contains("Quota exceeded"));
                assert_eq!(reason.as_deref(), Some("RESOURCE_EXHAUSTED"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_api_error_plain_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/documents"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&mock_server)
            .await;

        let client = DocsApiClient::with_base_url("ya29.test".to_string(), mock_server.uri());
        let err = client.create_document("Test").await.unwrap_err();

        assert!(matches!(
            &err,
            RemoteCallError::Api { status: 502, reason: None, .. }
        ));
        assert!(err.to_string().contains("Bad Gateway"));
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/documents"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&mock_server)
            .await;

        let client = DocsApiClient::with_base_url("ya29.test".to_string(), mock_server.uri());
        let result = client.create_document("Test").await;

        assert!(matches!(result, Err(RemoteCallError::Decode(_))));
    }
}
