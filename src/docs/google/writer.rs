/// 创建文档并写入文本
///
/// 流程：获取凭据 → documents.create → documents.batchUpdate（正文开头插入文本）→ 返回地址
use crate::config::{Config, TokenStore};
use crate::docs::google::api::{DocsApi, DocsApiClient};
use crate::docs::google::error::{AuthError, WriteError};
use crate::docs::google::oauth::GoogleOAuth;
use crate::docs::google::token::{AuthBackend, CredentialManager};
use crate::docs::google::types::{DocumentRef, Request, document_url};

/// 正文第一个可插入位置（索引 0 是隐式的根节点）
pub const BODY_START_INDEX: u32 = 1;

/// 文档写入器
pub struct DocumentCreator<A> {
    api: A,
}

impl<A: DocsApi> DocumentCreator<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// 创建文档并在开头插入 `text`
    ///
    /// 标题与正文不做本地校验，交由服务端处理
    ///
    /// # Errors
    /// - `WriteError::Create`：文档未创建
    /// - `WriteError::Insert`：文档已创建但插入失败，远端留下空文档（不做清理）
    pub async fn create_document(
        &self,
        title: &str,
        text: &str,
    ) -> Result<DocumentRef, WriteError> {
        let document = self
            .api
            .create_document(title)
            .await
            .map_err(WriteError::Create)?;

        let requests = [Request::insert_text(BODY_START_INDEX, text)];

        if let Err(source) = self.api.batch_update(&document.document_id, &requests).await {
            tracing::warn!(
                "⚠️ 文档 {} 已创建但插入文本失败，远端保留空文档",
                document.document_id
            );
            return Err(WriteError::Insert {
                document_id: document.document_id,
                source,
            });
        }

        tracing::info!("✅ 文本已写入: {}", document.url());
        Ok(document)
    }
}

/// 由配置构建凭据管理器
pub fn credential_manager(config: &Config) -> anyhow::Result<CredentialManager<GoogleOAuth>> {
    let store = TokenStore::new(config.token_path()?);
    let backend = GoogleOAuth::new(config.client_secret_path()?)
        .with_callback_timeout(std::time::Duration::from_secs(config.auth.callback_timeout_secs))
        .with_open_browser(config.auth.open_browser);

    Ok(CredentialManager::new(store, backend, config.auth.scopes.clone()))
}

/// 获取凭据并构建 Docs 写入器
pub async fn connect(config: &Config) -> anyhow::Result<DocumentCreator<DocsApiClient>> {
    let credential = credential_manager(config)?.obtain_credential().await?;
    let api = DocsApiClient::with_base_url(credential.access_token, config.docs.base_url.clone());
    Ok(DocumentCreator::new(api))
}

/// 创建文档并写入文本，返回文档地址
///
/// - 授权失败：返回 `Err(AuthError)`
/// - 远端调用失败：记录错误日志并返回 `Ok(None)`，调用方可整体重试
pub async fn create_doc_with_text(
    manager: &CredentialManager<impl AuthBackend>,
    base_url: &str,
    title: &str,
    text: &str,
) -> Result<Option<String>, AuthError> {
    let credential = manager.obtain_credential().await?;
    let creator = DocumentCreator::new(DocsApiClient::with_base_url(
        credential.access_token,
        base_url,
    ));

    Ok(write_or_log(&creator, title, text).await)
}

/// 写入文档，失败时只记录日志
pub async fn write_or_log<A: DocsApi>(
    creator: &DocumentCreator<A>,
    title: &str,
    text: &str,
) -> Option<String> {
    match creator.create_document(title, text).await {
        Ok(document) => Some(document.url()),
        Err(e) => {
            tracing::error!("❌ 写入文档失败: {}", e);
            if let Some(document_id) = e.orphaned_document_id() {
                tracing::error!("   远端遗留空文档: {}", document_url(document_id));
            }
            None
        }
    }
}
