/// Google Docs 相关错误类型
///
/// - `AuthError`：无法建立授权（向调用方传播，不吞掉）
/// - `RemoteCallError`：Docs API 单次调用失败
/// - `WriteError`：创建 + 插入文本流程中的失败（带阶段信息）
use thiserror::Error;

/// 授权错误
#[derive(Debug, Error)]
pub enum AuthError {
    /// 未找到 OAuth2 客户端配置（credentials.json 或环境变量）
    #[error("缺少 OAuth2 客户端配置: {0}")]
    MissingClientSecret(String),

    /// 客户端配置文件格式不正确
    #[error("OAuth2 客户端配置无效: {0}")]
    InvalidClientSecret(String),

    /// 用户在授权页面拒绝了授权
    #[error("用户拒绝授权: {0}")]
    ConsentDenied(String),

    /// 未在规定时间内收到回调
    #[error("授权超时：{0} 秒内未收到回调")]
    CallbackTimeout(u64),

    /// 本地回调服务器出错
    #[error("本地回调服务器错误: {0}")]
    Callback(String),

    /// state 与发出的不一致
    #[error("CSRF 验证失败：state 不匹配")]
    CsrfMismatch,

    /// 授权码交换 Token 失败
    #[error("Token 交换失败: {0}")]
    CodeExchange(String),

    /// Refresh Token 交换失败
    #[error("Refresh Token 交换失败: {0}")]
    Refresh(String),

    #[error("Token 文件读写失败: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Token 序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("URL 无效: {0}")]
    Url(#[from] url::ParseError),
}

/// Docs API 调用错误
#[derive(Debug, Error)]
pub enum RemoteCallError {
    /// 网络层失败（连接、超时等）
    #[error("请求 Docs API 失败: {0}")]
    Transport(#[from] reqwest::Error),

    /// API 返回非 2xx
    #[error("Docs API 返回错误 {status}: {message}")]
    Api {
        status: u16,
        message: String,
        /// Google 错误体中的 `status` 字段，如 `PERMISSION_DENIED`
        reason: Option<String>,
    },

    /// 响应体无法解析
    #[error("解析 Docs API 响应失败: {0}")]
    Decode(String),

    #[error("创建文档的响应中缺少 documentId")]
    MissingDocumentId,
}

/// 创建文档并写入文本时的失败
#[derive(Debug, Error)]
pub enum WriteError {
    /// 文档未能创建
    #[error("创建文档失败: {0}")]
    Create(#[source] RemoteCallError),

    /// 文档已创建，但插入文本失败（远端会留下一个空文档）
    #[error("文档 {document_id} 已创建，但插入文本失败: {source}")]
    Insert {
        document_id: String,
        #[source]
        source: RemoteCallError,
    },
}

impl WriteError {
    /// 已创建但未写入文本的文档 ID
    pub fn orphaned_document_id(&self) -> Option<&str> {
        match self {
            Self::Insert { document_id, .. } => Some(document_id),
            Self::Create(_) => None,
        }
    }
}
