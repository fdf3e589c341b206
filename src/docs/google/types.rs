/// Google Docs 数据结构
///
/// 包含 OAuth2 凭据（持久化格式与 Google "authorized user" JSON 兼容）
/// 以及 Docs API 的请求/响应类型
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token 刷新阈值（提前多少分钟算作过期）
pub const REFRESH_THRESHOLD_MINUTES: i64 = 5;

/// 文档查看地址前缀
const DOCUMENT_URL_PREFIX: &str = "https://docs.google.com/document/d/";

/// OAuth2 凭据
///
/// 字段名与 Google 官方工具写出的 token 文件一致，
/// 其他工具生成的 `google-docs-token.json` 可直接读取
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// 访问令牌
    #[serde(rename = "token")]
    pub access_token: String,

    /// 刷新令牌（授权时未返回则为空）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// 签发该 Token 的端点（刷新时使用）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// 已授予的权限范围
    #[serde(default)]
    pub scopes: Vec<String>,

    /// 过期时间（UTC），为空表示未知/不过期
    #[serde(rename = "expiry", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &crate::utils::mask_secret(&self.access_token))
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Credential {
    /// 由新签发的 Token 创建凭据
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_in_seconds: Option<i64>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            token_uri: None,
            client_id: None,
            client_secret: None,
            scopes: Vec::new(),
            expires_at: expires_in_seconds.map(expiry_from_now),
        }
    }

    /// 检查 Token 是否已过期（含提前阈值）
    pub fn is_expired(&self) -> bool {
        self.is_expiring(REFRESH_THRESHOLD_MINUTES)
    }

    /// 检查 Token 是否在 `threshold_minutes` 分钟内过期
    pub fn is_expiring(&self, threshold_minutes: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                expires_at <= Utc::now() + chrono::Duration::minutes(threshold_minutes)
            }
            None => false,
        }
    }

    /// 已授予的权限是否覆盖 `required`
    pub fn has_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    /// 可直接使用：Token 非空、未过期、权限足够
    pub fn is_valid(&self, required: &[String]) -> bool {
        !self.access_token.is_empty() && !self.is_expired() && self.has_scopes(required)
    }

    /// 已过期但可以用 Refresh Token 换新
    ///
    /// 权限不足时刷新也拿不到新权限，只能重新授权
    pub fn can_refresh(&self, required: &[String]) -> bool {
        self.refresh_token.is_some() && self.is_expired() && self.has_scopes(required)
    }

    /// 应用刷新结果
    ///
    /// 响应中没有新的 refresh_token / scope 时沿用旧值
    pub fn apply_refresh(
        &mut self,
        access_token: String,
        refresh_token: Option<String>,
        expires_in_seconds: Option<i64>,
        scopes: Option<Vec<String>>,
    ) {
        self.access_token = access_token;
        if let Some(refresh_token) = refresh_token {
            self.refresh_token = Some(refresh_token);
        }
        self.expires_at = expires_in_seconds.map(expiry_from_now);
        if let Some(scopes) = scopes {
            self.scopes = scopes;
        }
    }
}

fn expiry_from_now(seconds: i64) -> DateTime<Utc> {
    Utc::now() + chrono::Duration::seconds(seconds)
}

/// 远端文档引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub document_id: String,
    pub title: Option<String>,
}

impl DocumentRef {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            title: None,
        }
    }

    /// 文档的查看/编辑地址
    pub fn url(&self) -> String {
        document_url(&self.document_id)
    }
}

/// 由文档 ID 生成查看地址
pub fn document_url(document_id: &str) -> String {
    format!("{}{}/edit", DOCUMENT_URL_PREFIX, document_id)
}

/// `documents.create` 请求体
#[derive(Debug, Serialize)]
pub struct CreateDocumentRequest<'a> {
    pub title: &'a str,
}

/// `documents.create` 响应（只取用到的字段）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_id: Option<String>,
    pub title: Option<String>,
}

/// 文档内的位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub index: u32,

    /// 片段 ID（页眉/页脚/脚注），为空表示正文
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,
}

impl Location {
    /// 正文中的位置
    pub fn body(index: u32) -> Self {
        Self {
            index,
            segment_id: None,
        }
    }
}

/// 插入文本
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertText {
    pub location: Location,
    pub text: String,
}

/// batchUpdate 中的单个编辑操作
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    InsertText(InsertText),
}

impl Request {
    /// 在正文 `index` 处插入文本
    pub fn insert_text(index: u32, text: impl Into<String>) -> Self {
        Self::InsertText(InsertText {
            location: Location::body(index),
            text: text.into(),
        })
    }
}

/// `documents.batchUpdate` 请求体
#[derive(Debug, Serialize)]
pub struct BatchUpdateRequest<'a> {
    pub requests: &'a [Request],
}

/// `documents.batchUpdate` 响应
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    #[serde(default)]
    pub replies: Vec<serde_json::Value>,
}

/// Google API 错误响应体
#[derive(Debug, Deserialize)]
pub struct GoogleErrorEnvelope {
    pub error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct GoogleErrorBody {
    pub message: Option<String>,
    pub status: Option<String>,
}
