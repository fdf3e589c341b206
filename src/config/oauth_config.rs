/// OAuth2 客户端配置读取模块
///
/// 支持从环境变量或 Google Cloud Console 下载的 `credentials.json` 读取客户端凭据
use serde::Deserialize;
use std::path::Path;

use crate::docs::google::AuthError;

/// Google 授权页面
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google Token 端点
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// OAuth2 客户端配置
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthConfig {
    /// Google OAuth2 客户端 ID
    pub client_id: String,

    /// Google OAuth2 客户端密钥
    pub client_secret: String,

    /// 授权页面地址
    pub auth_uri: String,

    /// Token 交换地址
    pub token_uri: String,
}

/// credentials.json 的顶层结构（桌面应用为 `installed`，Web 应用为 `web`）
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecretEntry>,
    web: Option<ClientSecretEntry>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretEntry {
    client_id: String,
    client_secret: String,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

impl OAuthConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_uri: GOOGLE_AUTH_URL.to_string(),
            token_uri: GOOGLE_TOKEN_URL.to_string(),
        }
    }

    /// 加载 OAuth2 配置
    ///
    /// 优先级（从高到低）：
    /// 1. 环境变量：`GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`
    /// 2. 客户端配置文件 `client_secret_path`
    ///
    /// # Errors
    /// - 两者都不存在：`AuthError::MissingClientSecret`
    /// - 文件格式错误：`AuthError::InvalidClientSecret`
    pub fn load(client_secret_path: &Path) -> Result<Self, AuthError> {
        if let (Ok(client_id), Ok(client_secret)) = (
            std::env::var("GOOGLE_CLIENT_ID"),
            std::env::var("GOOGLE_CLIENT_SECRET"),
        ) {
            tracing::info!("✅ 从环境变量加载 OAuth2 配置");
            return Ok(Self::new(client_id, client_secret));
        }

        Self::load_from_file(client_secret_path)
    }

    /// 从客户端配置文件加载
    pub fn load_from_file(path: &Path) -> Result<Self, AuthError> {
        if !path.exists() {
            return Err(AuthError::MissingClientSecret(format!(
                "文件不存在: {}（请从 Google Cloud Console 下载桌面应用的 OAuth 客户端 JSON）",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;

        tracing::info!("✅ 从配置文件加载 OAuth2 配置: {}", path.display());
        Ok(config)
    }

    /// 解析 credentials.json 内容
    pub fn from_json(content: &str) -> Result<Self, AuthError> {
        let file: ClientSecretFile = serde_json::from_str(content)
            .map_err(|e| AuthError::InvalidClientSecret(e.to_string()))?;

        let entry = file
            .installed
            .or(file.web)
            .ok_or_else(|| AuthError::InvalidClientSecret("缺少 installed 或 web 段".to_string()))?;

        if entry.client_id.is_empty() || entry.client_secret.is_empty() {
            return Err(AuthError::InvalidClientSecret(
                "client_id 或 client_secret 为空".to_string(),
            ));
        }

        Ok(Self {
            client_id: entry.client_id,
            client_secret: entry.client_secret,
            auth_uri: entry.auth_uri.unwrap_or_else(|| GOOGLE_AUTH_URL.to_string()),
            token_uri: entry.token_uri.unwrap_or_else(|| GOOGLE_TOKEN_URL.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_installed_client() {
        let json = r#"{
            "installed": {
                "client_id": "123.apps.googleusercontent.com",
                "project_id": "docs-helper",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "client_secret": "GOCSPX-secret",
                "redirect_uris": ["http://localhost"]
            }
        }"#;

        let config = OAuthConfig::from_json(json).unwrap();
        assert_eq!(config.client_id, "123.apps.googleusercontent.com");
        assert_eq!(config.client_secret, "GOCSPX-secret");
        assert_eq!(config.token_uri, GOOGLE_TOKEN_URL);
    }

    #[test]
    fn test_parse_web_client_with_default_uris() {
        let json = r#"{"web": {"client_id": "id", "client_secret": "secret"}}"#;

        let config = OAuthConfig::from_json(json).unwrap();
        assert_eq!(config, OAuthConfig::new("id", "secret"));
    }

    #[test]
    fn test_parse_invalid_client() {
        assert!(matches!(
            OAuthConfig::from_json(r#"{"other": {}}"#),
            Err(AuthError::InvalidClientSecret(_))
        ));
        assert!(matches!(
            OAuthConfig::from_json("not json"),
            Err(AuthError::InvalidClientSecret(_))
        ));
        assert!(matches!(
            OAuthConfig::from_json(r#"{"installed": {"client_id": "", "client_secret": "x"}}"#),
            Err(AuthError::InvalidClientSecret(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = OAuthConfig::load_from_file(&dir.path().join("credentials.json"));
        assert!(matches!(result, Err(AuthError::MissingClientSecret(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(
            &path,
            r#"{"installed": {"client_id": "file-id", "client_secret": "file-secret"}}"#,
        )
        .unwrap();

        let config = OAuthConfig::load_from_file(&path).unwrap();
        assert_eq!(config.client_id, "file-id");
    }
}
