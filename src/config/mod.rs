use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod oauth_config;
pub mod storage;

pub use oauth_config::OAuthConfig;
pub use storage::TokenStore;

/// Google Docs 读写权限
pub const DOCUMENTS_SCOPE: &str = "https://www.googleapis.com/auth/documents";

/// Docs API 默认地址
pub const DEFAULT_DOCS_BASE_URL: &str = "https://docs.googleapis.com";

/// 等待授权回调的默认超时（秒）
pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 120;

/// 应用配置
///
/// 来源（后者覆盖前者）：默认值 → `config.toml` → 环境变量 → 命令行参数
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth: AuthConfig,
    pub docs: DocsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Token 缓存文件，默认 `~/.credentials/google-docs-token.json`
    pub token_path: Option<PathBuf>,

    /// OAuth 客户端配置，默认为程序同目录下的 `credentials.json`
    pub client_secret_path: Option<PathBuf>,

    /// 请求的 API 权限范围
    pub scopes: Vec<String>,

    /// 等待授权回调的超时（秒）
    pub callback_timeout_secs: u64,

    /// 授权时是否自动打开浏览器
    pub open_browser: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_path: None,
            client_secret_path: None,
            scopes: vec![DOCUMENTS_SCOPE.to_string()],
            callback_timeout_secs: DEFAULT_CALLBACK_TIMEOUT_SECS,
            open_browser: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    pub base_url: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_DOCS_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// 实际使用的 Token 文件路径
    pub fn token_path(&self) -> Result<PathBuf> {
        match &self.auth.token_path {
            Some(path) => Ok(path.clone()),
            None => default_token_path(),
        }
    }

    /// 实际使用的客户端配置路径
    pub fn client_secret_path(&self) -> Result<PathBuf> {
        match &self.auth.client_secret_path {
            Some(path) => Ok(path.clone()),
            None => default_client_secret_path(),
        }
    }

    /// 应用环境变量覆盖
    ///
    /// - `NANODOCS_TOKEN_PATH`
    /// - `NANODOCS_CLIENT_SECRET`
    /// - `NANODOCS_DOCS_BASE_URL`
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("NANODOCS_TOKEN_PATH") {
            self.auth.token_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("NANODOCS_CLIENT_SECRET") {
            self.auth.client_secret_path = Some(PathBuf::from(path));
        }
        if let Some(url) = lookup("NANODOCS_DOCS_BASE_URL") {
            self.docs.base_url = url;
        }
    }
}

/// 默认 Token 路径：`~/.credentials/google-docs-token.json`
pub fn default_token_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("无法获取用户主目录"))?;
    Ok(home.join(".credentials").join("google-docs-token.json"))
}

/// 默认客户端配置路径：与可执行文件同目录的 `credentials.json`
pub fn default_client_secret_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("无法获取可执行文件路径")?;
    let dir = exe
        .parent()
        .ok_or_else(|| anyhow::anyhow!("可执行文件没有父目录: {}", exe.display()))?;
    Ok(dir.join("credentials.json"))
}

/// 获取配置文件路径：`<config_dir>/nanodocs/config.toml`
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("无法获取配置目录"))?
        .join("nanodocs");

    Ok(config_dir.join("config.toml"))
}

/// 加载配置（默认路径），并应用环境变量覆盖
pub fn load() -> Result<Config> {
    let mut config = load_from(&config_path()?)?;
    config.apply_env();
    Ok(config)
}

/// 从指定文件加载配置，文件不存在时返回默认配置
pub fn load_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!("配置文件不存在，使用默认配置: {}", path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("解析配置文件失败: {}", path.display()))?;

    tracing::debug!("已加载配置文件: {}", path.display());
    Ok(config)
}
