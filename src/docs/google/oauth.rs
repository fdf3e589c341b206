/// Google OAuth2 授权流程
///
/// 实现授权码流程（带 PKCE）与 Refresh Token 交换
use async_trait::async_trait;
use oauth2::basic::{BasicClient, BasicErrorResponse, BasicErrorResponseType, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, RefreshToken, RequestTokenError, Scope, TokenResponse, TokenUrl,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tiny_http::{Header, Response, Server};
use tokio::sync::oneshot;
use url::Url;

use crate::config::DEFAULT_CALLBACK_TIMEOUT_SECS;
use crate::config::oauth_config::{GOOGLE_AUTH_URL, OAuthConfig};
use crate::docs::google::error::AuthError;
use crate::docs::google::token::AuthBackend;
use crate::docs::google::types::Credential;
use crate::utils::mask_secret;

/// OAuth2 成功页面 HTML
const SUCCESS_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>授权成功 - nanodocs</title>
    <style>
        body {
            font-family: -apple-system, "Segoe UI", Arial, sans-serif;
            text-align: center;
            padding-top: 80px;
            color: #444;
        }
        .mark { font-size: 64px; color: #4caf50; }
    </style>
</head>
<body>
    <div class="mark">✓</div>
    <h1>授权成功</h1>
    <p>现在可以关闭此页面并返回终端。</p>
</body>
</html>"#;

/// OAuth2 错误页面 HTML
const ERROR_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>授权失败 - nanodocs</title>
    <style>
        body {
            font-family: -apple-system, "Segoe UI", Arial, sans-serif;
            text-align: center;
            padding-top: 80px;
            color: #444;
        }
        .mark { font-size: 64px; color: #f44336; }
    </style>
</head>
<body>
    <div class="mark">✗</div>
    <h1>授权失败</h1>
    <p>Google 账户未授权，请返回终端查看详情。</p>
</body>
</html>"#;

/// 回调请求的解析结果
#[derive(Debug, PartialEq, Eq)]
enum CallbackOutcome {
    /// 收到授权码
    Code { code: String, state: String },
    /// 用户拒绝（或授权服务器返回错误）
    Denied(String),
    /// 与授权无关的请求（如 `/favicon.ico`）
    Ignored,
}

/// Google 授权后端
pub struct GoogleOAuth {
    /// credentials.json 路径（仅在需要时读取）
    client_secret_path: PathBuf,

    /// 等待回调的超时
    callback_timeout: Duration,

    /// 是否自动打开浏览器
    open_browser: bool,
}

impl GoogleOAuth {
    pub fn new(client_secret_path: impl Into<PathBuf>) -> Self {
        Self {
            client_secret_path: client_secret_path.into(),
            callback_timeout: Duration::from_secs(DEFAULT_CALLBACK_TIMEOUT_SECS),
            open_browser: true,
        }
    }

    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    pub fn with_open_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    /// 刷新时使用的客户端信息
    ///
    /// 优先使用凭据中记录的值，缺失时回退到 credentials.json
    fn refresh_client_info(
        &self,
        credential: &Credential,
    ) -> Result<(String, Option<String>, String), AuthError> {
        match (&credential.client_id, &credential.token_uri) {
            (Some(client_id), Some(token_uri)) => Ok((
                client_id.clone(),
                credential.client_secret.clone(),
                token_uri.clone(),
            )),
            _ => {
                tracing::debug!("凭据中缺少客户端信息，从 credentials.json 读取");
                let config = OAuthConfig::load(&self.client_secret_path)?;
                Ok((config.client_id, Some(config.client_secret), config.token_uri))
            }
        }
    }
}

#[async_trait]
impl AuthBackend for GoogleOAuth {
    /// 使用 Refresh Token 从 Google 获取新的 Access Token
    ///
    /// # Errors
    /// - 凭据中没有 Refresh Token
    /// - 网络请求失败 / Refresh Token 已被撤销
    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError> {
        tracing::debug!("开始刷新 Access Token");

        let refresh_token = credential
            .refresh_token
            .clone()
            .ok_or_else(|| AuthError::Refresh("凭据中没有 refresh_token".to_string()))?;

        let (client_id, client_secret, token_uri) = self.refresh_client_info(credential)?;

        let client = BasicClient::new(
            ClientId::new(client_id.clone()),
            client_secret.clone().map(ClientSecret::new),
            AuthUrl::new(GOOGLE_AUTH_URL.to_string())?,
            Some(TokenUrl::new(token_uri.clone())?),
        );

        let token_response = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token))
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| {
                if let RequestTokenError::ServerResponse(resp) = &e {
                    if matches!(resp.error(), BasicErrorResponseType::InvalidGrant) {
                        tracing::error!("❌ Token 刷新失败 [授权被拒绝/已过期]");
                        tracing::error!(
                            "   💡 可能原因:\n   \
                             - Refresh Token 已过期或被撤销\n   \
                             - 用户撤销了应用授权\n   \
                             - 删除 Token 文件后重新授权即可"
                        );
                    }
                }
                AuthError::Refresh(describe_token_error(&e))
            })?;

        let mut refreshed = credential.clone();
        refreshed.apply_refresh(
            token_response.access_token().secret().to_string(),
            token_response.refresh_token().map(|t| t.secret().to_string()),
            expires_in_secs(&token_response),
            granted_scopes(&token_response),
        );
        refreshed.client_id = Some(client_id);
        refreshed.client_secret = client_secret;
        refreshed.token_uri = Some(token_uri);

        tracing::debug!("新 Token: {}", mask_secret(&refreshed.access_token));

        Ok(refreshed)
    }

    /// 执行交互式授权
    ///
    /// 1. 读取 credentials.json
    /// 2. 在随机端口启动本地回调服务器
    /// 3. 生成授权 URL（PKCE + state）并打开浏览器
    /// 4. 等待回调（带超时）
    /// 5. 验证 CSRF state
    /// 6. 交换 Token
    async fn authorize(&self, scopes: &[String]) -> Result<Credential, AuthError> {
        tracing::info!("🔐 开始 Google OAuth2 授权流程");

        // 步骤 1：加载配置
        let config = OAuthConfig::load(&self.client_secret_path)?;

        // 步骤 2：启动本地服务器（端口 0 由系统分配）
        let server = Server::http("127.0.0.1:0")
            .map_err(|e| AuthError::Callback(format!("无法启动本地服务器: {}", e)))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| AuthError::Callback("无法获取本地服务器端口".to_string()))?;
        let redirect_uri = format!("http://127.0.0.1:{}/", port);
        tracing::info!("✅ 本地服务器启动成功: {}", redirect_uri);

        // 步骤 3：生成授权 URL
        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(config.auth_uri.clone())?,
            Some(TokenUrl::new(config.token_uri.clone())?),
        )
        .set_redirect_uri(RedirectUrl::new(redirect_uri)?);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_state) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(scopes.iter().map(|s| Scope::new(s.clone())))
            .add_extra_param("access_type", "offline")
            .set_pkce_challenge(pkce_challenge)
            .url();
        tracing::debug!("授权 URL: {}", auth_url);

        let (result_tx, result_rx) = oneshot::channel();
        let timeout = self.callback_timeout;
        let expected_state = csrf_state.secret().clone();
        std::thread::spawn(move || {
            result_tx
                .send(wait_for_callback(&server, timeout, &expected_state))
                .ok();
        });

        eprintln!("请在浏览器中打开以下地址完成授权：\n{}", auth_url);
        if self.open_browser {
            match webbrowser::open(auth_url.as_str()) {
                Ok(_) => tracing::info!("✅ 浏览器已打开，等待用户授权..."),
                Err(e) => tracing::warn!("⚠️ 无法打开浏览器，请手动复制上面的 URL: {}", e),
            }
        }

        // 步骤 4-5：等待回调并验证 CSRF state
        let code = result_rx
            .await
            .map_err(|_| AuthError::Callback("回调线程意外退出".to_string()))??;
        tracing::info!("✅ 收到授权回调，CSRF 验证通过");

        // 步骤 6：交换 Token
        let credential =
            exchange_authorization_code(&client, &config, code, pkce_verifier, scopes).await?;

        tracing::info!("🎉 OAuth2 授权流程完成");
        Ok(credential)
    }
}

/// 用授权码换取 Token 并组装凭据
///
/// 客户端信息一并写入凭据，之后刷新时不再需要 credentials.json
async fn exchange_authorization_code(
    client: &BasicClient,
    config: &OAuthConfig,
    code: String,
    pkce_verifier: PkceCodeVerifier,
    scopes: &[String],
) -> Result<Credential, AuthError> {
    let token_response = client
        .exchange_code(AuthorizationCode::new(code))
        .set_pkce_verifier(pkce_verifier)
        .request_async(oauth2::reqwest::async_http_client)
        .await
        .map_err(|e| {
            tracing::error!("Token 交换详细错误: {:?}", e);
            AuthError::CodeExchange(describe_token_error(&e))
        })?;

    let mut credential = Credential::new(
        token_response.access_token().secret().to_string(),
        token_response.refresh_token().map(|t| t.secret().to_string()),
        expires_in_secs(&token_response),
    );
    credential.scopes = granted_scopes(&token_response).unwrap_or_else(|| scopes.to_vec());
    credential.token_uri = Some(config.token_uri.clone());
    credential.client_id = Some(config.client_id.clone());
    credential.client_secret = Some(config.client_secret.clone());

    if credential.refresh_token.is_none() {
        tracing::warn!("⚠️ 未收到 refresh_token，Token 过期后需要重新授权");
    }

    Ok(credential)
}

/// 在本地服务器上等待授权回调
///
/// 返回授权码；收到 `error` 参数时返回 `ConsentDenied`，state 不符时返回 `CsrfMismatch`
fn wait_for_callback(
    server: &Server,
    timeout: Duration,
    expected_state: &str,
) -> Result<String, AuthError> {
    let deadline = Instant::now() + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(AuthError::CallbackTimeout(timeout.as_secs()));
        }

        let request = match server.recv_timeout(remaining) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => return Err(AuthError::Callback(e.to_string())),
        };
        tracing::debug!("收到请求: {}", request.url());

        match parse_callback(request.url()) {
            CallbackOutcome::Code { state, .. } if state != expected_state => {
                tracing::error!("回调 state 与请求不一致，拒绝授权码");
                if let Err(e) = request.respond(html_response(ERROR_HTML)) {
                    tracing::warn!("返回错误页面失败: {}", e);
                }
                return Err(AuthError::CsrfMismatch);
            }
            CallbackOutcome::Code { code, .. } => {
                if let Err(e) = request.respond(html_response(SUCCESS_HTML)) {
                    tracing::warn!("返回成功页面失败: {}", e);
                }
                return Ok(code);
            }
            CallbackOutcome::Denied(error) => {
                tracing::error!("用户拒绝授权: {}", error);
                if let Err(e) = request.respond(html_response(ERROR_HTML)) {
                    tracing::warn!("返回错误页面失败: {}", e);
                }
                return Err(AuthError::ConsentDenied(error));
            }
            CallbackOutcome::Ignored => {
                request
                    .respond(Response::from_string("Not Found").with_status_code(404))
                    .ok();
            }
        }
    }
}

/// 解析回调请求的 path + query
fn parse_callback(path_and_query: &str) -> CallbackOutcome {
    let Ok(url) = Url::parse(&format!("http://127.0.0.1{}", path_and_query)) else {
        return CallbackOutcome::Ignored;
    };

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    match (code, error) {
        (_, Some(error)) => CallbackOutcome::Denied(error),
        (Some(code), None) => CallbackOutcome::Code {
            code,
            state: state.unwrap_or_default(),
        },
        (None, None) => CallbackOutcome::Ignored,
    }
}

fn html_response(body: &str) -> Response<std::io::Cursor<Vec<u8>>> {
    let response = Response::from_string(body);
    match Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..]) {
        Ok(header) => response.with_header(header),
        Err(_) => response,
    }
}

fn expires_in_secs(token: &BasicTokenResponse) -> Option<i64> {
    token.expires_in().map(|d| d.as_secs() as i64)
}

fn granted_scopes(token: &BasicTokenResponse) -> Option<Vec<String>> {
    token
        .scopes()
        .map(|scopes| scopes.iter().map(|s| s.as_str().to_owned()).collect())
}

/// Token 端点错误的可读描述
fn describe_token_error<RE>(err: &RequestTokenError<RE, BasicErrorResponse>) -> String
where
    RE: std::error::Error + 'static,
{
    match err {
        RequestTokenError::ServerResponse(resp) => resp.to_string(),
        RequestTokenError::Request(e) => format!("请求失败: {}", e),
        RequestTokenError::Parse(e, _) => format!("响应解析失败: {}", e),
        RequestTokenError::Other(msg) => msg.clone(),
    }
}
