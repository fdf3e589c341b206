/// 凭据生命周期管理模块
///
/// 读取缓存 → 过期则刷新 → 否则走交互式授权 → 写回缓存
use async_trait::async_trait;

use crate::config::storage::TokenStore;
use crate::docs::google::error::AuthError;
use crate::docs::google::types::Credential;
use crate::utils::mask_secret;

/// 授权后端
///
/// Google 的实现见 [`crate::docs::google::oauth::GoogleOAuth`]
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// 使用 Refresh Token 换取新的 Access Token
    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError>;

    /// 交互式授权（浏览器 + 本地回调）
    async fn authorize(&self, scopes: &[String]) -> Result<Credential, AuthError>;
}

/// 凭据管理器
///
/// 负责获取一个可用的凭据，并在刷新或重新授权后持久化
pub struct CredentialManager<B> {
    /// Token 缓存
    store: TokenStore,

    /// 授权后端
    backend: B,

    /// 需要的权限范围
    scopes: Vec<String>,
}

impl<B: AuthBackend> CredentialManager<B> {
    pub fn new(store: TokenStore, backend: B, scopes: Vec<String>) -> Self {
        Self {
            store,
            backend,
            scopes,
        }
    }

    /// 获取可用凭据
    ///
    /// 1. 缓存有效：直接返回（不刷新、不写盘）
    /// 2. 已过期且有 Refresh Token：刷新一次
    /// 3. 其他情况：交互式授权一次
    ///
    /// 2、3 的结果会写回 Token 文件
    ///
    /// # Errors
    /// - 缺少客户端配置、用户拒绝授权、刷新/交换失败、写文件失败
    pub async fn obtain_credential(&self) -> Result<Credential, AuthError> {
        let cached = self.store.load()?;

        let credential = match cached {
            Some(credential) if credential.is_valid(&self.scopes) => {
                tracing::debug!("使用缓存的 Token: {:?}", credential);
                return Ok(credential);
            }
            Some(credential) if credential.can_refresh(&self.scopes) => {
                tracing::info!("Access Token 已过期（{:?}），自动刷新", credential.expires_at);
                let refreshed = self.backend.refresh(&credential).await?;
                tracing::info!(
                    "✅ Access Token 刷新成功（新的过期时间: {:?}）",
                    refreshed.expires_at
                );
                refreshed
            }
            cached => {
                match &cached {
                    Some(_) => tracing::info!("缓存的 Token 无法使用（权限不足或无 Refresh Token），重新授权"),
                    None => tracing::info!("没有缓存的 Token，开始授权"),
                }
                self.backend.authorize(&self.scopes).await?
            }
        };

        self.store.save(&credential)?;
        tracing::debug!(
            "Token 已写入 {}: {}",
            self.store.path().display(),
            mask_secret(&credential.access_token)
        );

        Ok(credential)
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }
}
