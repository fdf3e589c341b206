/// Token 文件存储模块
///
/// 负责将 OAuth2 凭据持久化为 JSON 文件。路径在构造时注入，
/// 读后覆盖写，不加锁（多进程并发刷新时以最后写入者为准）
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::docs::google::{AuthError, Credential};

/// 基于文件的凭据存储
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取已缓存的凭据
    ///
    /// # Returns
    /// 文件不存在或内容无法解析时返回 `None`（视为没有缓存）
    ///
    /// # Errors
    /// - 文件存在但无法读取（权限等）
    pub fn load(&self) -> Result<Option<Credential>, AuthError> {
        if !self.path.exists() {
            tracing::debug!("Token 文件不存在: {}", self.path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)?;

        match serde_json::from_str::<Credential>(&content) {
            Ok(credential) => {
                tracing::debug!("已加载缓存的 Token: {}", self.path.display());
                Ok(Some(credential))
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ Token 文件无法解析（可能已损坏），将重新获取: {}: {}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    /// 保存凭据（覆盖写入）
    ///
    /// 父目录不存在时自动创建；Unix 下文件权限为 0600
    pub fn save(&self, credential: &Credential) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(credential)?;

        let mut file = open_private(&self.path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;

        tracing::debug!("Token 已保存到: {}", self.path.display());
        Ok(())
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<std::fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // 已存在的文件不受 mode() 影响
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<std::fs::File> {
    std::fs::File::create(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_credential() -> Credential {
        let mut cred = Credential::new(
            "ya29.test_access_token".to_string(),
            Some("1//test_refresh_token".to_string()),
            Some(3600),
        );
        cred.scopes = vec!["https://www.googleapis.com/auth/documents".to_string()];
        cred
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".credentials").join("google-docs-token.json");
        let store = TokenStore::new(&path);

        let cred = test_credential();
        store.save(&cred).unwrap();

        assert!(path.exists());
        assert_eq!(store.load().unwrap(), Some(cred));
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));

        let mut cred = test_credential();
        store.save(&cred).unwrap();

        cred.access_token = "ya29.second_token".to_string();
        store.save(&cred).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access_token, "ya29.second_token");
    }

    #[test]
    fn test_corrupted_file_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = TokenStore::new(&path);
        assert!(store.load().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        TokenStore::new(&path).save(&test_credential()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
