/// Google Docs 模块 - OAuth2 凭据管理与 Docs API 调用
pub mod api;
pub mod error;
pub mod oauth;
pub mod token;
pub mod types;
pub mod writer;

// 重新导出常用类型和函数
pub use api::{DocsApi, DocsApiClient};
pub use error::{AuthError, RemoteCallError, WriteError};
pub use oauth::GoogleOAuth;
pub use token::{AuthBackend, CredentialManager};
pub use types::{Credential, DocumentRef, Request, document_url};
pub use writer::{DocumentCreator, create_doc_with_text};
