//! nanodocs - 用 OAuth2 授权后在 Google Docs 中创建文档并写入文本
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! let config = nanodocs::config::load()?;
//! let manager = nanodocs::docs::google::writer::credential_manager(&config)?;
//! let url = nanodocs::docs::google::create_doc_with_text(
//!     &manager,
//!     &config.docs.base_url,
//!     "会议记录",
//!     "Hello",
//! )
//! .await?;
//! println!("{:?}", url);
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod docs;
pub mod utils;
