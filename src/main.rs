use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use nanodocs::config::{self, Config};
use nanodocs::docs::google::{document_url, writer};

/// 创建 Google 文档并写入文本，成功时输出文档地址
#[derive(Debug, Parser)]
#[command(name = "nanodocs", version)]
struct Cli {
    /// 文档标题
    title: String,

    /// 正文；省略时从标准输入读取
    text: Option<String>,

    /// Token 缓存文件
    #[arg(long, value_name = "PATH")]
    token_path: Option<PathBuf>,

    /// OAuth 客户端配置（credentials.json）
    #[arg(long, value_name = "PATH")]
    client_secret: Option<PathBuf>,

    /// 配置文件（默认 <config_dir>/nanodocs/config.toml）
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// 授权时不自动打开浏览器
    #[arg(long)]
    no_browser: bool,

    /// 等待授权回调的超时（秒）
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

fn main() -> Result<ExitCode> {
    // 1. 初始化日志
    init_logger()?;

    // 2. 解析参数与配置
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    let text = match &cli.text {
        Some(text) => text.clone(),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("读取标准输入失败")?;
            buf
        }
    };

    // 3. 创建 Tokio 运行时（用于 async OAuth2 / HTTP）
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(&config, &cli.title, &text))
}

async fn run(config: &Config, title: &str, text: &str) -> Result<ExitCode> {
    let creator = writer::connect(config).await.context("Google 授权失败")?;

    match creator.create_document(title, text).await {
        Ok(document) => {
            println!("{}", document.url());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!("❌ 写入文档失败: {}", e);
            match e.orphaned_document_id() {
                Some(document_id) => println!(
                    "An error occurred: {} (empty document left at {})",
                    e,
                    document_url(document_id)
                ),
                None => println!("An error occurred: {}", e),
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

/// 合并配置：配置文件 → 环境变量 → 命令行
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            anyhow::ensure!(path.exists(), "配置文件不存在: {}", path.display());
            let mut config = config::load_from(path)?;
            config.apply_env();
            config
        }
        None => config::load()?,
    };

    if let Some(path) = &cli.token_path {
        config.auth.token_path = Some(path.clone());
    }
    if let Some(path) = &cli.client_secret {
        config.auth.client_secret_path = Some(path.clone());
    }
    if cli.no_browser {
        config.auth.open_browser = false;
    }
    if let Some(secs) = cli.timeout {
        config.auth.callback_timeout_secs = secs;
    }

    tracing::debug!("生效配置: {:?}", config);
    Ok(config)
}

/// 初始化日志系统（输出到 stderr，stdout 只留给结果）
fn init_logger() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nanodocs=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}
