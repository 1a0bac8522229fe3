//! CARE健康ID服务主程序

use anyhow::{Context, Result};
use care_abdm::{GatewayConfig, HealthIdGateway, HealthIdService};
use care_admin::ConfigManager;
use care_database::{DatabasePool, Migrator, PgStore, PoolOptions};
use care_web::{AppState, WebServer};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// 服务器命令行参数
#[derive(Parser, Debug)]
#[command(name = "care-server")]
#[command(about = "CARE ABDM 健康ID服务")]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 监听主机，覆盖配置文件
    #[arg(long)]
    host: Option<String>,

    /// 监听端口，覆盖配置文件
    #[arg(short, long)]
    port: Option<u16>,

    /// 日志级别，覆盖配置文件
    #[arg(short, long)]
    log_level: Option<String>,

    /// 跳过数据库迁移
    #[arg(long)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ConfigManager::load(args.config.as_deref())?.into_config();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.level))
        .init();

    info!("启动CARE健康ID服务...");
    info!("  监听地址: {}:{}", config.server.host, config.server.port);
    info!("  ABDM网关: {}", config.abdm.gateway_url);
    info!("  健康ID服务: {}", config.abdm.health_service_url);

    let pool = DatabasePool::connect(&PoolOptions {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        connect_timeout: config.database.connect_timeout(),
    })
    .await
    .context("Failed to connect to database")?;

    if config.database.run_migrations && !args.skip_migrations {
        let applied = Migrator::default()
            .run(&pool)
            .await
            .context("Failed to run migrations")?;
        info!("Applied {} migrations", applied.len());
    }

    let gateway = HealthIdGateway::new(GatewayConfig {
        gateway_url: config.abdm.gateway_url.clone(),
        health_service_url: config.abdm.health_service_url.clone(),
        client_id: config.abdm.client_id.clone(),
        client_secret: config.abdm.client_secret.clone(),
        timeout: config.abdm.request_timeout(),
    })?;

    let service = HealthIdService::new(Arc::new(gateway), Arc::new(PgStore::new(pool)));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid listen address")?;

    let server = WebServer::new(addr, AppState { health_id: service });
    if let Err(e) = server.run().await {
        error!("服务器启动失败: {}", e);
        return Err(e.into());
    }

    Ok(())
}
