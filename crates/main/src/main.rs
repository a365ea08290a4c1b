//! 主应用程序入口
//!
//! 加载配置、连接数据库并执行迁移，启动在线清理任务和 Axum Web API 服务。

use std::sync::Arc;

use anyhow::Context;
use application::{
    Clock, MessageRepository, MessageService, MessageServiceDependencies, ParticipantRepository,
    ParticipantService, ParticipantServiceDependencies, PresenceSweeper,
    PresenceSweeperDependencies, SystemClock, TransactionManager,
};
use config::AppConfig;
use infrastructure::{
    create_pg_pool, PgMessageRepository, PgParticipantRepository, PgTransactionManager, MIGRATOR,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load().context("加载配置失败")?;

    tracing::info!(database = %config.redacted_database_url(), "连接数据库");
    let pg_pool = create_pg_pool(&config.database.url, config.database.max_connections)
        .await
        .context("连接数据库失败")?;

    // 运行迁移
    MIGRATOR.run(&pg_pool).await.context("数据库迁移失败")?;

    let participant_repository: Arc<dyn ParticipantRepository> =
        Arc::new(PgParticipantRepository::new(pg_pool.clone()));
    let message_repository: Arc<dyn MessageRepository> =
        Arc::new(PgMessageRepository::new(pg_pool.clone()));
    let transaction_manager: Arc<dyn TransactionManager> =
        Arc::new(PgTransactionManager::new(pg_pool.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 创建应用层服务
    let participant_service = ParticipantService::new(ParticipantServiceDependencies {
        participant_repository: participant_repository.clone(),
        transaction_manager: transaction_manager.clone(),
        clock: clock.clone(),
    });
    let message_service = MessageService::new(MessageServiceDependencies {
        participant_repository: participant_repository.clone(),
        message_repository,
        clock: clock.clone(),
    });

    // 后台在线清理任务
    let shutdown = CancellationToken::new();
    let sweeper = Arc::new(PresenceSweeper::new(PresenceSweeperDependencies {
        participant_repository,
        transaction_manager,
        clock,
    }));
    let sweeper_handle = sweeper.spawn(shutdown.clone());

    let state = AppState::new(Arc::new(participant_service), Arc::new(message_service));
    let app = router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("无法监听 {address}"))?;

    tracing::info!("聊天室服务器启动在 http://{}", address);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 服务停止后再停止清理任务
    shutdown.cancel();
    if let Err(err) = sweeper_handle.await {
        tracing::error!(error = %err, "在线清理任务异常退出");
    }
    pg_pool.close().await;

    tracing::info!("聊天室服务器已停止");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "无法监听 Ctrl+C 信号");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig_term) => {
                sig_term.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "无法监听终止信号");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("接收到 Ctrl+C 信号，开始优雅停机...");
        }
        _ = terminate => {
            tracing::info!("接收到终止信号，开始优雅停机...");
        }
    }
}
