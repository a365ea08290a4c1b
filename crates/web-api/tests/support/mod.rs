use std::{net::SocketAddr, sync::Arc, time::Duration};

use application::{
    MemoryStore, MessageService, MessageServiceDependencies, ParticipantService,
    ParticipantServiceDependencies, SystemClock,
};
use axum::Router;
use tokio::{net::TcpListener, sync::oneshot, time::sleep};
use web_api::{router as build_router_fn, AppState};

// 测试使用内存存储，不需要数据库
pub fn build_router() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(SystemClock);

    let participant_service = ParticipantService::new(ParticipantServiceDependencies {
        participant_repository: store.clone(),
        transaction_manager: store.clone(),
        clock: clock.clone(),
    });
    let message_service = MessageService::new(MessageServiceDependencies {
        participant_repository: store.clone(),
        message_repository: store.clone(),
        clock,
    });

    let state = AppState::new(Arc::new(participant_service), Arc::new(message_service));
    (build_router_fn(state), store)
}

pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let (router, store) = build_router();
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr: SocketAddr = listener.local_addr().expect("addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // 等待服务器启动
        sleep(Duration::from_millis(100)).await;

        Self {
            base_url: format!("http://{}", addr),
            store,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
