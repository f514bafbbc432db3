use std::sync::Arc;

use aegis_core::Redactor;
use aegis_http::{AdminCredentials, AppState, create_router};
use aegis_storage::{AuditLog, GovernanceStore, QueueDriver, RedisKvStore, ResultStore, StatsStore};
use anyhow::Result;
use tokio::sync::RwLock;

use crate::{env_var, redis_config};

pub(crate) async fn run(port: u16, host: String) -> Result<()> {
    let (redis_host, redis_port, redis_password) = redis_config();
    let store =
        Arc::new(RedisKvStore::connect(&redis_host, redis_port, redis_password.as_deref()).await?);

    let state = Arc::new(AppState {
        queue: Arc::new(QueueDriver::new(store.clone())),
        governance: Arc::new(GovernanceStore::new(store.clone())),
        results: Arc::new(ResultStore::new(store.clone())),
        audit: Arc::new(AuditLog::new(store.clone())),
        stats: Arc::new(StatsStore::new(store)),
        redactor: Arc::new(Redactor::default()),
        admin: AdminCredentials { username: env_var("ADMIN_USERNAME")?, password: env_var("ADMIN_PASSWORD")? },
        admin_token: RwLock::new(None),
    });

    let router = create_router(state);
    let addr = format!("{host}:{port}");
    tracing::info!("starting HTTP front-end on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
