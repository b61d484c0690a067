// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process entry point: loads configuration, replays the write-ahead log,
//! and runs the REST façade and the backend gRPC surface concurrently until
//! one of them exits.

use dispatchd_adapters::GrpcAgentAdapter;
use dispatchd_core::{AgentStatus, Config, SystemClock};
use dispatchd_daemon::grpc::BackendServiceImpl;
use dispatchd_daemon::{app::AppState, auth::ApiKeyTable, rest, stream::StreamManager};
use dispatchd_engine::Runtime;
use dispatchd_storage::{FileWal, Store};
use dispatchd_wire::proto::backend_service_server::BackendServiceServer;
use std::path::PathBuf;
use std::sync::Arc;
use tonic::transport::Server;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter.clone()));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let events = FileWal::replay(&config.wal_path)?;
    let wal = FileWal::open(&config.wal_path)?;
    let store = Arc::new(Store::from_events(SystemClock, wal, &events));

    let adapter = Arc::new(GrpcAgentAdapter::new());
    let stream_manager = Arc::new(StreamManager::new());
    let api_keys = ApiKeyTable::new(&config.api_keys);

    let runtime = Arc::new(Runtime::new(
        store.clone(),
        adapter.clone(),
        stream_manager.clone(),
        config.dispatch_interval(),
        config.health_check_interval(),
        config.health_check_ack_timeout(),
        config.orphan_threshold(),
        config.execute_heartbeat_timeout(),
    ));

    for agent in store.all_agents() {
        if agent.status == AgentStatus::Active {
            adapter.set_endpoint(agent.id, agent.host.clone(), agent.port);
            runtime.start_agent(agent.id);
        }
    }

    let rest_state = AppState { runtime: runtime.clone(), auth: api_keys.clone() };
    let rest_listen: std::net::SocketAddr = config.rest_listen.parse()?;
    let rest_listener = tokio::net::TcpListener::bind(rest_listen).await?;
    let rest_server = axum::serve(rest_listener, rest::router(rest_state));

    let grpc_listen: std::net::SocketAddr = config.grpc_listen.parse()?;
    let backend_service = BackendServiceImpl::new(runtime.clone(), adapter.clone(), stream_manager.clone(), api_keys);
    let grpc_server = Server::builder().add_service(BackendServiceServer::new(backend_service)).serve(grpc_listen);

    tracing::info!(rest = %config.rest_listen, grpc = %config.grpc_listen, "dispatchd starting");

    tokio::select! {
        result = rest_server => result.map_err(Into::into),
        result = grpc_server => result.map_err(Into::into),
    }
}
