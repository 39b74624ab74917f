//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;

use tracing::info;

use orderhub_cache::CacheManager;
use orderhub_core::config::RealtimeConfig;
use orderhub_worker::JobQueue;

use crate::bridge::OrderEventBridge;
use crate::connection::manager::ConnectionManager;
use crate::ticket::TicketService;

/// Central real-time engine, constructed once per process and shared by handle.
#[derive(Debug, Clone)]
pub struct RealtimeEngine {
    /// Connection manager.
    pub connections: Arc<ConnectionManager>,
    /// Ticket issuance and redemption.
    pub tickets: TicketService,
    /// Order event fan-out.
    pub events: Arc<OrderEventBridge>,
}

impl RealtimeEngine {
    /// Creates a new real-time engine with all subsystems.
    pub fn new(config: RealtimeConfig, cache: CacheManager, queue: Option<Arc<JobQueue>>) -> Self {
        let tickets = TicketService::from_config(cache, &config);
        let connections = Arc::new(ConnectionManager::new(config));
        let events = Arc::new(OrderEventBridge::new(Arc::clone(&connections), queue));

        info!("Real-time engine initialized");
        Self {
            connections,
            tickets,
            events,
        }
    }

    /// Closes every connection.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");
        self.connections.close_all();
    }
}
