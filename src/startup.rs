//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::domain::{MessageStore, UserStore};
use crate::infrastructure::database;
use crate::infrastructure::repositories::{PgMessageRepository, PgUserRepository};
use crate::presentation::http::routes;
use crate::presentation::middleware::cors;
use crate::presentation::websocket::{ConnectionRegistry, Relay};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub messages: Arc<dyn MessageStore>,
    pub relay: Arc<Relay>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Assemble the state from store implementations and settings.
    ///
    /// Kept store-agnostic so tests can run the full router against
    /// in-memory stores.
    pub fn new(
        users: Arc<dyn UserStore>,
        messages: Arc<dyn MessageStore>,
        settings: Settings,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let relay = Arc::new(Relay::new(
            registry,
            users.clone(),
            messages.clone(),
            settings.relay.store_timeout(),
        ));

        Self {
            users,
            messages,
            relay,
            settings: Arc::new(settings),
        }
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        // Create database pool
        let db = database::create_pool(&settings.database).await?;
        tracing::info!("Database connection pool created");

        database::run_migrations(&db).await?;
        tracing::info!("Database migrations applied");

        let users: Arc<dyn UserStore> = Arc::new(PgUserRepository::new(db.clone()));
        let messages: Arc<dyn MessageStore> = Arc::new(PgMessageRepository::new(db));

        // Create app state
        let state = AppState::new(users, messages, settings.clone());

        // Build router with middleware
        let router = routes::create_router(state)
            .layer(TraceLayer::new_for_http())
            .layer(cors::create_cors_layer(&settings.cors));

        // Bind to address
        let listener = TcpListener::bind(settings.server_addr()).await?;
        tracing::info!("Listening on {}", settings.server_addr());

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
