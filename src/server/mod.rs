mod auth;
mod handlers;

use anyhow::{Context, Result};
use axum::{middleware, routing::post, Router};
use crate::alert::ContentFormat;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use tracing::info;

pub use auth::{AppState, AuthCredentials};

pub struct AlertServer {
    state: AppState,
    addr: String,
}

impl AlertServer {
    pub fn new(dispatcher: Dispatcher, format: ContentFormat, addr: String) -> Self {
        Self {
            state: AppState {
                dispatcher,
                extractor: format.extractor(),
                auth: None,
            },
            addr,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let server = Self::new(
            Dispatcher::from_config(config),
            config.content_format,
            config.bind_address(),
        );
        match &config.auth {
            Some(auth) => server.with_auth(auth.username.clone(), auth.password.clone()),
            None => server,
        }
    }

    /// Require HTTP Basic auth on the webhook
    pub fn with_auth(mut self, username: String, password: String) -> Self {
        self.state.auth = Some(AuthCredentials { username, password });
        self
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", post(handlers::receive_alert))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                auth::auth_middleware,
            ))
            .with_state(self.state.clone())
    }

    pub async fn run(self) -> Result<()> {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.addr))?;
        info!("started {}", self.addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}
