pub mod alert;
pub mod config;
pub mod dispatch;
pub mod identifier;
pub mod relay;
pub mod server;

pub use alert::{ContentExtractor, ContentFormat};
pub use config::{Config, ConfigError};
pub use dispatch::{DispatchError, Dispatcher, PublishOutcome};
pub use identifier::RecipientResolver;
pub use relay::{RelayConnection, RelayError};
pub use server::AlertServer;
