// Module declarations
mod builder;
mod connection;
mod core;
mod driver;
mod state;

// Public API exports
pub use builder::{LiveClientBuilder, LiveClientOptions};
pub use connection::{ConnectionState, ConnectionStatus};
pub use self::core::LiveClient;
