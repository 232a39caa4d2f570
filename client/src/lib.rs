pub mod client;
pub mod connection;
mod frame_tx_storage;
pub mod render;
pub mod service;
mod service_state;

pub use client::{spawn_client, ClientHandle, ClientInput};
pub use connection::{connect, ConnectError, Connection, ServiceChannel, SessionHandle};
pub use render::{LogAffordance, LogRenderer};
pub use service::{spawn_service, ServiceCommand, ServiceConfig, ServiceTx};
