//! Shared Draw server: the authoritative session, its TCP loop, and the
//! matching client adapter.

pub mod client;
pub mod config;
pub mod error;
pub mod net;
pub mod session;

pub use client::{ChannelTransport, connect};
pub use config::ServerConfig;
pub use error::ServerError;
pub use net::{run, serve};
pub use session::{Outgoing, ServerSession};
