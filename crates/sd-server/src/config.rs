use sd_editor::LogUndoPolicy;
use std::net::{Ipv4Addr, SocketAddr};

pub const DEFAULT_PORT: u16 = 54181;

/// Server settings. `Default` matches the binary's defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    /// Redo-branch policy of the authoritative log.
    pub policy: LogUndoPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            policy: LogUndoPolicy::Gnu,
        }
    }
}
