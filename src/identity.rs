//! Node identity: the stable `(type, name, address)` triple assigned at
//! construction and immutable thereafter.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Coordinator,
    Participant,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Coordinator => write!(f, "Coordinator"),
            NodeKind::Participant => write!(f, "Participant"),
        }
    }
}

/// A listener endpoint. Kept distinct from `SocketAddr` because nodes
/// advertise a host string (usually `127.0.0.1`) rather than a resolved
/// socket, matching the bootstrap file format in `nodes.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAddress {
    pub host: String,
    pub port: u16,
}

impl NodeAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        NodeAddress {
            host: host.into(),
            port,
        }
    }

    pub fn to_socket_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl std::str::FromStr for NodeAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("{s:?} is not host:port"))?;
        let port: u16 = port
            .parse()
            .map_err(|_| format!("{port:?} is not a valid port"))?;
        Ok(NodeAddress::new(host, port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub kind: NodeKind,
    pub name: String,
    pub address: NodeAddress,
}

impl NodeIdentity {
    pub fn new(kind: NodeKind, name: impl Into<String>, address: NodeAddress) -> Self {
        NodeIdentity {
            kind,
            name: name.into(),
            address,
        }
    }

    /// Deterministic base name used for `node_data/<Type>-<Name>.{data,log}`.
    pub fn file_stem(&self) -> String {
        format!("{}-{}", self.kind, self.name)
    }
}
