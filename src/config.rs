//! Bootstrap file handling: `nodes.txt` lists every node's role-prefixed
//! endpoint so a client can discover the cohort without a directory
//! service.
//!
//! Grounded on `utils/system.go`/`utils/network.go`'s bootstrap-file
//! responsibilities; out of scope for the protocol itself, kept thin.

use crate::error::TpcResult;
use crate::identity::{NodeAddress, NodeKind};
use std::path::Path;

pub struct NodeEntry {
    pub kind: NodeKind,
    pub name: String,
    pub address: NodeAddress,
}

pub fn write_nodes_file(path: &Path, entries: &[NodeEntry]) -> TpcResult<()> {
    let mut contents = String::new();
    for entry in entries {
        match entry.kind {
            NodeKind::Coordinator => {
                contents.push_str(&format!("Coordinator: {}\n", entry.address));
            }
            NodeKind::Participant => {
                contents.push_str(&format!("Participant {}: {}\n", entry.name, entry.address));
            }
        }
    }
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn read_nodes_file(path: &Path) -> TpcResult<Vec<NodeEntry>> {
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((label, address)) = line.split_once(": ") else {
            continue;
        };
        let address: NodeAddress = match address.parse() {
            Ok(a) => a,
            Err(_) => continue,
        };
        if label == "Coordinator" {
            entries.push(NodeEntry {
                kind: NodeKind::Coordinator,
                name: "Coordinator".to_string(),
                address,
            });
        } else if let Some(name) = label.strip_prefix("Participant ") {
            entries.push(NodeEntry {
                kind: NodeKind::Participant,
                name: name.to_string(),
                address,
            });
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_coordinator_and_participants() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nodes.txt");
        let written = vec![
            NodeEntry {
                kind: NodeKind::Coordinator,
                name: "Coordinator".to_string(),
                address: NodeAddress::new("127.0.0.1", 9000),
            },
            NodeEntry {
                kind: NodeKind::Participant,
                name: "A".to_string(),
                address: NodeAddress::new("127.0.0.1", 9001),
            },
        ];
        write_nodes_file(&path, &written).unwrap();
        let read = read_nodes_file(&path).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].kind, NodeKind::Coordinator);
        assert_eq!(read[1].name, "A");
        assert_eq!(read[1].address, NodeAddress::new("127.0.0.1", 9001));
    }
}
