//! Byte snapshot of network membership for the host's save layer.
//!
//! The core never writes files. The save layer calls
//! `NetworkManager::snapshot`, stores the bytes wherever it likes, and on
//! load hands the decoded snapshot to `NetworkManager::restore`, which
//! rebuilds membership and schedules a full recompute of every network.

use bitcode::{Decode, Encode};

use crate::error::NetworkError;
use crate::point::Point;

/// Members of one network, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct NetworkMembers {
    pub connection: String,
    pub points: Vec<Point>,
}

/// Membership of every network, sorted by connection name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct MembershipSnapshot {
    pub networks: Vec<NetworkMembers>,
}

impl MembershipSnapshot {
    pub fn to_bytes(&self) -> Vec<u8> {
        bitcode::encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NetworkError> {
        Ok(bitcode::decode(bytes)?)
    }

    pub fn point_count(&self) -> usize {
        self.networks.iter().map(|n| n.points.len()).sum()
    }
}
