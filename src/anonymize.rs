use std::net::IpAddr;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// An opaque, one-way token standing in for a client address.
///
/// The same address always maps to the same token so repeated likes from one client collapse together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ClientToken(String);

impl ClientToken {
    pub fn from_address(address: &str) -> Self {
        let digest = Sha256::digest(address.as_bytes());
        ClientToken(hex::encode(digest))
    }
}

impl From<IpAddr> for ClientToken {
    fn from(address: IpAddr) -> Self {
        Self::from_address(&address.to_canonical().to_string())
    }
}

impl std::fmt::Display for ClientToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ClientToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
