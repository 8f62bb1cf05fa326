// SPDX-License-Identifier: Apache-2.0

//! The version-acknowledgement message sent by downstream connectors.

use crate::node::NodeId;
use crate::Version;

/// Sent by a downstream connector to mean: "I have durably handled
/// everything up to and including `version`."
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionAck {
    /// The downstream connector that sent this acknowledgement.
    pub sent_from: NodeId,
    /// The version being acknowledged.
    pub version: Version,
}

impl VersionAck {
    /// Builds a new version acknowledgement.
    #[must_use]
    pub fn new(sent_from: NodeId, version: Version) -> Self {
        Self { sent_from, version }
    }
}
