// TransactionHeader/Transaction/BatchHeader/Batch form the wire-level
// envelope the scheduling core consumes. The core treats every field as
// opaque except header_signature, inputs, outputs, and dependencies (see
// the data model section of the spec); the remaining fields exist so the
// envelope round-trips through rmp-serde the way a real validator's
// transaction/batch would.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

use sched_base::Result;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionHeader {
    pub signer_pubkey: Vec<u8>,
    pub batcher_pubkey: Vec<u8>,
    pub family_name: String,
    pub family_version: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub dependencies: Vec<String>,
    pub payload_encoding: String,
    pub payload_sha512: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub header: TransactionHeader,
    pub payload: Vec<u8>,
    pub header_signature: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BatchHeader {
    pub signer_pubkey: Vec<u8>,
    pub transaction_ids: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub header: BatchHeader,
    pub transactions: Vec<Transaction>,
    pub header_signature: String,
}

impl TransactionHeader {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec(self)?)
    }
}

impl BatchHeader {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec(self)?)
    }
}

impl Batch {
    /// A batch is non-empty and atomic for validity by construction of the
    /// scheduler; this just exposes the convenience the tests want.
    pub fn transaction_signatures(&self) -> Vec<&str> {
        self.transactions
            .iter()
            .map(|t| t.header_signature.as_str())
            .collect()
    }
}

/// The address convention used by this crate's own fixtures: `"000000" +
/// sha512(name)`. The core doesn't enforce or depend on this, only on the
/// result being hex.
pub fn fixture_address(name: &str) -> String {
    let digest = Sha512::digest(name.as_bytes());
    format!("000000{}", sched_base::encode(&digest))
}

pub fn sha512_hex(payload: &[u8]) -> String {
    let digest = Sha512::digest(payload);
    sched_base::encode(&digest)
}
