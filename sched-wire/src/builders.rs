// Test/fixture builders mirroring the way a validator's own test suite
// constructs signed transactions and batches: sign over the serialized
// header, then wrap header bytes + signature into the envelope.

use crate::envelope::{Batch, BatchHeader, Transaction, TransactionHeader};
use crate::signing::{self, PrivateKey, PublicKey};
use crate::envelope::{fixture_address, sha512_hex};

pub fn create_transaction(name: &str, private_key: &PrivateKey, public_key: &PublicKey) -> Transaction {
    let payload = name.as_bytes().to_vec();
    let addr = fixture_address(name);

    let header = TransactionHeader {
        signer_pubkey: public_key.to_bytes().to_vec(),
        batcher_pubkey: public_key.to_bytes().to_vec(),
        family_name: "scheduler_test".into(),
        family_version: "1.0".into(),
        inputs: vec![addr.clone()],
        outputs: vec![addr],
        dependencies: vec![],
        payload_encoding: "application/octet-stream".into(),
        payload_sha512: sha512_hex(&payload),
    };

    let header_bytes = header.to_bytes().expect("header serializes");
    let signature = signing::sign(&header_bytes, private_key);

    Transaction {
        header,
        payload,
        header_signature: sched_base::encode(&signature),
    }
}

pub fn create_batch(transactions: Vec<Transaction>, private_key: &PrivateKey, public_key: &PublicKey) -> Batch {
    let transaction_ids = transactions
        .iter()
        .map(|t| t.header_signature.clone())
        .collect();

    let header = BatchHeader {
        signer_pubkey: public_key.to_bytes().to_vec(),
        transaction_ids,
    };

    let header_bytes = header.to_bytes().expect("header serializes");
    let signature = signing::sign(&header_bytes, private_key);

    Batch {
        header,
        transactions,
        header_signature: sched_base::encode(&signature),
    }
}
