mod builders;
mod envelope;
mod signing;

pub use builders::{create_batch, create_transaction};
pub use envelope::{fixture_address, sha512_hex, Batch, BatchHeader, Transaction, TransactionHeader};
pub use signing::{generate_keypair, sign, PrivateKey, PublicKey};
