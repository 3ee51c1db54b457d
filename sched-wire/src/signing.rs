// Signing is an external collaborator as far as the scheduling core is
// concerned: it only needs bytes-in, signature-bytes-out, and a way to
// generate a keypair. Deterministic or randomized doesn't matter to the
// core; what it gets is ed25519, because that's what a validator actually
// uses to sign transaction and batch headers.

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

pub type PrivateKey = SigningKey;
pub type PublicKey = VerifyingKey;

pub fn generate_keypair() -> (PrivateKey, PublicKey) {
    let signing_key = SigningKey::generate(&mut OsRng);
    let verifying_key = signing_key.verifying_key();
    (signing_key, verifying_key)
}

pub fn sign(bytes: &[u8], private_key: &PrivateKey) -> Vec<u8> {
    private_key.sign(bytes).to_bytes().to_vec()
}
