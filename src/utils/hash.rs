use sha2::{Digest, Sha256};

/// Short hex fingerprint used to correlate prompts and inputs in logs.
pub fn hash_text(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    hex::encode(&digest[..8])
}
