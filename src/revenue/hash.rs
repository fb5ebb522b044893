use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha2::{Digest, Sha256};

/// Tendermint tx hash: SHA-256 over the raw tx bytes, uppercase hex.
/// The /block endpoint carries txs as base64, the LCD indexes them by this
/// hash, so the rendering has to match exactly or every lookup 404s.
pub fn tx_hash_from_base64(tx_b64: &str) -> Result<String> {
    let raw = BASE64
        .decode(tx_b64)
        .context("invalid base64 transaction payload")?;
    Ok(hex::encode_upper(Sha256::digest(raw)))
}

#[cfg(test)]
mod tests {
    use super::tx_hash_from_base64;

    #[test]
    fn it_matches_the_tendermint_hash_scheme() {
        // "aGVsbG8=" is "hello", sha256 is the well known vector below
        let hash = tx_hash_from_base64("aGVsbG8=").unwrap();
        assert_eq!(
            hash,
            "2CF24DBA5FB0A30E26E83B2AC5B9E29E1B161E5C1FA7425E73043362938B9824"
        );
    }

    #[test]
    fn it_hashes_empty_payloads() {
        let hash = tx_hash_from_base64("").unwrap();
        assert_eq!(
            hash,
            "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855"
        );
    }

    #[test]
    fn it_rejects_invalid_base64() {
        assert!(tx_hash_from_base64("not@base64!").is_err());
    }
}
