//! Transaction verification: id, signature and payload commitment checks.

use crate::crypto::Sha256Hash;
use crate::error::ValidationError;
use crate::merkle::{generate_transaction_chunks, validate_path, ValidatedPath};
use crate::transaction::{Format, Transaction};
use crate::types::TransactionId;
use crate::wallet::verify;

/// Verify a signed transaction as any third party would.
///
/// This performs:
/// - Presence of owner and signature
/// - id == SHA-256(signature)
/// - Payload commitment (`data_size`, and `data_root` when the payload is held)
/// - RSA-PSS verification of the signature over the canonical message
pub fn verify_transaction(tx: &Transaction) -> Result<(), ValidationError> {
    // 1. Signed fields present
    if tx.signature.is_empty() {
        return Err(ValidationError::MissingSignature);
    }
    if tx.owner.is_empty() {
        return Err(ValidationError::MissingOwner);
    }

    // 2. Id derives from the signature
    let expected = TransactionId::from_signature(&tx.signature);
    match &tx.id {
        Some(id) if *id == expected => {}
        _ => {
            return Err(ValidationError::IdMismatch {
                expected: expected.to_b64url(),
                actual: tx.id.map(|id| id.to_b64url()).unwrap_or_default(),
            })
        }
    }

    // 3. Payload commitment, when the payload is held locally
    if !tx.data.is_empty() {
        let actual = tx.data.len() as u64;
        if actual != tx.data_size {
            return Err(ValidationError::DataSizeMismatch {
                declared: tx.data_size,
                actual,
            });
        }
        if tx.format == Format::V2 {
            let chunks = generate_transaction_chunks(&tx.data);
            if chunks.data_root_bytes() != tx.data_root.as_slice() {
                return Err(ValidationError::DataRootMismatch);
            }
        }
    }

    // 4. Signature over the canonical message
    let message = tx.signature_data()?;
    verify(&tx.owner, message.as_ref(), &tx.signature)?;

    Ok(())
}

/// Check one uploaded chunk against a transaction's `data_root`.
///
/// `offset` is the chunk's last byte offset as carried by its upload body.
pub fn validate_chunk(
    data_root: &[u8],
    data_size: u64,
    offset: u64,
    data_path: &[u8],
    chunk: &[u8],
) -> Result<ValidatedPath, ValidationError> {
    let (Ok(size), Ok(offset)) = (usize::try_from(data_size), usize::try_from(offset)) else {
        return Err(ValidationError::InvalidProof("size out of range".into()));
    };
    if offset >= size {
        return Err(ValidationError::InvalidProof(format!(
            "offset {} outside payload of {} bytes",
            offset, size
        )));
    }

    let validated = validate_path(data_root, offset, 0, size, data_path)
        .ok_or_else(|| ValidationError::InvalidProof("path does not lead to data_root".into()))?;

    if validated.chunk_size != chunk.len() {
        return Err(ValidationError::InvalidProof(format!(
            "chunk is {} bytes, proof covers {}",
            chunk.len(),
            validated.chunk_size
        )));
    }
    if Sha256Hash::hash(chunk) != validated.data_hash {
        return Err(ValidationError::InvalidProof("chunk digest mismatch".into()));
    }

    Ok(validated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::crypto::b64url_decode;
    use crate::merkle::{MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
    use crate::wallet::test_keys::{other_wallet, wallet};

    fn signed(data: Vec<u8>) -> Transaction {
        let mut tx = Transaction::from_data(data);
        tx.set_reward(Amount::from_winston(100)).unwrap();
        tx.sign(&wallet()).unwrap();
        tx
    }

    #[test]
    fn test_valid_transaction() {
        let tx = signed(b"hello world".to_vec());
        assert!(verify_transaction(&tx).is_ok());
    }

    #[test]
    fn test_unsigned_rejected() {
        let tx = Transaction::from_data(&b"unsigned"[..]);
        assert!(matches!(
            verify_transaction(&tx),
            Err(ValidationError::MissingSignature)
        ));
    }

    #[test]
    fn test_tampered_id_rejected() {
        let mut tx = signed(b"hello".to_vec());
        tx.id = Some(TransactionId::from_bytes([0; 32]));
        assert!(matches!(
            verify_transaction(&tx),
            Err(ValidationError::IdMismatch { .. })
        ));
    }

    #[test]
    fn test_tampered_field_rejected() {
        let mut tx = signed(b"hello".to_vec());
        tx.reward = Some(Amount::from_winston(1));
        assert!(matches!(
            verify_transaction(&tx),
            Err(ValidationError::SignatureFailed)
        ));
    }

    #[test]
    fn test_foreign_owner_rejected() {
        let mut tx = signed(b"hello".to_vec());
        tx.owner = other_wallet().owner().to_vec();
        assert!(matches!(
            verify_transaction(&tx),
            Err(ValidationError::SignatureFailed)
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let mut tx = signed(b"hello".to_vec());
        tx.data = bytes::Bytes::from_static(b"jello");
        assert!(matches!(
            verify_transaction(&tx),
            Err(ValidationError::DataRootMismatch)
        ));

        tx.data = bytes::Bytes::from_static(b"hello!");
        assert!(matches!(
            verify_transaction(&tx),
            Err(ValidationError::DataSizeMismatch { declared: 5, actual: 6 })
        ));
    }

    #[test]
    fn test_validate_chunk_uploads() {
        let data: Vec<u8> = (0..(MAX_CHUNK_SIZE * 2 + 7)).map(|i| (i * 7) as u8).collect();
        let tx = signed(data);

        for index in 0..tx.chunks().unwrap().len() {
            let upload = tx.chunk_upload(index).unwrap();
            let path = b64url_decode(&upload.data_path).unwrap();
            let chunk = b64url_decode(&upload.chunk).unwrap();
            let offset = upload.offset.parse().unwrap();

            let validated =
                validate_chunk(tx.data_root(), tx.data_size(), offset, &path, &chunk).unwrap();
            assert_eq!(validated.offset as u64, offset);

            let mut forged = chunk.clone();
            forged[0] ^= 0xff;
            assert!(validate_chunk(tx.data_root(), tx.data_size(), offset, &path, &forged).is_err());
        }
    }

    #[test]
    fn test_validate_chunk_rejects_offset_at_or_past_size() {
        let data: Vec<u8> = (0..(MAX_CHUNK_SIZE + MIN_CHUNK_SIZE)).map(|i| i as u8).collect();
        let tx = signed(data);
        let upload = tx.chunk_upload(0).unwrap();
        let path = b64url_decode(&upload.data_path).unwrap();
        let chunk = b64url_decode(&upload.chunk).unwrap();

        for offset in [tx.data_size(), tx.data_size() + 1] {
            assert!(matches!(
                validate_chunk(tx.data_root(), tx.data_size(), offset, &path, &chunk),
                Err(ValidationError::InvalidProof(_))
            ));
        }
        assert!(validate_chunk(tx.data_root(), 0, 0, &path, &chunk).is_err());
    }
}
