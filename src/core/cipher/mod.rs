//! Decryption of the source platform's sensitive values.
//!
//! Values at rest are AES-CBC encrypted under a single master key and stored
//! as `base64(ciphertext)|base64(iv)`. Decryption is pure and stateless, so
//! the functions here can be called from any number of extractors at once.
//!
//! ## Padding
//!
//! The platform pads with PKCS#7. Legacy data has historically been unpadded
//! by reading the trailing byte as a count and truncating, with no further
//! check. [`PaddingMode::Lenient`] keeps that behaviour, [`PaddingMode::Strict`]
//! validates the padding and the UTF-8 of the result.

mod padding;

use aes::{Aes128, Aes192, Aes256};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cbc::cipher::block_padding::{NoPadding, Pkcs7};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use tracing::trace;
use zeroize::Zeroizing;

use crate::error::{CipherError, Result, SecretPart};

pub use padding::PaddingMode;

/// AES block size, which is also the required IV length.
pub const BLOCK_SIZE: usize = 16;

const SEPARATOR: char = '|';

/// The platform's symmetric master key.
///
/// Decoded once per run. The key bytes are wiped on drop and never printed.
#[derive(Clone)]
pub struct MasterKey {
    bytes: Zeroizing<Vec<u8>>,
}

impl MasterKey {
    /// Decode a base64 master key and check it is a valid AES key length.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::Encoding` for invalid base64 and
    /// `CipherError::InvalidKeyLength` if the key is not 16, 24 or 32 bytes.
    pub fn parse(encoded: &str) -> Result<Self> {
        let bytes = Zeroizing::new(STANDARD.decode(encoded.trim()).map_err(|source| {
            CipherError::Encoding {
                part: SecretPart::MasterKey,
                source,
            }
        })?);

        match bytes.len() {
            16 | 24 | 32 => Ok(Self { bytes }),
            n => Err(CipherError::InvalidKeyLength(n).into()),
        }
    }

    /// Key length in bits.
    pub fn bits(&self) -> usize {
        self.bytes.len() * 8
    }

    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

/// A parsed `ciphertext|iv` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedSecret {
    ciphertext: Vec<u8>,
    iv: Vec<u8>,
}

impl EncryptedSecret {
    /// Split and decode an encrypted payload.
    ///
    /// # Errors
    ///
    /// - `CipherError::MalformedSecret` unless there is exactly one `|`
    /// - `CipherError::Encoding` if either half is not base64
    /// - `CipherError::InvalidIv` if the IV is not one block long
    pub fn parse(value: &str) -> Result<Self> {
        let mut parts = value.split(SEPARATOR);
        let (ciphertext, iv) = match (parts.next(), parts.next(), parts.next()) {
            (Some(ciphertext), Some(iv), None) => (ciphertext, iv),
            _ => {
                return Err(CipherError::MalformedSecret(
                    "expected two base64 encoded strings separated by a pipe".to_string(),
                )
                .into())
            }
        };

        let ciphertext = STANDARD
            .decode(ciphertext)
            .map_err(|source| CipherError::Encoding {
                part: SecretPart::Ciphertext,
                source,
            })?;
        let iv = STANDARD.decode(iv).map_err(|source| CipherError::Encoding {
            part: SecretPart::Iv,
            source,
        })?;

        if iv.len() != BLOCK_SIZE {
            return Err(CipherError::InvalidIv(iv.len()).into());
        }

        Ok(Self { ciphertext, iv })
    }

    /// Format back into the stored `ciphertext|iv` representation.
    pub fn encode(&self) -> String {
        format!(
            "{}{}{}",
            STANDARD.encode(&self.ciphertext),
            SEPARATOR,
            STANDARD.encode(&self.iv)
        )
    }
}

/// Decrypt a stored value with the legacy-compatible lenient padding rules.
///
/// # Errors
///
/// Returns a `CipherError` describing the first framing, encoding, IV or
/// block-alignment problem found.
pub fn decrypt(key: &MasterKey, value: &str) -> Result<Zeroizing<String>> {
    decrypt_with(key, value, PaddingMode::Lenient)
}

/// Decrypt a stored value with an explicit padding mode.
pub fn decrypt_with(key: &MasterKey, value: &str, mode: PaddingMode) -> Result<Zeroizing<String>> {
    let secret = EncryptedSecret::parse(value)?;
    let blocks = Zeroizing::new(cbc_decrypt(key, &secret)?);
    let plaintext = mode.unpad(&blocks)?;

    trace!(
        ciphertext_len = secret.ciphertext.len(),
        plaintext_len = plaintext.len(),
        "decrypted value"
    );
    Ok(plaintext)
}

/// Encrypt a plaintext into the platform's `ciphertext|iv` format.
///
/// The caller supplies the IV; it must be one block long and should be
/// unique per value.
pub fn encrypt(key: &MasterKey, iv: &[u8], plaintext: &str) -> Result<String> {
    if iv.len() != BLOCK_SIZE {
        return Err(CipherError::InvalidIv(iv.len()).into());
    }

    let k = key.as_bytes();
    let data = plaintext.as_bytes();
    let ciphertext = match k.len() {
        16 => cbc::Encryptor::<Aes128>::new_from_slices(k, iv)
            .map(|c| c.encrypt_padded_vec_mut::<Pkcs7>(data)),
        24 => cbc::Encryptor::<Aes192>::new_from_slices(k, iv)
            .map(|c| c.encrypt_padded_vec_mut::<Pkcs7>(data)),
        32 => cbc::Encryptor::<Aes256>::new_from_slices(k, iv)
            .map(|c| c.encrypt_padded_vec_mut::<Pkcs7>(data)),
        n => return Err(CipherError::InvalidKeyLength(n).into()),
    }
    .map_err(|_| CipherError::InvalidKeyLength(k.len()))?;

    Ok(EncryptedSecret {
        ciphertext,
        iv: iv.to_vec(),
    }
    .encode())
}

/// Raw CBC decryption without removing any padding.
fn cbc_decrypt(key: &MasterKey, secret: &EncryptedSecret) -> Result<Vec<u8>> {
    if secret.ciphertext.is_empty() || secret.ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CipherError::MalformedSecret(format!(
            "ciphertext length {} is not a positive multiple of the block size",
            secret.ciphertext.len()
        ))
        .into());
    }

    let k = key.as_bytes();
    let ct = &secret.ciphertext;
    let iv = &secret.iv;
    let blocks = match k.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(k, iv)
            .map(|c| c.decrypt_padded_vec_mut::<NoPadding>(ct)),
        24 => cbc::Decryptor::<Aes192>::new_from_slices(k, iv)
            .map(|c| c.decrypt_padded_vec_mut::<NoPadding>(ct)),
        32 => cbc::Decryptor::<Aes256>::new_from_slices(k, iv)
            .map(|c| c.decrypt_padded_vec_mut::<NoPadding>(ct)),
        n => return Err(CipherError::InvalidKeyLength(n).into()),
    }
    .map_err(|_| CipherError::InvalidKeyLength(k.len()))?
    .map_err(|_| CipherError::MalformedSecret("ciphertext is not block aligned".to_string()))?;

    Ok(blocks)
}
