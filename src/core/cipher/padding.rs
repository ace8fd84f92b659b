//! Padding removal.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::BLOCK_SIZE;
use crate::error::{CipherError, Result};

/// How decrypted blocks are unpadded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaddingMode {
    /// Read the trailing byte as a count and truncate. Padding content is not
    /// checked and invalid UTF-8 is replaced, so a corrupted ciphertext can
    /// produce garbage instead of an error.
    #[default]
    Lenient,
    /// Full PKCS#7 validation and UTF-8 checking.
    Strict,
}

impl PaddingMode {
    /// Strip padding from decrypted blocks and decode the result as text.
    pub(crate) fn unpad(self, data: &[u8]) -> Result<Zeroizing<String>> {
        let Some(&last) = data.last() else {
            return Err(CipherError::MalformedSecret("empty plaintext block".to_string()).into());
        };
        let count = last as usize;

        match self {
            Self::Lenient => {
                if count > data.len() {
                    return Err(CipherError::MalformedSecret(format!(
                        "padding count {} exceeds data length {}",
                        count,
                        data.len()
                    ))
                    .into());
                }
                let body = &data[..data.len() - count];
                Ok(Zeroizing::new(String::from_utf8_lossy(body).into_owned()))
            }
            Self::Strict => {
                if count == 0 || count > BLOCK_SIZE || count > data.len() {
                    return Err(CipherError::InvalidPadding.into());
                }
                let (body, pad) = data.split_at(data.len() - count);
                if pad.iter().any(|&b| b != last) {
                    return Err(CipherError::InvalidPadding.into());
                }
                let text = std::str::from_utf8(body).map_err(|_| CipherError::InvalidUtf8)?;
                Ok(Zeroizing::new(text.to_string()))
            }
        }
    }
}

impl std::fmt::Display for PaddingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lenient => write!(f, "lenient"),
            Self::Strict => write!(f, "strict"),
        }
    }
}
