//! Public key loading for JWT verification.
//!
//! Keys are PEM-encoded SubjectPublicKeyInfo (X.509), RSA only, one file
//! per `kid`. Loaded once at startup; the resulting map is read-only.

use std::collections::HashMap;

use jsonwebtoken::DecodingKey;

/// Errors loading the configured public keys. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("failed to read public key file for kid={kid} at {path}: {source}")]
    Io {
        kid: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse public key for kid={kid}: {source}")]
    Pem {
        kid: String,
        #[source]
        source: jsonwebtoken::errors::Error,
    },
}

/// Load RSA public keys from the configured `kid → path` map.
pub fn load_public_keys(
    key_files: &HashMap<String, String>,
) -> Result<HashMap<String, DecodingKey>, KeyError> {
    let mut keys = HashMap::with_capacity(key_files.len());

    for (kid, path) in key_files {
        let pem = std::fs::read(path).map_err(|source| KeyError::Io {
            kid: kid.clone(),
            path: path.clone(),
            source,
        })?;

        let key = DecodingKey::from_rsa_pem(&pem).map_err(|source| KeyError::Pem {
            kid: kid.clone(),
            source,
        })?;

        keys.insert(kid.clone(), key);
    }

    Ok(keys)
}
