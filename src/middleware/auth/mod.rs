//! Authentication stages: JWT verification and revocation checking.

pub mod jwt;
pub mod keys;
pub mod revoke;

pub use jwt::{extract_bearer, JwtMiddleware};
pub use keys::{load_public_keys, KeyError};
pub use revoke::RevokeMiddleware;

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header};

    const PRIVATE_PEM: &str = include_str!("../../../tests/fixtures/jwt_private.pem");
    const PUBLIC_PEM: &str = include_str!("../../../tests/fixtures/jwt_public.pem");

    /// Verification key map with the fixture key under kid "key-1".
    pub fn test_keys() -> HashMap<String, DecodingKey> {
        HashMap::from([(
            "key-1".to_string(),
            DecodingKey::from_rsa_pem(PUBLIC_PEM.as_bytes()).unwrap(),
        )])
    }

    /// Sign `claims` with the fixture RSA key, stamping `kid`.
    pub fn sign_rs256(kid: &str, claims: serde_json::Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        let key = EncodingKey::from_rsa_pem(PRIVATE_PEM.as_bytes()).unwrap();
        jsonwebtoken::encode(&header, &claims, &key).unwrap()
    }

    /// Sign `claims` with a symmetric key, for wrong-algorithm tests.
    pub fn sign_hs256(claims: serde_json::Value) -> String {
        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(b"test-secret");
        jsonwebtoken::encode(&header, &claims, &key).unwrap()
    }
}
