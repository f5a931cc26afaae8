use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

pub fn hash_password(plain: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2.hash_password(plain.as_bytes(), &salt)?.to_string();
    Ok(password_hash)
}

pub fn verify_password(plain: &str, hashed: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hashed)?;
    let ok = Argon2::default()
        .verify_password(plain.as_bytes(), &parsed_hash)
        .is_ok();
    Ok(ok)
}

// Argon2 is deliberately expensive; keep it off the async workers.
pub async fn hash_password_blocking(plain: String) -> crate::error::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| crate::error::Error::Internal(format!("hash task failed: {}", e)))?
        .map_err(|e| crate::error::Error::Internal(e.to_string()))
}

pub async fn verify_password_blocking(
    plain: String,
    hashed: String,
) -> crate::error::Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hashed))
        .await
        .map_err(|e| crate::error::Error::Internal(format!("verify task failed: {}", e)))?
        .map_err(|e| crate::error::Error::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_differs_from_plaintext_and_verifies() {
        let hash = hash_password("senha-forte").unwrap();
        assert_ne!(hash, "senha-forte");
        assert!(verify_password("senha-forte", &hash).unwrap());
        assert!(!verify_password("senha-errada", &hash).unwrap());
    }
}
