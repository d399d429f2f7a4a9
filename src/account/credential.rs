//! Password generation, username derivation and password hashing.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::{rngs::OsRng, Rng};

use crate::Error;

/// Characters generated passwords are drawn from.
///
/// Glyphs that are easily confused when copied by hand (`0`/`O`, `1`/`l`/`I`)
/// are left out.
const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789!@#$%&*?";

/// The shortest password [`generate_password`] produces.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Username used when the local part of an email has no usable character.
const FALLBACK_USERNAME: &str = "member";

/// Generates a random password of the given length.
///
/// Lengths below [`MIN_PASSWORD_LENGTH`] are raised to it.
pub fn generate_password(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length.max(MIN_PASSWORD_LENGTH))
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Derives a base username from the local part of an email address.
///
/// The result is lowercase and only contains ascii alphanumerics, `.`, `_`
/// and `-`, never starting or ending with punctuation. Callers still have to
/// disambiguate it against existing usernames.
pub fn username_from_email(email: &lettre::Address) -> String {
    let sanitized: String = email
        .user()
        .chars()
        .filter_map(|c| {
            let c = c.to_ascii_lowercase();
            (c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')).then_some(c)
        })
        .collect();
    let trimmed = sanitized.trim_matches(|c: char| !c.is_ascii_alphanumeric());
    if trimmed.is_empty() {
        FALLBACK_USERNAME.to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Hashes a password with Argon2id into a PHC string.
pub fn hash_password(plain: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(plain.as_bytes(), &salt)?
        .to_string())
}

/// Verifies a plaintext password against a PHC string.
///
/// Returns `Ok(false)` on mismatch and an error only if the stored hash
/// is malformed.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, Error> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(raw: &str) -> lettre::Address {
        raw.parse().unwrap()
    }

    #[test]
    fn generated_passwords() {
        let password = generate_password(12);
        assert_eq!(password.len(), 12);
        assert!(password.bytes().all(|b| CHARSET.contains(&b)));

        assert_eq!(generate_password(3).len(), MIN_PASSWORD_LENGTH);
        assert_ne!(generate_password(16), generate_password(16));
    }

    #[test]
    fn usernames() {
        assert_eq!(username_from_email(&address("Asha.Patel@x.com")), "asha.patel");
        assert_eq!(username_from_email(&address("ravi+gaam@x.com")), "ravigaam");
        assert_eq!(username_from_email(&address("_dev_@x.com")), "dev");
        assert_eq!(username_from_email(&address("--@x.com")), "member");
    }

    #[test]
    fn hash_round_trip() {
        let hash = hash_password("hunter2!").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter2!", &hash).unwrap());
        assert!(!verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        assert_ne!(hash_password("pw").unwrap(), hash_password("pw").unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("pw", "not-a-hash").is_err());
    }
}
