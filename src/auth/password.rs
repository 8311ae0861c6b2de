use crate::error::{ AppError, Result };

pub const HASH_COST: u32 = 10;

pub fn hash_password(password: &str) -> Result<String> {
    hash_password_with_cost(password, HASH_COST)
}

pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost).map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
}

/// Compares a plain password with a stored bcrypt hash. A hash that cannot
/// be parsed is an error, not a mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).map_err(|e| AppError::Internal(format!("stored hash unusable: {}", e)))
}
