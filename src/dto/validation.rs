//! Validation helpers for DTOs.

use validator::ValidationError;

/// Maximum nickname length in characters.
const NICKNAME_MAX_CHARS: usize = 24;
/// Length of a room code.
const ROOM_CODE_LENGTH: usize = 4;

/// Validates that a nickname is non-blank and at most 24 characters.
pub fn validate_nickname(nickname: &str) -> Result<(), ValidationError> {
    if nickname.trim().is_empty() {
        let mut err = ValidationError::new("nickname_blank");
        err.message = Some("Nickname must not be blank".into());
        return Err(err);
    }

    let chars = nickname.chars().count();
    if chars > NICKNAME_MAX_CHARS {
        let mut err = ValidationError::new("nickname_length");
        err.message = Some(
            format!("Nickname must be at most {NICKNAME_MAX_CHARS} characters (got {chars})")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates that a room code is exactly 4 alphanumeric characters.
///
/// Codes are case-insensitive on the wire; the dispatcher uppercases them
/// before any registry lookup.
pub fn validate_room_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != ROOM_CODE_LENGTH || !code.bytes().all(|byte| byte.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("room_code_format");
        err.message =
            Some(format!("Room code must be {ROOM_CODE_LENGTH} letters or digits").into());
        return Err(err);
    }

    Ok(())
}
