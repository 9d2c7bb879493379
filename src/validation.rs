//! Input checks shared by the auth and classroom routes.

use crate::constants::{MAX_TEXT_LENGTH, MAX_TITLE_LENGTH, MAX_USERNAME_LENGTH};

/// 2 to 50 characters of letters, digits, underscore, hyphen or space.
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let char_count = username.chars().count();
    if !(2..=MAX_USERNAME_LENGTH).contains(&char_count) {
        return Err("username must be between 2 and 50 characters");
    }
    if username.trim().is_empty() {
        return Err("username must not be blank");
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == ' ')
    {
        return Err("username may only contain letters, digits, underscores, hyphens and spaces");
    }
    Ok(())
}

/// Kakao user ids are opaque but always short ASCII tokens.
pub fn validate_kakao_uid(kakao_uid: &str) -> Result<(), &'static str> {
    let trimmed = kakao_uid.trim();
    if trimmed.is_empty() {
        return Err("kakaoUid is required");
    }
    if trimmed.len() > 64 {
        return Err("kakaoUid must be at most 64 characters");
    }
    if !trimmed
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err("kakaoUid may only contain letters, digits, underscores and hyphens");
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), &'static str> {
    if title.trim().is_empty() {
        return Err("title is required");
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err("title must be at most 200 characters");
    }
    Ok(())
}

/// Short identifiers such as subunit codes, content types and labels.
pub fn validate_short_field(value: &str, field: &'static str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    if value.chars().count() > MAX_TITLE_LENGTH {
        return Err(format!("{field} must be at most {MAX_TITLE_LENGTH} characters"));
    }
    Ok(())
}

pub fn validate_text(text: &str) -> Result<(), &'static str> {
    if text.chars().count() > MAX_TEXT_LENGTH {
        return Err("text must be at most 20000 characters");
    }
    Ok(())
}
