//! Save name validation and filesystem mapping

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::game::errors::GameError;

/// Longest save name accepted, in characters.
pub const MAX_SAVE_NAME_CHARS: usize = 64;

/// Everything except ASCII letters, digits, `_` and `-` is encoded.
const FILENAME_ENCODE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'-');

/// Device names some filesystems refuse regardless of extension.
const RESERVED: &[&str] = &[
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// Check a save name and return it trimmed.
pub fn validate_save_name(name: &str) -> Result<String, GameError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(GameError::InvalidName("save name is empty".to_string()));
    }
    if trimmed.chars().count() > MAX_SAVE_NAME_CHARS {
        return Err(GameError::InvalidName(format!(
            "save name longer than {} characters",
            MAX_SAVE_NAME_CHARS
        )));
    }
    // Path traversal
    if trimmed.contains("..") || trimmed.contains('/') || trimmed.contains('\\') {
        return Err(GameError::InvalidName(
            "save name contains a path separator".to_string(),
        ));
    }
    if trimmed.starts_with('.') {
        return Err(GameError::InvalidName(
            "save name starts with '.'".to_string(),
        ));
    }
    if let Some(c) = trimmed.chars().find(|c| c.is_control()) {
        return Err(GameError::InvalidName(format!(
            "save name contains control character \\u{{{:04x}}}",
            c as u32
        )));
    }
    if RESERVED.contains(&trimmed.to_lowercase().as_str()) {
        return Err(GameError::InvalidName(format!("'{}' is reserved", trimmed)));
    }
    Ok(trimmed.to_string())
}

/// Generate safe filename from a save name using percent encoding
pub fn safe_filename(name: &str) -> String {
    utf8_percent_encode(name, FILENAME_ENCODE).to_string()
}

/// Reverse of [`safe_filename`]. `None` for files this crate would not have written.
pub fn filename_to_save_name(filename: &str) -> Option<String> {
    let decoded = percent_decode_str(filename).decode_utf8().ok()?;
    let name = validate_save_name(&decoded).ok()?;
    (safe_filename(&name) == filename).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_name_validation() {
        assert_eq!(validate_save_name("save_slot_1").unwrap(), "save_slot_1");
        assert_eq!(validate_save_name("  my run  ").unwrap(), "my run");
        assert!(validate_save_name("勇者的存档").is_ok());

        assert!(validate_save_name("").is_err());
        assert!(validate_save_name("   ").is_err());
        assert!(validate_save_name("../etc/passwd").is_err());
        assert!(validate_save_name("saves\\one").is_err());
        assert!(validate_save_name(".hidden").is_err());
        assert!(validate_save_name("bad\u{7}bell").is_err());
        assert!(validate_save_name("CON").is_err());
        assert!(validate_save_name(&"x".repeat(MAX_SAVE_NAME_CHARS + 1)).is_err());
        assert!(validate_save_name(&"存".repeat(MAX_SAVE_NAME_CHARS)).is_ok());
    }

    #[test]
    fn test_safe_filename() {
        assert_eq!(safe_filename("save_slot_1"), "save_slot_1");
        assert_eq!(safe_filename("my run"), "my%20run");
        assert!(!safe_filename("a.b").contains('.'));
        assert!(!safe_filename("存档").contains('/'));
    }

    #[test]
    fn test_filename_mapping() {
        for name in ["save_20240501_201500", "my run", "勇者的存档"] {
            assert_eq!(filename_to_save_name(&safe_filename(name)).as_deref(), Some(name));
        }
        // Written by something else
        assert_eq!(filename_to_save_name("notes.txt"), None);
        assert_eq!(filename_to_save_name("%2E%2E"), None);
        assert_eq!(filename_to_save_name("%FF"), None);
    }
}
