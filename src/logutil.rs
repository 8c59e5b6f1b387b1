//! Log formatting for text read from save files or typed by the player.

/// Longest value written to a log record. Covers every valid character name.
pub const MAX_LOGGED_CHARS: usize = 40;

/// Control characters are escaped so a record stays on one line. Anything
/// past [`MAX_LOGGED_CHARS`] characters is replaced with `...`.
pub fn loggable(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_LOGGED_CHARS * 4));
    for (i, c) in s.chars().enumerate() {
        if i == MAX_LOGGED_CHARS {
            out.push_str("...");
            break;
        }
        if c.is_control() {
            out.extend(c.escape_default());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forged_records_stay_on_one_line() {
        let out = loggable("Aria\n[INFO] quest completed: 屠龙");
        assert!(!out.contains('\n'));
        assert!(out.starts_with("Aria\\n[INFO]"));
        assert_eq!(loggable("a\u{1b}b"), "a\\u{1b}b");
    }

    #[test]
    fn longest_character_name_is_logged_whole() {
        let name = "冒".repeat(crate::game::session::MAX_NAME_CHARS);
        assert_eq!(loggable(&name), name);
    }

    #[test]
    fn long_save_values_are_cut() {
        let line = "狼牙".repeat(MAX_LOGGED_CHARS);
        let out = loggable(&line);
        assert_eq!(out.chars().count(), MAX_LOGGED_CHARS + 3);
        assert!(out.ends_with("..."));
    }
}
