/// Suffix that replaces everything after the revealed prefix.
pub const MASK_SUFFIX: &str = "***";

/// Masks an email for public display.
///
/// Reveals the first two characters of the local part (one when the local part is
/// two characters or shorter), then appends `***`. The domain is never shown.
pub fn mask_email(email: &str) -> String {
    let local = email.trim().split('@').next().unwrap_or_default();

    let chars = local.chars().count();
    let reveal = if chars > 2 { 2 } else { chars.min(1) };
    let prefix: String = local.chars().take(reveal).collect();

    format!("{}{}", prefix, MASK_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_hides_local_part_and_domain() {
        assert_eq!(mask_email("alice@example.com"), "al***");
        assert_eq!(mask_email("bo@example.com"), "b***");
        assert_eq!(mask_email("x@example.com"), "x***");
    }

    #[test]
    fn test_mask_handles_odd_input() {
        assert_eq!(mask_email(""), "***");
        assert_eq!(mask_email("@example.com"), "***");
        assert_eq!(mask_email("no-at-sign"), "no***");
        assert_eq!(mask_email("élodie@example.fr"), "él***");
    }

    #[test]
    fn test_mask_never_contains_raw_email() {
        for email in ["carol.smith@uni.edu", "ab@c.d", "z@z.z"] {
            let masked = mask_email(email);
            assert!(!masked.contains(email));
            assert!(!masked.contains('@'));
        }
    }

    #[test]
    fn test_mask_uses_text_before_first_at_sign() {
        assert_eq!(mask_email("  mallory@evil@example.com "), "ma***");
    }
}
