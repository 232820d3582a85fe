//! Canonical form and textual spellings of a die-roll sequence.

/// Strips every character outside {1,2,3,4}. An empty result means there is
/// nothing to look up and the caller must go straight to the fallback.
pub fn normalize_sequence(raw: &str) -> String {
    raw.chars().filter(|c| ('1'..='4').contains(c)).collect()
}

/// Arrow-joined display form, e.g. "123" -> "1 → 2 → 3".
pub fn human_form(digits: &str) -> String {
    join_digits(digits, " → ")
}

pub fn hyphen_form(digits: &str) -> String {
    join_digits(digits, "-")
}

/// Every textual spelling of the sequence accepted for matching. Matching any
/// one of them is equivalent to matching the sequence itself.
pub fn candidate_keys(digits: &str) -> Vec<String> {
    if digits.is_empty() {
        return Vec::new();
    }

    let spellings = [
        digits.to_string(),
        join_digits(digits, "-"),
        join_digits(digits, " → "),
        join_digits(digits, " "),
        join_digits(digits, ","),
        join_digits(digits, ", "),
    ];

    let mut keys = Vec::with_capacity(spellings.len());
    for spelling in spellings {
        if !keys.contains(&spelling) {
            keys.push(spelling);
        }
    }
    keys
}

fn join_digits(digits: &str, separator: &str) -> String {
    digits
        .chars()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_keeps_only_die_digits() {
        assert_eq!(normalize_sequence("1, 2 -> 5x3"), "123");
        assert_eq!(normalize_sequence("9 8 7"), "");
        assert_eq!(normalize_sequence(""), "");
    }

    #[test]
    fn normalization_preserves_order_and_is_idempotent() {
        let once = normalize_sequence("4a3b2c1");
        assert_eq!(once, "4321");
        assert_eq!(normalize_sequence(&once), once);
    }

    #[test]
    fn human_form_joins_with_arrows() {
        assert_eq!(human_form("123"), "1 → 2 → 3");
        assert_eq!(human_form("2"), "2");
        assert_eq!(human_form(""), "");
    }

    #[test]
    fn candidate_keys_cover_all_spellings() {
        let keys = candidate_keys("12");
        assert!(keys.contains(&"12".to_string()));
        assert!(keys.contains(&"1-2".to_string()));
        assert!(keys.contains(&"1 → 2".to_string()));
        assert!(keys.contains(&"1 2".to_string()));
        assert!(keys.contains(&"1,2".to_string()));
        assert!(keys.contains(&"1, 2".to_string()));
    }

    #[test]
    fn single_digit_keys_deduplicate() {
        assert_eq!(candidate_keys("3"), vec!["3".to_string()]);
    }

    #[test]
    fn empty_sequence_has_no_keys() {
        assert!(candidate_keys("").is_empty());
    }
}
