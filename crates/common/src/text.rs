//! Text matching shared by every component lookup

/// Case-insensitive comparison that ignores surrounding whitespace
pub fn matches_text(rendered: &str, wanted: &str) -> bool {
    normalize(rendered) == normalize(wanted)
}

/// Case-insensitive containment check that ignores surrounding whitespace
pub fn contains_text(rendered: &str, wanted: &str) -> bool {
    normalize(rendered).contains(&normalize(wanted))
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Option1", "option1 " ; "trailing space")]
    #[test_case("  YES ", "yes" ; "padded rendering")]
    #[test_case("Material", "MATERIAL" ; "case only")]
    fn test_matches(rendered: &str, wanted: &str) {
        assert!(matches_text(rendered, wanted));
    }

    #[test]
    fn test_rejects_partial_match() {
        assert!(!matches_text("Option10", "option1"));
        assert!(contains_text("Option10", "option1"));
    }
}
