//! Input sanitization for identifiers and query values.
//!
//! This is a defense-in-depth filter, not an encoding or escaping solution:
//! it strips the characters most often used to smuggle markup or quoted
//! payloads and bounds the length of what reaches the Vortex API. Output that
//! ends up in HTML must still be escaped by whoever renders it.

/// Maximum number of characters kept after sanitization.
pub const MAX_INPUT_LENGTH: usize = 1000;

/// Trim, strip `< > ' "`, and truncate to [`MAX_INPUT_LENGTH`] characters.
///
/// Missing input, and input that is empty once cleaned, yields `None`.
pub fn sanitize(input: Option<&str>) -> Option<String> {
    let cleaned: String = input?
        .trim()
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '\'' | '"'))
        .take(MAX_INPUT_LENGTH)
        .collect();

    (!cleaned.is_empty()).then_some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markup_characters_and_trims() {
        assert_eq!(
            sanitize(Some("  <script>alert(1)</script>  ")),
            Some("scriptalert(1)/script".to_string())
        );
        assert_eq!(sanitize(Some("O'Brien \"x\"")), Some("OBrien x".to_string()));
    }

    #[test]
    fn truncates_to_max_length() {
        let long = "a".repeat(MAX_INPUT_LENGTH + 250);
        let result = sanitize(Some(&long)).unwrap();
        assert_eq!(result.chars().count(), MAX_INPUT_LENGTH);
    }

    #[test]
    fn missing_or_empty_input_is_none() {
        assert_eq!(sanitize(None), None);
        assert_eq!(sanitize(Some("")), None);
        assert_eq!(sanitize(Some("   ")), None);
        assert_eq!(sanitize(Some("<>''")), None);
    }
}
