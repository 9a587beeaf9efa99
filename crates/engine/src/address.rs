//! Recipient address normalization.
//!
//! The messaging network addresses users as `<number>@c.us`. Callers hand
//! us phone numbers in whatever shape their address book produced;
//! normalization is a pure function so dispatch results stay deterministic.

/// Address domain for individual users on the messaging network.
pub const USER_ADDRESS_SUFFIX: &str = "@c.us";

/// Normalize a raw recipient into the engine's addressing format.
///
/// Already-qualified addresses (anything containing `@`) pass through
/// untouched; everything else is stripped of formatting characters and
/// suffixed with [`USER_ADDRESS_SUFFIX`].
pub fn normalize_recipient(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains('@') {
        return trimmed.to_string();
    }
    let digits: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '+' | '(' | ')'))
        .collect();
    format!("{digits}{USER_ADDRESS_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_number_gets_suffix() {
        assert_eq!(normalize_recipient("4915112345678"), "4915112345678@c.us");
    }

    #[test]
    fn whitespace_and_formatting_stripped() {
        assert_eq!(normalize_recipient("  +49 151 123-456 "), "49151123456@c.us");
        assert_eq!(normalize_recipient("(0151) 2345678"), "01512345678@c.us");
    }

    #[test]
    fn qualified_address_passes_through() {
        assert_eq!(normalize_recipient("4915112345678@c.us"), "4915112345678@c.us");
        assert_eq!(normalize_recipient(" group-42@g.us "), "group-42@g.us");
    }

    #[test]
    fn deterministic() {
        let a = normalize_recipient("+49 151");
        let b = normalize_recipient("+49 151");
        assert_eq!(a, b);
    }
}
