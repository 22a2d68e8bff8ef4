use crate::error::{Error, Result};

/// Maximum length of a template or profile name.
pub const MAX_NAME_LEN: usize = 32;

/// Validates a template or profile name: 1 to 32 lower-case letters, digits
/// or underscores.
pub fn validate_name(name: &str) -> Result<()> {
    let valid = (1..=MAX_NAME_LEN).contains(&name.len())
        && name.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidName { name: name.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_slug_like_names() {
        let longest = "x".repeat(MAX_NAME_LEN);
        for name in ["a", "my_template", "py3", longest.as_str()] {
            assert!(validate_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_everything_else() {
        let too_long = "x".repeat(MAX_NAME_LEN + 1);
        for name in ["", "My", "with-dash", "with space", "dot.name", "é", too_long.as_str()] {
            assert!(
                matches!(validate_name(name), Err(Error::InvalidName { .. })),
                "{name} should be invalid"
            );
        }
    }
}
