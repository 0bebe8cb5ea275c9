//! Destination identifier rendering.
//!
//! Registry names are mixed-case mnemonics (`StraatNaam`, `NISGEMCODE`).
//! PostgreSQL identifiers are rendered snake_case and left unquoted so they
//! fold the same way in hand-written queries.

use crate::error::{ImportError, Result};

/// PostgreSQL truncates identifiers longer than this (NAMEDATALEN - 1).
const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Render a registry name as a PostgreSQL identifier.
///
/// Inserts `_` at every lowercase-to-uppercase boundary, then lowercases.
///
/// ```
/// use crab_import::core::identifier::pg_name;
///
/// assert_eq!(pg_name("StraatNaam"), "straat_naam");
/// assert_eq!(pg_name("ID"), "id");
/// ```
pub fn pg_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if prev_lower && c.is_ascii_uppercase() {
            out.push('_');
        }
        prev_lower = c.is_ascii_lowercase();
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// Validate a rendered identifier before it is spliced into SQL text.
///
/// Identifiers come from the built-in catalog, so this only rejects what
/// PostgreSQL would silently mangle: empty names, characters outside
/// `[a-z0-9_]`, and names it would truncate.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ImportError::Config("Identifier cannot be empty".to_string()));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ImportError::Config(format!(
            "Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(ImportError::Config(format!(
            "Identifier must be snake_case ASCII: {:?}",
            name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pg_name_camel_case() {
        assert_eq!(pg_name("StraatNaam"), "straat_naam");
        assert_eq!(pg_name("KadGemeenteGemeente"), "kad_gemeente_gemeente");
        assert_eq!(pg_name("TerreinObjectHuisNummer"), "terrein_object_huis_nummer");
    }

    #[test]
    fn test_pg_name_upper_case() {
        assert_eq!(pg_name("ID"), "id");
        assert_eq!(pg_name("NISGEMCODE"), "nisgemcode");
        assert_eq!(pg_name("HUISNRID0"), "huisnrid0");
    }

    #[test]
    fn test_pg_name_boundary_only_after_lowercase() {
        // Digits and uppercase runs do not open a boundary.
        assert_eq!(pg_name("X"), "x");
        assert_eq!(pg_name("a1B"), "a1b");
        assert_eq!(pg_name("abCDe"), "ab_cde");
    }

    #[test]
    fn test_pg_name_idempotent() {
        for name in ["straat_naam", "id", "gemeente", "begin_datum_2"] {
            assert_eq!(pg_name(name), name);
            assert_eq!(pg_name(&pg_name(name)), pg_name(name));
        }
        let once = pg_name("PostKantonNaam");
        assert_eq!(pg_name(&once), once);
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("straat_naam").is_ok());
        assert!(validate_identifier("huisnrid0").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("Straat").is_err());
        assert!(validate_identifier("a; drop table x").is_err());
        assert!(validate_identifier(&"a".repeat(64)).is_err());
        assert!(validate_identifier(&"a".repeat(63)).is_ok());
    }
}
