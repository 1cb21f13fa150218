//! Name normalization for Kong entities
//!
//! Entity names and UUIDv5 inputs are derived from free-form OAS strings
//! (titles, literal paths, operation ids), which must be reduced to the
//! character set Kong accepts.

/// Convert one or more name elements to a valid Kong name.
///
/// Each element is lowercased, common accented Latin letters fold to their
/// ASCII base, and every other non-alphanumeric character collapses to a
/// single `-`; leading and trailing dashes are trimmed. The normalized
/// elements are joined with `_`.
pub fn slugify(elements: &[&str]) -> String {
    elements
        .iter()
        .map(|element| slugify_one(element))
        .collect::<Vec<_>>()
        .join("_")
}

fn slugify_one(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        let c = fold_diacritic(c);
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

/// Map the common Latin-1 accented letters onto ASCII; anything else passes
/// through untouched (and non-ASCII ends up as `-`).
fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify(&["Pet Store"]), "pet-store");
        assert_eq!(slugify(&["/pets/{id}"]), "pets-id");
        assert_eq!(slugify(&["GET"]), "get");
        assert_eq!(slugify(&["already-valid"]), "already-valid");
        assert_eq!(slugify(&["  spaced  out  "]), "spaced-out");
    }

    #[test]
    fn test_slugify_joins_with_underscore() {
        assert_eq!(slugify(&["My Api", "pets"]), "my-api_pets");
        assert_eq!(slugify(&["a", "b", "c"]), "a_b_c");
    }

    #[test]
    fn test_slugify_folds_accents() {
        assert_eq!(slugify(&["Café Menü"]), "cafe-menu");
        assert_eq!(slugify(&["naïve résumé"]), "naive-resume");
    }

    #[test]
    fn test_slugify_collapses_runs() {
        assert_eq!(slugify(&["a--b!!c"]), "a-b-c");
        assert_eq!(slugify(&["!!!"]), "");
    }
}
