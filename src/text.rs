//! Text helpers shared by location filtering, hospital search and secret
//! comparison.

/// Lowercase, strip Portuguese diacritics and collapse whitespace.
///
/// `"  Hospital  São Luiz "` → `"hospital sao luiz"`
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;

    for c in input.trim().chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;

        for lower in c.to_lowercase() {
            out.push(fold_accent(lower));
        }
    }

    out
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        _ => c,
    }
}

/// Compare two secrets without short-circuiting on the first mismatch
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("s3cret", "s3cret"));
        assert!(constant_time_compare("", ""));
        assert!(!constant_time_compare("s3cret", "s3cre7"));
        assert!(!constant_time_compare("s3cret", "s3cret!"));
    }

    #[test]
    fn test_normalize_folds_case_and_accents() {
        assert_eq!(normalize("Hospital São Luiz"), "hospital sao luiz");
        assert_eq!(normalize("UPA Vila Mariana – Ação"), "upa vila mariana – acao");
        assert_eq!(normalize("SANTA CASA DE MISERICÓRDIA"), "santa casa de misericordia");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  Hospital \t  das   Clínicas "), "hospital das clinicas");
        assert_eq!(normalize("   "), "");
    }
}
