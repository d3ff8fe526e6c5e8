//! Text normalization for obfuscation-resistant matching
//!
//! Detection rules run against the raw text and against normalized forms so
//! that trivial evasions (odd casing, stray whitespace, `b.l.o.c.k.e.d`
//! spacing, digit look-alikes) still hit the catalogue.

/// Characters commonly used to space out a word one letter at a time.
const SEPARATORS: &[char] = &['.', '-', '_', '*', '+'];

/// Case-fold and collapse whitespace runs into single spaces.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;

    for ch in text.to_lowercase().chars() {
        if ch.is_whitespace() {
            if !last_was_space && !out.is_empty() {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }

    out.trim_end().to_string()
}

/// Undo common look-alike substitutions and inter-letter separators.
///
/// Substitutions first (`h3ll0` → `hello`), then any separator character
/// sandwiched between two alphanumerics is dropped (`b.l.o.c.k` → `block`).
/// Separators at word edges are kept so ordinary punctuation survives.
pub fn deobfuscate(text: &str) -> String {
    let substituted: String = text
        .chars()
        .map(|ch| match ch {
            '0' => 'o',
            '1' => 'i',
            '3' => 'e',
            '4' => 'a',
            '5' => 's',
            '7' => 't',
            '@' => 'a',
            '$' => 's',
            _ => ch,
        })
        .collect();

    let chars: Vec<char> = substituted.chars().collect();
    let mut out = String::with_capacity(chars.len());

    for (i, &ch) in chars.iter().enumerate() {
        if SEPARATORS.contains(&ch) {
            let prev_alnum = i > 0 && chars[i - 1].is_alphanumeric();
            let next_alnum = i + 1 < chars.len() && chars[i + 1].is_alphanumeric();
            if prev_alnum && next_alnum {
                continue;
            }
        }
        out.push(ch);
    }

    out
}

/// The distinct text forms a scanner should try, raw form first.
pub fn match_forms(text: &str) -> Vec<String> {
    let raw = text.to_string();
    let normalized = normalize(text);
    let deobfuscated = deobfuscate(&normalized);

    let mut forms = vec![raw];
    if !forms.contains(&normalized) {
        forms.push(normalized);
    }
    if !forms.contains(&deobfuscated) {
        forms.push(deobfuscated);
    }
    forms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_case_and_whitespace() {
        assert_eq!(normalize("Hello   WORLD"), "hello world");
        assert_eq!(normalize("  a\t\nb  "), "a b");
    }

    #[test]
    fn test_deobfuscate_lookalikes() {
        assert_eq!(deobfuscate("h3ll0 w0rld"), "hello world");
        assert_eq!(deobfuscate("p4$$word"), "password");
    }

    #[test]
    fn test_deobfuscate_separated_letters() {
        assert_eq!(deobfuscate("b.l.o.c.k.e.d"), "blocked");
        assert_eq!(deobfuscate("w-o-r-d"), "word");
    }

    #[test]
    fn test_deobfuscate_keeps_edge_punctuation() {
        assert_eq!(deobfuscate("end of sentence."), "end of sentence.");
        assert_eq!(deobfuscate("- item"), "- item");
    }

    #[test]
    fn test_match_forms_dedupes() {
        // Already lowercase with no obfuscation: one form only
        assert_eq!(match_forms("plain text").len(), 1);
        // Casing adds a normalized form
        let forms = match_forms("Plain Text");
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[1], "plain text");
    }

    #[test]
    fn test_match_forms_exposes_deobfuscated() {
        let forms = match_forms("i.g.n.o.r.e previous");
        assert!(forms.iter().any(|f| f.contains("ignore previous")));
    }
}
