//! Homoglyph folding for domain labels.
//!
//! A deliberately small skeleton in the spirit of UTS #39: each character is
//! folded to the Latin letter it is commonly mistaken for. Two hosts are
//! "confusable" when their folded forms agree but the raw strings do not.
//! The table covers the Cyrillic and Greek letters that appear in real
//! IDN-homograph attacks against Latin-script domains.

/// Characters visually interchangeable with Latin letters, with their
/// Latin fold.
const HOMOGLYPHS: &[(char, char)] = &[
    // Cyrillic
    ('а', 'a'),
    ('в', 'b'),
    ('с', 'c'),
    ('ԁ', 'd'),
    ('е', 'e'),
    ('ё', 'e'),
    ('һ', 'h'),
    ('і', 'i'),
    ('ї', 'i'),
    ('ј', 'j'),
    ('к', 'k'),
    ('м', 'm'),
    ('н', 'h'),
    ('о', 'o'),
    ('р', 'p'),
    ('ԛ', 'q'),
    ('ѕ', 's'),
    ('т', 't'),
    ('ц', 'u'),
    ('ѵ', 'v'),
    ('ԝ', 'w'),
    ('х', 'x'),
    ('у', 'y'),
    // Greek
    ('α', 'a'),
    ('β', 'b'),
    ('ε', 'e'),
    ('η', 'n'),
    ('ι', 'i'),
    ('κ', 'k'),
    ('ν', 'v'),
    ('ο', 'o'),
    ('ρ', 'p'),
    ('τ', 't'),
    ('υ', 'u'),
    ('χ', 'x'),
    // Latin lookalikes
    ('ɑ', 'a'),
    ('ɡ', 'g'),
    ('ı', 'i'),
    ('ⅼ', 'l'),
    ('ℓ', 'l'),
];

fn fold_char(c: char) -> char {
    for &(glyph, latin) in HOMOGLYPHS {
        if c == glyph {
            return latin;
        }
    }
    c
}

/// Fold every homoglyph to its Latin base, lowercased.
pub fn skeleton(s: &str) -> String {
    s.chars()
        .flat_map(|c| c.to_lowercase())
        .map(fold_char)
        .collect()
}

/// True when the string carries at least one known homoglyph.
pub fn contains_homoglyph(s: &str) -> bool {
    s.chars().any(|c| HOMOGLYPHS.iter().any(|&(g, _)| g == c))
}

/// Two hosts are confusable when they differ as strings but fold to the
/// same skeleton and at least one of them carries a homoglyph.
pub fn looks_confusable(target: &str, candidate: &str) -> bool {
    let target = target.trim();
    let candidate = candidate.trim();
    if target.is_empty() || candidate.is_empty() || target == candidate {
        return false;
    }
    if skeleton(target) != skeleton(candidate) {
        return false;
    }
    contains_homoglyph(target) || contains_homoglyph(candidate)
}
