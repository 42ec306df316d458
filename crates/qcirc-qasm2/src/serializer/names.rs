//! Identifier sanitization for emitted gate names.

use crate::lexer::TokenKind;

const CHAR_REPLACEMENTS: &[(char, &str)] = &[
    ('†', "dg"),
    ('^', "pow"),
    ('+', "plus"),
    ('-', "minus"),
    ('/', "div"),
    ('*', "mul"),
    ('(', "_"),
    (')', ""),
    ('[', "_"),
    (']', ""),
    ('=', "eq"),
    (',', "_"),
];

const GREEK_LETTERS: &[(char, &str)] = &[
    ('α', "alpha"),
    ('β', "beta"),
    ('γ', "gamma"),
    ('δ', "delta"),
    ('ε', "epsilon"),
    ('ζ', "zeta"),
    ('η', "eta"),
    ('θ', "theta"),
    ('ι', "iota"),
    ('κ', "kappa"),
    ('λ', "lambda"),
    ('μ', "mu"),
    ('ν', "nu"),
    ('ξ', "xi"),
    ('ο', "omicron"),
    ('π', "pi"),
    ('ρ', "rho"),
    ('σ', "sigma"),
    ('τ', "tau"),
    ('υ', "upsilon"),
    ('φ', "phi"),
    ('χ', "chi"),
    ('ψ', "psi"),
    ('ω', "omega"),
    ('Α', "Alpha"),
    ('Β', "Beta"),
    ('Γ', "Gamma"),
    ('Δ', "Delta"),
    ('Ε', "Epsilon"),
    ('Ζ', "Zeta"),
    ('Η', "Eta"),
    ('Θ', "Theta"),
    ('Ι', "Iota"),
    ('Κ', "Kappa"),
    ('Λ', "Lambda"),
    ('Μ', "Mu"),
    ('Ν', "Nu"),
    ('Ξ', "Xi"),
    ('Ο', "Omicron"),
    ('Π', "Pi"),
    ('Ρ', "Rho"),
    ('Σ', "Sigma"),
    ('Τ', "Tau"),
    ('Υ', "Upsilon"),
    ('Φ', "Phi"),
    ('Χ', "Chi"),
    ('Ψ', "Psi"),
    ('Ω', "Omega"),
];

fn lookup(table: &[(char, &'static str)], c: char) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == c).map(|(_, v)| *v)
}

/// Whether `name` matches `[A-Za-z_][A-Za-z0-9_]*` and re-parses as a plain
/// identifier, i.e. is neither a keyword nor the constant `pi`.
pub(crate) fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let well_formed = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    well_formed && !is_reserved(name)
}

fn is_reserved(name: &str) -> bool {
    name == "pi" || TokenKind::keyword(name).is_some()
}

/// Rewrite an arbitrary operation name into an identifier starting with a
/// lowercase letter.
pub(crate) fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if let Some(rep) = lookup(CHAR_REPLACEMENTS, c).or_else(|| lookup(GREEK_LETTERS, c)) {
            out.push_str(rep);
        } else if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            out.push('_');
        }
    }

    let mut out = collapse_underscores(&out);
    if out.len() > 1 && out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() || out == "_" {
        return "gate".to_string();
    }
    if !out.starts_with(|c: char| c.is_ascii_lowercase()) {
        out = collapse_underscores(&format!("g_{out}"));
    }
    out
}

fn collapse_underscores(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("x†"), "xdg");
        assert_eq!(sanitize("x^0.5"), "xpow0_5");
        assert_eq!(sanitize("c4x"), "c4x");
        assert_eq!(sanitize("my gate"), "my_gate");
        assert_eq!(sanitize("Rθ"), "g_Rtheta");
        assert_eq!(sanitize("_hidden"), "g_hidden");
        assert_eq!(sanitize("3way"), "g_3way");
        assert_eq!(sanitize("f(a,b)"), "f_a_b");
        assert_eq!(sanitize("a__b___"), "a_b");
        assert_eq!(sanitize(""), "gate");
        assert_eq!(sanitize("!!"), "gate");
    }

    #[test]
    fn test_sanitized_names_are_valid() {
        for name in ["x†", "√x", "Ω", "--", "a b c", "CNOT"] {
            assert!(is_valid_identifier(&sanitize(name)), "{name}");
        }
    }

    #[test]
    fn test_valid_identifier() {
        assert!(is_valid_identifier("bell_0"));
        assert!(is_valid_identifier("_x"));
        assert!(!is_valid_identifier("0x"));
        assert!(!is_valid_identifier("a-b"));
        assert!(!is_valid_identifier(""));
        for reserved in ["pi", "sin", "sqrt", "gate", "opaque", "U", "CX", "OPENQASM"] {
            assert!(!is_valid_identifier(reserved), "{reserved}");
        }
        assert!(is_valid_identifier("u"));
        assert!(is_valid_identifier("pi2"));
    }
}
