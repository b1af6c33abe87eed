use courier_core::{resolve_template, resolve_template_with};
use rand::rngs::mock::StepRng;

#[test]
fn name_substitution_is_deterministic_without_variants() {
    assert_eq!(resolve_template("Olá {nome}", "Ana"), "Olá Ana");
    assert_eq!(resolve_template("Olá {nome}", ""), "Olá ");
}

#[test]
fn pipe_variants_stay_within_the_option_set() {
    for _ in 0..64 {
        let resolved = resolve_template("{A|B}", "");
        assert!(resolved == "A" || resolved == "B", "got {resolved}");
    }
}

#[test]
fn slash_variants_stay_within_the_option_set() {
    for _ in 0..64 {
        let resolved = resolve_template("{A/B/C}", "");
        assert!(
            resolved == "A" || resolved == "B" || resolved == "C",
            "got {resolved}"
        );
    }
}

#[test]
fn pipe_takes_precedence_over_slash() {
    for _ in 0..64 {
        let resolved = resolve_template("{a/b|c}", "");
        assert!(resolved == "a/b" || resolved == "c", "got {resolved}");
    }
}

#[test]
fn options_are_trimmed() {
    for _ in 0..32 {
        let resolved = resolve_template("{ oi | olá }", "");
        assert!(resolved == "oi" || resolved == "olá", "got {resolved}");
    }
}

#[test]
fn name_is_substituted_before_variant_resolution() {
    // A name placeholder inside a variant group resolves to the name, never
    // to a corrupted mix of the group's delimiters.
    for _ in 0..64 {
        let resolved = resolve_template("{nome|outro}", "X");
        assert!(resolved == "X" || resolved == "outro", "got {resolved}");
    }
}

#[test]
fn pinned_rng_makes_the_choice_reproducible() {
    let mut rng = StepRng::new(0, 0);
    let first = resolve_template_with("{A|B} {C|D}", "", &mut rng);
    let mut rng = StepRng::new(0, 0);
    let second = resolve_template_with("{A|B} {C|D}", "", &mut rng);
    assert_eq!(first, second);
}

#[test]
fn mixed_template_resolves_every_group() {
    let resolved = resolve_template("{Oi|Olá} {nome}, {tudo bem?|como vai?}", "Bia");
    assert!(resolved.contains("Bia"));
    assert!(!resolved.contains('{'));
    assert!(!resolved.contains('|'));
}
