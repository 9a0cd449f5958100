/// Series grammar loading and linting integration tests.

use rap_battle_bot::core::grammar::GrammarSet;
use rap_battle_bot::core::matchup::SERIES_RULE;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn shipped_series_grammar_loads() {
    let path = std::path::Path::new("data/series.ron");
    let gs = GrammarSet::load_from_ron(path).unwrap();

    for rule_name in [SERIES_RULE, "adjective", "rap", "battle", "of_what"] {
        assert!(gs.rules.contains_key(rule_name), "Missing rule: {}", rule_name);
    }
    assert_eq!(gs.rules[SERIES_RULE].alternatives.len(), 3);
}

#[test]
fn word_banks_have_minimum_alternatives() {
    let gs = GrammarSet::builtin_series().unwrap();
    for (name, rule) in &gs.rules {
        assert!(
            rule.alternatives.len() >= 3,
            "Rule '{}' has only {} alternatives (minimum 3 expected)",
            name,
            rule.alternatives.len()
        );
    }
}

#[test]
fn no_broken_rule_references_in_templates() {
    let gs = GrammarSet::builtin_series().unwrap();
    for (name, rule) in &gs.rules {
        for alt in &rule.alternatives {
            for ref_name in alt.template.rule_refs() {
                assert!(
                    gs.rules.contains_key(ref_name),
                    "Rule '{}' references non-existent rule '{}'",
                    name,
                    ref_name
                );
            }
        }
    }
}

#[test]
fn series_names_take_the_three_shapes() {
    let gs = GrammarSet::builtin_series().unwrap();
    let battles = ["Wars", "Clashes", "Battles", "Conflicts", "Skirmishes", "Altercations"];
    let mut saw_of = false;
    let mut saw_vs = false;
    let mut saw_plain = false;

    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        let name = gs.expand(SERIES_RULE, &mut rng).unwrap();
        assert!(!name.contains('{'), "unexpanded reference in '{}'", name);
        assert!(battles.iter().any(|b| name.contains(b)), "no battle noun in '{}'", name);

        if name.ends_with(" vs Anything") {
            saw_vs = true;
        } else if name.contains(" of ") {
            saw_of = true;
        } else {
            saw_plain = true;
            assert!(name.split(' ').count() >= 3, "too short: '{}'", name);
        }
    }
    assert!(saw_of && saw_vs && saw_plain);
}

#[test]
fn override_file_replaces_single_word_bank() {
    let mut gs = GrammarSet::builtin_series().unwrap();
    let overrides =
        GrammarSet::load_from_ron(std::path::Path::new("tests/fixtures/test_series.ron")).unwrap();
    gs.merge(overrides);

    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..20 {
        let name = gs.expand(SERIES_RULE, &mut rng).unwrap();
        assert!(name.starts_with("Fixture "), "got '{}'", name);
    }
    assert!(gs.rules.contains_key("of_what"));
}
