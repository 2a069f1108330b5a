//! Term-update laws: an update sequence never loses or corrupts data.

use proptest::prelude::*;

use ftgs_rs::Term;

fn term_strategy() -> impl Strategy<Value = Term> {
    prop_oneof![
        any::<i64>().prop_map(Term::Int),
        prop::collection::vec(any::<u8>(), 0..24).prop_map(Term::Str),
    ]
}

proptest! {
    #[test]
    fn assign_always_matches_the_source(
        seed in term_strategy(),
        updates in prop::collection::vec(term_strategy(), 0..20),
    ) {
        // Any interleaving of growth, shrinkage, and type changes must leave
        // the term equal to the value last assigned.
        let mut term = seed;
        for update in &updates {
            term.assign(update.as_term_ref());
            prop_assert_eq!(&term, update);
        }
    }

    #[test]
    fn fresh_and_reused_terms_are_indistinguishable(
        history in prop::collection::vec(term_strategy(), 1..10),
        last in term_strategy(),
    ) {
        let mut reused = history[0].clone();
        for update in &history[1..] {
            reused.assign(update.as_term_ref());
        }
        reused.assign(last.as_term_ref());

        // Same content and type as a term built directly from the value.
        prop_assert_eq!(&reused, &last);
        prop_assert_eq!(reused.term_type(), last.term_type());
    }
}
