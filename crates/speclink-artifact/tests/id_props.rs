use proptest::prelude::*;
use speclink_artifact::{RequirementId, RequirementKind, SpecId, TraceStatus};

fn any_kind() -> impl Strategy<Value = RequirementKind> {
    prop_oneof![
        Just(RequirementKind::Ubiquitous),
        Just(RequirementKind::StateDriven),
        Just(RequirementKind::EventDriven),
        Just(RequirementKind::Optional),
        Just(RequirementKind::Negative),
    ]
}

proptest! {
    #[test]
    fn prop_built_ids_parse_back(number in 0u32..1000, kind in any_kind(), seq in 1u32..500) {
        let spec = SpecId::from_number("SPEC", number);
        let id = RequirementId::new(&spec, kind, seq);
        let parts = id.parts().expect("built id is well formed");
        prop_assert_eq!(parts.spec, spec.as_str());
        prop_assert_eq!(parts.kind, kind);
        prop_assert_eq!(parts.seq, seq);
    }

    #[test]
    fn prop_scanner_finds_embedded_id(
        prefix in "[ a-z/#]{0,12}",
        suffix in "[ .,;)]{0,8}",
        kind in any_kind(),
        seq in 1u32..100,
    ) {
        let id = RequirementId::new(&SpecId::new("SPEC-007"), kind, seq);
        let line = format!("{prefix} {id}{suffix}");
        let found: Vec<_> = RequirementId::find_all(&line).map(|(_, id)| id).collect();
        prop_assert_eq!(found, vec![id]);
    }

    #[test]
    fn prop_status_is_monotone_in_references(code in any::<bool>(), test in any::<bool>()) {
        let without = TraceStatus::derive(false, test);
        let with = TraceStatus::derive(true, test);
        prop_assert!(with >= without);
        prop_assert!(TraceStatus::derive(code, true) >= TraceStatus::derive(code, false));
    }
}

#[test]
fn spec_id_number_and_format_agree() {
    for n in [1, 9, 10, 99, 100, 999] {
        let id = SpecId::from_number("SPEC", n);
        assert!(id.is_well_formed("SPEC"));
        assert_eq!(id.number(), Some(n));
    }
}
