use proptest::prelude::*;
use speclink_artifact::{RequirementId, Role, SpecId};
use speclink_composition::{inspect, FileState, HeaderBlock, HeaderOnlyMerge, MergeDecision, MergeStrategy, RegionedFile};

fn header(refs: &[u32]) -> String {
    HeaderBlock {
        spec_id: SpecId::new("SPEC-001"),
        role: Role::Model,
        entity: "Order".to_string(),
        refs: refs
            .iter()
            .map(|n| RequirementId::raw(format!("REQ-SPEC-001-U-{n:02}")))
            .collect(),
    }
    .render("//")
    .unwrap()
}

fn apply(existing: Option<&str>, file: &RegionedFile) -> String {
    match HeaderOnlyMerge.merge(existing, file) {
        MergeDecision::Unchanged => existing.unwrap().to_string(),
        decision => decision.text().unwrap().to_string(),
    }
}

proptest! {
    #[test]
    fn prop_body_survives_header_rewrite(
        old_refs in prop::collection::vec(1u32..20, 0..5),
        new_refs in prop::collection::vec(1u32..20, 0..5),
        body in "[ -~\n]{0,200}",
    ) {
        prop_assume!(!body.contains("END-GENERATED-HEADER"));
        let existing = RegionedFile::new(header(&old_refs), body.clone()).unwrap().render();
        let regenerated = RegionedFile::new(header(&new_refs), "template body\n").unwrap();

        let merged = apply(Some(&existing), &regenerated);
        prop_assert!(merged.ends_with(&body));
        prop_assert!(merged.starts_with(regenerated.header()));
    }

    #[test]
    fn prop_second_merge_is_unchanged(refs in prop::collection::vec(1u32..20, 0..5), body in "[a-z \n]{0,80}") {
        let file = RegionedFile::new(header(&refs), body).unwrap();
        let first = apply(None, &file);
        prop_assert_eq!(HeaderOnlyMerge.merge(Some(&first), &file), MergeDecision::Unchanged);
    }
}

#[test]
fn inspect_round_trips_render() {
    let file = RegionedFile::new(header(&[1, 2]), "class Order\n").unwrap();
    assert_eq!(
        inspect(&file.render()),
        FileState::Managed {
            header: file.header().to_string(),
            body: file.body().to_string(),
        }
    );
}
