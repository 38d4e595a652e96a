use pretty_assertions::assert_eq;
use speclink_cli::{command, exit_code, run};
use speclink_test_utils::{SourceTree, SAMPLE_SPEC};

fn speclink(args: &[&str]) -> (i32, String) {
    let matches = command()
        .try_get_matches_from(std::iter::once("speclink").chain(args.iter().copied()))
        .unwrap();
    let mut out = Vec::new();
    let code = match run(&matches, &mut out) {
        Ok(code) => code,
        Err(error) => exit_code(&error),
    };
    (code, String::from_utf8(out).unwrap())
}

fn path_str(tree: &SourceTree, relative: &str) -> String {
    tree.path(relative).to_string_lossy().into_owned()
}

#[test]
fn validate_exit_codes() {
    let tree = SourceTree::new()
        .with("ok/SPEC-007.md", SAMPLE_SPEC)
        .with("empty/SPEC-008.md", "---\nid: SPEC-008\n---\n## Requirements\n\n")
        .with("broken/SPEC-009.md", "no front matter\n");

    let (code, out) = speclink(&["validate", &path_str(&tree, "ok/SPEC-007.md")]);
    assert_eq!(code, 0);
    assert!(out.ends_with(": ok\n"));

    let (code, out) = speclink(&["validate", &path_str(&tree, "empty/SPEC-008.md"), "--json"]);
    assert_eq!(code, 1);
    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["ok"], false);

    let (code, _) = speclink(&["validate", &path_str(&tree, "broken/SPEC-009.md")]);
    assert_eq!(code, 2);

    let (code, _) = speclink(&["validate", &path_str(&tree, "missing.md")]);
    assert_eq!(code, 3);
}

#[test]
fn sync_then_verify() {
    let tree = SourceTree::new()
        .with("SPEC-007.md", SAMPLE_SPEC)
        .with("src/main/domain/Email.kt", "// REQ-SPEC-007-U-01\n")
        .with("src/test/EmailTest.kt", "// REQ-SPEC-007-U-01\n");
    let doc = path_str(&tree, "SPEC-007.md");
    let root = tree.root().to_string_lossy().into_owned();
    let summary = path_str(&tree, "STATUS.md");
    let architecture = path_str(&tree, "docs/architecture.md");

    let (code, out) = speclink(&[
        "sync",
        &doc,
        "--source",
        &root,
        "--summary",
        &summary,
        "--architecture",
        &architecture,
    ]);
    assert_eq!(code, 0);
    assert!(out.contains("**Coverage**: 1/3 (33.3%)"));
    assert!(tree.read("SPEC-007.md").contains("| REQ-SPEC-007-U-01 | src/main/domain/Email.kt:1 | src/test/EmailTest.kt:1 | ✅ Tested |"));
    assert!(tree.read("STATUS.md").contains("- [x] `REQ-SPEC-007-U-01` (tested)"));
    assert!(tree
        .read("docs/architecture.md")
        .contains("## Domain Layer\n\n- `src/main/domain/Email.kt`\n"));

    // Two requirements have no code reference yet
    let before = tree.read("SPEC-007.md");
    let (code, out) = speclink(&["verify", &doc, "--source", &root, "--json"]);
    assert_eq!(code, 1);
    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["counts"]["tested"], 1);
    assert_eq!(report["counts"]["pending"], 2);
    assert_eq!(tree.read("SPEC-007.md"), before);
}

#[test]
fn verify_passes_once_every_requirement_is_referenced() {
    let tree = SourceTree::new()
        .with("SPEC-007.md", SAMPLE_SPEC)
        .with(
            "src/Profile.kt",
            "// REQ-SPEC-007-U-01\n// REQ-SPEC-007-U-02\nfun save() = Unit // REQ-SPEC-007-E-01\n",
        );
    let doc = path_str(&tree, "SPEC-007.md");
    let root = tree.root().to_string_lossy().into_owned();

    let (code, out) = speclink(&["verify", &doc, "--source", &root]);
    assert_eq!(code, 0, "{out}");
    assert!(out.contains("## Pending\n\n_None._\n"));

    tree.write("src/Profile.kt", "// REQ-SPEC-007-U-01\n");
    let (code, _) = speclink(&["verify", &doc, "--source", &root]);
    assert_eq!(code, 1);
}

#[test]
fn create_generate_and_stamp() {
    let tree = SourceTree::new();
    let specs = path_str(&tree, "specs");

    let (code, out) = speclink(&[
        "create",
        "Offline Notes",
        "--specs-dir",
        &specs,
        "-r",
        "store notes in a local database",
        "-r",
        "WHEN the device reconnects, the system shall upload pending notes.",
        "--author",
        "Sam",
    ]);
    assert_eq!(code, 0, "{out}");
    assert!(out.starts_with("SPEC-001 created at "));
    let doc = path_str(&tree, "specs/SPEC-001-offline-notes.md");

    let out_dir = path_str(&tree, "app");
    let (code, out) = speclink(&["generate", &doc, "--out", &out_dir, "--namespace", "org.notes"]);
    assert_eq!(code, 0, "{out}");
    assert!(out.contains("7 written, 0 skipped"));
    assert!(tree
        .path("app/src/main/kotlin/org/notes/domain/model/OfflineNote.kt")
        .is_file());

    let (_, out) = speclink(&["generate", &doc, "--out", &out_dir, "--namespace", "org.notes"]);
    assert!(out.contains("0 written, 0 skipped"));

    let bare = tree.write("SPEC-020.md", "---\nid: SPEC-020\n---\n## Requirements\nThe system shall sync.\n");
    let (code, out) = speclink(&["stamp", &bare.to_string_lossy()]);
    assert_eq!(code, 0);
    assert!(out.ends_with(": 1 requirement ids stamped\n"));
}

#[test]
fn explicit_config_is_used() {
    let tree = SourceTree::new()
        .with("cfg/speclink.toml", "spec_prefix = \"FEAT\"\n")
        .with("FEAT-001.md", "---\nid: FEAT-001\nfeature: x\nversion: 1\nstatus: draft\n---\n## Requirements\nThe system shall run.\n");
    let config = path_str(&tree, "cfg/speclink.toml");

    let (code, _) = speclink(&["validate", &path_str(&tree, "FEAT-001.md"), "--config", &config]);
    assert_eq!(code, 0);
    let (code, _) = speclink(&["validate", &path_str(&tree, "FEAT-001.md")]);
    assert_eq!(code, 1);
}
