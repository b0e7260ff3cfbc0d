use std::path::Path;

use repack_manifest::{
    EntrySource, MANIFEST_PATH, locate_manifest, patch, resolve_entry_script, resolve_version,
    write_manifest,
};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[test]
fn analyze_then_patch_on_disk() {
    let tree = tempfile::tempdir().unwrap();
    write(
        tree.path(),
        MANIFEST_PATH,
        r#"{
  "name": "vscode-augment",
  "publisher": "Augment",
  "version": "1.2.3",
  "main": "./out/main.js",
  "contributes": {
    "commands": [
      { "command": "vscode-augment.signIn", "title": "Sign In", "category": "Augment" }
    ]
  },
  "activationEvents": ["onStartupFinished"]
}
"#,
    );
    write(tree.path(), "extension/out/main.js", "exports.activate = () => {};\n");

    let located = locate_manifest(tree.path()).unwrap();
    assert_eq!(resolve_version(&located.manifest).unwrap(), "1.2.3");

    let entry = resolve_entry_script(tree.path(), &located).unwrap();
    assert_eq!(entry.source, EntrySource::Declared);

    let (patched, outcome) = patch(located.manifest);
    assert!(outcome.changed());
    write_manifest(&located.path, &patched).unwrap();

    let first_write = std::fs::read_to_string(&located.path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&first_write).unwrap();
    let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
    assert_eq!(
        keys,
        ["name", "publisher", "version", "main", "contributes", "activationEvents"]
    );
    assert_eq!(
        value["contributes"]["commands"][0]["command"],
        "vscode-augment.byokProxy.settings"
    );

    // a second pass over the written file changes nothing
    let located = locate_manifest(tree.path()).unwrap();
    let (again, outcome) = patch(located.manifest);
    assert!(!outcome.changed());
    write_manifest(&located.path, &again).unwrap();
    assert_eq!(std::fs::read_to_string(&located.path).unwrap(), first_write);
}
