use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use repack_fetch::{FetchError, HttpClient, Response};
use repack_inject::{FragmentSet, FragmentSource};
use tempfile::TempDir;
use uuid::Uuid;
use vsix_repack::{ErrorKind, PipelineRequest, RunId, Source, Stage, run, run_with};
use zip::write::SimpleFileOptions;

const MANIFEST: &str = r#"{
  "name": "sample",
  "displayName": "Sample",
  "version": "1.2.3",
  "main": "out/main.js",
  "contributes": {
    "commands": [
      { "command": "sample.hello", "title": "Hello" }
    ]
  },
  "activationEvents": ["onStartupFinished"]
}
"#;

const MAIN_JS: &str = "exports.activate = function () {};\n";

struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let patch = dir.path().join("vsix-patch");
        std::fs::create_dir_all(&patch).unwrap();
        std::fs::write(patch.join("auth.js"), "/* M1 */ globalThis.M1 = true;\n").unwrap();
        std::fs::write(patch.join("panel.js"), "/* M2 */ globalThis.M2 = true;\n").unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn dist(&self) -> PathBuf {
        self.root().join("dist")
    }

    fn fragments(&self) -> FragmentSet {
        let patch = self.root().join("vsix-patch");
        FragmentSet {
            pre: None,
            auth: FragmentSource::new(patch.join("auth.js"), "M1"),
            panel: FragmentSource::new(patch.join("panel.js"), "M2"),
        }
    }

    fn package(&self, name: &str, entries: &[(&str, &str)]) -> PathBuf {
        let path = self.root().join(name);
        let file = std::fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (entry, content) in entries {
            zip.start_file(*entry, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        path
    }

    fn sample_package(&self) -> PathBuf {
        self.package(
            "sample.vsix",
            &[
                ("extension.vsixmanifest", "<PackageManifest/>"),
                ("extension/package.json", MANIFEST),
                ("extension/out/main.js", MAIN_JS),
                ("extension/out/util.js", "module.exports = {};\n"),
            ],
        )
    }

    fn request(&self, source: Source) -> PipelineRequest {
        let mut request = PipelineRequest::new(source, self.dist(), self.fragments());
        request.run_id = RunId::from(Uuid::new_v4());
        request
    }

    fn workdirs(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(self.dist()) else {
            return Vec::new();
        };
        entries
            .map(|e| e.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("_vsix_work_"))
            })
            .collect()
    }
}

fn read_entry(archive: &Path, name: &str) -> String {
    let file = std::fs::File::open(archive).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let mut entry = zip.by_name(name).unwrap();
    let mut text = String::new();
    entry.read_to_string(&mut text).unwrap();
    text
}

#[test]
fn repacks_local_package() {
    let project = Project::new();
    let source = project.sample_package();

    let outcome = run(&project.request(Source::Local(source))).unwrap();

    assert_eq!(outcome.version, "1.2.3");
    assert_eq!(outcome.entry_script, Path::new("extension/out/main.js"));
    assert_eq!(
        outcome.output,
        project.dist().join("augment-vscode-modified-v1.2.3.vsix")
    );
    assert!(outcome.patch.command_added);
    assert!(outcome.patch.activation_added);
    assert!(outcome.workdir.is_none());
    assert!(project.workdirs().is_empty());

    let script = read_entry(&outcome.output, "extension/out/main.js");
    let m1 = script.find("M1").unwrap();
    let m2 = script.find("M2").unwrap();
    let original = script.find(MAIN_JS).unwrap();
    assert!(m1 < m2 && m2 < original);
    assert!(script.ends_with(MAIN_JS));

    let untouched = read_entry(&outcome.output, "extension/out/util.js");
    assert_eq!(untouched, "module.exports = {};\n");

    let manifest: serde_json::Value =
        serde_json::from_str(&read_entry(&outcome.output, "extension/package.json")).unwrap();
    assert_eq!(manifest["version"], "1.2.3");
    assert_eq!(
        manifest["contributes"]["commands"][0]["command"],
        "vscode-augment.byokProxy.settings"
    );
    assert_eq!(manifest["contributes"]["commands"][1]["command"], "sample.hello");
    let events = manifest["activationEvents"].as_array().unwrap();
    assert!(events.iter().any(|e| e == "onCommand:vscode-augment.byokProxy.settings"));
    assert!(events.iter().any(|e| e == "onStartupFinished"));
}

#[test]
fn explicit_output_and_kept_workdir() {
    let project = Project::new();
    let source = project.sample_package();
    let mut request = project.request(Source::Local(source));
    request.output = Some(project.root().join("build/patched.vsix"));
    request.keep_workdir = true;

    let outcome = run(&request).unwrap();

    assert_eq!(outcome.output, project.root().join("build/patched.vsix"));
    assert!(outcome.output.is_file());
    let workdir = outcome.workdir.unwrap();
    assert!(workdir.join("original.vsix").is_file());
    assert!(workdir.join("unpacked_ext/extension/package.json").is_file());
    assert_eq!(project.workdirs(), vec![workdir]);
}

#[test]
fn zip_slip_fails_and_cleans_up() {
    let project = Project::new();
    let source = project.package(
        "evil.vsix",
        &[
            ("extension/package.json", MANIFEST),
            ("../../evil.js", "pwned"),
        ],
    );

    let err = run(&project.request(Source::Local(source))).unwrap_err();

    assert_eq!(err.stage, Stage::Unextracted);
    assert!(matches!(
        err.kind,
        ErrorKind::Archive(repack_archive::Error::PathTraversal { .. })
    ));
    assert!(project.workdirs().is_empty());
    assert!(!project.dist().join("evil.js").exists());
}

#[test]
fn missing_version_fails_in_analysis() {
    let project = Project::new();
    let source = project.package(
        "noversion.vsix",
        &[
            ("extension/package.json", r#"{ "name": "x", "main": "out/main.js" }"#),
            ("extension/out/main.js", MAIN_JS),
        ],
    );

    let err = run(&project.request(Source::Local(source))).unwrap_err();

    assert_eq!(err.stage, Stage::Extracted);
    assert!(matches!(
        err.kind,
        ErrorKind::Manifest(repack_manifest::Error::MissingVersion)
    ));
    assert!(project.workdirs().is_empty());
    assert!(!project.dist().join("augment-vscode-modified-v.vsix").exists());
}

#[test]
fn version_cannot_steer_output_path() {
    let project = Project::new();
    let manifest = MANIFEST.replace("\"1.2.3\"", "\"1/../../../escaped\"");
    let source = project.package(
        "steer.vsix",
        &[
            ("extension/package.json", manifest.as_str()),
            ("extension/out/main.js", MAIN_JS),
        ],
    );

    let err = run(&project.request(Source::Local(source))).unwrap_err();

    assert_eq!(err.stage, Stage::Extracted);
    assert!(matches!(
        err.kind,
        ErrorKind::Manifest(repack_manifest::Error::InvalidVersion { .. })
    ));
    assert!(project.workdirs().is_empty());
    assert!(!project.root().join("escaped.vsix").exists());
    assert!(!project.dist().join("augment-vscode-modified-v1").exists());
}

#[test]
fn patched_package_needs_force() {
    let project = Project::new();
    let source = project.sample_package();
    let first = run(&project.request(Source::Local(source))).unwrap();

    let err = run(&project.request(Source::Local(first.output.clone()))).unwrap_err();
    assert_eq!(err.stage, Stage::Analyzed);
    assert!(matches!(
        err.kind,
        ErrorKind::Inject(repack_inject::Error::AlreadyInjected { .. })
    ));

    let mut forced = project.request(Source::Local(first.output.clone()));
    forced.force = true;
    forced.output = Some(project.root().join("twice.vsix"));
    let second = run(&forced).unwrap();
    assert!(second.injection.reinjected);
    assert!(!second.patch.changed());

    let script = read_entry(&second.output, "extension/out/main.js");
    assert_eq!(script.matches("globalThis.M2").count(), 2);
}

#[test]
fn missing_source_file_reports_path() {
    let project = Project::new();
    let missing = project.root().join("absent.vsix");

    let err = run(&project.request(Source::Local(missing.clone()))).unwrap_err();

    assert_eq!(err.stage, Stage::Unextracted);
    assert!(matches!(&err.kind, ErrorKind::Source { path, .. } if *path == missing));
    assert!(project.workdirs().is_empty());
}

struct ServePackage(Vec<u8>);

impl HttpClient for ServePackage {
    type Body = Cursor<Vec<u8>>;

    fn get(&self, url: &str) -> repack_fetch::Result<Response<Self::Body>> {
        assert!(url.contains("/publishers/augment/vsextensions/vscode-augment/"));
        Ok(Response {
            status: 200,
            body: Cursor::new(self.0.clone()),
        })
    }
}

struct NotFound;

impl HttpClient for NotFound {
    type Body = Cursor<Vec<u8>>;

    fn get(&self, url: &str) -> repack_fetch::Result<Response<Self::Body>> {
        Err(FetchError::HttpStatus {
            url: url.to_string(),
            status: 404,
        })
    }
}

#[test]
fn downloads_marketplace_package() {
    let project = Project::new();
    let bytes = std::fs::read(project.sample_package()).unwrap();
    let request = project.request(Source::marketplace("augment", "vscode-augment"));

    let outcome = run_with(&request, Some(ServePackage(bytes))).unwrap();

    assert_eq!(outcome.version, "1.2.3");
    assert!(outcome.output.is_file());
    assert!(project.workdirs().is_empty());
}

#[test]
fn download_failure_stops_before_extraction() {
    let project = Project::new();
    let request = project.request(Source::marketplace("augment", "vscode-augment"));

    let err = run_with(&request, Some(NotFound)).unwrap_err();

    assert_eq!(err.stage, Stage::Unextracted);
    assert!(matches!(
        err.kind,
        ErrorKind::Fetch(FetchError::HttpStatus { status: 404, .. })
    ));
    assert!(project.workdirs().is_empty());
}
