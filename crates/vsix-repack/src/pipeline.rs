//! Pipeline - one repackaging run, start to finish.
//!
//! Stages only move forward:
//!
//! ```text
//! Unextracted -> Extracted -> Analyzed -> Injected -> Patched -> Repacked
//!      \___________\___________\___________\___________\---> Failed
//! ```
//!
//! Everything a run writes, except the final archive, lives in a [`WorkDir`]
//! under the dist directory. The guard removes it when [`run`] returns, on
//! success, on error and during a panic, unless `keep_workdir` was set. For
//! SIGINT and SIGTERM the directory is also registered with [`interrupt`].

use std::fmt;
use std::path::{Path, PathBuf};

use repack_archive::{ExtractReport, PackReport};
use repack_fetch::{FetchOptions, Fetcher, HttpClient, ReqwestClient, marketplace_url};
use repack_fs::WorkDir;
use repack_inject::{FragmentSet, InjectReport};
use repack_manifest::{EntrySource, PatchOutcome};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{ErrorKind, PipelineError};
use crate::interrupt;

pub const WORKDIR_PREFIX: &str = "_vsix_work_";
pub const OUTPUT_PREFIX: &str = "augment-vscode-modified-v";

const SOURCE_FILE: &str = "original.vsix";
const TREE_DIR: &str = "unpacked_ext";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Unextracted,
    Extracted,
    Analyzed,
    Injected,
    Patched,
    Repacked,
    Failed,
}

impl Stage {
    /// The stage a successful step leads to. `None` once finished or failed.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Unextracted => Some(Stage::Extracted),
            Stage::Extracted => Some(Stage::Analyzed),
            Stage::Analyzed => Some(Stage::Injected),
            Stage::Injected => Some(Stage::Patched),
            Stage::Patched => Some(Stage::Repacked),
            Stage::Repacked | Stage::Failed => None,
        }
    }

    /// Name of the step that leaves this stage.
    pub fn step(self) -> &'static str {
        match self {
            Stage::Unextracted => "extract",
            Stage::Extracted => "analyze",
            Stage::Analyzed => "inject",
            Stage::Injected => "patch",
            Stage::Patched => "repack",
            Stage::Repacked => "finish",
            Stage::Failed => "recover",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Unextracted => "unextracted",
            Stage::Extracted => "extracted",
            Stage::Analyzed => "analyzed",
            Stage::Injected => "injected",
            Stage::Patched => "patched",
            Stage::Repacked => "repacked",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Identifies a run; names its work directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RunId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Where the package to patch comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// A `.vsix` on disk, copied into the work directory.
    Local(PathBuf),
    /// Latest published version, downloaded from the marketplace.
    Marketplace { publisher: String, extension: String },
}

impl Source {
    pub fn marketplace(publisher: impl Into<String>, extension: impl Into<String>) -> Self {
        Source::Marketplace {
            publisher: publisher.into(),
            extension: extension.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PipelineRequest {
    pub source: Source,
    /// Parent of the work directory and of the default output.
    pub dist_dir: PathBuf,
    pub fragments: FragmentSet,
    /// Explicit output path; defaults to [`default_output`].
    pub output: Option<PathBuf>,
    /// Inject even if the entry script already carries the terminal marker.
    pub force: bool,
    pub keep_workdir: bool,
    pub run_id: RunId,
    pub fetch: FetchOptions,
}

impl PipelineRequest {
    pub fn new(source: Source, dist_dir: impl Into<PathBuf>, fragments: FragmentSet) -> Self {
        Self {
            source,
            dist_dir: dist_dir.into(),
            fragments,
            output: None,
            force: false,
            keep_workdir: false,
            run_id: RunId::new(),
            fetch: FetchOptions::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PipelineOutcome {
    pub run_id: RunId,
    pub version: String,
    /// Entry script, relative to the extracted tree.
    pub entry_script: PathBuf,
    pub entry_source: EntrySource,
    pub output: PathBuf,
    pub extracted: ExtractReport,
    pub injection: InjectReport,
    pub patch: PatchOutcome,
    pub packed: PackReport,
    /// Set when the work directory was kept on disk.
    pub workdir: Option<PathBuf>,
}

/// `<dist>/augment-vscode-modified-v<version>.vsix`
pub fn default_output(dist_dir: &Path, version: &str) -> PathBuf {
    dist_dir.join(format!("{OUTPUT_PREFIX}{version}.vsix"))
}

/// Run the pipeline, downloading through reqwest when the source is remote.
pub fn run(request: &PipelineRequest) -> Result<PipelineOutcome, PipelineError> {
    let client = match request.source {
        Source::Local(_) => None,
        Source::Marketplace { .. } => Some(
            ReqwestClient::new(&request.fetch)
                .map_err(|e| PipelineError::new(Stage::Unextracted, e))?,
        ),
    };
    run_with(request, client)
}

/// Run the pipeline with a caller-supplied HTTP client for remote sources.
pub fn run_with<C: HttpClient>(
    request: &PipelineRequest,
    client: Option<C>,
) -> Result<PipelineOutcome, PipelineError> {
    info!(run_id = %request.run_id, "starting repack");
    let mut pipeline = Run {
        request,
        stage: Stage::Unextracted,
    };
    let outcome = pipeline.execute(client);
    if let Err(e) = &outcome {
        error!(stage = %e.stage, error = %e.kind, "repack failed");
    }
    outcome
}

struct Run<'a> {
    request: &'a PipelineRequest,
    stage: Stage,
}

impl Run<'_> {
    fn execute<C: HttpClient>(&mut self, client: Option<C>) -> Result<PipelineOutcome, PipelineError> {
        let request = self.request;

        let mut workdir = self.attempt(|| {
            WorkDir::acquire(&request.dist_dir, WORKDIR_PREFIX, request.run_id)
                .map_err(ErrorKind::WorkDir)
        })?;
        if request.keep_workdir {
            workdir.retain();
        }
        let _registration = (!workdir.is_retained()).then(|| interrupt::register(workdir.path()));
        info!(workdir = %workdir.path().display(), "work directory ready");

        let source = workdir.join(SOURCE_FILE);
        self.attempt(|| obtain_source(&request.source, client, &source))?;

        let tree = workdir.join(TREE_DIR);
        let extracted = self.attempt(|| Ok(repack_archive::extract(&source, &tree)?))?;
        self.advance();
        info!(entries = extracted.entry_count(), bytes = extracted.total_bytes, "extracted");

        let root = extracted.root.clone();
        let (located, version, entry) = self.attempt(|| {
            let located = repack_manifest::locate_manifest(&root)?;
            let version = repack_manifest::resolve_version(&located.manifest)?;
            let entry = repack_manifest::resolve_entry_script(&root, &located)?;
            Ok((located, version, entry))
        })?;
        self.advance();
        info!(%version, entry = %entry.path.display(), source = %entry.source, "analyzed");

        let injection =
            self.attempt(|| Ok(repack_inject::inject(&entry.path, &request.fragments, request.force)?))?;
        self.advance();
        info!(header_bytes = injection.header_bytes, "injected");

        let manifest_path = located.path.clone();
        let patch = self.attempt(|| {
            let (patched, outcome) = repack_manifest::patch(located.manifest);
            repack_manifest::write_manifest(&manifest_path, &patched)?;
            Ok(outcome)
        })?;
        self.advance();
        info!(
            command_added = patch.command_added,
            activation_added = patch.activation_added,
            "patched manifest"
        );

        let output = request
            .output
            .clone()
            .unwrap_or_else(|| default_output(&request.dist_dir, &version));
        let packed = self.attempt(|| Ok(repack_archive::repack(&root, &output)?))?;
        self.advance();
        info!(output = %output.display(), entries = packed.entries.len(), "repacked");

        let entry_script = entry
            .path
            .strip_prefix(&root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| entry.path.clone());

        Ok(PipelineOutcome {
            run_id: request.run_id,
            version,
            entry_script,
            entry_source: entry.source,
            output,
            extracted,
            injection,
            patch,
            packed,
            workdir: workdir.is_retained().then(|| workdir.path().to_path_buf()),
        })
    }

    /// Run one step; on error the run is marked failed at the current stage.
    fn attempt<T>(
        &mut self,
        step: impl FnOnce() -> Result<T, ErrorKind>,
    ) -> Result<T, PipelineError> {
        step().map_err(|kind| {
            let stage = self.stage;
            self.stage = Stage::Failed;
            PipelineError { stage, kind }
        })
    }

    fn advance(&mut self) {
        if let Some(next) = self.stage.next() {
            self.stage = next;
        }
    }
}

fn obtain_source<C: HttpClient>(
    source: &Source,
    client: Option<C>,
    destination: &Path,
) -> Result<(), ErrorKind> {
    match source {
        Source::Local(path) => {
            info!(path = %path.display(), "using local package");
            std::fs::copy(path, destination).map_err(|e| ErrorKind::Source {
                path: path.clone(),
                source: e,
            })?;
        }
        Source::Marketplace {
            publisher,
            extension,
        } => {
            let client = client.ok_or_else(|| {
                repack_fetch::FetchError::Client("no HTTP client configured".to_string())
            })?;
            let url = marketplace_url(publisher, extension);
            Fetcher::new(client).fetch(&url, destination)?;
        }
    }
    Ok(())
}
