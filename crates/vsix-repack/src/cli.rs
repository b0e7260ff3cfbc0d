use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use repack_inject::FragmentSet;

use crate::config::RepackConfig;
use crate::pipeline::{PipelineRequest, RunId, Source};

#[derive(Clone, Debug, Parser)]
#[command(name = "vsix-repack", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct Args {
    /// Local .vsix to patch; downloads the latest marketplace release when omitted
    #[arg(long = "in", value_name = "VSIX")]
    pub input: Option<PathBuf>,

    /// Output archive (relative paths resolve against --root)
    #[arg(long = "out", value_name = "VSIX")]
    pub output: Option<PathBuf>,

    /// Marketplace publisher
    #[arg(long)]
    pub publisher: Option<String>,

    /// Marketplace extension name
    #[arg(long)]
    pub extension: Option<String>,

    /// Inject even if the entry script is already patched
    #[arg(long)]
    pub force: bool,

    /// Keep the work directory after the run
    #[arg(long)]
    pub keep_workdir: bool,

    /// Project root holding vsix-patch/ and dist/
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Settings file (defaults to <root>/repack.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn load_config(&self) -> Result<RepackConfig> {
        RepackConfig::load(&self.root, self.config.as_deref())
            .with_context(|| format!("failed to load settings under {}", self.root.display()))
    }

    /// Merge flags over the loaded settings.
    pub fn request(&self, config: &RepackConfig) -> PipelineRequest {
        let source = match &self.input {
            Some(path) => Source::Local(path.clone()),
            None => Source::marketplace(
                self.publisher.as_deref().unwrap_or(&config.publisher),
                self.extension.as_deref().unwrap_or(&config.extension),
            ),
        };

        PipelineRequest {
            source,
            dist_dir: config.dist_path(&self.root),
            fragments: FragmentSet::in_dir(&config.fragment_path(&self.root)),
            output: self.output.as_deref().map(|out| resolve(&self.root, out)),
            force: self.force,
            keep_workdir: self.keep_workdir,
            run_id: RunId::new(),
            fetch: config.fetch_options(),
        }
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
