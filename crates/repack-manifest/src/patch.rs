//! Command registration in the manifest.

use std::path::Path;

use repack_fs::atomic_write;
use tracing::info;

use crate::error::{Error, Result};
use crate::model::{CommandDescriptor, Manifest};

pub const BYOK_PROXY_COMMAND_ID: &str = "vscode-augment.byokProxy.settings";

/// The command to register and its palette metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub id: String,
    pub title: String,
    pub category: String,
}

impl CommandSpec {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: category.into(),
        }
    }

    /// The settings panel command contributed by the injected fragments.
    pub fn byok_proxy_settings() -> Self {
        Self::new(BYOK_PROXY_COMMAND_ID, "BYOK Proxy: Settings...", "Augment")
    }

    pub fn activation_event(&self) -> String {
        format!("onCommand:{}", self.id)
    }

    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor::new(self.id.clone())
            .title(self.title.clone())
            .category(self.category.clone())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatchOutcome {
    pub command_added: bool,
    pub activation_added: bool,
}

impl PatchOutcome {
    pub fn changed(&self) -> bool {
        self.command_added || self.activation_added
    }
}

/// Register the BYOK proxy settings command. See [`patch_with`].
pub fn patch(manifest: Manifest) -> (Manifest, PatchOutcome) {
    patch_with(manifest, &CommandSpec::byok_proxy_settings())
}

/// Ensure `spec` is contributed and activates the extension.
///
/// A missing descriptor is inserted at the front of `contributes.commands`;
/// a missing `onCommand:<id>` is appended to `activationEvents`. Entries that
/// already exist are left as they are, so patching twice equals patching once.
pub fn patch_with(mut manifest: Manifest, spec: &CommandSpec) -> (Manifest, PatchOutcome) {
    let mut outcome = PatchOutcome::default();

    let commands = manifest.commands_mut();
    if !commands.iter().any(|c| c.command == spec.id) {
        commands.insert(0, spec.descriptor());
        outcome.command_added = true;
        info!(command = %spec.id, "registered command");
    }

    let event = spec.activation_event();
    let events = manifest.activation_events_mut();
    if !events.contains(&event) {
        info!(event = %event, "registered activation event");
        events.push(event);
        outcome.activation_added = true;
    }

    (manifest, outcome)
}

/// Pretty JSON with two-space indentation and a trailing newline.
pub fn render_manifest(manifest: &Manifest) -> Result<String> {
    let value = manifest.to_value().map_err(Error::Serialize)?;
    let mut rendered = serde_json::to_string_pretty(&value).map_err(Error::Serialize)?;
    rendered.push('\n');
    Ok(rendered)
}

pub fn write_manifest(path: &Path, manifest: &Manifest) -> Result<()> {
    let rendered = render_manifest(manifest)?;
    atomic_write(path, rendered.as_bytes())?;
    info!(manifest = %path.display(), "manifest written");
    Ok(())
}
