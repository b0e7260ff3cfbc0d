//! Typed view of an extension `package.json`.
//!
//! Only the fields the repack pipeline reads or writes are typed; everything
//! else is carried through `extra` untouched. Defaulting rules:
//!
//! - `version`, `main`: absent stays `None`; blank values are treated as
//!   absent by the resolvers, never here.
//! - `contributes`: absent stays `None` until a command is registered.
//! - `contributes.commands`, `activationEvents`: absent stays `None` and reads
//!   as an empty list through the accessors.
//!
//! Serialization restores the key order of the parsed document, so a patched
//! manifest diffs cleanly against the original.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributes: Option<Contributes>,

    #[serde(
        rename = "activationEvents",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub activation_events: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// Parsed document, kept only as a key-order template for serialization.
    #[serde(skip)]
    layout: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Contributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<Vec<CommandDescriptor>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    pub command: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Manifest {
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        let mut manifest: Manifest = serde_json::from_value(value.clone())?;
        manifest.layout = Some(value);
        Ok(manifest)
    }

    /// Serialize back to JSON, keys in their original order where they existed.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        let mut value = serde_json::to_value(self)?;
        if let Some(layout) = &self.layout {
            align_key_order(&mut value, layout);
        }
        Ok(value)
    }

    pub fn commands(&self) -> &[CommandDescriptor] {
        self.contributes
            .as_ref()
            .and_then(|c| c.commands.as_deref())
            .unwrap_or(&[])
    }

    pub fn commands_mut(&mut self) -> &mut Vec<CommandDescriptor> {
        self.contributes
            .get_or_insert_with(Contributes::default)
            .commands
            .get_or_insert_with(Vec::new)
    }

    pub fn activation_events(&self) -> &[String] {
        self.activation_events.as_deref().unwrap_or(&[])
    }

    pub fn activation_events_mut(&mut self) -> &mut Vec<String> {
        self.activation_events.get_or_insert_with(Vec::new)
    }
}

impl CommandDescriptor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            title: None,
            category: None,
            extra: Map::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Reorder the object keys of `value` to follow `layout`.
///
/// Keys present in `layout` come first in layout order, new keys follow in
/// their serialized order. A longer array is aligned on its tail, since new
/// command descriptors are only ever inserted at the front.
fn align_key_order(value: &mut Value, layout: &Value) {
    match (value, layout) {
        (Value::Object(map), Value::Object(template)) => {
            let mut current = std::mem::take(map);
            for (key, template_child) in template {
                if let Some(mut child) = current.remove(key) {
                    align_key_order(&mut child, template_child);
                    map.insert(key.clone(), child);
                }
            }
            map.extend(current);
        }
        (Value::Array(items), Value::Array(template)) if items.len() >= template.len() => {
            let inserted = items.len() - template.len();
            for (item, template_item) in items[inserted..].iter_mut().zip(template) {
                align_key_order(item, template_item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_known_fields_and_keeps_extras() {
        let manifest = Manifest::from_value(json!({
            "name": "vscode-augment",
            "version": "0.1.0",
            "main": "./out/extension.js",
            "engines": {"vscode": "^1.80.0"},
            "contributes": {
                "commands": [{"command": "a.b", "title": "A", "icon": "$(gear)"}],
                "configuration": {"title": "Augment"}
            },
            "activationEvents": ["onStartupFinished"]
        }))
        .unwrap();

        assert_eq!(manifest.version.as_deref(), Some("0.1.0"));
        assert_eq!(manifest.main.as_deref(), Some("./out/extension.js"));
        assert_eq!(manifest.commands().len(), 1);
        assert_eq!(manifest.commands()[0].extra["icon"], json!("$(gear)"));
        assert_eq!(manifest.activation_events(), ["onStartupFinished"]);
        assert_eq!(manifest.extra["engines"], json!({"vscode": "^1.80.0"}));
    }

    #[test]
    fn missing_lists_read_as_empty() {
        let manifest = Manifest::from_value(json!({"version": "1.0.0"})).unwrap();
        assert!(manifest.commands().is_empty());
        assert!(manifest.activation_events().is_empty());
        assert!(manifest.contributes.is_none());
    }

    #[test]
    fn serialization_preserves_original_key_order() {
        let original = json!({
            "name": "ext",
            "displayName": "Ext",
            "version": "1.0.0",
            "activationEvents": [],
            "main": "out/main.js",
            "contributes": {"menus": {}, "commands": []},
            "scripts": {"build": "tsc"}
        });
        let manifest = Manifest::from_value(original.clone()).unwrap();
        let value = manifest.to_value().unwrap();

        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(
            keys,
            ["name", "displayName", "version", "activationEvents", "main", "contributes", "scripts"]
        );
        let contributes: Vec<_> = value["contributes"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(contributes, ["menus", "commands"]);
        assert_eq!(value, original);
    }

    #[test]
    fn new_keys_follow_existing_ones() {
        let mut manifest = Manifest::from_value(json!({"name": "ext", "version": "1.0.0"})).unwrap();
        manifest.activation_events_mut().push("onCommand:x".into());
        manifest.commands_mut().push(CommandDescriptor::new("x").title("X"));

        let value = manifest.to_value().unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["name", "version", "contributes", "activationEvents"]);
    }

    #[test]
    fn existing_commands_keep_key_order_after_front_insert() {
        let mut manifest = Manifest::from_value(json!({
            "version": "1.0.0",
            "contributes": {
                "commands": [
                    {"title": "Hello", "command": "sample.hello"},
                    {"category": "S", "command": "sample.bye", "title": "Bye"}
                ]
            }
        }))
        .unwrap();
        manifest
            .commands_mut()
            .insert(0, CommandDescriptor::new("new.cmd").title("New"));

        let value = manifest.to_value().unwrap();
        let commands = value["contributes"]["commands"].as_array().unwrap();
        let keys = |i: usize| -> Vec<String> {
            commands[i].as_object().unwrap().keys().cloned().collect()
        };
        assert_eq!(commands[0]["command"], "new.cmd");
        assert_eq!(keys(1), ["title", "command"]);
        assert_eq!(keys(2), ["category", "command", "title"]);
    }

    #[test]
    fn non_string_version_is_a_parse_error() {
        assert!(Manifest::from_value(json!({"version": 3})).is_err());
    }
}
