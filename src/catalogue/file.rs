//! Catalogue files
//!
//! Recipes can be declared in YAML or JSON next to the built-in ones:
//!
//! ```yaml
//! recipes:
//!   - id: acme-3.0
//!     display_name: "Acme API changes for 3.0"
//!     from: "2"
//!     to: "3.0"
//!     kind: code
//!     rules:
//!       - id: registry-put
//!         match:
//!           signature: "org.acme.Registry put(java.lang.String, *)"
//!         action:
//!           rename: bind
//!       - id: exchange-route-stop
//!         match:
//!           signature: "org.acme.Exchange setProperty(*, *)"
//!           constants: { 0: org.acme.Exchange.ROUTE_STOP }
//!         action:
//!           retarget:
//!             template: "#{any()}.setRouteStop(#{any()})"
//!             args: [receiver, 1]
//!
//! aliases:
//!   - from: "2"
//!     to: "3.0"
//!     packages: { org.acme.impl: org.acme.support }
//! ```

use super::{CatalogueError, Version};
use crate::action::{Action, ArgRef};
use crate::pattern::{MethodPattern, Pattern, PatternError, TypeAliases};
use crate::recipe::{Recipe, RewriteRule};
use crate::tree::ArtifactKind;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level structure of a catalogue file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogueFile {
    pub recipes: Vec<RecipeDefinition>,
    pub aliases: Vec<AliasDefinition>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecipeDefinition {
    pub id: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    pub from: Version,
    pub to: Version,
    pub kind: ArtifactKind,

    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleDefinition {
    pub id: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "match")]
    pub pattern: MatchDefinition,

    pub action: ActionDefinition,
}

/// What a rule matches; exactly one kind of pattern must be given
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MatchDefinition {
    pub signature: Option<String>,
    /// Argument index to required constant, for `signature` and `initializer`
    pub constants: BTreeMap<usize, String>,
    pub path: Option<String>,
    #[serde(rename = "type")]
    pub type_ref: Option<String>,
    pub annotation: Option<String>,
    /// Attribute an `annotation` must carry
    pub attribute: Option<String>,
    pub initializer: Option<String>,
    /// Key glob
    pub property: Option<String>,
    /// Exact value a `property` must have
    pub value: Option<String>,
    pub any: Vec<MatchDefinition>,
}

/// What a rule does; exactly one action must be given
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ActionDefinition {
    pub rename: Option<String>,
    pub wrap_with_accessor: Option<String>,
    pub retarget: Option<RetargetDefinition>,
    pub rename_attribute: Option<RenameAttributeDefinition>,
    pub change_value: Option<String>,
    /// Drop the matched node
    pub remove: bool,
    /// Manual-migration note inserted as a comment
    pub annotate: Option<String>,
    /// Manual-migration note reported without touching the source
    pub notice: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetargetDefinition {
    pub template: String,
    #[serde(default)]
    pub args: Vec<ArgDefinition>,
}

/// `receiver`, or an argument index written as a number or a string
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ArgDefinition {
    Index(usize),
    Name(String),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenameAttributeDefinition {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AliasDefinition {
    pub from: Version,
    pub to: Version,
    #[serde(default)]
    pub types: BTreeMap<String, String>,
    #[serde(default)]
    pub packages: BTreeMap<String, String>,
}

/// Validated contents of a catalogue file
#[derive(Debug, Clone, Default)]
pub struct LoadedCatalogue {
    pub recipes: Vec<Recipe>,
    pub aliases: Vec<(Version, Version, TypeAliases)>,
}

impl CatalogueFile {
    /// Parse YAML (JSON being a subset, both are accepted)
    pub fn from_yaml(content: &str, file: &str) -> Result<Self, CatalogueError> {
        serde_yaml::from_str(content).map_err(|e| CatalogueError::Parse {
            file: file.to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_json(content: &str, file: &str) -> Result<Self, CatalogueError> {
        serde_json::from_str(content).map_err(|e| CatalogueError::Parse {
            file: file.to_string(),
            message: e.to_string(),
        })
    }

    /// Turn the definitions into recipes, rejecting anything malformed
    pub fn build(self) -> Result<LoadedCatalogue, CatalogueError> {
        let recipes = self
            .recipes
            .into_iter()
            .map(RecipeDefinition::build)
            .collect::<Result<Vec<_>, _>>()?;
        let aliases = self
            .aliases
            .into_iter()
            .map(|def| {
                let mut aliases = TypeAliases::new();
                for (old, new) in &def.types {
                    aliases.add_type(old, new);
                }
                for (old, new) in &def.packages {
                    aliases.add_package(old, new);
                }
                (def.from, def.to, aliases)
            })
            .collect();
        Ok(LoadedCatalogue { recipes, aliases })
    }
}

impl RecipeDefinition {
    fn build(self) -> Result<Recipe, CatalogueError> {
        let mut recipe = Recipe::new(&self.id, self.from, self.to, self.kind);
        if let Some(name) = &self.display_name {
            recipe = recipe.with_display_name(name);
        }
        if let Some(description) = &self.description {
            recipe = recipe.with_description(description);
        }
        for rule in self.rules {
            let invalid = |message: String| CatalogueError::InvalidRecipe {
                id: format!("{}/{}", self.id, rule.id),
                message,
            };
            let pattern = rule.pattern.build().map_err(invalid)?;
            let action = rule.action.build().map_err(invalid)?;
            let mut built = RewriteRule::new(&rule.id, pattern, action);
            if let Some(description) = &rule.description {
                built = built.with_description(description);
            }
            recipe = recipe.with_rule(built);
        }
        Ok(recipe)
    }
}

impl MatchDefinition {
    fn build(&self) -> Result<Pattern, String> {
        let given = [
            self.signature.is_some(),
            self.path.is_some(),
            self.type_ref.is_some(),
            self.annotation.is_some(),
            self.initializer.is_some(),
            self.property.is_some(),
            !self.any.is_empty(),
        ];
        match given.iter().filter(|g| **g).count() {
            0 => return Err("match needs one of signature, path, type, annotation, initializer, property or any".to_string()),
            1 => {}
            _ => return Err("match takes exactly one pattern".to_string()),
        }

        if let Some(text) = &self.signature {
            return Ok(Pattern::Signature(self.method(text)?));
        }
        if let Some(text) = &self.initializer {
            return Ok(Pattern::Initializer(self.method(text)?));
        }
        if let Some(text) = &self.path {
            return Pattern::path(text).map_err(|e| e.to_string());
        }
        if let Some(fqn) = &self.type_ref {
            return Ok(Pattern::type_ref(fqn));
        }
        if let Some(fqn) = &self.annotation {
            return Ok(Pattern::annotation(fqn, self.attribute.as_deref()));
        }
        if let Some(key) = &self.property {
            return Pattern::property(key, self.value.as_deref()).map_err(|e| e.to_string());
        }
        let alternatives = self
            .any
            .iter()
            .map(MatchDefinition::build)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Pattern::Any(alternatives))
    }

    fn method(&self, text: &str) -> Result<MethodPattern, String> {
        let mut method: MethodPattern = text.parse().map_err(|e: PatternError| e.to_string())?;
        for (index, constant) in &self.constants {
            if *index >= method.params.len() && !method.accepts_arity(index + 1) {
                return Err(format!(
                    "constant for argument {} but {} takes {} argument(s)",
                    index,
                    method.name,
                    method.params.len()
                ));
            }
            method = method.with_constant(*index, constant);
        }
        Ok(method)
    }
}

impl ActionDefinition {
    fn build(&self) -> Result<Action, String> {
        let given = [
            self.rename.is_some(),
            self.wrap_with_accessor.is_some(),
            self.retarget.is_some(),
            self.rename_attribute.is_some(),
            self.change_value.is_some(),
            self.remove,
            self.annotate.is_some(),
            self.notice.is_some(),
        ];
        if given.iter().filter(|g| **g).count() != 1 {
            return Err("action takes exactly one of rename, wrap_with_accessor, retarget, rename_attribute, change_value, remove, annotate or notice".to_string());
        }

        if let Some(name) = &self.rename {
            return Ok(Action::rename(name));
        }
        if let Some(accessor) = &self.wrap_with_accessor {
            return Ok(Action::wrap_with_accessor(accessor));
        }
        if let Some(retarget) = &self.retarget {
            let args = retarget
                .args
                .iter()
                .map(|arg| match arg {
                    ArgDefinition::Index(i) => Ok(ArgRef::Arg(*i)),
                    ArgDefinition::Name(name) => name.parse::<ArgRef>(),
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Action::retarget(&retarget.template, args).map_err(|e| e.to_string());
        }
        if let Some(rename) = &self.rename_attribute {
            return Ok(Action::rename_attribute(&rename.from, &rename.to));
        }
        if let Some(value) = &self.change_value {
            return Ok(Action::change_value(value));
        }
        if self.remove {
            return Ok(Action::remove());
        }
        if let Some(message) = &self.annotate {
            return Ok(Action::annotate(message));
        }
        let message = self.notice.as_deref().unwrap_or_default();
        Ok(Action::notice(message))
    }
}

/// Load and validate one catalogue file
pub fn load_file(path: &Path) -> Result<LoadedCatalogue, CatalogueError> {
    let content = std::fs::read_to_string(path)?;
    let name = path.display().to_string();
    let file = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => CatalogueFile::from_json(&content, &name)?,
        _ => CatalogueFile::from_yaml(&content, &name)?,
    };
    let loaded = file.build()?;
    debug!("Loaded {} recipe(s) from {}", loaded.recipes.len(), name);
    Ok(loaded)
}

/// Load every `*.yaml`, `*.yml` and `*.json` file in `dir`, in name order
pub fn load_dir(dir: &Path) -> Result<Vec<LoadedCatalogue>, CatalogueError> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if path.is_file() && matches!(ext, "yaml" | "yml" | "json") {
            paths.push(path);
        }
    }
    paths.sort();
    paths.iter().map(|p| load_file(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::Catalogue;
    use std::fs;
    use tempfile::TempDir;

    const ACME: &str = r##"
recipes:
  - id: acme-3.0
    display_name: "Acme API changes for 3.0"
    from: "2"
    to: "3.0"
    kind: code
    rules:
      - id: registry-put
        description: "Registry.put() is now bind()"
        match:
          signature: "org.acme.Registry put(java.lang.String, *)"
        action:
          rename: bind
      - id: route-stop
        match:
          signature: "org.acme.Exchange setProperty(*, *)"
          constants: { 0: org.acme.Exchange.ROUTE_STOP }
        action:
          retarget:
            template: "#{any()}.setRouteStop(#{any()})"
            args: [receiver, 1]
  - id: acme-3.0-xml
    from: "2"
    to: "3.0"
    kind: markup
    rules:
      - id: custom
        match:
          any:
            - path: "loadBalance/custom"
            - path: "balance/custom"
        action:
          rename: customLoadBalancer
aliases:
  - from: "2"
    to: "3.0"
    packages:
      org.acme.impl: org.acme.support
"##;

    #[test]
    fn test_yaml_catalogue() {
        let loaded = CatalogueFile::from_yaml(ACME, "acme.yaml")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(loaded.recipes.len(), 2);
        let api = &loaded.recipes[0];
        assert_eq!(api.display_name, "Acme API changes for 3.0");
        assert_eq!(api.rules.len(), 2);
        assert_eq!(api.rules[0].summary(), "Registry.put() is now bind()");
        match &api.rules[1].pattern {
            Pattern::Signature(method) => {
                assert_eq!(method.constants.get(&0).map(String::as_str), Some("org.acme.Exchange.ROUTE_STOP"));
            }
            other => panic!("unexpected pattern {}", other),
        }
        assert_eq!(loaded.recipes[1].kind, ArtifactKind::Markup);
        assert!(loaded.aliases[0].2.equivalent("org.acme.impl.Thing", "org.acme.support.Thing"));
    }

    #[test]
    fn test_json_catalogue() {
        let json = r#"{"recipes": [{"id": "p", "from": "3.22", "to": "4.0", "kind": "properties",
            "rules": [{"id": "policy", "match": {"property": "camel.threadpool.*", "value": "Discard"},
                       "action": {"change_value": "Abort"}}]}]}"#;
        let loaded = CatalogueFile::from_json(json, "p.json").unwrap().build().unwrap();
        assert_eq!(loaded.recipes[0].rules[0].id, "policy");
    }

    #[test]
    fn test_build_descriptor_rules() {
        let yaml = r#"
recipes:
  - id: acme-pom
    from: "1"
    to: "2"
    kind: markup
    rules:
      - id: drop-legacy
        match:
          path: "/project//dependency[groupId='com.acme'][artifactId='acme-legacy']"
        action:
          remove: true
      - id: rename-client
        match:
          path: "dependency[groupId='com.acme']/artifactId[.='acme-client']"
        action:
          change_value: acme-http-client
"#;
        let loaded = CatalogueFile::from_yaml(yaml, "pom.yaml").unwrap().build().unwrap();
        let rules = &loaded.recipes[0].rules;
        assert!(matches!(rules[0].action, Action::RemoveConstruct));
        assert_eq!(rules[1].action.to_string(), "set value to acme-http-client");
    }

    #[test]
    fn test_rejects_bad_definitions() {
        let cases = [
            ("no pattern", r#"{"id": "r", "match": {}, "action": {"rename": "x"}}"#),
            ("two patterns", r#"{"id": "r", "match": {"path": "a", "type": "b.C"}, "action": {"rename": "x"}}"#),
            ("bad signature", r#"{"id": "r", "match": {"signature": "put(x)"}, "action": {"rename": "x"}}"#),
            ("bad path", r#"{"id": "r", "match": {"path": "a///b"}, "action": {"rename": "x"}}"#),
            ("two actions", r#"{"id": "r", "match": {"path": "a"}, "action": {"rename": "x", "notice": "y"}}"#),
            ("arity", r##"{"id": "r", "match": {"signature": "a.B c(*)"}, "action": {"retarget": {"template": "#{any()}.d(#{any()})", "args": ["receiver"]}}}"##),
            ("bad arg", r##"{"id": "r", "match": {"signature": "a.B c(*)"}, "action": {"retarget": {"template": "#{any()}.d()", "args": ["first"]}}}"##),
            ("bad predicate", r#"{"id": "r", "match": {"path": "dependency[artifactId=x]"}, "action": {"remove": true}}"#),
            ("remove and rename", r#"{"id": "r", "match": {"path": "a"}, "action": {"remove": true, "rename": "b"}}"#),
            ("constant index", r#"{"id": "r", "match": {"signature": "a.B c(*)", "constants": {"3": "a.B.X"}}, "action": {"rename": "d"}}"#),
        ];
        for (name, rule) in cases {
            let json = format!(
                r#"{{"recipes": [{{"id": "bad", "from": "1", "to": "2", "kind": "code", "rules": [{}]}}]}}"#,
                rule
            );
            let result = CatalogueFile::from_json(&json, "bad.json").unwrap().build();
            assert!(
                matches!(result, Err(CatalogueError::InvalidRecipe { .. })),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_parse_errors_name_the_file() {
        let err = CatalogueFile::from_yaml("recipes: [", "broken.yaml").unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
        let err = CatalogueFile::from_yaml("recipes: [{id: x, from: two, to: '3', kind: code}]", "v.yaml")
            .unwrap_err();
        assert!(matches!(err, CatalogueError::Parse { .. }));
    }

    #[test]
    fn test_load_dir() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("acme.yaml"), ACME).unwrap();
        fs::write(temp.path().join("notes.txt"), "not a catalogue").unwrap();

        let mut catalogue = Catalogue::new();
        assert_eq!(catalogue.extend_from_dir(temp.path()).unwrap(), 2);
        let plan = catalogue
            .resolve("2".parse().unwrap(), "3.0".parse().unwrap())
            .unwrap();
        assert_eq!(plan.recipes.len(), 2);
        assert!(plan.aliases.equivalent("org.acme.impl.Thing", "org.acme.support.Thing"));
    }
}
