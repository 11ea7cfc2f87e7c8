//! Version catalogue
//!
//! Recipes are registered under the version step they belong to. A
//! [`MigrationPlan`] for a `(from, to)` request collects every step whose
//! target version lies in `(from, to]`, in ascending version order, so a
//! request spanning several releases runs each release's recipes in turn.

pub mod camel;
pub mod file;

use crate::pattern::{PatternError, TypeAliases};
use crate::template::TemplateError;
use crate::recipe::Recipe;
use crate::tree::ArtifactKind;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

pub use file::{load_dir, load_file, CatalogueFile};

/// Error resolving or loading the catalogue
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("No migration registered from {from} to {to}")]
    UnknownVersionPair { from: Version, to: Version },

    #[error("Invalid recipe {id}: {message}")]
    InvalidRecipe { id: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },
}

impl From<PatternError> for CatalogueError {
    fn from(err: PatternError) -> Self {
        CatalogueError::InvalidRecipe {
            id: "builtin".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<TemplateError> for CatalogueError {
    fn from(err: TemplateError) -> Self {
        CatalogueError::InvalidRecipe {
            id: "builtin".to_string(),
            message: err.to_string(),
        }
    }
}

/// A library release, `major[.minor[.patch]]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let parts: Vec<&str> = text.split('.').collect();
        if text.is_empty() || parts.len() > 3 {
            return Err(format!("Invalid version: {}", s));
        }
        let mut numbers = [0u32; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| format!("Invalid version: {}", s))?;
        }
        Ok(Version::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl TryFrom<String> for Version {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.patch == 0 {
            write!(f, "{}.{}", self.major, self.minor)
        } else {
            write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
        }
    }
}

/// Recipes to run for one `(from, to)` request, in order
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    pub from: Version,
    pub to: Version,
    pub recipes: Vec<Arc<Recipe>>,
    /// Relocated types and packages known to every recipe in the plan
    pub aliases: TypeAliases,
}

impl MigrationPlan {
    pub fn new(from: Version, to: Version) -> Self {
        Self {
            from,
            to,
            recipes: Vec::new(),
            aliases: TypeAliases::new(),
        }
    }

    pub fn with_recipe(mut self, recipe: Recipe) -> Self {
        self.aliases.merge(&recipe.aliases());
        self.recipes.push(Arc::new(recipe));
        self
    }

    /// Recipes that apply to artifacts of `kind`
    pub fn recipes_for(&self, kind: ArtifactKind) -> impl Iterator<Item = &Arc<Recipe>> {
        self.recipes.iter().filter(move |r| r.kind == kind)
    }

    /// The plan minus the recipes with the given ids
    pub fn without(mut self, disabled: &[String]) -> Self {
        self.recipes.retain(|r| !disabled.contains(&r.id));
        self
    }

    pub fn rule_count(&self) -> usize {
        self.recipes.iter().map(|r| r.rules.len()).sum()
    }
}

#[derive(Debug, Clone, Default)]
struct Step {
    recipes: Vec<Arc<Recipe>>,
    aliases: TypeAliases,
}

/// Summary of one registered version step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepInfo {
    pub from: Version,
    pub to: Version,
    pub recipes: Vec<String>,
}

/// Registered version steps
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    steps: BTreeMap<(Version, Version), Step>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in Camel catalogue
    pub fn builtin() -> Result<Self, CatalogueError> {
        let mut catalogue = Self::new();
        for recipe in camel::recipes()? {
            catalogue.register(recipe)?;
        }
        for (from, to, aliases) in camel::aliases() {
            catalogue.register_aliases(from, to, &aliases);
        }
        Ok(catalogue)
    }

    /// Add a recipe under its own version step
    pub fn register(&mut self, recipe: Recipe) -> Result<(), CatalogueError> {
        if recipe.from >= recipe.to {
            return Err(CatalogueError::InvalidRecipe {
                id: recipe.id.clone(),
                message: format!("{} does not precede {}", recipe.from, recipe.to),
            });
        }
        let step = self.steps.entry((recipe.from, recipe.to)).or_default();
        if step.recipes.iter().any(|r| r.id == recipe.id) {
            warn!("Recipe {} registered twice for {} -> {}", recipe.id, recipe.from, recipe.to);
            step.recipes.retain(|r| r.id != recipe.id);
        }
        step.aliases.merge(&recipe.aliases());
        step.recipes.push(Arc::new(recipe));
        Ok(())
    }

    /// Add type aliases to a version step without any recipe
    pub fn register_aliases(&mut self, from: Version, to: Version, aliases: &TypeAliases) {
        self.steps
            .entry((from, to))
            .or_default()
            .aliases
            .merge(aliases);
    }

    /// Load every catalogue file in `dir` and register its contents
    pub fn extend_from_dir(&mut self, dir: &Path) -> Result<usize, CatalogueError> {
        let mut count = 0;
        for loaded in load_dir(dir)? {
            count += loaded.recipes.len();
            self.absorb(loaded)?;
        }
        Ok(count)
    }

    /// Register a loaded catalogue file
    pub fn absorb(&mut self, loaded: file::LoadedCatalogue) -> Result<(), CatalogueError> {
        for recipe in loaded.recipes {
            self.register(recipe)?;
        }
        for (from, to, aliases) in loaded.aliases {
            self.register_aliases(from, to, &aliases);
        }
        Ok(())
    }

    /// Build the plan taking artifacts from `from` to `to`.
    ///
    /// An exact step is used on its own; otherwise every step whose target
    /// lies in `(from, to]` is chained, ordered by target then origin.
    pub fn resolve(&self, from: Version, to: Version) -> Result<MigrationPlan, CatalogueError> {
        let unknown = || CatalogueError::UnknownVersionPair { from, to };
        if from >= to {
            return Err(unknown());
        }

        let chain: Vec<(&(Version, Version), &Step)> = match self.steps.get_key_value(&(from, to)) {
            Some(exact) => vec![exact],
            None => {
                let mut steps: Vec<_> = self
                    .steps
                    .iter()
                    .filter(|((_, target), _)| *target > from && *target <= to)
                    .collect();
                steps.sort_by_key(|((origin, target), _)| (*target, *origin));
                steps
            }
        };
        if chain.iter().all(|(_, step)| step.recipes.is_empty()) {
            return Err(unknown());
        }

        let mut plan = MigrationPlan::new(from, to);
        for (_, step) in &chain {
            plan.recipes.extend(step.recipes.iter().cloned());
            plan.aliases.merge(&step.aliases);
        }
        info!(
            "Resolved {} -> {}: {} step(s), {} recipe(s)",
            from,
            to,
            chain.len(),
            plan.recipes.len()
        );
        Ok(plan)
    }

    /// Registered steps in version order
    pub fn steps(&self) -> Vec<StepInfo> {
        self.steps
            .iter()
            .map(|((from, to), step)| StepInfo {
                from: *from,
                to: *to,
                recipes: step.recipes.iter().map(|r| r.id.clone()).collect(),
            })
            .collect()
    }

    pub fn recipe(&self, id: &str) -> Option<&Arc<Recipe>> {
        self.steps
            .values()
            .flat_map(|s| s.recipes.iter())
            .find(|r| r.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::pattern::Pattern;
    use crate::recipe::RewriteRule;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    fn recipe(id: &str, from: &str, to: &str) -> Recipe {
        Recipe::new(id, v(from), v(to), ArtifactKind::Markup).with_rule(RewriteRule::new(
            id,
            Pattern::path("a").unwrap(),
            Action::rename("b"),
        ))
    }

    fn catalogue() -> Catalogue {
        let mut catalogue = Catalogue::new();
        catalogue.register(recipe("two-three", "2", "3.0")).unwrap();
        catalogue.register(recipe("three-one", "3.0", "3.1")).unwrap();
        catalogue.register(recipe("three-two", "3.1", "3.2")).unwrap();
        catalogue.register(recipe("four", "3.2", "4.0")).unwrap();
        catalogue
    }

    fn ids(plan: &MigrationPlan) -> Vec<&str> {
        plan.recipes.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_version_parse_and_order() {
        assert_eq!(v("3"), Version::new(3, 0, 0));
        assert_eq!(v("4.18.1"), Version::new(4, 18, 1));
        assert!(v("3.9") < v("3.10"));
        assert!(v("2") < v("3.0"));
        assert_eq!(v("3.1").to_string(), "3.1");
        assert_eq!(v("3.1.2").to_string(), "3.1.2");
        for bad in ["", "a", "1.2.3.4", "1..2", "-1"] {
            assert!(bad.parse::<Version>().is_err(), "{:?}", bad);
        }
    }

    #[test]
    fn test_version_serde() {
        let parsed: Version = serde_json::from_str("\"4.18\"").unwrap();
        assert_eq!(parsed, Version::new(4, 18, 0));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"4.18\"");
        assert!(serde_json::from_str::<Version>("\"four\"").is_err());
    }

    #[test]
    fn test_exact_pair() {
        let plan = catalogue().resolve(v("3.0"), v("3.1")).unwrap();
        assert_eq!(ids(&plan), vec!["three-one"]);
    }

    #[test]
    fn test_chained_steps() {
        let plan = catalogue().resolve(v("2"), v("3.2")).unwrap();
        assert_eq!(ids(&plan), vec!["two-three", "three-one", "three-two"]);

        let plan = catalogue().resolve(v("2.25"), v("4.0")).unwrap();
        assert_eq!(plan.recipes.len(), 4);
    }

    #[test]
    fn test_unknown_pair() {
        let catalogue = catalogue();
        for (from, to) in [("3.2", "3.3"), ("3.1", "3.0"), ("3.0", "3.0"), ("5", "6")] {
            let err = catalogue.resolve(v(from), v(to)).unwrap_err();
            assert!(
                matches!(err, CatalogueError::UnknownVersionPair { .. }),
                "{} -> {}",
                from,
                to
            );
        }
    }

    #[test]
    fn test_register_rejects_backwards_step() {
        let mut catalogue = Catalogue::new();
        let err = catalogue.register(recipe("bad", "3.1", "3.0")).unwrap_err();
        assert!(matches!(err, CatalogueError::InvalidRecipe { .. }));
    }

    #[test]
    fn test_reregistering_replaces() {
        let mut catalogue = catalogue();
        catalogue.register(recipe("three-one", "3.0", "3.1")).unwrap();
        assert_eq!(catalogue.steps()[1].recipes, vec!["three-one"]);
    }

    #[test]
    fn test_plan_aliases_and_filtering() {
        let mut catalogue = catalogue();
        let mut aliases = TypeAliases::new();
        aliases.add_package("org.example.old", "org.example.new");
        catalogue.register_aliases(v("3.0"), v("3.1"), &aliases);

        let plan = catalogue.resolve(v("2"), v("3.1")).unwrap();
        assert!(plan.aliases.equivalent("org.example.old.A", "org.example.new.A"));

        let plan = plan.without(&["two-three".to_string()]);
        assert_eq!(ids(&plan), vec!["three-one"]);
        assert_eq!(plan.recipes_for(ArtifactKind::Markup).count(), 1);
        assert_eq!(plan.recipes_for(ArtifactKind::Code).count(), 0);
    }

    #[test]
    fn test_builtin_catalogue() {
        let catalogue = Catalogue::builtin().unwrap();
        assert!(catalogue.recipe("camel-3.0-java-api").is_some());
        let plan = catalogue.resolve(v("2"), v("3.0")).unwrap();
        assert!(plan.rule_count() > 10);
        assert!(plan.aliases.equivalent(
            "org.apache.camel.impl.SimpleRegistry",
            "org.apache.camel.support.SimpleRegistry"
        ));
        assert!(catalogue.resolve(v("4.17"), v("4.18")).is_ok());
    }
}
