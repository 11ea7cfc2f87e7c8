//! Molt - Rule-driven API migration engine
//!
//! Molt upgrades Java sources, XML route definitions and properties files
//! from one library version to another. Every file is parsed into a lossless
//! tree, rewritten by versioned recipes and written back so that anything no
//! rule touched comes out byte-identical.
//!
//! # Architecture
//!
//! ```text
//! CLI/API -> Catalogue -> MigrationPlan -> Pipeline -> Recipe -> Tree -> Writer
//! ```
//!
//! The catalogue resolves a `(from, to)` version pair into an ordered plan of
//! recipes. The pipeline parses each artifact, runs the recipes for its kind
//! in plan order and collects changes and diagnostics. Files that fail to
//! parse are reported and skipped; the rest of the batch carries on.
//!
//! # Custom catalogues
//!
//! Extra recipes can be declared in YAML or JSON (e.g. `acme.yaml`):
//!
//! ```yaml
//! recipes:
//!   - id: acme-2.0-java
//!     from: "1.9"
//!     to: "2.0"
//!     kind: code
//!     rules:
//!       - id: acme-client-send
//!         match:
//!           signature: "com.acme.Client send(java.lang.String)"
//!         action:
//!           rename: dispatch
//! ```

pub mod action;
pub mod catalogue;
pub mod config;
pub mod diagnostic;
pub mod lang;
pub mod output;
pub mod pattern;
pub mod pipeline;
pub mod recipe;
pub mod template;
pub mod tree;
pub mod writer;

// Re-export main types
pub use action::{Action, ArgRef, Effect};
pub use catalogue::{Catalogue, CatalogueError, MigrationPlan, Version};
pub use config::Config;
pub use diagnostic::{Diagnostic, DiagnosticKind, Location, Severity};
pub use lang::{Language, Languages, ParseError};
pub use output::{JsonFormatter, OutputFormatter, TextFormatter};
pub use pattern::{MatchOutcome, Pattern, PatternError, TypeAliases};
pub use pipeline::{Artifact, ArtifactState, BatchResult, Pipeline};
pub use recipe::{Recipe, RecipeRun, RewriteRule};
pub use template::{Template, TemplateError};
pub use tree::{ArtifactKind, Node, Tree};
pub use writer::{WriteMode, Writer};
