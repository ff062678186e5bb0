//! # sheetcalc - Attribute Resolution for Tabletop Character Sheets
//!
//! An engine that computes the effective value of any derived statistic on a
//! character sheet (an attack bonus, a skill modifier, a carried weight, a
//! creature's size) from the modifiers scattered across a character, its
//! equipment, and the effects attached to either:
//! - **Content-driven**: no built-in statistic names; sizes, scalable tables
//!   and propagation rules are data
//! - **Best-effort**: missing or malformed data contributes nothing, nothing
//!   panics or returns an error at resolution time
//! - **Version-cached**: repeated queries are served from a per-entity cache
//!   that expires on its own when the entity changes
//!
//! ## Core Concepts
//!
//! ### Resolution Pipeline
//!
//! ```text
//! [Query] → [Cache] → [GraphWalker] → [ScalingExpander] → filters → [Reduce]
//! ```
//!
//! 1. The **walker** collects candidate modifiers from an entity, its child
//!    components, their effects and loaded consumables
//! 2. The **scaling expander** replaces size-dependent modifiers with the
//!    concrete ones for the entity's resolved size
//! 3. Modifiers are filtered by key, by an attribute filter and by
//!    prerequisites
//! 4. A **reduction strategy** collapses the survivors into one answer
//!
//! ### Size and Scaling
//!
//! Size is itself resolved from modifiers, and scaling needs size. The size
//! walk runs with [`ResolutionContext::skip_size`] set, so it can never start
//! another scaling pass.
//!
//! ## Example
//!
//! ```rust
//! use sheetcalc::*;
//!
//! let config = EngineConfig::default().with_templates(
//!     ScalableTemplates::new()
//!         .with("unarmedDamageScalable", "1d4", "Small", vec![Change::new("unarmedDamage", "1d3")])
//!         .with("unarmedDamageScalable", "1d4", "Medium", vec![Change::new("unarmedDamage", "1d4")]),
//! );
//!
//! let hero = Actor::new("a1", "Kel", "character")
//!     .with_change(Change::new("size", "Medium"))
//!     .with_change(Change::new("unarmedDamageScalable", "1d4"))
//!     .with_item(Item::new("f1", "Skill Focus", "feat").with_change(Change::new("skillBonus", 5)));
//!
//! let mut resolver = AttributeResolver::new(config);
//!
//! let damage = resolver.resolve(&Query::new().entity(&hero).key("unarmedDamage"));
//! assert_eq!(damage.as_values(), Some(&[ModifierValue::from("1d4")][..]));
//!
//! let skill = resolver.resolve(&Query::new().entity(&hero).key("skillBonus").reduce(Reduce::Sum));
//! assert_eq!(skill.as_number(), Some(5.0));
//! ```
//!
//! ## Modules
//!
//! - [`key`] - Attribute keys and key selectors
//! - [`value`] - Modifier values and their coercions
//! - [`modifier`] - Changes, modifier records and prerequisites
//! - [`entity`] - Entity capability traits
//! - [`sheet`] - Plain actor, item and effect types
//! - [`prerequisite`] - Prerequisite gates
//! - [`content`] - Size scale, scalable templates and engine configuration
//! - [`walker`] - Graph walker
//! - [`scaling`] - Scaling expander
//! - [`size`] - Size resolver
//! - [`reduce`] - Reduction strategies
//! - [`resolved`] - Reduction results
//! - [`cache`] - Resolution cache
//! - [`query`] - Query input and filters
//! - [`resolver`] - Main attribute resolver
//! - [`context`] - Resolution flags
//! - [`error`] - Error types

pub mod cache;
pub mod content;
pub mod context;
pub mod entity;
pub mod error;
pub mod key;
pub mod modifier;
pub mod prerequisite;
pub mod query;
pub mod reduce;
pub mod resolved;
pub mod resolver;
pub mod scaling;
pub mod sheet;
pub mod size;
pub mod value;
pub mod walker;

// Re-export main types for convenience
pub use cache::ResolutionCache;
pub use content::{EngineConfig, ScalableTemplates, SizeKeys, SizeScale};
pub use context::ResolutionContext;
pub use entity::{EffectRecordLike, EntityKind, EntityLike, Target};
pub use error::ContentError;
pub use key::{AttributeKey, KeySelector};
pub use modifier::{Change, ModifierMode, ModifierRecord, PrerequisiteExpr};
pub use prerequisite::{AllowAll, FnGate, PrerequisiteGate, StructuralGate};
pub use query::{AttributeFilter, ItemFilter, Query};
pub use reduce::{Reduce, ReduceRequest};
pub use resolved::Reduced;
pub use resolver::{AttributeResolver, ResolverStats};
pub use scaling::ScalingExpander;
pub use sheet::{Actor, Effect, Item};
pub use size::SizeStatistic;
pub use value::ModifierValue;
pub use walker::{Candidate, GraphWalker};
