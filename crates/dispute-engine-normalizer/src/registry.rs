// crates/dispute-engine-normalizer/src/registry.rs
// ============================================================================
// Module: Template Registry
// Description: Keyed lookup of bureau templates with built-in defaults.
// Purpose: Route an incoming document to the right structural template.
// Dependencies: crate::template, dispute-engine-core
// ============================================================================

//! ## Overview
//! The registry maps bureaus to their extraction templates. It ships with
//! built-ins for all four bureaus; callers can override any of them, for
//! example when a bureau rolls out a new export layout before a release.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use dispute_engine_core::Bureau;

use crate::template::BureauTemplate;
use crate::template::builtin_template;

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Registry of bureau templates keyed by bureau.
///
/// # Invariants
/// - Iteration order is deterministic (sorted by bureau).
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    /// Registered templates, one per bureau.
    templates: BTreeMap<Bureau, BureauTemplate>,
}

impl TemplateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }

    /// Creates a registry preloaded with built-in templates for all bureaus.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for bureau in [
            Bureau::Equifax,
            Bureau::Experian,
            Bureau::TransUnion,
            Bureau::Innovis,
        ] {
            registry.register(builtin_template(bureau));
        }
        registry
    }

    /// Registers a template, replacing any existing one for the same bureau.
    pub fn register(&mut self, template: BureauTemplate) {
        self.templates.insert(template.bureau, template);
    }

    /// Returns the template for a bureau, when one is registered.
    #[must_use]
    pub fn get(&self, bureau: Bureau) -> Option<&BureauTemplate> {
        self.templates.get(&bureau)
    }

    /// Returns the number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns `true` when no templates are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
