//! Resolution context.
//!
//! The flags a resolution threads through every recursive call. They are a
//! closed set of named booleans so the size/scaling recursion guard is
//! visible in the types rather than hidden in a list of strings.

use serde::{Deserialize, Serialize};

/// Flags controlling one resolution and everything it recurses into.
///
/// # Examples
///
/// ```rust
/// use sheetcalc::ResolutionContext;
///
/// let ctx = ResolutionContext::new();
/// assert!(!ctx.skip_size);
///
/// let inner = ctx.for_size_resolution();
/// assert!(inner.skip_size);
/// assert!(inner.recursive);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolutionContext {
    /// Do not run the scaling pass; set while resolving size itself.
    pub skip_size: bool,
    /// Inner call of a larger resolution: skip per-record prerequisite
    /// filtering, the outer call does it.
    pub recursive: bool,
    /// The query comes from a primary-entity computation; apply each record's
    /// parent prerequisite against that primary entity.
    pub requested_by_primary: bool,
    /// Do not emit the entity's own changes.
    pub skip_local: bool,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for the guarded size sub-resolution.
    ///
    /// Size-skip and recursion are forced on; nothing reached from here may
    /// start another size resolution.
    pub fn for_size_resolution(self) -> Self {
        Self {
            skip_size: true,
            recursive: true,
            requested_by_primary: false,
            skip_local: false,
        }
    }

    /// Context for walking a child component on behalf of its owner.
    pub fn for_child(self) -> Self {
        Self {
            recursive: true,
            skip_local: false,
            ..self
        }
    }

    pub fn with_skip_size(mut self, skip_size: bool) -> Self {
        self.skip_size = skip_size;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_requested_by_primary(mut self, requested: bool) -> Self {
        self.requested_by_primary = requested;
        self
    }

    pub fn with_skip_local(mut self, skip_local: bool) -> Self {
        self.skip_local = skip_local;
        self
    }
}
