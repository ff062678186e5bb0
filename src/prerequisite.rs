//! Prerequisite gates.
//!
//! The engine asks a gate one question: does this expression hold for this
//! entity? Whatever cannot be evaluated counts as "no".

use crate::entity::EntityLike;
use crate::modifier::PrerequisiteExpr;

/// Boolean eligibility predicate evaluated against an entity.
pub trait PrerequisiteGate {
    fn meets(&self, expr: &PrerequisiteExpr, target: &dyn EntityLike) -> bool;
}

/// Gate that accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PrerequisiteGate for AllowAll {
    fn meets(&self, _expr: &PrerequisiteExpr, _target: &dyn EntityLike) -> bool {
        true
    }
}

/// Evaluates the structural subset of the prerequisite language.
///
/// | type | holds when |
/// |---|---|
/// | `AND` | every child holds (vacuously true) |
/// | `OR` | some child holds |
/// | `NOT` | the first child does not hold |
/// | `HAS` | the target or one of its children is named `requirement` |
/// | `LEVEL` | the target has taken at least `requirement` levels |
/// | `TYPE` | the target's content type equals `requirement` |
///
/// Names compare case-insensitively. Unknown types fail closed.
///
/// # Examples
///
/// ```rust
/// use sheetcalc::{Actor, Item, PrerequisiteExpr, PrerequisiteGate, StructuralGate};
///
/// let hero = Actor::new("a1", "Kel", "character")
///     .with_item(Item::new("f1", "Weapon Focus", "feat"));
///
/// let gate = StructuralGate;
/// assert!(gate.meets(&PrerequisiteExpr::new("HAS", "weapon focus"), &hero));
/// assert!(!gate.meets(&PrerequisiteExpr::new("HAS", "Dodge"), &hero));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralGate;

impl StructuralGate {
    fn requirement<'e>(expr: &'e PrerequisiteExpr) -> Option<&'e str> {
        expr.requirement.as_deref().map(str::trim)
    }
}

impl PrerequisiteGate for StructuralGate {
    fn meets(&self, expr: &PrerequisiteExpr, target: &dyn EntityLike) -> bool {
        match expr.kind.to_ascii_uppercase().as_str() {
            "AND" => expr.children.iter().all(|c| self.meets(c, target)),
            "OR" => expr.children.iter().any(|c| self.meets(c, target)),
            "NOT" => expr
                .children
                .first()
                .map(|c| !self.meets(c, target))
                .unwrap_or(false),
            "HAS" => match Self::requirement(expr) {
                Some(name) => {
                    target.name().eq_ignore_ascii_case(name)
                        || target
                            .children()
                            .iter()
                            .any(|c| c.name().eq_ignore_ascii_case(name))
                }
                None => false,
            },
            "LEVEL" => Self::requirement(expr)
                .and_then(|r| r.parse::<u32>().ok())
                .map(|level| target.levels_taken() >= level)
                .unwrap_or(false),
            "TYPE" => Self::requirement(expr)
                .map(|t| target.content_type().eq_ignore_ascii_case(t))
                .unwrap_or(false),
            other => {
                tracing::trace!(kind = other, "unknown prerequisite type, failing closed");
                false
            }
        }
    }
}

/// Adapter turning a closure into a gate.
pub struct FnGate<F>(pub F);

impl<F> PrerequisiteGate for FnGate<F>
where
    F: Fn(&PrerequisiteExpr, &dyn EntityLike) -> bool,
{
    fn meets(&self, expr: &PrerequisiteExpr, target: &dyn EntityLike) -> bool {
        (self.0)(expr, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::{Actor, Item};

    fn hero() -> Actor {
        Actor::new("a1", "Kel", "character")
            .with_item(Item::new("f1", "Dodge", "feat"))
            .with_item(Item::new("c1", "Soldier", "class").with_levels(3))
    }

    #[test]
    fn test_logical_combinators() {
        let gate = StructuralGate;
        let actor = hero();
        let has_dodge = PrerequisiteExpr::new("HAS", "Dodge");
        let has_mobility = PrerequisiteExpr::new("HAS", "Mobility");

        assert!(gate.meets(
            &PrerequisiteExpr::group("OR", vec![has_dodge.clone(), has_mobility.clone()]),
            &actor
        ));
        assert!(!gate.meets(
            &PrerequisiteExpr::group("AND", vec![has_dodge.clone(), has_mobility.clone()]),
            &actor
        ));
        assert!(gate.meets(&PrerequisiteExpr::group("NOT", vec![has_mobility]), &actor));
        assert!(gate.meets(&PrerequisiteExpr::group("AND", vec![]), &actor));
    }

    #[test]
    fn test_level_and_type() {
        let gate = StructuralGate;
        let class = Item::new("c1", "Soldier", "class").with_levels(3);
        assert!(gate.meets(&PrerequisiteExpr::new("LEVEL", "3"), &class));
        assert!(!gate.meets(&PrerequisiteExpr::new("LEVEL", "4"), &class));
        assert!(!gate.meets(&PrerequisiteExpr::new("LEVEL", "three"), &class));
        assert!(gate.meets(&PrerequisiteExpr::new("type", "CLASS"), &class));
    }

    #[test]
    fn test_unknown_type_fails_closed() {
        let gate = StructuralGate;
        assert!(!gate.meets(&PrerequisiteExpr::new("BAB", "5"), &hero()));
    }

    #[test]
    fn test_fn_gate() {
        let gate = FnGate(|expr: &PrerequisiteExpr, _: &dyn EntityLike| expr.kind == "yes");
        assert!(gate.meets(&PrerequisiteExpr::new("yes", ""), &hero()));
        assert!(!gate.meets(&PrerequisiteExpr::new("no", ""), &hero()));
    }
}
