//! Accessibility probe boundary
//!
//! The tracer never talks to the OS accessibility layer directly; it is
//! handed an [`ElementProbe`] at session construction. A probe failure
//! degrades to `None` (the element is logged as unknown) and must never
//! abort the session.

use serde::{Deserialize, Serialize};

/// Screen-space bounding rectangle of a UI element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// What the accessibility layer knows about the element under a point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
    pub name: String,
    pub rect: Option<Rect>,
}

/// Probe into the OS accessibility tree.
pub trait ElementProbe: Send {
    /// Look up the UI element under the given screen coordinates.
    /// Implementations return `None` on any failure.
    fn element_at(&self, x: i32, y: i32) -> Option<ElementInfo>;
}

/// Probe that never resolves an element. Useful for tests and for running
/// without accessibility permissions.
pub struct NullProbe;

impl ElementProbe for NullProbe {
    fn element_at(&self, _x: i32, _y: i32) -> Option<ElementInfo> {
        None
    }
}
