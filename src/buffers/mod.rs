//! Coalescing buffers
//!
//! Small state machines sitting between the classifiers and the session
//! log: consecutive keystrokes collapse into one type-text action,
//! consecutive wheel deltas into one scroll action, and a two-key sliding
//! window feeds hotkey matching. Each buffer is reset whenever continuity
//! breaks (a non-typing key, a click, a scroll halt, or explicit stop).

pub mod hotkey_buffer;
pub mod scroll_buffer;
pub mod type_buffer;

pub use hotkey_buffer::HotkeyBuffer;
pub use scroll_buffer::ScrollBuffer;
pub use type_buffer::TypeBuffer;
