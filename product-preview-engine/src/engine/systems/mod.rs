//! Frame loop wiring, shortcuts and teardown.

/// Native keyboard shortcuts that push the same commands as RPC.
pub mod keyboard;

/// Per-frame system sets and their ordering.
pub mod render_loop;

/// Ordered release of everything the viewer created.
pub mod teardown;
