//! JSON-RPC 2.0 command channel from the host page.
//!
//! The host app embeds the viewer in an iframe and drives it with
//! `postMessage`. Every method maps to one `ViewerCommand`; requests that
//! carry an `id` are acknowledged, notifications are applied silently. No
//! viewer state is reported back.
//!
//! ```text
//! Host (Parent Window)   <──postMessage──>  Bevy (iframe)
//!        │                                        │
//!        ├─ Request (with ID) ──────────────────> │
//!        │                                        ├─ Queue ViewerCommand
//!        │ <──────────── {"success": true} (ID) ──┤
//!        │                                        │
//!        ├─ Notification (no ID) ───────────────> ├─ Queue ViewerCommand
//! ```
//!
//! ## Methods
//!
//! - `set_models` `{urls, index}`
//! - `show_model` `{index}`
//! - `set_weather` `{weather}`
//! - `set_skyboxes` `{skyboxes: {state: url}}`
//! - `set_dimensions` `{dimensions: {width, height, thickness, units} | null}`
//! - `set_display_unit` `{unit}`
//! - `set_measurements_visible` `{visible}`
//! - `set_assumed_unit` `{unit}`
//! - `resize` `{width, height}`
//! - `teardown`
//!
//! ## Error Handling
//!
//! - `-32601`: Method not found
//! - `-32602`: Invalid params

/// JSON-RPC 2.0 message handling and the WASM message listener.
pub mod web_rpc;
