//! Host-side runtime for an embedded terminal engine.
//!
//! The engine itself (emulation, rendering, PTY) sits behind the [`Engine`]
//! and [`EngineSurface`] traits. This crate owns everything the host needs
//! around it:
//! - [`EngineHandle`], the process-wide owner of the engine, its layered
//!   [`Config`] and the generation-checked surface registry,
//! - the wire protocol: [`KeyEvent`], [`Mods`], [`Action`] and friends,
//! - [`RuntimeProxy`], the `Send` side the engine reports through. Its
//!   messages are applied only when the UI thread calls
//!   [`EngineHandle::drain`],
//! - clipboard glue between engine requests and an OS [`Pasteboard`].
//!
//! Hosts usually:
//! 1. Call [`EngineHandle::initialize`] with a factory for their engine.
//! 2. Create surfaces with [`EngineHandle::create_surface`].
//! 3. Drain the handle from the UI loop with an [`ActionDispatcher`] that
//!    routes actions to per-surface bridges.

pub mod action;
pub mod clipboard;
mod config;
mod engine;
mod error;
#[cfg(any(test, feature = "fake"))]
pub mod fake;
mod input;
mod registry;
mod runtime;
mod trigger;

pub use action::{Action, Target};
pub use clipboard::{
    ClipboardContent, ClipboardLocation, ClipboardRequestId, MemoryPasteboard,
    Pasteboard, PasteboardType, PasteboardUrl,
};
pub use config::{Config, ConfigSources, Keybind};
pub use engine::{Engine, EngineSurface, SurfaceOptions};
pub use error::{EngineError, Result};
pub use input::{
    BindingFlags, ColorScheme, ImePoint, KeyAction, KeyEvent, MomentumPhase,
    Mods, MouseButton, MouseState, ScrollMods, SelectionText, SurfaceSize,
};
pub use registry::{SurfaceId, SurfaceRegistry};
pub use runtime::{ActionDispatcher, EngineHandle, RuntimeMessage, RuntimeProxy};
pub use trigger::{NamedKey, Trigger, TriggerKey, TriggerParseError};
