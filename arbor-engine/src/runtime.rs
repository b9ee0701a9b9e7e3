use flume::{Receiver, Sender};

use crate::action::{Action, Target};
use crate::clipboard::{
    ClipboardContent, ClipboardLocation, ClipboardRequestId, MemoryPasteboard,
    Pasteboard, opinionated_contents, pasteboard_items,
};
use crate::config::{Config, ConfigSources};
use crate::engine::{Engine, EngineSurface, SurfaceOptions};
use crate::error::Result;
use crate::input::ColorScheme;
use crate::registry::{SurfaceId, SurfaceRegistry};
use crate::trigger::Trigger;

/// Callback traffic from the engine, queued until the UI thread drains it.
#[derive(Debug)]
pub enum RuntimeMessage {
    Wakeup,
    Action {
        target: Target,
        action: Action,
    },
    ReadClipboard {
        surface: SurfaceId,
        location: ClipboardLocation,
        request: ClipboardRequestId,
    },
    ConfirmReadClipboard {
        surface: SurfaceId,
        text: String,
        request: ClipboardRequestId,
    },
    WriteClipboard {
        location: ClipboardLocation,
        items: Vec<ClipboardContent>,
        confirm: bool,
    },
    CloseSurface {
        surface: SurfaceId,
        process_alive: bool,
    },
}

/// Thread-safe sender the engine uses for its callbacks.
///
/// Nothing here touches host state: every call only enqueues a
/// [`RuntimeMessage`]. Sends after the handle is gone are dropped.
#[derive(Debug, Clone)]
pub struct RuntimeProxy {
    sender: Sender<RuntimeMessage>,
}

impl RuntimeProxy {
    /// Request a tick on the UI thread.
    pub fn wakeup(&self) {
        self.send(RuntimeMessage::Wakeup);
    }

    pub fn action(&self, target: Target, action: Action) {
        self.send(RuntimeMessage::Action { target, action });
    }

    pub fn read_clipboard(
        &self,
        surface: SurfaceId,
        location: ClipboardLocation,
        request: ClipboardRequestId,
    ) {
        self.send(RuntimeMessage::ReadClipboard {
            surface,
            location,
            request,
        });
    }

    pub fn confirm_read_clipboard(
        &self,
        surface: SurfaceId,
        text: String,
        request: ClipboardRequestId,
    ) {
        self.send(RuntimeMessage::ConfirmReadClipboard {
            surface,
            text,
            request,
        });
    }

    pub fn write_clipboard(
        &self,
        location: ClipboardLocation,
        items: Vec<ClipboardContent>,
        confirm: bool,
    ) {
        self.send(RuntimeMessage::WriteClipboard {
            location,
            items,
            confirm,
        });
    }

    pub fn close_surface(&self, surface: SurfaceId, process_alive: bool) {
        self.send(RuntimeMessage::CloseSurface {
            surface,
            process_alive,
        });
    }

    fn send(&self, message: RuntimeMessage) {
        let _ = self.sender.send(message);
    }
}

/// Host side receiver of drained engine callbacks.
pub trait ActionDispatcher {
    /// Deliver an action addressed to a live surface. Returns whether the
    /// action was consumed.
    fn dispatch_action(
        &mut self,
        engine: &mut EngineHandle,
        surface: SurfaceId,
        action: Action,
    ) -> bool;

    /// The engine asked to close a live surface.
    fn close_surface(
        &mut self,
        engine: &mut EngineHandle,
        surface: SurfaceId,
        process_alive: bool,
    );

    /// The stored configuration was replaced.
    fn config_changed(&mut self, _engine: &EngineHandle) {}
}

/// Process-wide owner of the engine instance.
///
/// Constructed once at startup and passed by reference. Holds the loaded
/// configuration, the registry of live surfaces used for global broadcasts
/// and the last color scheme so late surfaces match the rest.
pub struct EngineHandle {
    sources: ConfigSources,
    config: Config,
    engine: Box<dyn Engine>,
    registry: SurfaceRegistry,
    last_color_scheme: Option<ColorScheme>,
    pasteboard: Box<dyn Pasteboard>,
    sender: Sender<RuntimeMessage>,
    receiver: Receiver<RuntimeMessage>,
}

impl EngineHandle {
    /// Load configuration and construct the engine.
    ///
    /// A failure here is a fatal startup error: there is no degraded mode
    /// without an engine.
    pub fn initialize<F>(sources: ConfigSources, factory: F) -> Result<Self>
    where
        F: FnOnce(&Config, RuntimeProxy) -> Result<Box<dyn Engine>>,
    {
        let config = Config::load(&sources)?;
        let (sender, receiver) = flume::unbounded();
        let proxy = RuntimeProxy {
            sender: sender.clone(),
        };
        let engine = factory(&config, proxy)?;
        log::debug!("engine initialized");

        Ok(Self {
            sources,
            config,
            engine,
            registry: SurfaceRegistry::new(),
            last_color_scheme: None,
            pasteboard: Box::new(MemoryPasteboard::new()),
            sender,
            receiver,
        })
    }

    /// Use `pasteboard` for clipboard callbacks.
    pub fn with_pasteboard(mut self, pasteboard: Box<dyn Pasteboard>) -> Self {
        self.pasteboard = pasteboard;
        self
    }

    pub fn proxy(&self) -> RuntimeProxy {
        RuntimeProxy {
            sender: self.sender.clone(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sources(&self) -> &ConfigSources {
        &self.sources
    }

    pub fn pasteboard(&self) -> &dyn Pasteboard {
        self.pasteboard.as_ref()
    }

    /// Whether the scrollbar is enabled. Only `never` hides it.
    pub fn should_show_scrollbar(&self) -> bool {
        self.config.get("scrollbar") != Some("never")
    }

    /// Trigger bound to an engine binding action such as `new_tab`.
    pub fn keyboard_shortcut(&self, action: &str) -> Option<&Trigger> {
        self.config.trigger(action)
    }

    pub fn set_app_focus(&mut self, focused: bool) {
        self.engine.set_focus(focused);
    }

    pub fn keyboard_changed(&mut self) {
        self.engine.keyboard_changed();
    }

    pub fn tick(&mut self) {
        self.engine.tick();
    }

    /// Create and register a surface.
    ///
    /// A trailing newline is appended to the initial input so the command
    /// runs. Registration re-applies the last known color scheme.
    pub fn create_surface(
        &mut self,
        mut options: SurfaceOptions,
    ) -> Result<SurfaceId> {
        options.initial_input = options.initial_input.map(|input| {
            if input.ends_with('\n') {
                input
            } else {
                format!("{input}\n")
            }
        });

        let id = self.registry.insert();
        if let Err(err) = self.engine.new_surface(id, &options) {
            self.registry.remove(id);
            return Err(err);
        }
        self.register_surface(id);
        log::debug!("surface {id} created");
        Ok(id)
    }

    fn register_surface(&mut self, id: SurfaceId) {
        let Some(scheme) = self.last_color_scheme else {
            return;
        };
        if let Some(surface) = self.engine.surface(id) {
            surface.set_color_scheme(scheme);
        }
    }

    /// Unregister `id` and free the engine surface. Stale ids are ignored.
    pub fn free_surface(&mut self, id: SurfaceId) -> bool {
        if !self.registry.remove(id) {
            return false;
        }
        self.engine.free_surface(id);
        log::debug!("surface {id} freed");
        true
    }

    pub fn is_valid(&self, id: SurfaceId) -> bool {
        self.registry.contains(id)
    }

    pub fn surface_count(&self) -> usize {
        self.registry.len()
    }

    /// Engine surface for a live id. Stale ids yield `None`.
    pub fn surface_mut(
        &mut self,
        id: SurfaceId,
    ) -> Option<&mut dyn EngineSurface> {
        if !self.registry.contains(id) {
            return None;
        }
        self.engine.surface(id)
    }

    pub fn last_color_scheme(&self) -> Option<ColorScheme> {
        self.last_color_scheme
    }

    /// Apply `scheme` app-wide and to every registered surface.
    pub fn set_color_scheme(&mut self, scheme: ColorScheme) {
        self.last_color_scheme = Some(scheme);
        self.engine.set_color_scheme(scheme);
        for id in self.registry.ids() {
            if let Some(surface) = self.engine.surface(id) {
                surface.set_color_scheme(scheme);
            }
        }
    }

    /// Re-apply configuration to `target`.
    ///
    /// A soft reload pushes the stored config. A hard reload re-reads every
    /// source and applies the fresh copy without storing it; the engine
    /// announces the result through a config-change action.
    pub fn reload_config(&mut self, soft: bool, target: Target) {
        if soft {
            let config = self.config.clone();
            self.apply_config(&config, target);
            return;
        }

        match Config::load(&self.sources) {
            Ok(fresh) => self.apply_config(&fresh, target),
            Err(err) => log::warn!("config reload failed: {err}"),
        }
    }

    fn apply_config(&mut self, config: &Config, target: Target) {
        match target {
            Target::App => self.engine.update_config(config),
            Target::Surface(id) => {
                if let Some(surface) = self.surface_mut(id) {
                    surface.update_config(config);
                }
            },
        }
    }

    /// Number of callbacks waiting for [`EngineHandle::drain`].
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Process queued engine callbacks on the calling (UI) thread.
    ///
    /// Messages queued while draining are left for the next call.
    pub fn drain<D>(&mut self, dispatcher: &mut D) -> usize
    where
        D: ActionDispatcher + ?Sized,
    {
        let messages: Vec<RuntimeMessage> = self.receiver.try_iter().collect();
        let count = messages.len();
        for message in messages {
            self.process(message, dispatcher);
        }
        count
    }

    fn process<D>(&mut self, message: RuntimeMessage, dispatcher: &mut D)
    where
        D: ActionDispatcher + ?Sized,
    {
        match message {
            RuntimeMessage::Wakeup => self.engine.tick(),
            RuntimeMessage::Action { target, action } => {
                self.process_action(target, action, dispatcher)
            },
            RuntimeMessage::ReadClipboard {
                surface,
                location,
                request,
            } => {
                let value =
                    opinionated_contents(self.pasteboard.as_ref(), location)
                        .unwrap_or_default();
                if let Some(surface) = self.surface_mut(surface) {
                    surface.complete_clipboard_request(request, &value, false);
                }
            },
            RuntimeMessage::ConfirmReadClipboard {
                surface,
                text,
                request,
            } => {
                if let Some(surface) = self.surface_mut(surface) {
                    surface.complete_clipboard_request(request, &text, true);
                }
            },
            RuntimeMessage::WriteClipboard {
                location, items, ..
            } => {
                let items = pasteboard_items(items);
                if !items.is_empty() {
                    self.pasteboard.write(location, items);
                }
            },
            RuntimeMessage::CloseSurface {
                surface,
                process_alive,
            } => {
                if self.registry.contains(surface) {
                    dispatcher.close_surface(self, surface, process_alive);
                }
            },
        }
    }

    fn process_action<D>(
        &mut self,
        target: Target,
        action: Action,
        dispatcher: &mut D,
    ) where
        D: ActionDispatcher + ?Sized,
    {
        match &action {
            Action::ConfigChange { config } => {
                self.config = config.as_ref().clone();
                log::debug!("engine config replaced");
                dispatcher.config_changed(self);
            },
            Action::ReloadConfig { soft } => self.reload_config(*soft, target),
            _ => {},
        }

        let Target::Surface(surface) = target else {
            return;
        };
        if self.registry.contains(surface) {
            dispatcher.dispatch_action(self, surface, action);
        }
    }
}
