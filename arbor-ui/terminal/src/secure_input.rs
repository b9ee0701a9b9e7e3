use std::collections::HashMap;

use arbor_engine::SurfaceId;

/// Process-wide OS secure keyboard entry.
pub trait SecureEventInput {
    fn enable(&mut self);
    fn disable(&mut self);
}

/// Secure keyboard entry shared by every view.
///
/// Engaged while the global flag is set or any scope asks for it, and only
/// while the app is active: the OS grant cannot be held across app
/// switches, so it is dropped on resign and taken again on activation.
pub struct SecureInputContext {
    backend: Box<dyn SecureEventInput>,
    global: bool,
    scoped: HashMap<SurfaceId, bool>,
    app_active: bool,
    engaged: bool,
}

impl SecureInputContext {
    pub fn new(backend: Box<dyn SecureEventInput>) -> Self {
        Self {
            backend,
            global: false,
            scoped: HashMap::new(),
            app_active: true,
            engaged: false,
        }
    }

    /// Whether some scope or the global flag wants secure entry.
    pub fn desired(&self) -> bool {
        self.global || self.scoped.values().any(|enabled| *enabled)
    }

    /// Whether the OS resource is currently held.
    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub fn global(&self) -> bool {
        self.global
    }

    pub fn set_global(&mut self, enabled: bool) {
        self.global = enabled;
        self.update();
    }

    pub fn toggle_global(&mut self) {
        self.set_global(!self.global);
    }

    pub fn set_scoped(&mut self, scope: SurfaceId, enabled: bool) {
        self.scoped.insert(scope, enabled);
        self.update();
    }

    pub fn remove_scoped(&mut self, scope: SurfaceId) {
        if self.scoped.remove(&scope).is_some() {
            self.update();
        }
    }

    pub fn app_did_become_active(&mut self) {
        self.app_active = true;
        self.update();
    }

    pub fn app_did_resign_active(&mut self) {
        self.app_active = false;
        self.update();
    }

    fn update(&mut self) {
        let engage = self.app_active && self.desired();
        if engage == self.engaged {
            return;
        }
        if engage {
            self.backend.enable();
        } else {
            self.backend.disable();
        }
        self.engaged = engage;
        log::debug!("secure keyboard entry engaged: {engage}");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use arbor_engine::SurfaceRegistry;

    use super::*;

    #[derive(Clone, Default)]
    struct RecordingBackend(Rc<RefCell<Vec<bool>>>);

    impl SecureEventInput for RecordingBackend {
        fn enable(&mut self) {
            self.0.borrow_mut().push(true);
        }

        fn disable(&mut self) {
            self.0.borrow_mut().push(false);
        }
    }

    fn context() -> (SecureInputContext, RecordingBackend) {
        let backend = RecordingBackend::default();
        (SecureInputContext::new(Box::new(backend.clone())), backend)
    }

    #[test]
    fn given_two_scopes_when_one_is_removed_then_entry_stays_engaged() {
        let (mut secure, backend) = context();
        let mut registry = SurfaceRegistry::new();
        let (a, b) = (registry.insert(), registry.insert());

        secure.set_scoped(a, true);
        secure.set_scoped(b, true);
        secure.remove_scoped(a);
        assert!(secure.is_engaged());

        secure.set_scoped(b, false);

        assert!(!secure.is_engaged());
        assert_eq!(*backend.0.borrow(), vec![true, false]);
    }

    #[test]
    fn given_inactive_app_when_secure_is_desired_then_it_is_released_until_activation()
     {
        let (mut secure, backend) = context();
        secure.set_global(true);

        secure.app_did_resign_active();
        assert!(!secure.is_engaged());
        assert!(secure.desired());

        secure.app_did_become_active();
        assert!(secure.is_engaged());
        assert_eq!(*backend.0.borrow(), vec![true, false, true]);
    }

    #[test]
    fn given_global_toggle_when_scopes_are_off_then_global_decides() {
        let (mut secure, _backend) = context();

        secure.toggle_global();
        assert!(secure.is_engaged());
        secure.toggle_global();
        assert!(!secure.is_engaged());
    }
}
