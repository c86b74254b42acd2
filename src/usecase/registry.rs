//! Use-case registry
//!
//! Explicitly constructed and passed to whoever needs it; there is no global
//! instance. Modules keep their registration order, and re-registering an id
//! swaps the module in place.

use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{debug, error, info, warn};

use super::descriptor::UseCaseDescriptor;
use super::module::UseCase;
use crate::dispatch::ChannelDispatch;
use crate::error::panic_message;
use crate::logging;
use crate::window::WindowHandle;

#[derive(Default)]
pub struct UseCaseRegistry {
    modules: RefCell<Vec<Rc<dyn UseCase>>>,
}

impl UseCaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module keyed by its descriptor id. A duplicate id replaces the earlier module.
    pub fn register(&self, module: Rc<dyn UseCase>) {
        let id = module.descriptor().id.clone();
        let mut modules = self.modules.borrow_mut();
        match modules.iter().position(|m| m.descriptor().id == id) {
            Some(index) => {
                warn!(use_case_id = %id, "Use-case id registered twice; replacing earlier module");
                modules[index] = module;
            }
            None => {
                modules.push(module);
                logging::log_use_case_event(&id, "registered");
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Rc<dyn UseCase>> {
        self.modules
            .borrow()
            .iter()
            .find(|m| m.descriptor().id == id)
            .cloned()
    }

    /// Snapshot of every module in registration order
    pub fn get_all(&self) -> Vec<Rc<dyn UseCase>> {
        self.modules.borrow().clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.modules.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.borrow().is_empty()
    }

    pub fn descriptors(&self) -> Vec<UseCaseDescriptor> {
        self.modules
            .borrow()
            .iter()
            .map(|m| m.descriptor().clone())
            .collect()
    }

    pub fn by_category(&self, category: &str) -> Vec<UseCaseDescriptor> {
        self.descriptors()
            .into_iter()
            .filter(|d| d.category == category)
            .collect()
    }

    pub fn with_tag(&self, tag: &str) -> Vec<UseCaseDescriptor> {
        self.descriptors()
            .into_iter()
            .filter(|d| d.has_tag(tag))
            .collect()
    }

    /// Let every module bind its channels. Calling this twice re-binds them.
    pub fn register_channel_handlers(&self, dispatch: &ChannelDispatch) {
        // Snapshot first: modules may reach back into the registry
        for module in self.get_all() {
            module.register_channel_handlers(dispatch);
            logging::log_use_case_event(&module.descriptor().id, "handlers_registered");
        }
        info!(count = self.len(), "Registered use-case channel handlers");
    }

    /// Tell the module `use_case_id` that a window was opened for it. Unknown ids are ignored.
    pub fn notify_window_created(&self, use_case_id: &str, window: &WindowHandle) {
        match self.get(use_case_id) {
            Some(module) => module.on_window_created(window),
            None => debug!(
                use_case_id = use_case_id,
                window_id = window.id().0,
                "No use-case to notify of window creation"
            ),
        }
    }

    /// Run every module's cleanup in registration order. Failures are logged and skipped.
    pub fn cleanup(&self) {
        for module in self.get_all() {
            let id = module.descriptor().id.clone();
            match catch_unwind(AssertUnwindSafe(|| module.cleanup())) {
                Ok(Ok(())) => logging::log_use_case_event(&id, "cleaned_up"),
                Ok(Err(e)) => error!(use_case_id = %id, error = %e, "Use-case cleanup failed"),
                Err(payload) => error!(
                    use_case_id = %id,
                    error = %panic_message(payload.as_ref()),
                    "Use-case cleanup panicked"
                ),
            }
        }
    }
}
