//! Control-process bootstrap
//!
//! Owns one registry, one dispatch layer and one window manager, and drives
//! them through the process lifecycle:
//!
//! ```text
//! register(module)*  →  start()  →  open_window(..)*  →  shutdown()
//!                       │                │                 │
//!                       │                │                 ├─ close_all_windows
//!                       │                │                 └─ registry.cleanup
//!                       │                ├─ windows.create_window
//!                       │                └─ registry.notify_window_created
//!                       ├─ built-in shell:* channels
//!                       └─ registry.register_channel_handlers
//! ```

use std::cell::Cell;
use std::rc::Rc;

use anyhow::Context;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::ShellConfig;
use crate::dispatch::{ChannelDispatch, IpcMain};
use crate::error::{Result, ShellError};
use crate::usecase::{UseCase, UseCaseRegistry};
use crate::window::{CreatedWindow, SurfaceFactory, WindowId, WindowManager, WindowOverrides};

pub const CHANNEL_LIST_USE_CASES: &str = "shell:list-use-cases";
pub const CHANNEL_OPEN_WINDOW: &str = "shell:open-window";
pub const CHANNEL_FOCUS_WINDOW: &str = "shell:focus-window";
pub const CHANNEL_CLOSE_WINDOW: &str = "shell:close-window";
pub const CHANNEL_LIST_WINDOWS: &str = "shell:list-windows";

pub struct Shell {
    config: ShellConfig,
    registry: Rc<UseCaseRegistry>,
    dispatch: Rc<ChannelDispatch>,
    windows: Rc<WindowManager>,
    started: Cell<bool>,
    shut_down: Cell<bool>,
}

impl Shell {
    pub fn new(ipc: Rc<dyn IpcMain>, factory: Rc<dyn SurfaceFactory>, config: ShellConfig) -> Self {
        let windows = WindowManager::new(factory, config.get_window_options());
        Self {
            config,
            registry: Rc::new(UseCaseRegistry::new()),
            dispatch: Rc::new(ChannelDispatch::new(ipc)),
            windows: Rc::new(windows),
            started: Cell::new(false),
            shut_down: Cell::new(false),
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn registry(&self) -> &UseCaseRegistry {
        &self.registry
    }

    pub fn dispatch(&self) -> &ChannelDispatch {
        &self.dispatch
    }

    pub fn windows(&self) -> &WindowManager {
        &self.windows
    }

    /// Register a module unless config disables it. Returns whether it was registered.
    pub fn register(&self, module: Rc<dyn UseCase>) -> bool {
        let id = module.descriptor().id.clone();
        if !self.config.is_use_case_enabled(&id) {
            info!(use_case_id = %id, "Use-case disabled by config");
            return false;
        }
        if self.started.get() {
            warn!(use_case_id = %id, "Use-case registered after start; its channels are not bound");
        }
        self.registry.register(module);
        true
    }

    /// Bind built-in and module channels. Only the first call has any effect.
    pub fn start(&self) {
        if self.started.replace(true) {
            warn!("Shell already started; ignoring repeated start");
            return;
        }
        self.register_builtin_channels();
        self.registry.register_channel_handlers(&self.dispatch);
        info!(
            event_type = "shell_lifecycle",
            action = "started",
            use_cases = self.registry.len(),
            "Shell started"
        );
    }

    pub fn is_started(&self) -> bool {
        self.started.get()
    }

    /// Open a window for `use_case_id` and notify that module.
    pub fn open_window(&self, use_case_id: &str, overrides: &WindowOverrides) -> Result<CreatedWindow> {
        open_use_case_window(&self.registry, &self.windows, use_case_id, overrides)
    }

    /// Open a window that belongs to no use-case
    pub fn open_main_window(&self, overrides: &WindowOverrides) -> Result<CreatedWindow> {
        self.windows.create_window(overrides)
    }

    /// Focus a tracked window, restoring it first if minimized.
    pub fn focus_window(&self, id: WindowId) -> Result<()> {
        focus_tracked_window(&self.windows, id)
    }

    /// Close a tracked window.
    pub fn close_window(&self, id: WindowId) -> Result<()> {
        close_tracked_window(&self.windows, id)
    }

    /// Send to a window by id. Unknown or closed windows return false.
    pub fn send_to(&self, id: WindowId, channel: &str, data: &Value) -> bool {
        match self.windows.get_window_by_id(id) {
            Some(handle) => self.dispatch.send_message(&handle, channel, data),
            None => false,
        }
    }

    /// Send to every live window. Returns the delivery count.
    pub fn broadcast(&self, channel: &str, data: &Value) -> usize {
        let windows = self.windows.get_all_windows();
        self.dispatch.broadcast_message(windows.values(), channel, data)
    }

    /// Close every window, then run module cleanup. Only the first call has any effect.
    pub fn shutdown(&self) {
        if self.shut_down.replace(true) {
            return;
        }
        self.windows.close_all_windows();
        self.registry.cleanup();
        info!(event_type = "shell_lifecycle", action = "shutdown", "Shell shut down");
    }

    fn register_builtin_channels(&self) {
        let registry = Rc::clone(&self.registry);
        self.dispatch
            .register_handler(CHANNEL_LIST_USE_CASES, move |_ctx, args| {
                let registry = Rc::clone(&registry);
                async move {
                    let descriptors = match optional_str(&args, 0) {
                        Some(category) => registry.by_category(category),
                        None => registry.descriptors(),
                    };
                    Ok(descriptors)
                }
            });

        let registry = Rc::clone(&self.registry);
        let windows = Rc::clone(&self.windows);
        self.dispatch
            .register_handler(CHANNEL_OPEN_WINDOW, move |_ctx, args| {
                let registry = Rc::clone(&registry);
                let windows = Rc::clone(&windows);
                async move {
                    let use_case_id = args
                        .first()
                        .and_then(Value::as_str)
                        .context("expected a use-case id")?;
                    let overrides: WindowOverrides = match args.get(1) {
                        Some(Value::Null) | None => WindowOverrides::default(),
                        Some(raw) => serde_json::from_value(raw.clone())
                            .context("invalid window options")?,
                    };
                    let created =
                        open_use_case_window(&registry, &windows, use_case_id, &overrides)?;
                    Ok(json!({ "id": created.id }))
                }
            });

        let windows = Rc::clone(&self.windows);
        self.dispatch
            .register_handler(CHANNEL_FOCUS_WINDOW, move |_ctx, args| {
                let windows = Rc::clone(&windows);
                async move {
                    focus_tracked_window(&windows, window_id_arg(&args)?)?;
                    Ok(true)
                }
            });

        let windows = Rc::clone(&self.windows);
        self.dispatch
            .register_handler(CHANNEL_CLOSE_WINDOW, move |_ctx, args| {
                let windows = Rc::clone(&windows);
                async move {
                    close_tracked_window(&windows, window_id_arg(&args)?)?;
                    Ok(true)
                }
            });

        let windows = Rc::clone(&self.windows);
        self.dispatch
            .register_handler(CHANNEL_LIST_WINDOWS, move |_ctx, _args| {
                let windows = Rc::clone(&windows);
                async move { Ok(windows.window_ids()) }
            });
    }
}

fn open_use_case_window(
    registry: &UseCaseRegistry,
    windows: &WindowManager,
    use_case_id: &str,
    overrides: &WindowOverrides,
) -> Result<CreatedWindow> {
    let module = registry
        .get(use_case_id)
        .ok_or_else(|| ShellError::UnknownUseCase(use_case_id.to_string()))?;

    let mut overrides = overrides.clone();
    if overrides.title.is_none() {
        overrides.title = Some(module.descriptor().title.clone());
    }

    let created = windows.create_window(&overrides)?;
    registry.notify_window_created(use_case_id, &created.handle);
    Ok(created)
}

fn focus_tracked_window(windows: &WindowManager, id: WindowId) -> Result<()> {
    if windows.get_window_by_id(id).is_none() {
        return Err(ShellError::UnknownWindow(id));
    }
    windows.focus_window(id);
    Ok(())
}

fn close_tracked_window(windows: &WindowManager, id: WindowId) -> Result<()> {
    if windows.close_window(id) {
        Ok(())
    } else {
        Err(ShellError::UnknownWindow(id))
    }
}

fn optional_str(args: &[Value], index: usize) -> Option<&str> {
    args.get(index).and_then(Value::as_str)
}

fn window_id_arg(args: &[Value]) -> anyhow::Result<WindowId> {
    args.first()
        .and_then(Value::as_u64)
        .map(WindowId)
        .context("expected a window id")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessIpc, HeadlessSurfaceFactory};
    use crate::usecase::UseCaseDescriptor;
    use crate::window::WindowHandle;
    use futures::executor::block_on;
    use std::cell::RefCell;

    struct Counter {
        descriptor: UseCaseDescriptor,
        opened: RefCell<Vec<WindowId>>,
        cleanups: Cell<usize>,
    }

    impl Counter {
        fn new(id: &str) -> Rc<Self> {
            Rc::new(Counter {
                descriptor: UseCaseDescriptor::new(id, format!("{} title", id), "demo", vec![]),
                opened: RefCell::new(Vec::new()),
                cleanups: Cell::new(0),
            })
        }
    }

    impl UseCase for Counter {
        fn descriptor(&self) -> &UseCaseDescriptor {
            &self.descriptor
        }

        fn register_channel_handlers(&self, dispatch: &ChannelDispatch) {
            dispatch.register_handler("counter:hello", |_ctx, _args| async { Ok("hi") });
        }

        fn on_window_created(&self, window: &WindowHandle) {
            self.opened.borrow_mut().push(window.id());
        }

        fn cleanup(&self) -> anyhow::Result<()> {
            self.cleanups.set(self.cleanups.get() + 1);
            Ok(())
        }
    }

    fn shell(config: ShellConfig) -> (Shell, Rc<HeadlessIpc>, Rc<HeadlessSurfaceFactory>) {
        let ipc = Rc::new(HeadlessIpc::new());
        let factory = Rc::new(HeadlessSurfaceFactory::new());
        let shell = Shell::new(ipc.clone(), factory.clone(), config);
        (shell, ipc, factory)
    }

    #[test]
    fn test_start_binds_builtin_and_module_channels() {
        let (shell, ipc, _) = shell(ShellConfig::default());
        shell.register(Counter::new("counter"));
        shell.start();

        assert!(ipc.is_bound(CHANNEL_LIST_USE_CASES));
        assert!(ipc.is_bound("counter:hello"));
        let response = block_on(ipc.invoke("counter:hello", None, vec![])).unwrap();
        assert_eq!(response["data"], json!("hi"));
    }

    #[test]
    fn test_open_window_notifies_module_and_titles_window() {
        let (shell, _, factory) = shell(ShellConfig::default());
        let counter = Counter::new("counter");
        shell.register(counter.clone());
        shell.start();

        let created = shell
            .open_window("counter", &WindowOverrides::default())
            .unwrap();

        assert_eq!(*counter.opened.borrow(), vec![created.id]);
        assert_eq!(
            factory.last_created().unwrap().options().title.as_deref(),
            Some("counter title")
        );
    }

    #[test]
    fn test_open_window_for_unknown_use_case_fails() {
        let (shell, _, factory) = shell(ShellConfig::default());
        let err = shell
            .open_window("ghost", &WindowOverrides::default())
            .unwrap_err();
        assert!(matches!(err, ShellError::UnknownUseCase(ref id) if id == "ghost"));
        assert!(factory.surfaces().is_empty());
    }

    #[test]
    fn test_disabled_use_case_is_not_registered() {
        let config = ShellConfig {
            disabled_use_cases: Some(vec!["counter".to_string()]),
            ..Default::default()
        };
        let (shell, _, _) = shell(config);
        assert!(!shell.register(Counter::new("counter")));
        assert!(shell.registry().is_empty());
    }

    #[test]
    fn test_shutdown_closes_windows_then_cleans_up_once() {
        let (shell, _, factory) = shell(ShellConfig::default());
        let counter = Counter::new("counter");
        shell.register(counter.clone());
        shell.start();
        shell.open_window("counter", &WindowOverrides::default()).unwrap();
        shell.open_main_window(&WindowOverrides::default()).unwrap();

        shell.shutdown();
        shell.shutdown();

        assert!(shell.windows().get_all_windows().is_empty());
        assert!(factory.surfaces().iter().all(|s| s.close_requests() == 1));
        assert_eq!(counter.cleanups.get(), 1);
    }

    #[test]
    fn test_builtin_open_and_list_windows() {
        let (shell, ipc, _) = shell(ShellConfig::default());
        shell.register(Counter::new("counter"));
        shell.start();

        let opened = block_on(ipc.invoke(
            CHANNEL_OPEN_WINDOW,
            None,
            vec![json!("counter"), json!({"width": 640})],
        ))
        .unwrap();
        assert_eq!(opened, json!({"success": true, "data": {"id": 1}}));

        let listed = block_on(ipc.invoke(CHANNEL_LIST_WINDOWS, None, vec![])).unwrap();
        assert_eq!(listed["data"], json!([1]));

        let missing = block_on(ipc.invoke(CHANNEL_OPEN_WINDOW, None, vec![json!("ghost")]))
            .unwrap();
        assert_eq!(
            missing,
            json!({"success": false, "error": "Unknown use-case: ghost"})
        );
    }

    #[test]
    fn test_open_window_with_bad_options_reports_cause() {
        let (shell, ipc, _) = shell(ShellConfig::default());
        shell.register(Counter::new("counter"));
        shell.start();

        let response = block_on(ipc.invoke(
            CHANNEL_OPEN_WINDOW,
            None,
            vec![json!("counter"), json!({"width": "wide"})],
        ))
        .unwrap();
        let error = response["error"].as_str().unwrap();
        assert!(error.starts_with("invalid window options: invalid type"), "{}", error);
        assert_eq!(shell.windows().window_count(), 0);
    }

    #[test]
    fn test_builtin_focus_and_close_window() {
        let (shell, ipc, factory) = shell(ShellConfig::default());
        shell.start();
        let created = shell.open_main_window(&WindowOverrides::default()).unwrap();
        factory.last_created().unwrap().minimize();

        let focused =
            block_on(ipc.invoke(CHANNEL_FOCUS_WINDOW, None, vec![json!(created.id)])).unwrap();
        assert_eq!(focused["data"], json!(true));
        assert_eq!(factory.last_created().unwrap().focus_count(), 1);

        let closed =
            block_on(ipc.invoke(CHANNEL_CLOSE_WINDOW, None, vec![json!(created.id)])).unwrap();
        assert_eq!(closed["data"], json!(true));

        let bad = block_on(ipc.invoke(CHANNEL_FOCUS_WINDOW, None, vec![json!("x")])).unwrap();
        assert_eq!(bad["error"], json!("expected a window id"));
    }

    #[test]
    fn test_focus_and_close_untracked_window_fail() {
        let (shell, ipc, factory) = shell(ShellConfig::default());
        shell.start();
        let created = shell.open_main_window(&WindowOverrides::default()).unwrap();
        factory.last_created().unwrap().simulate_user_close();

        let focused =
            block_on(ipc.invoke(CHANNEL_FOCUS_WINDOW, None, vec![json!(created.id)])).unwrap();
        assert_eq!(focused, json!({"success": false, "error": "Unknown window: 1"}));

        let closed = block_on(ipc.invoke(CHANNEL_CLOSE_WINDOW, None, vec![json!(9)])).unwrap();
        assert_eq!(closed, json!({"success": false, "error": "Unknown window: 9"}));

        assert!(matches!(
            shell.focus_window(WindowId(9)),
            Err(ShellError::UnknownWindow(WindowId(9)))
        ));
        assert!(matches!(
            shell.close_window(created.id),
            Err(ShellError::UnknownWindow(_))
        ));
    }

    #[test]
    fn test_list_use_cases_by_category() {
        let (shell, ipc, _) = shell(ShellConfig::default());
        shell.register(Counter::new("counter"));
        shell.start();

        let all = block_on(ipc.invoke(CHANNEL_LIST_USE_CASES, None, vec![])).unwrap();
        assert_eq!(all["data"][0]["id"], json!("counter"));

        let none =
            block_on(ipc.invoke(CHANNEL_LIST_USE_CASES, None, vec![json!("system")])).unwrap();
        assert_eq!(none["data"], json!([]));
    }

    #[test]
    fn test_send_to_and_broadcast() {
        let (shell, _, factory) = shell(ShellConfig::default());
        shell.start();
        let first = shell.open_main_window(&WindowOverrides::default()).unwrap();
        shell.open_main_window(&WindowOverrides::default()).unwrap();

        assert!(shell.send_to(first.id, "note", &json!("only first")));
        assert!(!shell.send_to(WindowId(42), "note", &json!("nobody")));
        assert_eq!(shell.broadcast("theme", &json!("dark")), 2);

        assert_eq!(factory.surfaces()[0].received().len(), 2);
        assert_eq!(factory.surfaces()[1].received().len(), 1);
    }
}
