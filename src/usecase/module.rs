use super::descriptor::UseCaseDescriptor;
use crate::dispatch::ChannelDispatch;
use crate::window::WindowHandle;

/// A pluggable feature module hosted by the control process.
///
/// Every hook has a no-op default; implement only what the module needs.
/// Hooks take `&self`, so modules holding state use interior mutability.
pub trait UseCase {
    fn descriptor(&self) -> &UseCaseDescriptor;

    /// Bind this module's request channels. Called once at startup.
    fn register_channel_handlers(&self, _dispatch: &ChannelDispatch) {}

    /// A window was opened for this module.
    fn on_window_created(&self, _window: &WindowHandle) {}

    /// Release resources at shutdown. Errors are logged by the registry.
    fn cleanup(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
