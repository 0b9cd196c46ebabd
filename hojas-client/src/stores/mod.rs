pub mod auth;
pub mod configuracion;
pub mod notas_buenas;
pub mod personal;

use tokio::sync::watch;

/// Transient request status carried by every data store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStatus {
    pub loading: bool,
    /// User facing message of the last failed action
    pub error: Option<String>,
}

/// Store state that embeds a [StoreStatus]
pub(crate) trait HasStatus {
    fn status_mut(&mut self) -> &mut StoreStatus;
}

/// Marks a store as loading for as long as it lives. Dropping the guard resets the flag, so the
/// reset also happens when the action future is dropped before completing.
pub(crate) struct LoadingGuard<'a, S: HasStatus> {
    state: &'a watch::Sender<S>,
}

impl<'a, S: HasStatus> LoadingGuard<'a, S> {
    /// Set `loading` and clear the previous error
    pub(crate) fn start(state: &'a watch::Sender<S>) -> Self {
        state.send_modify(|s| {
            let status = s.status_mut();
            status.loading = true;
            status.error = None;
        });
        Self { state }
    }

    /// Record the user facing `message` of a failure
    pub(crate) fn fail(&self, message: &str) {
        self.state
            .send_modify(|s| s.status_mut().error = Some(message.to_owned()));
    }
}

impl<S: HasStatus> Drop for LoadingGuard<'_, S> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.status_mut().loading = false);
    }
}
