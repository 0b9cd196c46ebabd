use std::sync::Arc;

use hojas_common::Personal;
use tokio::sync::{watch, Mutex};

use super::{HasStatus, LoadingGuard, StoreStatus};
use crate::http::ApiTransport;

const PERSONAL_PATH: &str = "/api/personal";
const FETCH_FAILED: &str = "No se pudo cargar la lista de personal.";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonalState {
    pub personal: Vec<Personal>,
    pub status: StoreStatus,
}

impl HasStatus for PersonalState {
    fn status_mut(&mut self) -> &mut StoreStatus {
        &mut self.status
    }
}

/// Personnel roster. Loaded once and reused; concurrent loads share a single request.
pub struct PersonalStore<T> {
    api: Arc<T>,
    state: Arc<watch::Sender<PersonalState>>,
    in_flight: Arc<Mutex<()>>,
}

impl<T> Clone for PersonalStore<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            state: self.state.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}

impl<T: ApiTransport> PersonalStore<T> {
    pub fn new(api: Arc<T>) -> Self {
        let (state, _) = watch::channel(PersonalState::default());
        Self {
            api,
            state: Arc::new(state),
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    pub fn state(&self) -> PersonalState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PersonalState> {
        self.state.subscribe()
    }

    /// Load the roster unless it is already loaded. A caller arriving while another load is in
    /// flight waits for it and reuses its result.
    pub async fn fetch_personal(&self) {
        let _in_flight = self.in_flight.lock().await;
        let loaded = !self.state.borrow().personal.is_empty();
        if loaded {
            return;
        }
        self.load().await;
    }

    /// Reload the roster even if it is already loaded
    pub async fn refresh_personal(&self) {
        let _in_flight = self.in_flight.lock().await;
        self.load().await;
    }

    async fn load(&self) {
        let loading = LoadingGuard::start(&self.state);
        let personal = match self.api.get(PERSONAL_PATH).await {
            Ok(response) => response.json::<Vec<Personal>>(),
            Err(error) => Err(error),
        };
        match personal {
            Ok(personal) => {
                log::debug!("Fetched {} personal records", personal.len());
                self.state.send_modify(|state| state.personal = personal);
            }
            Err(error) => {
                log::error!("Could not fetch personal. {error}");
                loading.fail(FETCH_FAILED);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use serde_json::json;

    use super::PersonalStore;
    use crate::{
        http::MockApiTransport,
        stores::test::{json_error, json_response},
    };

    fn roster() -> serde_json::Value {
        json!([{"id": 1, "nombre": "Ana"}, {"id": 2, "nombre": "Luis"}])
    }

    #[tokio::test]
    async fn fetch_should_skip_when_already_loaded() {
        let mut api = MockApiTransport::new();
        api.expect_get()
            .withf(|path| path == "/api/personal")
            .times(1)
            .returning(|_| Ok(json_response(roster())));
        let store = PersonalStore::new(Arc::new(api));

        store.fetch_personal().await;
        store.fetch_personal().await;

        assert_eq!(store.state().personal.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_fetches_should_share_one_request() {
        let mut api = MockApiTransport::new();
        api.expect_get()
            .times(1)
            .returning(|_| Ok(json_response(roster())));
        let store = PersonalStore::new(Arc::new(api));
        let (first, second) = (store.clone(), store.clone());

        let (a, b) = tokio::join!(
            tokio::spawn(async move { first.fetch_personal().await }),
            tokio::spawn(async move { second.fetch_personal().await }),
        );
        a.expect("First fetch panicked");
        b.expect("Second fetch panicked");

        assert_eq!(store.state().personal.len(), 2);
    }

    #[tokio::test]
    async fn refresh_should_reload_loaded_roster() {
        let mut api = MockApiTransport::new();
        api.expect_get()
            .times(2)
            .returning(|_| Ok(json_response(roster())));
        let store = PersonalStore::new(Arc::new(api));

        store.fetch_personal().await;
        store.refresh_personal().await;

        assert_eq!(store.state().personal.len(), 2);
    }

    #[tokio::test]
    async fn failed_fetch_should_allow_retry() {
        let mut api = MockApiTransport::new();
        let mut calls = 0;
        api.expect_get().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(json_error(500, json!({})))
            } else {
                Ok(json_response(roster()))
            }
        });
        let store = PersonalStore::new(Arc::new(api));

        store.fetch_personal().await;
        let failed = store.state();
        store.fetch_personal().await;

        assert_eq!(
            failed.status.error.as_deref(),
            Some("No se pudo cargar la lista de personal.")
        );
        assert!(!failed.status.loading);
        assert_eq!(store.state().personal.len(), 2);
        assert!(store.state().status.error.is_none());
    }
}
