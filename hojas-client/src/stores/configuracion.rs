use std::sync::Arc;

use hojas_common::Configuracion;
use tokio::sync::watch;

use super::{HasStatus, LoadingGuard, StoreStatus};
use crate::http::ApiTransport;

const CONFIGURACION_PATH: &str = "/configuracion";
const FETCH_FAILED: &str = "No se pudo cargar la configuración global.";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfiguracionState {
    pub configuracion: Option<Configuracion>,
    pub status: StoreStatus,
}

impl ConfiguracionState {
    /// Default head of HR pre-selected on new service sheets
    pub fn jefe_rh_predeterminado_id(&self) -> Option<i64> {
        self.configuracion
            .as_ref()
            .and_then(|c| c.jefe_rh_predeterminado_id)
    }

    /// Letterhead used when printing
    pub fn hoja_membretada_url(&self) -> Option<&str> {
        self.configuracion
            .as_ref()
            .and_then(|c| c.hoja_membretada_url.as_deref())
    }
}

impl HasStatus for ConfiguracionState {
    fn status_mut(&mut self) -> &mut StoreStatus {
        &mut self.status
    }
}

/// Global configuration of the service sheet system
pub struct ConfiguracionStore<T> {
    api: Arc<T>,
    state: Arc<watch::Sender<ConfiguracionState>>,
}

impl<T> Clone for ConfiguracionStore<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T: ApiTransport> ConfiguracionStore<T> {
    pub fn new(api: Arc<T>) -> Self {
        let (state, _) = watch::channel(ConfiguracionState::default());
        Self {
            api,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> ConfiguracionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConfiguracionState> {
        self.state.subscribe()
    }

    pub fn jefe_rh_predeterminado_id(&self) -> Option<i64> {
        self.state.borrow().jefe_rh_predeterminado_id()
    }

    pub fn hoja_membretada_url(&self) -> Option<String> {
        self.state.borrow().hoja_membretada_url().map(str::to_owned)
    }

    /// Fetch the configuration, always replacing what is cached
    pub async fn fetch_configuracion(&self) {
        let loading = LoadingGuard::start(&self.state);
        let configuracion = match self.api.get(CONFIGURACION_PATH).await {
            Ok(response) => response.json::<Configuracion>(),
            Err(error) => Err(error),
        };
        match configuracion {
            Ok(configuracion) => {
                log::debug!("Global configuration loaded: {configuracion:?}");
                self.state
                    .send_modify(|state| state.configuracion = Some(configuracion));
            }
            Err(error) => {
                log::error!("Could not fetch global configuration. {error}");
                if let Some(status) = error.status() {
                    log::error!("Configuration response status: {status}");
                }
                loading.fail(FETCH_FAILED);
            }
        }
    }
}
