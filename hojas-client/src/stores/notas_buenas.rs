use std::sync::Arc;

use common::error::{HsError, HsResult};
use hojas_common::{NotaBuena, NuevaNotaBuena, PageInfo, Paginated};
use tokio::sync::watch;

use super::{HasStatus, LoadingGuard, StoreStatus};
use crate::{
    http::ApiTransport,
    viewer::{DocumentViewer, PdfDocument},
};

const NOTAS_BUENAS_PATH: &str = "/api/notas-buenas";
const FETCH_FAILED: &str = "Error al cargar las notas buenas.";
const CREATE_FAILED: &str = "Ocurrió un error al crear la nota.";
const PDF_FAILED: &str = "No se pudo generar el PDF.";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotasBuenasState {
    pub notas: Vec<NotaBuena>,
    pub page: PageInfo,
    pub status: StoreStatus,
}

impl HasStatus for NotasBuenasState {
    fn status_mut(&mut self) -> &mut StoreStatus {
        &mut self.status
    }
}

/// Good-conduct notes and the actions that fetch, create and print them
pub struct NotasBuenasStore<T> {
    api: Arc<T>,
    state: Arc<watch::Sender<NotasBuenasState>>,
}

impl<T> Clone for NotasBuenasStore<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T: ApiTransport> NotasBuenasStore<T> {
    pub fn new(api: Arc<T>) -> Self {
        let (state, _) = watch::channel(NotasBuenasState::default());
        Self {
            api,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> NotasBuenasState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NotasBuenasState> {
        self.state.subscribe()
    }

    /// Replace the local notes with the first page returned by the backend. Failures are only
    /// reported through the store's error message.
    pub async fn fetch_notas_buenas(&self) {
        let loading = LoadingGuard::start(&self.state);
        let page = match self.api.get(NOTAS_BUENAS_PATH).await {
            Ok(response) => response.json::<Paginated<NotaBuena>>(),
            Err(error) => Err(error),
        };
        match page {
            Ok(page) => {
                let (notas, info) = page.into_parts();
                log::debug!("Fetched {} notas buenas", notas.len());
                self.state.send_modify(|state| {
                    state.notas = notas;
                    state.page = info;
                });
            }
            Err(error) => {
                log::error!("Could not fetch notas buenas. {error}");
                loading.fail(FETCH_FAILED);
            }
        }
    }

    /// Submit a new note and put the record the backend created at the front of the list
    /// # Errors
    /// This function will return [HsError::Rejected] carrying the backend's message (or a generic
    /// one) if the note could not be created
    pub async fn create_nota_buena(&self, nota: &NuevaNotaBuena) -> HsResult<NotaBuena> {
        let loading = LoadingGuard::start(&self.state);
        let created = match serde_json::to_value(nota) {
            Ok(body) => match self.api.post(NOTAS_BUENAS_PATH, Some(body)).await {
                Ok(response) => response.json::<NotaBuena>(),
                Err(error) => Err(error),
            },
            Err(error) => Err(error.into()),
        };
        match created {
            Ok(nota) => {
                log::info!("Created nota buena {}", nota.id);
                self.state
                    .send_modify(|state| state.notas.insert(0, nota.clone()));
                Ok(nota)
            }
            Err(error) => {
                log::error!("Could not create nota buena. {error}");
                let message = error
                    .response_message()
                    .unwrap_or_else(|| CREATE_FAILED.to_owned());
                loading.fail(&message);
                Err(HsError::Rejected(message))
            }
        }
    }

    /// Download the printable version of note `id` and hand it to `viewer`
    /// # Errors
    /// This function will return [HsError::Rejected] with the backend's message when the error
    /// body is JSON, or a generic message otherwise
    pub async fn download_pdf<V: DocumentViewer + ?Sized>(
        &self,
        id: i64,
        viewer: &V,
    ) -> HsResult<()> {
        let path = format!("{NOTAS_BUENAS_PATH}/{id}/pdf");
        let response = match self.api.get(&path).await {
            Ok(response) => response,
            Err(error) => {
                log::error!("Could not download PDF for nota buena {id}. {error}");
                let message = error
                    .response_message()
                    .unwrap_or_else(|| PDF_FAILED.to_owned());
                return Err(HsError::Rejected(message));
            }
        };
        let document = PdfDocument {
            file_name: format!("nota-buena-{id}.pdf"),
            bytes: response.body,
        };
        if let Err(error) = viewer.open(document).await {
            log::error!("Could not open PDF for nota buena {id}. {error}");
            return Err(HsError::Rejected(PDF_FAILED.to_owned()));
        }
        Ok(())
    }
}
