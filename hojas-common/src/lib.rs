//! Records exchanged with the Hojas de Servicio backend. Every record keeps the attributes it does
//! not model in a flattened map so nothing the backend sends is lost on a round trip.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// A good-conduct note ("nota buena") as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotaBuena {
    pub id: i64,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Payload submitted to create a [NotaBuena]. The backend owns validation, so the client passes
/// the form fields through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NuevaNotaBuena(pub Map<String, Value>);

impl NuevaNotaBuena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

/// Member of the personnel roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personal {
    pub id: i64,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Global settings shared by every service sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuracion {
    #[serde(default)]
    pub jefe_rh_predeterminado_id: Option<i64>,
    #[serde(default)]
    pub hoja_membretada_url: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Laravel paginator envelope. Only `data` is guaranteed; the rest is present on
/// length-aware pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub current_page: Option<u64>,
    #[serde(default)]
    pub last_page: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Paging position of the last fetched page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub current_page: Option<u64>,
    pub last_page: Option<u64>,
    pub per_page: Option<u64>,
    pub total: Option<u64>,
}

impl<T> Paginated<T> {
    /// Split the envelope into its records and the paging position
    pub fn into_parts(self) -> (Vec<T>, PageInfo) {
        let info = PageInfo {
            current_page: self.current_page,
            last_page: self.last_page,
            per_page: self.per_page,
            total: self.total,
        };
        (self.data, info)
    }
}
