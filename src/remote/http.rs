use super::{RemoteError, RemoteTaskStore};
use crate::models::{NewTaskRecord, TaskRecord};
use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

const TODOS_PATH: &str = "todos";
const LIMIT_PARAM: &str = "_limit";

/// `RemoteTaskStore` speaking JSON over HTTP to a `/todos` resource.
pub struct HttpTaskStore {
    base_url: Url,
    client: Client,
}

impl HttpTaskStore {
    pub fn new(base_url: &str) -> Result<Self, RemoteError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            client: Client::new(),
        })
    }

    fn todos_url(&self) -> Result<Url, RemoteError> {
        self.base_url
            .join(TODOS_PATH)
            .map_err(|e| RemoteError::InvalidUrl(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        response
            .json::<T>()
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

impl RemoteTaskStore for HttpTaskStore {
    fn list_tasks(&self, limit: Option<u32>) -> Result<Vec<TaskRecord>, RemoteError> {
        let mut url = self.todos_url()?;
        if let Some(limit) = limit {
            url.query_pairs_mut()
                .append_pair(LIMIT_PARAM, &limit.to_string());
        }
        debug!(%url, "listing tasks");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let records: Vec<TaskRecord> = Self::decode(response)?;
        info!(count = records.len(), "fetched tasks");
        Ok(records)
    }

    fn create_task(&self, record: &NewTaskRecord) -> Result<TaskRecord, RemoteError> {
        let url = self.todos_url()?;
        debug!(%url, title = %record.title, "creating task");

        let response = self
            .client
            .post(url)
            .json(record)
            .send()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let created: TaskRecord = Self::decode(response)?;
        info!(id = %created.id, "created task");
        Ok(created)
    }
}

/// Parses a base URL and makes sure it ends in `/` so relative joins append.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, RemoteError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| RemoteError::InvalidUrl(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(RemoteError::InvalidUrl(format!(
            "unsupported scheme: {}",
            url.scheme()
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
