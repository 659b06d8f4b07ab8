//! Recording engine used to drive `Container` without a Docker daemon

use async_trait::async_trait;
use futures_util::stream;
use local_docker::{AttachOptions, ContainerEngine, CreateParams, DockerError, Frame, FrameStream, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Calls observed by the engine, shared with the test body
#[derive(Debug, Default)]
pub struct MockState {
    pub call_counts: HashMap<String, usize>,
    pub created: Vec<CreateParams>,
    pub looked_up: Vec<String>,
    pub removed: Vec<(String, bool)>,
    pub started: Vec<String>,
    pub network_lookups: Vec<String>,
    pub connections: Vec<(String, String)>,
    pub attached: Vec<(String, AttachOptions)>,
}

impl MockState {
    pub fn increment_call_count(&mut self, method: &str) {
        *self.call_counts.entry(method.to_string()).or_insert(0) += 1;
    }

    pub fn get_call_count(&self, method: &str) -> usize {
        self.call_counts.get(method).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.call_counts.values().sum()
    }
}

/// What the next lookup or removal should answer
#[derive(Debug, Clone)]
pub enum Outcome {
    Ok,
    NotFound,
    ServerError(u16, String),
}

impl Outcome {
    fn into_result(self, id: &str) -> Result<()> {
        match self {
            Outcome::Ok => Ok(()),
            Outcome::NotFound => Err(DockerError::ContainerNotFound(id.to_owned())),
            Outcome::ServerError(status_code, message) => Err(DockerError::ApiError(
                bollard::errors::Error::DockerResponseServerError {
                    status_code,
                    message,
                },
            )),
        }
    }
}

pub struct MockEngine {
    pub state: Arc<Mutex<MockState>>,
    generated_id: String,
    create_outcome: Mutex<Outcome>,
    get_outcome: Mutex<Outcome>,
    remove_outcome: Mutex<Outcome>,
    network_outcome: Mutex<Outcome>,
    connect_outcome: Mutex<Outcome>,
    frames: Mutex<Vec<Frame>>,
}

impl MockEngine {
    pub fn new(generated_id: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            generated_id: generated_id.to_string(),
            create_outcome: Mutex::new(Outcome::Ok),
            get_outcome: Mutex::new(Outcome::Ok),
            remove_outcome: Mutex::new(Outcome::Ok),
            network_outcome: Mutex::new(Outcome::Ok),
            connect_outcome: Mutex::new(Outcome::Ok),
            frames: Mutex::new(Vec::new()),
        }
    }

    pub fn with_create_outcome(self, outcome: Outcome) -> Self {
        *self.create_outcome.lock().unwrap() = outcome;
        self
    }

    pub fn with_network_outcome(self, outcome: Outcome) -> Self {
        *self.network_outcome.lock().unwrap() = outcome;
        self
    }

    pub fn with_connect_outcome(self, outcome: Outcome) -> Self {
        *self.connect_outcome.lock().unwrap() = outcome;
        self
    }

    /// Replace the answer for subsequent create calls
    pub fn set_create_outcome(&self, outcome: Outcome) {
        *self.create_outcome.lock().unwrap() = outcome;
    }

    pub fn with_get_outcome(self, outcome: Outcome) -> Self {
        *self.get_outcome.lock().unwrap() = outcome;
        self
    }

    pub fn with_remove_outcome(self, outcome: Outcome) -> Self {
        *self.remove_outcome.lock().unwrap() = outcome;
        self
    }

    pub fn with_frames(self, frames: Vec<Frame>) -> Self {
        *self.frames.lock().unwrap() = frames;
        self
    }

    fn record<F: FnOnce(&mut MockState)>(&self, method: &str, f: F) {
        let mut state = self.state.lock().unwrap();
        state.increment_call_count(method);
        f(&mut state);
    }
}

#[async_trait]
impl ContainerEngine for MockEngine {
    async fn create_container(&self, params: CreateParams) -> Result<String> {
        self.record("create_container", |s| s.created.push(params));
        self.create_outcome.lock().unwrap().clone().into_result(&self.generated_id)?;
        Ok(self.generated_id.clone())
    }

    async fn get_container(&self, id: &str) -> Result<String> {
        self.record("get_container", |s| s.looked_up.push(id.to_string()));
        self.get_outcome.lock().unwrap().clone().into_result(id)?;
        Ok(id.to_string())
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<()> {
        self.record("remove_container", |s| s.removed.push((id.to_string(), force)));
        self.remove_outcome.lock().unwrap().clone().into_result(id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.record("start_container", |s| s.started.push(id.to_string()));
        Ok(())
    }

    async fn get_network(&self, network_id: &str) -> Result<String> {
        self.record("get_network", |s| s.network_lookups.push(network_id.to_string()));
        match self.network_outcome.lock().unwrap().clone() {
            Outcome::NotFound => Err(DockerError::NetworkNotFound(network_id.to_owned())),
            outcome => outcome.into_result(network_id),
        }?;
        Ok(network_id.to_string())
    }

    async fn connect_network(&self, network_id: &str, container_id: &str) -> Result<()> {
        self.record("connect_network", |s| {
            s.connections.push((network_id.to_string(), container_id.to_string()))
        });
        self.connect_outcome.lock().unwrap().clone().into_result(container_id)
    }

    async fn attach(&self, container_id: &str, options: AttachOptions) -> Result<FrameStream> {
        self.record("attach", |s| s.attached.push((container_id.to_string(), options)));
        let frames = self.frames.lock().unwrap().clone();
        Ok(Box::pin(stream::iter(frames.into_iter().map(Ok))))
    }
}
