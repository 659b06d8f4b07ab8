use crate::engine::{AttachOptions, BindMode, ContainerEngine, CreateParams, VolumeBinding};
use crate::error::{DockerError, Result};
use crate::logs::{write_container_output, OutputSink};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A single container on the Docker engine.
///
/// Holds the desired configuration of the container and, once [`create`]
/// succeeds, the id the engine assigned to it. Every operation is one or two
/// calls against the shared [`ContainerEngine`].
///
/// [`create`]: Container::create
///
/// # Examples
///
/// ```rust,no_run
/// use local_docker::{Container, DockerEngine, EngineConfig};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let engine = Arc::new(DockerEngine::connect(&EngineConfig::from_env())?);
///     let mut container = Container::new(
///         "lambci/lambda:python3.6",
///         Some(vec!["index.handler".to_string()]),
///         "/var/task",
///         "/home/me/project",
///         engine,
///     )
///     .with_memory_limit_mb(128);
///
///     container.create().await?;
///     container.start(None).await?;
///
///     let mut stdout = tokio::io::stdout();
///     let mut stderr = tokio::io::stderr();
///     container.wait_for_logs(Some(&mut stdout), Some(&mut stderr)).await?;
///
///     container.delete().await?;
///     Ok(())
/// }
/// ```
pub struct Container {
    image: String,
    command: Option<Vec<String>>,
    working_dir: String,
    host_dir: String,
    memory_limit_mb: Option<u64>,
    exposed_ports: HashMap<u16, u16>,
    entrypoint: Option<Vec<String>>,
    env_vars: HashMap<String, String>,
    network_id: Option<String>,
    id: Option<String>,
    engine: Arc<dyn ContainerEngine>,
}

impl Container {
    /// Describe a container that mounts `host_dir` read-only at `working_dir`.
    pub fn new(
        image: &str,
        command: Option<Vec<String>>,
        working_dir: &str,
        host_dir: &str,
        engine: Arc<dyn ContainerEngine>,
    ) -> Self {
        Self {
            image: image.to_owned(),
            command,
            working_dir: working_dir.to_owned(),
            host_dir: host_dir.to_owned(),
            memory_limit_mb: None,
            exposed_ports: HashMap::new(),
            entrypoint: None,
            env_vars: HashMap::new(),
            network_id: None,
            id: None,
            engine,
        }
    }

    pub fn with_memory_limit_mb(mut self, memory_limit_mb: u64) -> Self {
        self.memory_limit_mb = Some(memory_limit_mb);
        self
    }

    /// container port -> host port
    pub fn with_exposed_ports(mut self, exposed_ports: HashMap<u16, u16>) -> Self {
        self.exposed_ports = exposed_ports;
        self
    }

    pub fn with_entrypoint(mut self, entrypoint: Vec<String>) -> Self {
        self.entrypoint = Some(entrypoint);
        self
    }

    pub fn with_env_vars(mut self, env_vars: HashMap<String, String>) -> Self {
        self.env_vars = env_vars;
        self
    }

    /// Network joined on the next [`create`](Container::create). Has no
    /// effect on a container that already exists.
    pub fn set_network_id(&mut self, network_id: Option<String>) {
        self.network_id = network_id;
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn command(&self) -> Option<&[String]> {
        self.command.as_deref()
    }

    pub fn working_dir(&self) -> &str {
        &self.working_dir
    }

    pub fn host_dir(&self) -> &str {
        &self.host_dir
    }

    pub fn memory_limit_mb(&self) -> Option<u64> {
        self.memory_limit_mb
    }

    pub fn exposed_ports(&self) -> &HashMap<u16, u16> {
        &self.exposed_ports
    }

    pub fn entrypoint(&self) -> Option<&[String]> {
        self.entrypoint.as_deref()
    }

    pub fn env_vars(&self) -> &HashMap<String, String> {
        &self.env_vars
    }

    pub fn network_id(&self) -> Option<&str> {
        self.network_id.as_deref()
    }

    /// Engine-assigned id, present between a successful create and delete
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_created(&self) -> bool {
        self.id.is_some()
    }

    /// Create the container on the engine and return its id.
    ///
    /// If a network id is set, the new container is connected to that
    /// network before this returns.
    pub async fn create(&mut self) -> Result<String> {
        if let Some(id) = &self.id {
            return Err(DockerError::AlreadyCreated(id.clone()));
        }

        let params = self.create_params();
        debug!(image = %self.image, "Creating container");
        let id = self.engine.create_container(params).await?;
        self.id = Some(id.clone());
        info!(container_id = %id, image = %self.image, "Container created");

        if let Some(network_id) = &self.network_id {
            let network = self.engine.get_network(network_id).await?;
            self.engine.connect_network(&network, &id).await?;
            info!(container_id = %id, network = %network, "Connected container to network");
        }

        Ok(id)
    }

    pub(crate) fn create_params(&self) -> CreateParams {
        let mut volumes = HashMap::new();
        volumes.insert(
            self.host_dir.clone(),
            VolumeBinding {
                bind: self.working_dir.clone(),
                mode: BindMode::ReadOnly,
            },
        );

        CreateParams {
            image: self.image.clone(),
            command: self.command.clone(),
            working_dir: self.working_dir.clone(),
            volumes,
            tty: false,
            environment: non_empty(&self.env_vars),
            ports: non_empty(&self.exposed_ports),
            entrypoint: self.entrypoint.clone().filter(|e| !e.is_empty()),
            mem_limit: self
                .memory_limit_mb
                .filter(|mb| *mb > 0)
                .map(|mb| format!("{}m", mb)),
        }
    }

    /// Remove the container, forcing it down if it is still running.
    ///
    /// A container that is already gone, or already being removed, counts as
    /// removed. Any other engine error is returned and the id is kept so the
    /// caller can retry.
    pub async fn delete(&mut self) -> Result<()> {
        let id = match &self.id {
            Some(id) => id.clone(),
            None => return Ok(()),
        };

        match self.engine.get_container(&id).await {
            Ok(live_id) => {
                debug!(container_id = %live_id, "Removing container");
                if let Err(e) = self.engine.remove_container(&live_id, true).await {
                    if !e.is_removal_in_progress() {
                        return Err(e);
                    }
                    warn!(container_id = %live_id, "Container removal is already in progress");
                }
                info!(container_id = %id, "Container removed");
            }
            Err(e) if e.is_not_found() => {
                warn!(container_id = %id, "Container already gone");
            }
            Err(e) => return Err(e),
        }

        self.id = None;
        Ok(())
    }

    /// Start the created container. Forwarding `input_data` to stdin is not
    /// supported and is rejected.
    pub async fn start(&self, input_data: Option<&[u8]>) -> Result<()> {
        if input_data.is_some() {
            return Err(DockerError::InputNotSupported);
        }

        let id = self.id.as_deref().ok_or(DockerError::NotCreated)?;
        debug!(container_id = %id, "Starting container");
        self.engine.start_container(id).await?;
        info!(container_id = %id, "Container started");
        Ok(())
    }

    /// Stream the container's output, past and future, into the given sinks
    /// until the container stops producing it.
    ///
    /// Does nothing when both sinks are `None`.
    pub async fn wait_for_logs<'a>(
        &self,
        stdout: Option<OutputSink<'a>>,
        stderr: Option<OutputSink<'a>>,
    ) -> Result<()> {
        if stdout.is_none() && stderr.is_none() {
            return Ok(());
        }

        let id = self.id.as_deref().ok_or(DockerError::NotCreated)?;
        debug!(container_id = %id, "Attaching to container output");
        let frames = self.engine.attach(id, AttachOptions::default()).await?;
        write_container_output(frames, stdout, stderr).await
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("image", &self.image)
            .field("command", &self.command)
            .field("working_dir", &self.working_dir)
            .field("host_dir", &self.host_dir)
            .field("memory_limit_mb", &self.memory_limit_mb)
            .field("exposed_ports", &self.exposed_ports)
            .field("entrypoint", &self.entrypoint)
            .field("env_vars", &self.env_vars)
            .field("network_id", &self.network_id)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

fn non_empty<K: Clone, V: Clone>(map: &HashMap<K, V>) -> Option<HashMap<K, V>> {
    if map.is_empty() {
        None
    } else {
        Some(map.clone())
    }
}
