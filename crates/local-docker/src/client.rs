use crate::config::EngineConfig;
use crate::engine::{AttachOptions, ContainerEngine, CreateParams};
use crate::error::{DockerError, Result};
use crate::logs::{Frame, FrameStream, STDERR_FRAME_TYPE, STDOUT_FRAME_TYPE};
use async_trait::async_trait;
use bollard::container::{
    AttachContainerOptions, AttachContainerResults, Config, CreateContainerOptions, LogOutput,
    RemoveContainerOptions, StartContainerOptions,
};
use bollard::models::{EndpointSettings, HostConfig, PortBinding};
use bollard::network::{ConnectNetworkOptions, InspectNetworkOptions};
use bollard::{ClientVersion, Docker, API_DEFAULT_VERSION};
use futures_util::stream::StreamExt;
use std::collections::HashMap;

const STDIN_FRAME_TYPE: u8 = 0;

/// [`ContainerEngine`] backed by a bollard client
#[derive(Clone)]
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    pub fn connect(config: &EngineConfig) -> Result<Self> {
        let docker = match &config.socket_path {
            Some(path) => {
                let version = match &config.api_version {
                    Some(version) => parse_api_version(version)?,
                    None => API_DEFAULT_VERSION.clone(),
                };
                Docker::connect_with_unix(path, config.timeout_seconds, &version)
            }
            None => Docker::connect_with_local_defaults()
                .map(|docker| docker.with_timeout(config.timeout())),
        }
        .map_err(|e| DockerError::ConnectionError(format!("Failed to connect to Docker: {}", e)))?;

        Ok(Self { docker })
    }

    pub fn from_docker(docker: Docker) -> Self {
        Self { docker }
    }

    pub fn docker(&self) -> &Docker {
        &self.docker
    }

    /// Check that the daemon answers
    pub async fn ping(&self) -> Result<()> {
        self.docker
            .ping()
            .await
            .map_err(|e| DockerError::ConnectionError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn create_container(&self, params: CreateParams) -> Result<String> {
        let config = container_config(params)?;
        let response = self
            .docker
            .create_container(None::<CreateContainerOptions<String>>, config)
            .await?;
        Ok(response.id)
    }

    async fn get_container(&self, id: &str) -> Result<String> {
        match self.docker.inspect_container(id, None).await {
            Ok(info) => Ok(info.id.unwrap_or_else(|| id.to_owned())),
            Err(e) if is_status(&e, 404) => Err(DockerError::ContainerNotFound(id.to_owned())),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<()> {
        let options = RemoveContainerOptions {
            force,
            ..Default::default()
        };
        self.docker.remove_container(id, Some(options)).await?;
        Ok(())
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn get_network(&self, network_id: &str) -> Result<String> {
        match self
            .docker
            .inspect_network(network_id, None::<InspectNetworkOptions<String>>)
            .await
        {
            Ok(network) => Ok(network.id.unwrap_or_else(|| network_id.to_owned())),
            Err(e) if is_status(&e, 404) => Err(DockerError::NetworkNotFound(network_id.to_owned())),
            Err(e) => Err(e.into()),
        }
    }

    async fn connect_network(&self, network_id: &str, container_id: &str) -> Result<()> {
        let options = ConnectNetworkOptions {
            container: container_id.to_owned(),
            endpoint_config: EndpointSettings::default(),
        };
        self.docker.connect_network(network_id, options).await?;
        Ok(())
    }

    async fn attach(&self, container_id: &str, options: AttachOptions) -> Result<FrameStream> {
        let options = AttachContainerOptions::<String> {
            stdout: Some(options.stdout),
            stderr: Some(options.stderr),
            logs: Some(options.logs),
            stream: Some(true),
            ..Default::default()
        };

        let AttachContainerResults { output, .. } =
            self.docker.attach_container(container_id, Some(options)).await?;

        Ok(Box::pin(output.map(|item| {
            item.map(log_output_to_frame).map_err(DockerError::from)
        })))
    }
}

fn log_output_to_frame(output: LogOutput) -> Frame {
    match output {
        LogOutput::StdIn { message } => Frame::new(STDIN_FRAME_TYPE, message.to_vec()),
        LogOutput::StdOut { message } => Frame::new(STDOUT_FRAME_TYPE, message.to_vec()),
        LogOutput::StdErr { message } => Frame::new(STDERR_FRAME_TYPE, message.to_vec()),
        // Only produced for tty containers, which carry no stream header
        LogOutput::Console { message } => Frame::new(STDOUT_FRAME_TYPE, message.to_vec()),
    }
}

fn is_status(error: &bollard::errors::Error, status: u16) -> bool {
    matches!(
        error,
        bollard::errors::Error::DockerResponseServerError { status_code, .. } if *status_code == status
    )
}

fn parse_api_version(version: &str) -> Result<ClientVersion> {
    let invalid = || DockerError::ConnectionError(format!("Invalid API version: {}", version));
    let (major, minor) = version.split_once('.').ok_or_else(invalid)?;

    Ok(ClientVersion {
        major_version: major.parse().map_err(|_| invalid())?,
        minor_version: minor.parse().map_err(|_| invalid())?,
    })
}

/// Translate create arguments into the bollard request body
fn container_config(params: CreateParams) -> Result<Config<String>> {
    let binds = params
        .volumes
        .iter()
        .map(|(host, binding)| format!("{}:{}:{}", host, binding.bind, binding.mode.as_str()))
        .collect();

    let mut host_config = HostConfig {
        binds: Some(binds),
        ..Default::default()
    };

    if let Some(limit) = &params.mem_limit {
        host_config.memory = Some(parse_memory_limit(limit)?);
    }

    let mut exposed_ports = None;
    if let Some(ports) = &params.ports {
        let mut exposed = HashMap::new();
        let mut bindings = HashMap::new();
        for (container_port, host_port) in ports {
            let key = format!("{}/tcp", container_port);
            exposed.insert(key.clone(), HashMap::new());
            bindings.insert(
                key,
                Some(vec![PortBinding {
                    host_ip: None,
                    host_port: Some(host_port.to_string()),
                }]),
            );
        }
        exposed_ports = Some(exposed);
        host_config.port_bindings = Some(bindings);
    }

    let env = params.environment.map(|vars| {
        vars.into_iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect()
    });

    Ok(Config {
        image: Some(params.image),
        cmd: params.command,
        working_dir: Some(params.working_dir),
        tty: Some(params.tty),
        env,
        entrypoint: params.entrypoint,
        exposed_ports,
        host_config: Some(host_config),
        ..Default::default()
    })
}

/// Convert a limit such as `"128m"` or `"1g"` to bytes
pub fn parse_memory_limit(limit: &str) -> Result<i64> {
    let invalid = || DockerError::InvalidMemoryLimit(limit.to_owned());
    let trimmed = limit.trim().to_lowercase();

    let (digits, multiplier) = match trimmed.chars().last() {
        Some('b') => (&trimmed[..trimmed.len() - 1], 1),
        Some('k') => (&trimmed[..trimmed.len() - 1], 1024),
        Some('m') => (&trimmed[..trimmed.len() - 1], 1024 * 1024),
        Some('g') => (&trimmed[..trimmed.len() - 1], 1024 * 1024 * 1024),
        Some(c) if c.is_ascii_digit() => (trimmed.as_str(), 1),
        _ => return Err(invalid()),
    };

    let value: i64 = digits.parse().map_err(|_| invalid())?;
    if value < 0 {
        return Err(invalid());
    }
    value.checked_mul(multiplier).ok_or_else(invalid)
}
