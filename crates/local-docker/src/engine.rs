//! The slice of the Docker API that a [`Container`](crate::Container) drives.
//!
//! [`ContainerEngine`] is the seam between the container handle and the
//! daemon: [`DockerEngine`](crate::DockerEngine) implements it with bollard,
//! tests implement it with a recording double.

use crate::error::Result;
use crate::logs::FrameStream;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Access mode of a bind mount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindMode {
    #[serde(rename = "ro")]
    ReadOnly,
    #[serde(rename = "rw")]
    ReadWrite,
}

impl BindMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindMode::ReadOnly => "ro",
            BindMode::ReadWrite => "rw",
        }
    }
}

/// Where a host path is mounted inside the container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeBinding {
    pub bind: String,
    pub mode: BindMode,
}

/// Arguments of a single "create container" call.
///
/// Optional arguments left as `None` are not sent to the engine, and are
/// skipped when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateParams {
    pub image: String,
    pub command: Option<Vec<String>>,
    pub working_dir: String,
    /// host path -> mount inside the container
    pub volumes: HashMap<String, VolumeBinding>,
    pub tty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<HashMap<String, String>>,
    /// container port -> host port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<HashMap<u16, u16>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<Vec<String>>,
    /// Memory limit with unit suffix, e.g. `"128m"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_limit: Option<String>,
}

/// Which streams to request when attaching to a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachOptions {
    pub stdout: bool,
    pub stderr: bool,
    /// Replay output produced before the attach
    pub logs: bool,
}

impl Default for AttachOptions {
    fn default() -> Self {
        Self {
            stdout: true,
            stderr: true,
            logs: true,
        }
    }
}

/// Container engine API consumed by [`Container`](crate::Container)
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Create a container and return the id the engine assigned to it.
    async fn create_container(&self, params: CreateParams) -> Result<String>;

    /// Look up a live container. Fails with a not-found error when absent.
    async fn get_container(&self, id: &str) -> Result<String>;

    async fn remove_container(&self, id: &str, force: bool) -> Result<()>;

    async fn start_container(&self, id: &str) -> Result<()>;

    /// Look up an existing network. Fails with a not-found error when absent.
    async fn get_network(&self, network_id: &str) -> Result<String>;

    async fn connect_network(&self, network_id: &str, container_id: &str) -> Result<()>;

    async fn attach(&self, container_id: &str, options: AttachOptions) -> Result<FrameStream>;
}
