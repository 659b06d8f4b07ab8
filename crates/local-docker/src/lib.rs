pub mod client;
pub mod config;
pub mod container;
pub mod engine;
pub mod error;
pub mod logs;


pub use client::{parse_memory_limit, DockerEngine};
pub use config::EngineConfig;
pub use container::Container;
pub use engine::{AttachOptions, BindMode, ContainerEngine, CreateParams, VolumeBinding};
pub use error::{DockerError, Result};
pub use logs::{
    write_container_output, Frame, FrameKind, FrameStream, OutputSink, STDERR_FRAME_TYPE,
    STDOUT_FRAME_TYPE,
};
