//! # Keryx Config
//!
//! Typed configuration for Keryx pipelines and proxy chains.
//!
//! Server and client pipelines each read their own namespaced copy of the
//! same key set (`[server]` / `[client]` TOML tables, `KERYX_SERVER_*` /
//! `KERYX_CLIENT_*` environment overrides). Building a pipeline from a
//! loaded configuration is side-effect-free; all I/O happens here, once,
//! at load time.
//!
//! # Example
//!
//! ```
//! use keryx_config::KeryxConfig;
//!
//! let config: KeryxConfig = toml::from_str(r#"
//!     service_name = "acquirer"
//!
//!     [server]
//!     metrics = true
//!     timeout_ms = 500
//!
//!     [client]
//!     tracer = true
//! "#).unwrap();
//!
//! assert!(config.server.metrics);
//! assert_eq!(config.server.timeout().as_millis(), 500);
//! assert_eq!(config.client.timeout().as_millis(), 1000); // default
//! ```

#![doc(html_root_url = "https://docs.rs/keryx-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod loader;
mod settings;

pub use error::ConfigError;
pub use loader::load;
pub use settings::{KeryxConfig, PipelineConfig};
