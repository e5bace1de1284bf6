//! External system integrations for Almoner.
//!
//! - [`extraction`] - extraction collaborator contract and its HTTP client
//! - [`directory`] - customer directory contract and its HTTP source
//! - [`progress`] - batch progress sinks
//! - [`documents`] - document loading from disk or inline base64
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with mock implementations. The core only sees the
//! [`extraction::ExtractionClient`], [`directory::DirectorySource`] and
//! [`progress::ProgressSink`] traits.
//!
//! ```rust,no_run
//! use almoner::adapters::extraction::HttpExtractionClient;
//! use almoner::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("almoner.toml")?;
//! let client = HttpExtractionClient::new(&config.extraction)?;
//! println!("extracting via {}", client.endpoint());
//! # Ok(())
//! # }
//! ```

pub mod directory;
pub mod documents;
pub mod extraction;
pub mod progress;
