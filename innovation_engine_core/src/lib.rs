//! `innovation_engine_core` is a common library to build Innovation Engine SDKs for different
//! languages. If you're an Innovation Engine user, you probably want to take a look at one of
//! existing SDKs.
//!
//! # Overview
//!
//! `innovation_engine_core` is organized as a set of building blocks that help to build
//! Innovation Engine SDKs. Different host platforms have different constraints. Some platforms
//! might use all building blocks and others might reimplement some pieces in the host language.
//!
//! [`Experiment`] is the unit of content: an immutable HTML/JS document, fetched from the loader
//! server, that represents one UI variant together with the URL its relative resources resolve
//! against.
//!
//! [`ExperimentFetcher`](experiment_fetcher::ExperimentFetcher) is an HTTP client that knows how
//! to fetch experiments from the loader server, one screen at a time or as a batch. It owns the
//! session configuration (client id, loader server, environment, timeout) and the endpoint URLs
//! derived from it. It's best to save and reuse the same instance, so it can reuse the
//! connection.
//!
//! [`FontAssetRegistry`](fonts::FontAssetRegistry) is a thread-safe registry of the custom fonts
//! a host makes available to rendered content. Registration is idempotent and can continue while
//! experiments are on screen; content receives whatever is registered at the moment it asks.
//!
//! [`bridge`] module contains the message protocol between the host and rendered content.
//! [`BridgeSession`](bridge::BridgeSession) drives one render of one experiment over a
//! host-provided [`RenderSurface`](bridge::RenderSurface) and resolves a
//! [`CloseSignal`](bridge::CloseSignal) once the content reports its result.
//!
//! # Versioning
//!
//! This library follows semver. However, it is considered an internal library, so expect
//! frequent breaking changes and major version bumps.

#![warn(rustdoc::missing_crate_level_docs)]

pub mod bridge;
pub mod experiment_fetcher;
pub mod fonts;

mod config;
mod error;
mod experiment;
mod query;

pub use config::{EngineConfig, Environment, DEFAULT_ENVIRONMENT, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use experiment::Experiment;
