//! The Rust SDK for Innovation Engine, a platform for running server-defined UI experiments
//! inside host applications.
//!
//! # Overview
//!
//! The SDK revolves around a [`Client`] that fetches server-defined experiments (HTML/JS
//! documents representing UI variants) from the loader server and renders them in an embedded
//! web surface provided by the host. Fetching results in an [`Experiment`] being returned,
//! ready to be rendered with [`Client::start_experiment()`].
//!
//! ```
//! # use innovation_engine::ClientConfig;
//! let client = ClientConfig::from_loader_server("https://your-instance.innovation-club.net")
//!     .client_id("install-42")
//!     .to_client();
//! ```
//!
//! # Rendering and the message bridge
//!
//! The SDK does not embed a webview itself. The host implements [`RenderSurface`] over whatever
//! webview its UI toolkit provides, registers [`CHANNELS`] on it, and routes posted messages to
//! [`BridgeSession::on_message`]. [`Client::start_experiment()`] wires a [`BridgeSession`] to
//! the surface and returns a [`CloseSignal`] that resolves with the content's [`CloseEvent`]
//! once the content asks to be closed.
//!
//! # Fonts
//!
//! Custom fonts registered with [`Client::add_font()`] are injected into rendered content when
//! the content asks for them. Registration is idempotent and may continue while experiments are
//! on screen.
//!
//! # Error Handling
//!
//! Errors are represented by the [`Error`] enum.
//!
//! In production, it is recommended to treat fetch errors as "no experiment to show" and fall
//! back to the host's built-in UI, as experiment delivery should not be critical enough to cause
//! system crashes. However, the returned errors are valuable for debugging and usually indicate
//! that developer's attention is needed.
//!
//! # Logging
//!
//! The package uses the [`log`](https://docs.rs/log/latest/log/) crate for logging
//! messages. Consider integrating a `log`-compatible logger implementation for better visibility
//! into SDK operations.
//!
//! # Examples
//!
//! Examples can be found in the
//! [examples directory](https://github.com/innovation-club/rust-sdk/tree/main/rust-sdk/examples)
//! of the `innovation-engine` crate repository.

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]

mod client;
mod config;

#[doc(inline)]
pub use innovation_engine_core::{
    bridge::{
        BridgeMessage, BridgeSession, CloseEvent, CloseSignal, RenderSurface, CHANNELS,
        CLOSE_WEB_VIEW_CHANNEL, SET_FONTS_CHANNEL,
    },
    experiment_fetcher::TreatmentOverride,
    fonts::FontAsset,
    Environment, Error, Experiment, Result,
};

pub use client::Client;
pub use config::ClientConfig;
