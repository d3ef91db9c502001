//! The message bridge between the host application and rendered experiment content.
//!
//! Content talks to the host by posting messages on a fixed set of [`CHANNELS`]; the host talks
//! back by evaluating JavaScript in the rendered document. [`BridgeSession`] owns one render of
//! one [`Experiment`] and routes messages until the content reports its result and asks to be
//! closed.
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use url::Url;

use crate::{fonts::FontAssetRegistry, Error, Experiment, Result};

/// Channel on which content reports its result and asks to be closed.
pub const CLOSE_WEB_VIEW_CHANNEL: &'static str = "closeWebView";

/// Channel on which content asks for the registered fonts to be injected.
pub const SET_FONTS_CHANNEL: &'static str = "setFonts";

/// All channels a host must register on its surface and route to [`BridgeSession::on_message`].
pub const CHANNELS: [&'static str; 2] = [CLOSE_WEB_VIEW_CHANNEL, SET_FONTS_CHANNEL];

/// Result reported by experiment content when it asks to be closed.
///
/// All fields are optional: purely informational content may close without reporting an
/// experiment or an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseEvent {
    /// Experiment the rendered content belonged to.
    pub experiment_id: Option<String>,
    /// Treatment that was shown.
    pub treatment_uuid: Option<String>,
    /// Interaction the user made, as reported by the content.
    pub interaction: Option<String>,
}

/// A message posted by rendered content on one of [`CHANNELS`].
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeMessage {
    /// The content is done and asks to be closed. The payload is the JSON text of a
    /// [`CloseEvent`].
    CloseWebView(String),
    /// The content asks for the registered fonts to be injected.
    SetFonts,
}

impl BridgeMessage {
    /// Classifies a raw message body posted by content.
    ///
    /// Close requests arrive as an object carrying the close event JSON under the
    /// `"closeWebView"` key; font requests arrive as the bare string `"setFonts"`. Anything
    /// else is unknown and yields `None`.
    pub fn from_body(body: &serde_json::Value) -> Option<BridgeMessage> {
        if let Some(payload) = body
            .get(CLOSE_WEB_VIEW_CHANNEL)
            .and_then(|value| value.as_str())
        {
            return Some(BridgeMessage::CloseWebView(payload.to_owned()));
        }
        if body.as_str() == Some(SET_FONTS_CHANNEL) {
            return Some(BridgeMessage::SetFonts);
        }
        None
    }
}

/// The embedded web surface a [`BridgeSession`] drives.
///
/// Implemented by the host over whatever webview its UI toolkit provides. The SDK only ever
/// loads a document into the surface, evaluates scripts against it, and closes it.
pub trait RenderSurface {
    /// Loads an HTML document, resolving relative resources against `base_url`.
    fn load_html(&mut self, html: &str, base_url: Option<&Url>);

    /// Evaluates a piece of JavaScript in the loaded document.
    fn evaluate_script(
        &mut self,
        script: &str,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Closes the surface. Called exactly once, when the session ends.
    fn close(&mut self);
}

/// A live render of one experiment.
///
/// The session routes messages between the host's web surface and the SDK until the content
/// asks to be closed. It is fully wired before the experiment document is loaded, so messages
/// the content posts while loading cannot be missed.
pub struct BridgeSession<S: RenderSurface> {
    surface: S,
    fonts: Arc<FontAssetRegistry>,
    /// `Some` while the session is active. Taken on close, making teardown run exactly once.
    completion: Option<oneshot::Sender<Result<CloseEvent>>>,
}

impl<S: RenderSurface> BridgeSession<S> {
    /// Starts rendering an experiment on the given surface.
    ///
    /// Returns the session and a [`CloseSignal`] that resolves when the content closes. The
    /// host must have registered [`CHANNELS`] on the surface before calling this; loading the
    /// experiment document is the last step of `start`.
    pub fn start(
        experiment: &Experiment,
        surface: S,
        fonts: Arc<FontAssetRegistry>,
    ) -> (BridgeSession<S>, CloseSignal) {
        let (sender, receiver) = oneshot::channel();
        let mut session = BridgeSession {
            surface,
            fonts,
            completion: Some(sender),
        };
        session
            .surface
            .load_html(experiment.html(), experiment.base_url());
        (session, CloseSignal { receiver })
    }

    /// Routes one message from the surface to the session.
    ///
    /// A close request resolves the [`CloseSignal`] and closes the surface; a font request
    /// injects the currently registered fonts into the document. Messages arriving after the
    /// session closed are ignored.
    pub fn on_message(&mut self, message: BridgeMessage) {
        if self.is_closed() {
            log::debug!(target: "innovation_engine", "ignoring message received after session close: {:?}", message);
            return;
        }
        match message {
            BridgeMessage::CloseWebView(payload) => self.close_with(&payload),
            BridgeMessage::SetFonts => self.inject_fonts(),
        }
    }

    /// Returns whether the session has closed. A closed session never becomes active again.
    pub fn is_closed(&self) -> bool {
        self.completion.is_none()
    }

    fn close_with(&mut self, payload: &str) {
        let event = serde_json::from_str::<CloseEvent>(payload)
            .map_err(|err| Error::DecodeFailure(Arc::new(err)));
        if let Err(err) = &event {
            log::warn!(target: "innovation_engine", "failed to decode close event: {:?}", err);
        }
        if let Some(completion) = self.completion.take() {
            // The host may have dropped the signal; the surface is torn down either way.
            let _ = completion.send(event);
        }
        self.surface.close();
    }

    fn inject_fonts(&mut self) {
        let script = format!("addFontAssets({})", self.fonts.to_json());
        if let Err(err) = self.surface.evaluate_script(&script) {
            log::warn!(target: "innovation_engine", "fonts injection failed: {:?}", err);
        }
    }
}

impl<S: RenderSurface> Drop for BridgeSession<S> {
    fn drop(&mut self) {
        // A session dropped mid-render still closes the surface, exactly once.
        if let Some(completion) = self.completion.take() {
            let _ = completion.send(Err(Error::SessionDropped));
            self.surface.close();
        }
    }
}

/// Completion of a [`BridgeSession`]. Resolves at most once.
pub struct CloseSignal {
    receiver: oneshot::Receiver<Result<CloseEvent>>,
}

impl CloseSignal {
    /// Waits for the rendered content to close.
    ///
    /// Resolves to the decoded [`CloseEvent`], to [`Error::DecodeFailure`] if the content sent
    /// malformed close event JSON, or to [`Error::SessionDropped`] if the session went away
    /// before the content closed.
    pub async fn wait(self) -> Result<CloseEvent> {
        match self.receiver.await {
            Ok(result) => result,
            Err(_) => Err(Error::SessionDropped),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::{BridgeMessage, BridgeSession, CloseEvent, RenderSurface};
    use crate::{fonts::FontAssetRegistry, Error, Experiment};

    #[derive(Debug, Clone, PartialEq)]
    enum SurfaceCall {
        Load(String),
        Script(String),
        Close,
    }

    #[derive(Clone, Default)]
    struct TestSurface {
        calls: Arc<Mutex<Vec<SurfaceCall>>>,
    }

    impl TestSurface {
        fn calls(&self) -> Vec<SurfaceCall> {
            self.calls.lock().unwrap().clone()
        }

        fn close_count(&self) -> usize {
            self.calls()
                .iter()
                .filter(|call| **call == SurfaceCall::Close)
                .count()
        }

        fn scripts(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    SurfaceCall::Script(script) => Some(script),
                    _ => None,
                })
                .collect()
        }
    }

    impl RenderSurface for TestSurface {
        fn load_html(&mut self, html: &str, _base_url: Option<&url::Url>) {
            self.calls
                .lock()
                .unwrap()
                .push(SurfaceCall::Load(html.to_owned()));
        }

        fn evaluate_script(
            &mut self,
            script: &str,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.calls
                .lock()
                .unwrap()
                .push(SurfaceCall::Script(script.to_owned()));
            Ok(())
        }

        fn close(&mut self) {
            self.calls.lock().unwrap().push(SurfaceCall::Close);
        }
    }

    fn start_session(
        surface: &TestSurface,
        fonts: Arc<FontAssetRegistry>,
    ) -> (BridgeSession<TestSurface>, super::CloseSignal) {
        let experiment = Experiment::new("<html></html>", None);
        BridgeSession::start(&experiment, surface.clone(), fonts)
    }

    #[test]
    fn classifies_wire_message_bodies() {
        assert_eq!(
            BridgeMessage::from_body(&json!({"closeWebView": "{}"})),
            Some(BridgeMessage::CloseWebView("{}".to_owned()))
        );
        assert_eq!(
            BridgeMessage::from_body(&json!("setFonts")),
            Some(BridgeMessage::SetFonts)
        );
        assert_eq!(BridgeMessage::from_body(&json!("something else")), None);
        assert_eq!(BridgeMessage::from_body(&json!({"other": "{}"})), None);
    }

    #[test]
    fn routes_messages_immediately_after_start() {
        let surface = TestSurface::default();
        let (mut session, _signal) = start_session(&surface, Arc::new(FontAssetRegistry::new()));

        assert_eq!(
            surface.calls()[0],
            SurfaceCall::Load("<html></html>".to_owned())
        );

        session.on_message(BridgeMessage::SetFonts);
        assert!(matches!(surface.calls()[1], SurfaceCall::Script(_)));
    }

    #[tokio::test]
    async fn close_event_resolves_the_signal_and_closes_the_surface() {
        let surface = TestSurface::default();
        let (mut session, signal) = start_session(&surface, Arc::new(FontAssetRegistry::new()));

        let body = json!({
            "closeWebView":
                r#"{"experimentId":"exp-1","treatmentUuid":"tr-9","interaction":"tap"}"#
        });
        session.on_message(BridgeMessage::from_body(&body).unwrap());

        let event = signal.wait().await.unwrap();
        assert_eq!(
            event,
            CloseEvent {
                experiment_id: Some("exp-1".to_owned()),
                treatment_uuid: Some("tr-9".to_owned()),
                interaction: Some("tap".to_owned()),
            }
        );
        assert!(session.is_closed());
        assert_eq!(surface.close_count(), 1);
    }

    #[tokio::test]
    async fn malformed_close_event_fails_the_signal_but_still_closes_the_surface() {
        let surface = TestSurface::default();
        let (mut session, signal) = start_session(&surface, Arc::new(FontAssetRegistry::new()));

        session.on_message(BridgeMessage::CloseWebView("not json".to_owned()));

        assert!(matches!(signal.wait().await, Err(Error::DecodeFailure(_))));
        assert!(session.is_closed());
        assert_eq!(surface.close_count(), 1);
    }

    #[test]
    fn font_injection_reflects_fonts_registered_after_start() {
        let fonts = Arc::new(FontAssetRegistry::new());
        fonts.register("Muli", b"abc".as_slice(), None);
        let surface = TestSurface::default();
        let (mut session, _signal) = start_session(&surface, fonts.clone());

        session.on_message(BridgeMessage::SetFonts);
        let first_snapshot = fonts.to_json();

        fonts.register("Inter", b"def".as_slice(), None);
        session.on_message(BridgeMessage::SetFonts);
        let second_snapshot = fonts.to_json();

        let scripts = surface.scripts();
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[0], format!("addFontAssets({})", first_snapshot));
        assert_eq!(scripts[1], format!("addFontAssets({})", second_snapshot));
        assert_ne!(first_snapshot, second_snapshot);
    }

    #[test]
    fn messages_after_close_are_ignored() {
        let surface = TestSurface::default();
        let (mut session, _signal) = start_session(&surface, Arc::new(FontAssetRegistry::new()));

        session.on_message(BridgeMessage::CloseWebView("{}".to_owned()));
        let calls_after_close = surface.calls().len();

        session.on_message(BridgeMessage::SetFonts);
        session.on_message(BridgeMessage::CloseWebView("{}".to_owned()));

        assert_eq!(surface.calls().len(), calls_after_close);
        assert_eq!(surface.close_count(), 1);
    }

    #[tokio::test]
    async fn dropping_an_active_session_closes_the_surface_and_fails_the_signal() {
        let surface = TestSurface::default();
        let (session, signal) = start_session(&surface, Arc::new(FontAssetRegistry::new()));

        drop(session);

        assert!(matches!(signal.wait().await, Err(Error::SessionDropped)));
        assert_eq!(surface.close_count(), 1);
    }

    #[test]
    fn dropping_a_closed_session_does_not_close_the_surface_again() {
        let surface = TestSurface::default();
        let (mut session, _signal) = start_session(&surface, Arc::new(FontAssetRegistry::new()));

        session.on_message(BridgeMessage::CloseWebView("{}".to_owned()));
        drop(session);

        assert_eq!(surface.close_count(), 1);
    }
}
