use std::{collections::BTreeMap, time::Duration};

use innovation_engine::{
    BridgeMessage, Client, ClientConfig, Experiment, RenderSurface, CHANNELS,
};
use url::Url;

/// Stand-in for a real embedded webview. A real host wraps its UI toolkit's webview, registers
/// [`CHANNELS`] on it, and forwards posted messages into the session.
struct PrintSurface;

impl RenderSurface for PrintSurface {
    fn load_html(&mut self, html: &str, base_url: Option<&Url>) {
        println!(
            "surface: loading {} bytes of content (base URL: {:?})",
            html.len(),
            base_url.map(Url::as_str)
        );
    }

    fn evaluate_script(
        &mut self,
        script: &str,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        println!("surface: evaluating {}", script);
        Ok(())
    }

    fn close(&mut self) {
        println!("surface: closed");
    }
}

fn register_demo_fonts(client: &Client) {
    let fonts: [(&str, &str, &[(&str, &str)]); 2] = [
        ("Muli", "assets/Muli-Bold.ttf", &[("weight", "700")]),
        (
            "IsidoraSansAlt_SemiBold",
            "assets/IsidoraSansAlt-SemiBold.ttf",
            &[("weight", "600"), ("style", "normal")],
        ),
    ];

    for (family, path, descriptors) in fonts {
        match std::fs::read(path) {
            Ok(bytes) => {
                let descriptors: BTreeMap<String, String> = descriptors
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect();
                client.add_font(family, bytes, Some(descriptors));
            }
            Err(_) => println!("font file {} not found, skipping", path),
        }
    }
}

#[tokio::main]
async fn main() -> innovation_engine::Result<()> {
    // Configure env_logger to see Innovation Engine SDK logs.
    env_logger::Builder::from_env(env_logger::Env::new().default_filter_or("innovation_engine"))
        .init();

    let loader_server = std::env::var("NVTNCLB_LOADER_SERVER")
        .unwrap_or_else(|_| "https://your-instance.innovation-club.net".to_owned());
    let environment = std::env::var("NVTNCLB_ENVIRONMENT").unwrap_or_else(|_| "test".to_owned());
    let timeout_ms = std::env::var("NVTNCLB_TIMEOUT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(500);
    let screen_id = std::env::var("SAMPLE_SCREEN_ID").unwrap_or_else(|_| "demo".to_owned());

    let client = ClientConfig::from_loader_server(loader_server)
        // Real hosts use a stable installation id; epoch millis keep the demo stateless.
        .client_id(chrono::Utc::now().timestamp_millis().to_string())
        .environment(environment)
        .timeout(Duration::from_millis(timeout_ms))
        .to_client()?;

    register_demo_fonts(&client);

    println!("bridge channels a host registers: {:?}", CHANNELS);
    println!("loader URL: {}", client.loader_url());

    // One request for several screens; screens without an experiment come back as None.
    match client.get_experiments(&[&screen_id, "home"], None).await {
        Ok(experiments) => {
            let available = experiments.iter().flatten().count();
            println!(
                "batch: {} of {} screens have an experiment",
                available,
                experiments.len()
            );
        }
        Err(err) => println!("batch fetch failed: {:?}", err),
    }

    // Fetch the experiment the server picks for this screen.
    let experiment = match client.get_experiment(&screen_id, None).await {
        Ok(experiment) => experiment,
        Err(err) => {
            println!(
                "no experiment from the server ({:?}), rendering a local sample",
                err
            );
            Experiment::new("<html><body>sample</body></html>", None)
        }
    };

    // Render it on the fake surface and post the messages real content would post.
    let (mut session, signal) = client.start_experiment(&experiment, PrintSurface);
    session.on_message(BridgeMessage::SetFonts);
    session.on_message(BridgeMessage::CloseWebView(
        r#"{"experimentId":"demo-experiment","treatmentUuid":"demo-treatment","interaction":"closeButton"}"#
            .to_owned(),
    ));

    let event = signal.wait().await?;
    println!("experiment closed: {:?}", event);

    Ok(())
}
