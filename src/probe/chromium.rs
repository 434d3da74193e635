use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::script;
use super::surface::{EmbedSurface, EmbedTarget, RenderEvents, SurfaceFactory};
use crate::config::{BrowserSettings, ProbeSettings};
use crate::errors::FabricError;
use crate::models::VisualElement;

/// How often queued page events are pulled out of the browser.
const EVENT_PUMP_INTERVAL: Duration = Duration::from_millis(200);
const REPORT_LOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// One headless Chromium per worker; every report gets its own tab.
pub struct ChromiumBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
    probe: ProbeSettings,
}

impl ChromiumBrowser {
    pub async fn launch(browser: &BrowserSettings, probe: &ProbeSettings) -> Result<Self, FabricError> {
        let (width, height) = probe.viewport;
        let headless = browser.headless;
        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .args(vec!["--no-sandbox", "--disable-gpu", "--disable-dev-shm-usage"]);
        if !headless {
            builder = builder.with_head();
        }
        if let Some(exe) = &browser.executable {
            builder = builder.chrome_executable(exe);
        }
        let config = builder
            .build()
            .map_err(|e| FabricError::Browser(format!("Invalid browser configuration: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "Browser handler event error");
                }
            }
        });
        info!(headless = headless, "Browser launched");

        Ok(Self { browser, handler, probe: probe.clone() })
    }

    pub async fn close(mut self) -> Result<(), FabricError> {
        self.browser.close().await?;
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "Browser did not exit cleanly");
        }
        self.handler.abort();
        Ok(())
    }
}

#[async_trait]
impl SurfaceFactory for ChromiumBrowser {
    async fn open(&self) -> Result<Box<dyn EmbedSurface>, FabricError> {
        let page = self.browser.new_page("about:blank").await?;
        let _: bool = page.evaluate(script::load_sdk(&self.probe.sdk_url)).await?.into_value()?;
        Ok(Box::new(ChromiumSurface { page, viewport: self.probe.viewport, pump: None }))
    }
}

#[derive(Debug, Default, Deserialize)]
struct DrainedEvents {
    #[serde(default)]
    rendered: Vec<String>,
    #[serde(default)]
    errors: Vec<String>,
}

/// A browser tab holding one embedded report.
pub struct ChromiumSurface {
    page: Page,
    viewport: (u32, u32),
    pump: Option<JoinHandle<()>>,
}

impl ChromiumSurface {
    async fn eval<T: serde::de::DeserializeOwned>(&self, js: String) -> Result<T, FabricError> {
        Ok(self.page.evaluate(js).await?.into_value()?)
    }

    fn stop_pump(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

/// Events returned by one drain; a payload that does not decode is logged and dropped.
fn decode_drained(value: Option<&serde_json::Value>) -> DrainedEvents {
    let Some(value) = value else {
        return DrainedEvents::default();
    };
    match DrainedEvents::deserialize(value) {
        Ok(drained) => drained,
        Err(e) => {
            warn!(error = %e, payload = %value, "Could not decode drained page events");
            DrainedEvents::default()
        }
    }
}

async fn pump_events(page: Page, rendered: UnboundedSender<String>, errors: UnboundedSender<String>) {
    loop {
        tokio::time::sleep(EVENT_PUMP_INTERVAL).await;
        let drained: DrainedEvents = match page.evaluate(script::DRAIN).await {
            Ok(result) => decode_drained(result.value()),
            Err(e) => {
                debug!(error = %e, "Event pump stopped");
                return;
            }
        };
        for id in drained.rendered {
            if rendered.send(id).is_err() {
                return;
            }
        }
        for msg in drained.errors {
            if errors.send(msg).is_err() {
                return;
            }
        }
    }
}

#[async_trait]
impl EmbedSurface for ChromiumSurface {
    async fn load_report(&mut self, target: &EmbedTarget) -> Result<f64, FabricError> {
        let (width, height) = self.viewport;
        let js = script::embed_report(target, width.saturating_sub(80), height);
        tokio::time::timeout(REPORT_LOAD_TIMEOUT, self.eval::<f64>(js))
            .await
            .map_err(|_| FabricError::Timeout(format!("Report {} did not load", target.report_id)))?
    }

    async fn pages(&mut self) -> Result<Vec<String>, FabricError> {
        self.eval(script::LIST_PAGES.to_string()).await
    }

    async fn visuals(&mut self, page: &str) -> Result<Vec<VisualElement>, FabricError> {
        self.eval(script::list_visuals(page)).await
    }

    async fn listen(&mut self) -> Result<RenderEvents, FabricError> {
        self.stop_pump();
        let _: bool = self.eval(script::LISTEN.to_string()).await?;
        let (rendered_tx, errors_tx, events) = RenderEvents::channel();
        self.pump = Some(tokio::spawn(pump_events(self.page.clone(), rendered_tx, errors_tx)));
        Ok(events)
    }

    async fn activate(&mut self, page: &str) -> Result<(), FabricError> {
        let found: bool = self.eval(script::activate_page(page)).await?;
        if !found {
            return Err(FabricError::Browser(format!("Page {} not found in report", page)));
        }
        Ok(())
    }

    async fn unlisten(&mut self) -> Result<(), FabricError> {
        self.stop_pump();
        let _: bool = self.eval(script::UNLISTEN.to_string()).await?;
        Ok(())
    }

    async fn capture(&mut self) -> Result<Vec<u8>, FabricError> {
        let selector = format!("#{}", script::CONTAINER_ID);
        let element = self.page.find_element(selector).await?;
        Ok(element.screenshot(CaptureScreenshotFormat::Png).await?)
    }

    async fn close(&mut self) -> Result<(), FabricError> {
        self.stop_pump();
        self.page.clone().close().await?;
        Ok(())
    }
}

impl Drop for ChromiumSurface {
    fn drop(&mut self) {
        self.stop_pump();
    }
}
