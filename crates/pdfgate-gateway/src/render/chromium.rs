//! Headless Chrome backend over the DevTools protocol.
//!
//! Every `launch` starts a dedicated browser process with one page. Nothing
//! is pooled. The sandbox is disabled because the container images this
//! runs in cannot provide the user namespaces Chrome's sandbox needs.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetEmulatedMediaParams;
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::cdp::browser_protocol::page::{PrintToPdfParams, StopLoadingParams};
use chromiumoxide::Page;
use futures_util::{stream, StreamExt};
use tokio::task::JoinHandle;
use url::Url;

use super::backend::{PdfOptions, RenderBackend, RenderError, RenderSession};
use super::idle::{wait_for_network_idle, NetEvent};

#[derive(Debug, Clone, Default)]
pub struct ChromiumBackend {
    executable: Option<PathBuf>,
}

impl ChromiumBackend {
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self { executable }
    }

    fn browser_config(&self) -> Result<BrowserConfig, RenderError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage");
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(RenderError::Launch)
    }
}

#[async_trait]
impl RenderBackend for ChromiumBackend {
    fn name(&self) -> &'static str {
        "chromium"
    }

    async fn launch(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        let config = self.browser_config()?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        // The handler must be polled for the browser connection to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "devtools handler stopped");
                    break;
                }
            }
        });

        match browser.new_page("about:blank").await {
            Ok(page) => Ok(Box::new(ChromiumSession {
                browser,
                page,
                handler_task,
            })),
            Err(e) => {
                shutdown(&mut browser, handler_task).await;
                Err(RenderError::Launch(e.to_string()))
            }
        }
    }
}

struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

async fn shutdown(browser: &mut Browser, handler_task: JoinHandle<()>) -> Option<String> {
    let mut failure = None;
    if let Err(e) = browser.close().await {
        failure = Some(e.to_string());
    }
    if let Err(e) = browser.wait().await {
        failure.get_or_insert_with(|| e.to_string());
    }
    handler_task.abort();
    failure
}

fn navigation(e: impl std::fmt::Display) -> RenderError {
    RenderError::Navigation(e.to_string())
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn navigate(&mut self, url: &Url, idle: Duration) -> Result<(), RenderError> {
        // Subscribe before navigating so the first requests are counted.
        let started = self
            .page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(navigation)?;
        let finished = self
            .page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(navigation)?;
        let failed = self
            .page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(navigation)?;

        self.page.goto(url.as_str()).await.map_err(navigation)?;

        let events = stream::select(
            started.map(|ev| NetEvent::Started(ev.request_id.inner().clone())),
            stream::select(
                finished.map(|ev| NetEvent::Finished(ev.request_id.inner().clone())),
                failed.map(|ev| NetEvent::Finished(ev.request_id.inner().clone())),
            ),
        );
        let left = wait_for_network_idle(events, idle).await;
        if left > 0 {
            tracing::debug!(inflight = left, "event stream closed before network idle");
        }
        Ok(())
    }

    async fn stop_loading(&mut self) -> Result<(), RenderError> {
        self.page
            .execute(StopLoadingParams::default())
            .await
            .map(|_| ())
            .map_err(navigation)
    }

    async fn emulate_print_media(&mut self) -> Result<(), RenderError> {
        self.page
            .execute(SetEmulatedMediaParams::builder().media("print").build())
            .await
            .map(|_| ())
            .map_err(|e| RenderError::Script(e.to_string()))
    }

    async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value, RenderError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| RenderError::Script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn capture_pdf(&mut self, opts: &PdfOptions) -> Result<Vec<u8>, RenderError> {
        let params = PrintToPdfParams::builder()
            .paper_width(opts.page.width_in)
            .paper_height(opts.page.height_in)
            .margin_top(opts.margins.top)
            .margin_bottom(opts.margins.bottom)
            .margin_left(opts.margins.left)
            .margin_right(opts.margins.right)
            .print_background(opts.print_background)
            .prefer_css_page_size(opts.prefer_css_page_size)
            .build();

        self.page
            .pdf(params)
            .await
            .map_err(|e| RenderError::Capture(e.to_string()))
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        let ChromiumSession {
            mut browser,
            page,
            handler_task,
        } = *self;
        drop(page);
        match shutdown(&mut browser, handler_task).await {
            None => Ok(()),
            Some(e) => Err(RenderError::Close(e)),
        }
    }
}
