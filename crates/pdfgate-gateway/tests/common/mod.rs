//! Scripted in-memory render backend shared by gateway tests.
//!
//! Records every session launch, call and close so tests can assert the
//! release-exactly-once property without a browser.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use pdfgate_gateway::render::{PdfOptions, RenderBackend, RenderError, RenderSession};

pub const FAKE_PDF: &[u8] = b"%PDF-1.7\n%fake\n";

#[derive(Debug, Clone, Default)]
pub enum Step {
    #[default]
    Ok,
    Fail(&'static str),
    Hang,
}

impl Step {
    async fn run(&self, err: fn(String) -> RenderError) -> Result<(), RenderError> {
        match self {
            Step::Ok => Ok(()),
            Step::Fail(msg) => Err(err((*msg).to_string())),
            Step::Hang => std::future::pending().await,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Script {
    pub launch_fails: bool,
    pub navigate: Step,
    pub emulate: Step,
    pub evaluate: Step,
    pub capture: Step,
    pub close_fails: bool,
}

#[derive(Debug, Default)]
pub struct Recorder {
    launches: AtomicUsize,
    closes: Mutex<Vec<usize>>,
    calls: Mutex<Vec<String>>,
    last_pdf_options: Mutex<Option<PdfOptions>>,
}

impl Recorder {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_pdf_options(&self) -> Option<PdfOptions> {
        self.last_pdf_options.lock().unwrap().clone()
    }

    /// Every launched session closed exactly once.
    pub fn assert_each_released_once(&self) {
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for id in self.closes.lock().unwrap().iter() {
            *counts.entry(*id).or_default() += 1;
        }
        for id in 0..self.launches() {
            assert_eq!(counts.get(&id).copied(), Some(1), "session {id} close count");
        }
        assert_eq!(counts.len(), self.launches(), "closes for unknown sessions");
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

pub struct ScriptedBackend {
    script: Script,
    recorder: Arc<Recorder>,
}

impl ScriptedBackend {
    pub fn new(script: Script) -> (Arc<Self>, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        (
            Arc::new(Self {
                script,
                recorder: Arc::clone(&recorder),
            }),
            recorder,
        )
    }
}

#[async_trait]
impl RenderBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn launch(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        if self.script.launch_fails {
            return Err(RenderError::Launch("no chrome binary".into()));
        }
        let id = self.recorder.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            id,
            script: self.script.clone(),
            recorder: Arc::clone(&self.recorder),
        }))
    }
}

struct ScriptedSession {
    id: usize,
    script: Script,
    recorder: Arc<Recorder>,
}

#[async_trait]
impl RenderSession for ScriptedSession {
    async fn navigate(&mut self, url: &Url, idle: Duration) -> Result<(), RenderError> {
        self.recorder.record(format!("navigate {url} idle={}ms", idle.as_millis()));
        self.script.navigate.run(RenderError::Navigation).await
    }

    async fn stop_loading(&mut self) -> Result<(), RenderError> {
        self.recorder.record("stop_loading".into());
        Ok(())
    }

    async fn emulate_print_media(&mut self) -> Result<(), RenderError> {
        self.recorder.record("emulate_print".into());
        self.script.emulate.run(RenderError::Script).await
    }

    async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value, RenderError> {
        self.recorder.record(format!("evaluate {script}"));
        self.script.evaluate.run(RenderError::Script).await?;
        Ok(serde_json::Value::Bool(true))
    }

    async fn capture_pdf(&mut self, opts: &PdfOptions) -> Result<Vec<u8>, RenderError> {
        self.recorder.record("capture".into());
        *self.recorder.last_pdf_options.lock().unwrap() = Some(opts.clone());
        self.script.capture.run(RenderError::Capture).await?;
        Ok(FAKE_PDF.to_vec())
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        self.recorder.closes.lock().unwrap().push(self.id);
        if self.script.close_fails {
            return Err(RenderError::Close("browser already gone".into()));
        }
        Ok(())
    }
}
