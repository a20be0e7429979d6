//! Scripted fakes shared by unit tests in this crate.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream;

use extmirror_core::{
    DownloadError, DownloadEvent, DownloadEventEmitterPort, ExtensionRecord, ExtensionSource,
};

use crate::transport::{ArtifactResponse, ArtifactTransport};

/// One scripted reaction of [`FakeTransport`] to an `open` call.
#[derive(Debug, Clone)]
pub enum Script {
    /// `open` itself fails.
    Fail(DownloadError),
    /// `open` succeeds and the body yields these chunks.
    Respond {
        suggested: Option<String>,
        chunks: Vec<Result<Bytes, DownloadError>>,
    },
    /// `open` succeeds but the body never yields.
    Stall,
    /// `open` never returns, like a server that accepts and stays silent.
    Hang,
}

impl Script {
    pub fn body(suggested: Option<&str>, chunks: &[&str]) -> Self {
        Self::Respond {
            suggested: suggested.map(ToString::to_string),
            chunks: chunks
                .iter()
                .map(|c| Ok(Bytes::copy_from_slice(c.as_bytes())))
                .collect(),
        }
    }

    /// Make the body fail after the scripted chunks.
    pub fn then_fail(self, err: DownloadError) -> Self {
        match self {
            Self::Respond {
                suggested,
                mut chunks,
            } => {
                chunks.push(Err(err));
                Self::Respond { suggested, chunks }
            }
            other => other,
        }
    }
}

/// Transport that replays per-URL scripts.
///
/// URLs without a script (or whose script ran out) answer with a body of
/// `artifact:{url}` and the last URL segment as the suggested name.
#[derive(Default)]
pub struct FakeTransport {
    scripts: Mutex<HashMap<String, VecDeque<Script>>>,
    opened: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, url: &str, scripts: Vec<Script>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), scripts.into());
        self
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactTransport for FakeTransport {
    async fn open(&self, url: &str) -> Result<ArtifactResponse, DownloadError> {
        self.opened.lock().unwrap().push(url.to_string());
        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front);

        match next {
            Some(Script::Fail(err)) => Err(err),
            Some(Script::Respond { suggested, chunks }) => Ok(ArtifactResponse {
                suggested_name: suggested,
                body: stream::iter(chunks).boxed(),
            }),
            Some(Script::Stall) => Ok(ArtifactResponse {
                suggested_name: None,
                body: stream::pending().boxed(),
            }),
            Some(Script::Hang) => std::future::pending().await,
            None => Ok(ArtifactResponse {
                suggested_name: url.rsplit('/').next().map(ToString::to_string),
                body: stream::iter([Ok(Bytes::from(format!("artifact:{url}")))]).boxed(),
            }),
        }
    }
}

/// Source serving a fixed set of records.
pub struct FakeSource {
    records: HashMap<String, ExtensionRecord>,
    fail_with: Option<DownloadError>,
    pub calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(records: impl IntoIterator<Item = ExtensionRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|r| (r.id().to_string(), r))
                .collect(),
            fail_with: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(err: DownloadError) -> Self {
        Self {
            fail_with: Some(err),
            ..Self::new(Vec::<ExtensionRecord>::new())
        }
    }
}

#[async_trait]
impl ExtensionSource for FakeSource {
    fn name(&self) -> &str {
        "fake"
    }

    async fn fetch_extensions(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, ExtensionRecord>, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.records
                    .values()
                    .find(|r| r.id().eq_ignore_ascii_case(id))
                    .map(|r| (r.id().to_string(), r.clone()))
            })
            .collect())
    }
}

/// Emitter that records every event.
#[derive(Default)]
pub struct RecordingEmitter {
    events: Mutex<Vec<DownloadEvent>>,
}

impl RecordingEmitter {
    pub fn events(&self) -> Vec<DownloadEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl DownloadEventEmitterPort for RecordingEmitter {
    fn emit(&self, event: DownloadEvent) {
        self.events.lock().unwrap().push(event);
    }
}
