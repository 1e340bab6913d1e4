//! Deterministic generation backend for tests.
//!
//! Enabled inside this crate's tests and, for downstream crates, through the
//! `test-util` feature.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

use crate::{
    error::VizportError,
    provider::{
        GenerateFuture, GenerateParameters, StreamingTextProvider, TextGenerationProvider,
        TextStream,
    },
};

#[derive(Default)]
struct Script {
    chunks: Vec<String>,
    failure: Option<String>,
    fail_after: Option<usize>,
    pending: bool,
    calls: AtomicUsize,
    last_params: Mutex<Option<GenerateParameters>>,
}

/// Replays a fixed list of chunks.
///
/// Buffered calls return the concatenation, streaming calls yield the chunks
/// one by one. Clones share the call counter.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    script: Arc<Script>,
}

impl ScriptedProvider {
    pub fn new<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Arc::new(Script {
                chunks: chunks.into_iter().map(Into::into).collect(),
                ..Script::default()
            }),
        }
    }

    /// Every call fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            script: Arc::new(Script {
                failure: Some(reason.into()),
                ..Script::default()
            }),
        }
    }

    /// Streams yield the first `n` chunks, then fail.
    pub fn failing_after(self, n: usize, reason: impl Into<String>) -> Self {
        self.rebuild(|script| {
            script.fail_after = Some(n);
            script.failure = Some(reason.into());
        })
    }

    /// Calls never complete.
    pub fn pending_forever(self) -> Self {
        self.rebuild(|script| script.pending = true)
    }

    /// Number of calls that reached the backend.
    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    pub fn last_params(&self) -> Option<GenerateParameters> {
        self.script
            .last_params
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn full_text(&self) -> String {
        self.script.chunks.concat()
    }

    fn rebuild(self, edit: impl FnOnce(&mut Script)) -> Self {
        let mut script = Script {
            chunks: self.script.chunks.clone(),
            failure: self.script.failure.clone(),
            fail_after: self.script.fail_after,
            pending: self.script.pending,
            ..Script::default()
        };
        edit(&mut script);
        Self {
            script: Arc::new(script),
        }
    }

    fn record(&self, params: GenerateParameters) {
        self.script.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .script
            .last_params
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(params);
    }
}

impl TextGenerationProvider for ScriptedProvider {
    fn generate(&self, params: GenerateParameters) -> GenerateFuture<'_> {
        self.record(params);
        let script = Arc::clone(&self.script);

        Box::pin(async move {
            if script.pending {
                std::future::pending::<()>().await;
            }
            match &script.failure {
                Some(reason) => Err(VizportError::generation(reason.clone())),
                None => Ok(script.chunks.concat()),
            }
        })
    }
}

impl StreamingTextProvider for ScriptedProvider {
    fn generate_stream(&self, params: GenerateParameters) -> TextStream<'_> {
        self.record(params);
        let script = Arc::clone(&self.script);

        Box::pin(async_stream::stream! {
            if script.pending {
                std::future::pending::<()>().await;
            }

            let healthy = match (&script.failure, script.fail_after) {
                (Some(_), Some(n)) => n,
                (Some(_), None) => 0,
                (None, _) => script.chunks.len(),
            };

            for chunk in script.chunks.iter().take(healthy) {
                tokio::task::yield_now().await;
                yield Ok(chunk.clone());
            }

            if let Some(reason) = &script.failure {
                yield Err(VizportError::generation(reason.clone()));
            }
        })
    }
}
