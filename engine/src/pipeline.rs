//! The diagnosis pipeline: per-document sessions, debounced re-checks,
//! and last-writer-wins publication.
//!
//! Document events arrive from the host, diagnosis runs on spawned
//! tasks, and results leave through the injected [`DiagnosticSink`].
//! Each run carries a sequence number; only a run newer than the last
//! published one may publish, so slow runs cannot overwrite fresh
//! results no matter how they interleave. Superseded runs are also
//! cancelled through their token so subprocesses die early.

use crate::config::BosunConfig;
use crate::skip::SkipList;
use bosun_plugins::{PluginRegistry, RunOptions, ToolPlugin};
use bosun_types::{
    CheckReport, Diagnostic, DocumentId, DocumentSnapshot, FormatReport, RegistryStats,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Receives replace-all diagnostic publications, one document at a time.
///
/// The host's side of the pipeline: an editor shim, a test capture, or
/// the CLI each provide one.
pub trait DiagnosticSink: Send + Sync {
    fn publish(&self, id: &DocumentId, diagnostics: Vec<Diagnostic>);
}

/// Discards every publication. For hosts that only use the direct
/// entry points.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn publish(&self, _id: &DocumentId, _diagnostics: Vec<Diagnostic>) {}
}

/// Tunables applied to every run; replaced wholesale on reload.
#[derive(Debug, Clone)]
struct RunSettings {
    debounce: Duration,
    timeout: Duration,
    skip: SkipList,
}

impl RunSettings {
    fn from_config(config: &BosunConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.diagnostics.debounce_ms),
            timeout: Duration::from_millis(config.diagnostics.timeout_ms),
            skip: SkipList::build(&config.files.skip),
        }
    }
}

/// Live state for one open document.
struct DocumentSession {
    text: Arc<str>,
    /// Last allocated run sequence number.
    seq: u64,
    /// Highest sequence number whose result was published.
    published_seq: u64,
    /// Debounce timer waiting out an edit burst's quiet period.
    pending: Option<JoinHandle<()>>,
    /// Token of the most recent run; the next run cancels it.
    cancel: CancellationToken,
}

impl DocumentSession {
    fn new(text: Arc<str>) -> Self {
        Self {
            text,
            seq: 0,
            published_seq: 0,
            pending: None,
            cancel: CancellationToken::new(),
        }
    }

    fn replace_text(&mut self, text: Arc<str>) {
        self.text = text;
    }

    fn clear_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }

    /// Cancel the in-flight run and hand out the token for the next one.
    fn next_run(&mut self) -> (u64, CancellationToken) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.seq += 1;
        (self.seq, self.cancel.clone())
    }
}

struct Inner {
    registry: RwLock<PluginRegistry>,
    sessions: Mutex<HashMap<DocumentId, DocumentSession>>,
    settings: RwLock<RunSettings>,
    sink: Arc<dyn DiagnosticSink>,
}

impl Inner {
    /// One diagnosis run: snapshot the session, fan out across the
    /// active plugins, publish if the result is conclusive and still
    /// the newest.
    async fn diagnose(self: Arc<Self>, id: DocumentId) {
        let (seq, token, text) = {
            let mut sessions = self.sessions.lock().await;
            let Some(session) = sessions.get_mut(&id) else {
                return;
            };
            let (seq, token) = session.next_run();
            (seq, token, session.text.clone())
        };

        let timeout = self.settings.read().await.timeout;
        let opts = RunOptions::new()
            .with_timeout(timeout)
            .with_cancel_token(token);
        let doc = DocumentSnapshot::new(id.clone(), text);

        let report = self.registry.read().await.check(&doc, &opts).await;

        if !report.is_conclusive() {
            tracing::debug!(document = id.as_str(), "diagnosis inconclusive");
            return;
        }

        {
            let mut sessions = self.sessions.lock().await;
            let Some(session) = sessions.get_mut(&id) else {
                return;
            };
            if seq <= session.published_seq {
                tracing::debug!(document = id.as_str(), seq, "discarding superseded run");
                return;
            }
            session.published_seq = seq;
        }
        self.sink.publish(&id, report.into_diagnostics());
    }
}

/// The engine's hub: owns the plugin registry, the per-document
/// sessions, and the run settings, and turns document events into
/// published diagnostics.
///
/// Explicitly constructed and passed by reference; a host holds exactly
/// one. Event methods return quickly, diagnosis runs on spawned tasks.
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    /// Build the registry from the configuration and activate the
    /// backends it enables. When this returns, the active set reflects
    /// actual tool availability.
    pub async fn start(config: &BosunConfig, sink: Arc<dyn DiagnosticSink>) -> Self {
        let mut registry = PluginRegistry::new();
        for plugin in config.build_plugins() {
            registry.register(plugin);
        }
        let enabled = config.enabled_plugins();
        let activated = registry.activate_many(enabled.iter().copied()).await;
        tracing::info!(activated, total = registry.stats().total, "pipeline started");

        Self {
            inner: Arc::new(Inner {
                registry: RwLock::new(registry),
                sessions: Mutex::new(HashMap::new()),
                settings: RwLock::new(RunSettings::from_config(config)),
                sink,
            }),
        }
    }

    /// A document came into view; diagnose it immediately.
    pub async fn document_opened(&self, id: DocumentId, text: &str) {
        self.refresh(id, text).await;
    }

    /// A document was saved; same urgency as opening.
    pub async fn document_saved(&self, id: DocumentId, text: &str) {
        self.refresh(id, text).await;
    }

    /// A document changed; re-diagnose once the edit burst quiets down.
    /// Each edit replaces the pending timer, so only the final content
    /// of the burst is diagnosed.
    pub async fn document_edited(&self, id: DocumentId, text: &str) {
        if self.ignored(&id).await {
            return;
        }
        let debounce = self.inner.settings.read().await.debounce;
        let mut sessions = self.inner.sessions.lock().await;
        let text: Arc<str> = Arc::from(text);
        let session = sessions
            .entry(id.clone())
            .or_insert_with(|| DocumentSession::new(text.clone()));
        session.replace_text(text);
        session.clear_pending();
        session.pending = Some(tokio::spawn({
            let inner = Arc::clone(&self.inner);
            async move {
                tokio::time::sleep(debounce).await;
                inner.diagnose(id).await;
            }
        }));
    }

    /// Drop the session and clear the document's published diagnostics.
    pub async fn document_closed(&self, id: &DocumentId) {
        let removed = self.inner.sessions.lock().await.remove(id);
        if let Some(mut session) = removed {
            session.clear_pending();
            session.cancel.cancel();
            self.inner.sink.publish(id, Vec::new());
        }
    }

    /// One direct diagnosis pass, bypassing sessions and debounce.
    pub async fn check_now(&self, doc: &DocumentSnapshot) -> CheckReport {
        let opts = self.run_options().await;
        self.inner.registry.read().await.check(doc, &opts).await
    }

    /// One direct formatting pass; the first capable backend wins.
    pub async fn format_document(&self, doc: &DocumentSnapshot) -> FormatReport {
        let opts = self.run_options().await;
        self.inner.registry.read().await.format(doc, &opts).await
    }

    /// Registry totals for status display.
    pub async fn stats(&self) -> RegistryStats {
        self.inner.registry.read().await.stats()
    }

    /// Apply a new configuration: cancel pending work, rebuild every
    /// backend instance, reactivate what the new configuration enables,
    /// and re-diagnose every open document from its last-known text.
    pub async fn reload(&self, config: &BosunConfig) {
        self.apply(
            config.build_plugins(),
            config.enabled_plugins(),
            RunSettings::from_config(config),
        )
        .await;
    }

    /// Stop all pending timers and in-flight runs. Sessions stay; a
    /// host that shuts down is expected to drop the orchestrator next.
    pub async fn shutdown(&self) {
        let mut sessions = self.inner.sessions.lock().await;
        for session in sessions.values_mut() {
            session.clear_pending();
            session.cancel.cancel();
        }
    }

    async fn apply(
        &self,
        plugins: Vec<Box<dyn ToolPlugin>>,
        enabled: Vec<&'static str>,
        settings: RunSettings,
    ) {
        {
            let mut sessions = self.inner.sessions.lock().await;
            for session in sessions.values_mut() {
                session.clear_pending();
                session.cancel.cancel();
            }
        }
        *self.inner.settings.write().await = settings;
        {
            let mut registry = self.inner.registry.write().await;
            for plugin in plugins {
                registry.register(plugin);
            }
            let activated = registry.reactivate(enabled.iter().copied()).await;
            tracing::info!(activated, "configuration applied");
        }

        let open: Vec<DocumentId> = self.inner.sessions.lock().await.keys().cloned().collect();
        for id in open {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(inner.diagnose(id));
        }
    }

    async fn refresh(&self, id: DocumentId, text: &str) {
        if self.ignored(&id).await {
            return;
        }
        {
            let mut sessions = self.inner.sessions.lock().await;
            let text: Arc<str> = Arc::from(text);
            let session = sessions
                .entry(id.clone())
                .or_insert_with(|| DocumentSession::new(text.clone()));
            session.replace_text(text);
            session.clear_pending();
        }
        let inner = Arc::clone(&self.inner);
        tokio::spawn(inner.diagnose(id));
    }

    /// Skip rules and extension support, applied to every document
    /// event before it touches a session.
    async fn ignored(&self, id: &DocumentId) -> bool {
        if self.inner.settings.read().await.skip.matches(id.as_str()) {
            tracing::debug!(document = id.as_str(), "skipped by files.skip");
            return true;
        }
        let Some(ext) = id.extension() else {
            return true;
        };
        !self.inner.registry.read().await.supports_extension(ext)
    }

    async fn run_options(&self) -> RunOptions {
        let timeout = self.inner.settings.read().await.timeout;
        RunOptions::new().with_timeout(timeout)
    }
}
