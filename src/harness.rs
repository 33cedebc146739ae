//! Plans users × documents sessions and drives them to completion.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::attachment;
use crate::config::{HarnessConfig, TransportConfig};
use crate::error::Result;
use crate::metrics::{MetricsSnapshot, RunMetrics};
use crate::session::{Session, random_hex};
use crate::sockjs::dispatch;
use crate::transport::{NORMAL_CLOSURE, WsClient};

/// One session to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    /// `<mmddHHMM>_<user>_<doc>_<16 hex>`.
    pub doc_id: String,
    /// Document URL placed in the open command.
    pub document_url: String,
}

/// Runs every planned session concurrently on the current runtime.
pub struct Harness {
    config: HarnessConfig,
    metrics: Arc<RunMetrics>,
    http: reqwest::Client,
}

impl Harness {
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(RunMetrics::new()),
            http: http_client(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    #[must_use]
    pub fn metrics(&self) -> &Arc<RunMetrics> {
        &self.metrics
    }

    /// Sessions for `config`, stamped with the current local time.
    #[must_use]
    pub fn plan(config: &HarnessConfig) -> Vec<SessionPlan> {
        let prefix = chrono::Local::now().format("%m%d%H%M").to_string();
        Self::plan_with_prefix(config, &prefix)
    }

    /// Sessions for `config` with an explicit document id prefix.
    ///
    /// Users are the outer loop. With a base URL, user `u` and document `d`
    /// open `names[(d * u) % names.len()]`.
    #[must_use]
    pub fn plan_with_prefix(config: &HarnessConfig, prefix: &str) -> Vec<SessionPlan> {
        let mut plans = Vec::with_capacity(config.session_count());
        for user in 0..config.users {
            for doc in 0..config.documents {
                let document_url = match (&config.base_url, config.document_names.len()) {
                    (Some(base), len) if len > 0 => {
                        format!("{base}/{}", config.document_names[(doc * user) % len])
                    }
                    _ => config.document_url.clone(),
                };
                plans.push(SessionPlan {
                    doc_id: format!("{prefix}_{user}_{doc}_{}", random_hex(8)),
                    document_url,
                });
            }
        }
        plans
    }

    /// Launch every planned session at once and wait for all of them.
    ///
    /// A failing session is logged and counted; it never stops the others.
    pub async fn run(&self) -> MetricsSnapshot {
        let plans = Self::plan(&self.config);
        self.run_plans(plans).await
    }

    /// Like [`Harness::run`] with a caller-provided plan.
    pub async fn run_plans(&self, plans: Vec<SessionPlan>) -> MetricsSnapshot {
        self.metrics.start();
        info!(
            sessions = plans.len(),
            server = %self.config.server,
            changes = self.config.change_budget,
            "starting load run"
        );

        let mut tasks = JoinSet::new();
        for plan in plans {
            let span = info_span!("session", doc_id = %plan.doc_id);
            let driver = SessionDriver {
                session: Session::new(plan.doc_id, plan.document_url, self.config.change_budget),
                server: self.config.server.clone(),
                transport: self.config.transport.clone(),
                output_dir: self.config.output_dir.clone(),
                metrics: Arc::clone(&self.metrics),
                http: self.http.clone(),
            };
            tasks.spawn(driver.run().instrument(span));
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "session task aborted");
                self.metrics.session_failed();
            }
        }

        let snapshot = self.metrics.snapshot();
        info!(
            completed = snapshot.sessions_completed,
            failed = snapshot.sessions_failed,
            edits = snapshot.edits_sent,
            "load run finished"
        );
        snapshot
    }
}

/// Attachment downloads go straight to the document server, never through
/// a system proxy.
fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap_or_default()
}

struct SessionDriver {
    session: Session,
    server: String,
    transport: TransportConfig,
    output_dir: PathBuf,
    metrics: Arc<RunMetrics>,
    http: reqwest::Client,
}

impl SessionDriver {
    async fn run(mut self) {
        self.metrics.session_started();
        let mut fetches = JoinSet::new();

        let outcome = self.drive(&mut fetches).await;
        self.session.link_lost();
        self.metrics.edits_sent(self.session.edits_sent());

        match outcome {
            Ok(()) => {
                debug!(edits = self.session.edits_sent(), "session finished");
                self.metrics.session_completed();
            }
            Err(err) => {
                warn!(error = %err, "session failed");
                self.metrics.session_failed();
            }
        }

        while let Some(joined) = fetches.join_next().await {
            match joined {
                Ok(Ok(path)) => {
                    debug!(path = %path.display(), "attachment stored");
                    self.metrics.attachment_saved();
                }
                Ok(Err(err)) => {
                    warn!(error = %err, "attachment download failed");
                    self.metrics.attachment_failed();
                }
                Err(err) => {
                    warn!(error = %err, "attachment task aborted");
                    self.metrics.attachment_failed();
                }
            }
        }
    }

    async fn drive(&mut self, fetches: &mut JoinSet<Result<PathBuf>>) -> Result<()> {
        let url = self.session.connect_url(&self.server)?;
        let mut ws = WsClient::connect(&url, &self.transport).await?;
        self.session.link_opened();

        while let Some(text) = ws.recv().await? {
            self.metrics.frame_received(text.len());
            debug!(frame = %text, "recv");
            dispatch(&text, &mut self.session);

            for frame in self.session.take_outbound() {
                ws.send_text(&frame).await?;
                self.metrics.request_sent(frame.len());
            }

            for url in self.session.take_attachments() {
                let http = self.http.clone();
                let dir = self.output_dir.clone();
                fetches.spawn(
                    async move { attachment::fetch(&http, &url, &dir).await }
                        .in_current_span(),
                );
            }

            if self.session.is_closed() {
                ws.close(NORMAL_CLOSURE).await?;
            }
        }

        Ok(())
    }
}
