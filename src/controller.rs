//! Single owner of the editor state.
//!
//! Every mutation goes through one [`Controller`], either by direct calls or as
//! [`Command`]s drained by [`Controller::run`]. Events are handled one at a time, so a
//! history read-modify-write never interleaves with another export.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::color::Color;
use crate::debounce::Debouncer;
use crate::error::{ExportResult, StoreResult, ValidationResult};
use crate::export::{ExportFile, ExportFormat, Exporter, FileSaver};
use crate::history::{HistoryEntry, HistoryStore};
use crate::logo::LogoSpec;
use crate::metadata::{
    check_margin, ECLevel, PixelSize, RenderConfig, RenderRequest, StyleKind, TextStatus, MAX_MARGIN,
};
use crate::persist::{Persistence, TEXT_KEY};
use crate::pipeline::{RenderOutcome, RenderPipeline};
use crate::provider::EncodingProvider;

/// A validated change to the render inputs.
#[derive(Debug, Clone)]
pub enum Edit {
    Text(String),
    Dark(Color),
    Light(Color),
    PixelSize(PixelSize),
    Margin(u32),
    ECLevel(ECLevel),
    Style(StyleKind),
    Logo(Option<LogoSpec>),
}

/// Read-only view of the editor for front ends.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub text: String,
    pub config: RenderConfig,
    pub status: TextStatus,
    pub has_logo: bool,
    pub rendered: Option<RenderRequest>,
    pub error: Option<String>,
    pub pending: bool,
}

#[derive(Debug)]
pub enum Command {
    Edit(Edit),
    Export { format: ExportFormat, reply: oneshot::Sender<ExportResult<PathBuf>> },
    History(oneshot::Sender<Vec<HistoryEntry>>),
    RemoveHistory { id: String, reply: oneshot::Sender<StoreResult<bool>> },
    ClearHistory(oneshot::Sender<StoreResult<()>>),
    Restore { id: String, reply: oneshot::Sender<bool> },
    Snapshot(oneshot::Sender<Snapshot>),
}

pub struct Controller<P, S, F> {
    text: String,
    config: RenderConfig,
    logo: Option<LogoSpec>,
    pipeline: RenderPipeline<P>,
    debouncer: Debouncer<RenderRequest>,
    rendered: Option<RenderRequest>,
    outcome: RenderOutcome,
    exporter: Exporter<F>,
    history: HistoryStore<S>,
}

impl<P: EncodingProvider, S: Persistence, F: FileSaver> Controller<P, S, F> {
    /// Restores the last edited text and the export history from `store` and renders the
    /// restored text right away.
    pub fn new(provider: P, store: S, saver: F) -> Self {
        let text = match store.load(TEXT_KEY) {
            Ok(text) => text.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not restore text");
                String::new()
            }
        };
        let history = HistoryStore::load(store);
        tracing::info!(entries = history.len(), restored_chars = text.chars().count(), "Editor ready");

        let mut controller = Self {
            text,
            config: RenderConfig::default(),
            logo: None,
            pipeline: RenderPipeline::new(provider),
            debouncer: Debouncer::default(),
            rendered: None,
            outcome: RenderOutcome::Empty(None),
            exporter: Exporter::new(saver),
            history,
        };
        let req = controller.request();
        controller.execute(req);
        controller
    }

    fn request(&self) -> RenderRequest {
        RenderRequest::new(self.text.clone(), self.config)
    }

    fn schedule(&mut self, now: Instant) {
        let req = self.request();
        self.debouncer.schedule(req, now);
    }

    fn execute(&mut self, req: RenderRequest) {
        self.outcome = self.pipeline.render(&req, self.logo.as_ref());
        self.rendered = (!self.outcome.is_empty()).then_some(req);
    }

    // Edits
    //--------------------------------------------------------------------------

    pub fn apply(&mut self, edit: Edit, now: Instant) {
        match edit {
            Edit::Text(text) => {
                self.set_text(text, now);
                return;
            }
            Edit::Dark(c) => self.config.dark = c,
            Edit::Light(c) => self.config.light = c,
            Edit::PixelSize(s) => self.config.pixel_size = s,
            // Out-of-range margins are clamped; `set_margin` rejects them instead
            Edit::Margin(m) => self.config.margin = m.min(MAX_MARGIN),
            Edit::ECLevel(ecl) => self.config.ec_level = ecl,
            Edit::Style(s) => self.config.style = s,
            Edit::Logo(logo) => self.logo = logo,
        }
        self.schedule(now);
    }

    pub fn set_text(&mut self, text: impl Into<String>, now: Instant) -> TextStatus {
        self.text = text.into();
        if let Err(e) = self.history.store().save(TEXT_KEY, &self.text) {
            tracing::warn!(error = %e, "Could not persist text");
        }
        self.schedule(now);
        TextStatus::of(&self.text)
    }

    /// Parses and applies a dark color. Malformed input leaves everything untouched.
    pub fn set_dark(&mut self, color: &str, now: Instant) -> ValidationResult<()> {
        let c = Color::parse(color)?;
        self.apply(Edit::Dark(c), now);
        Ok(())
    }

    pub fn set_light(&mut self, color: &str, now: Instant) -> ValidationResult<()> {
        let c = Color::parse(color)?;
        self.apply(Edit::Light(c), now);
        Ok(())
    }

    pub fn set_pixel_size(&mut self, size: PixelSize, now: Instant) {
        self.apply(Edit::PixelSize(size), now);
    }

    pub fn set_margin(&mut self, margin: u32, now: Instant) -> ValidationResult<()> {
        let margin = check_margin(margin)?;
        self.apply(Edit::Margin(margin), now);
        Ok(())
    }

    pub fn set_ec_level(&mut self, ecl: ECLevel, now: Instant) {
        self.apply(Edit::ECLevel(ecl), now);
    }

    pub fn set_style(&mut self, style: StyleKind, now: Instant) {
        self.apply(Edit::Style(style), now);
    }

    pub fn set_logo(&mut self, logo: LogoSpec, now: Instant) {
        self.apply(Edit::Logo(Some(logo)), now);
    }

    pub fn clear_logo(&mut self, now: Instant) {
        self.apply(Edit::Logo(None), now);
    }

    // Rendering
    //--------------------------------------------------------------------------

    /// Runs the pending render if its debounce deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.debouncer.take_due(now) {
            Some(req) => {
                self.execute(req);
                true
            }
            None => false,
        }
    }

    /// Runs the pending render immediately.
    pub fn flush(&mut self) -> bool {
        match self.debouncer.take_now() {
            Some(req) => {
                self.execute(req);
                true
            }
            None => false,
        }
    }

    pub fn outcome(&self) -> &RenderOutcome {
        &self.outcome
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn logo(&self) -> Option<&LogoSpec> {
        self.logo.as_ref()
    }

    pub fn pipeline(&self) -> &RenderPipeline<P> {
        &self.pipeline
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            text: self.text.clone(),
            config: self.config,
            status: TextStatus::of(&self.text),
            has_logo: self.logo.is_some(),
            rendered: self.rendered.clone(),
            error: match &self.outcome {
                RenderOutcome::Empty(Some(e)) => Some(e.to_string()),
                _ => None,
            },
            pending: self.debouncer.is_pending(),
        }
    }

    // Export & history
    //--------------------------------------------------------------------------

    /// Exports the current code. A pending edit is rendered first so the file always
    /// reflects the latest input. History is only touched after the file is saved.
    pub fn export(&mut self, format: ExportFormat, now: DateTime<Utc>) -> ExportResult<(ExportFile, PathBuf)> {
        self.flush();
        let (file, path) = self.exporter.export(self.outcome.export(), format, now.timestamp_millis())?;

        if let Some(req) = &self.rendered {
            if let Err(e) = self.history.add(req.effective_text(), req.config, now) {
                tracing::warn!(error = %e, "Export saved but history could not be persisted");
            }
        }
        Ok((file, path))
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.history.entries()
    }

    pub fn remove_history(&mut self, id: &str) -> StoreResult<bool> {
        Ok(self.history.remove(id)?.is_some())
    }

    pub fn clear_history(&mut self) -> StoreResult<()> {
        self.history.clear()
    }

    /// Loads a history entry's text and settings back into the editor.
    pub fn restore(&mut self, id: &str, now: Instant) -> bool {
        let Some(entry) = self.history.get(id).cloned() else {
            return false;
        };
        self.config = entry.config;
        self.set_text(entry.text, now);
        true
    }

    // Event loop
    //--------------------------------------------------------------------------

    pub fn handle(&mut self, cmd: Command, now: Instant) {
        // A dropped receiver only means the front end stopped listening
        match cmd {
            Command::Edit(edit) => self.apply(edit, now),
            Command::Export { format, reply } => {
                let res = self.export(format, Utc::now()).map(|(_, path)| path);
                if let Err(e) = &res {
                    tracing::warn!(error = %e, "Export failed");
                }
                let _ = reply.send(res);
            }
            Command::History(reply) => {
                let _ = reply.send(self.history().to_vec());
            }
            Command::RemoveHistory { id, reply } => {
                let _ = reply.send(self.remove_history(&id));
            }
            Command::ClearHistory(reply) => {
                let _ = reply.send(self.clear_history());
            }
            Command::Restore { id, reply } => {
                let _ = reply.send(self.restore(&id, now));
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    /// Drains `commands` until every sender is gone, running debounced renders as their
    /// deadlines pass. The debounce timer is the only suspension point besides the channel.
    pub async fn run(&mut self, mut commands: mpsc::Receiver<Command>) {
        loop {
            let deadline = self.debouncer.deadline();
            let timer = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now));

            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle(cmd, Instant::now()),
                    None => break,
                },
                _ = timer, if deadline.is_some() => {
                    self.poll(Instant::now());
                }
            }
        }
        self.flush();
        tracing::debug!("Command channel closed");
    }
}
