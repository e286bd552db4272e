// ============================================================================
// RETOUCH APP — panel layout, event wiring, background render pipeline
// ============================================================================

use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Instant;

use eframe::egui;
use image::RgbaImage;

use crate::components::controls::{ControlEvent, ControlsPanel};
use crate::components::histogram_panel::HistogramPanel;
use crate::components::history_panel::HistoryPanel;
use crate::components::image_view::ImageView;
use crate::io::{self, DisplayFormat};
use crate::ops::actions::{Action, Operation};
use crate::ops::histogram::ChannelHistogram;
use crate::ops::replay::{CacheScope, ReplayCache, render};
use crate::session::SessionState;
use crate::theme;
use crate::{log_err, log_info, log_warn};

// ============================================================================
// ASYNC RENDER PIPELINE — replay runs off the UI thread
// ============================================================================

/// Result delivered from a background render thread.
enum RenderOutcome {
    Done {
        /// The re-encoded display image (what the view and histogram show).
        preview: RgbaImage,
        histogram: ChannelHistogram,
        token: u64,
        elapsed_ms: f64,
    },
    Failed {
        token: u64,
        error: String,
    },
}

pub struct RetouchApp {
    session: SessionState,
    original: Arc<RgbaImage>,
    cache: Arc<Mutex<ReplayCache>>,

    // UI components
    controls: ControlsPanel,
    image_view: ImageView,
    histogram_panel: HistogramPanel,
    history_panel: HistoryPanel,
    histogram: Option<ChannelHistogram>,

    // Async render pipeline
    render_sender: mpsc::Sender<RenderOutcome>,
    render_receiver: mpsc::Receiver<RenderOutcome>,
    /// When > 0, a background render is in progress; show spinner.
    pending_jobs: usize,
    /// Monotonically-increasing token; results carrying an older token are
    /// discarded on receipt.
    render_token: u64,

    status: String,
    first_frame: bool,
    /// Format the last scheduled render used; a radio change re-encodes.
    rendered_format: DisplayFormat,
}

impl RetouchApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        theme::apply(&cc.egui_ctx);

        let original = io::placeholder_image();
        let source_bytes =
            io::encode_image(&original, DisplayFormat::Png, io::JPEG_QUALITY).unwrap_or_default();
        let session = SessionState::new("untitled", &source_bytes);

        let (render_sender, render_receiver) = mpsc::channel();

        Self {
            session,
            original: Arc::new(original),
            cache: Arc::new(Mutex::new(ReplayCache::default())),
            controls: ControlsPanel::default(),
            image_view: ImageView::default(),
            histogram_panel: HistogramPanel::default(),
            history_panel: HistoryPanel::default(),
            histogram: None,
            render_sender,
            render_receiver,
            pending_jobs: 0,
            render_token: 0,
            status: String::new(),
            first_frame: true,
            rendered_format: DisplayFormat::Jpeg,
        }
    }

    /// Kick off a background replay + display-encode job for the current
    /// session state.
    fn schedule_render(&mut self, ctx: &egui::Context) {
        self.render_token += 1;
        self.pending_jobs += 1;
        self.rendered_format = self.controls.display_format;

        let token = self.render_token;
        let original = self.original.clone();
        let actions = self.session.action_stack.actions().to_vec();
        let session_id = self.session.session_id.clone();
        let filename = self.session.filename.clone();
        let signature = self.session.image_signature.clone();
        let cache = self.cache.clone();
        let format = self.controls.display_format;
        let sender = self.render_sender.clone();
        let ctx = ctx.clone();

        thread::spawn(move || {
            let start = Instant::now();
            let outcome = (|| -> Result<(RgbaImage, ChannelHistogram), String> {
                let replayed = {
                    let mut cache = cache
                        .lock()
                        .map_err(|_| "render cache poisoned".to_string())?;
                    let scope = CacheScope {
                        session_id: &session_id,
                        filename: &filename,
                        signature: &signature,
                    };
                    render(&original, &actions, scope, &mut cache)
                };
                let preview = io::render_preview(&replayed, format, io::JPEG_QUALITY)?;
                let histogram = ChannelHistogram::compute(&preview);
                Ok((preview, histogram))
            })();

            let msg = match outcome {
                Ok((preview, histogram)) => RenderOutcome::Done {
                    preview,
                    histogram,
                    token,
                    elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
                },
                Err(error) => RenderOutcome::Failed { token, error },
            };
            let _ = sender.send(msg);
            ctx.request_repaint();
        });
    }

    /// Drain finished render jobs; apply the newest, drop superseded ones.
    fn receive_renders(&mut self, ctx: &egui::Context) {
        while let Ok(outcome) = self.render_receiver.try_recv() {
            self.pending_jobs = self.pending_jobs.saturating_sub(1);
            match outcome {
                RenderOutcome::Done {
                    preview,
                    histogram,
                    token,
                    elapsed_ms,
                } => {
                    if token != self.render_token {
                        continue; // superseded by a newer job
                    }
                    self.image_view.set_image(ctx, &preview);
                    self.histogram = Some(histogram);
                    self.status = format!("Updated image in {:.0} ms", elapsed_ms);
                    log_info!("render done in {:.1} ms ({} actions)", elapsed_ms, self.session.action_stack.len());
                }
                RenderOutcome::Failed { token, error } => {
                    if token != self.render_token {
                        continue;
                    }
                    self.status = format!("Render failed: {}", error);
                    log_err!("render failed: {}", error);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Event handlers
    // ------------------------------------------------------------------

    fn open_image(&mut self, ctx: &egui::Context) {
        let Some(path) = io::pick_image_file() else {
            return;
        };
        match io::load_image(&path) {
            Ok((image, bytes)) => {
                let filename = path
                    .file_name()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string());
                log_info!(
                    "{} replaced by {} ({}x{})",
                    self.session.filename,
                    filename,
                    image.width(),
                    image.height()
                );
                self.session.replace_image(&filename, &bytes);
                self.original = Arc::new(image);
                self.image_view.clear_selection();
                if let Ok(mut cache) = self.cache.lock() {
                    cache.clear();
                }
                self.status = format!("Opened {}", filename);
                self.schedule_render(ctx);
            }
            Err(e) => {
                self.status = e.clone();
                log_err!("open failed: {}", e);
            }
        }
    }

    fn save_image(&mut self) {
        let format = self.controls.display_format;
        let Some(path) = io::pick_save_image_file(format) else {
            return;
        };
        // Mostly cache hits: the GUI has already rendered this stack.
        let replayed = {
            let Ok(mut cache) = self.cache.lock() else {
                self.status = "render cache poisoned".to_string();
                return;
            };
            let scope = CacheScope {
                session_id: &self.session.session_id,
                filename: &self.session.filename,
                signature: &self.session.image_signature,
            };
            render(
                &self.original,
                self.session.action_stack.actions(),
                scope,
                &mut cache,
            )
        };
        match io::encode_and_write(&replayed, &path, format, io::JPEG_QUALITY) {
            Ok(()) => {
                self.status = format!("Saved {}", path.display());
                log_info!("saved {}", path.display());
            }
            Err(e) => {
                self.status = e.clone();
                log_err!("save failed: {}", e);
            }
        }
    }

    fn export_session(&mut self) {
        let Some(path) = io::pick_save_session_file() else {
            return;
        };
        match self.session.save(&path) {
            Ok(()) => self.status = format!("Session exported to {}", path.display()),
            Err(e) => {
                self.status = e.clone();
                log_err!("session export failed: {}", e);
            }
        }
    }

    fn import_session(&mut self, ctx: &egui::Context) {
        let Some(path) = io::pick_session_file() else {
            return;
        };
        match SessionState::load(&path) {
            Ok(loaded) => {
                // The stack only makes sense against the image it was
                // recorded on; the signature is the tie.
                if loaded.image_signature != self.session.image_signature {
                    self.status = "Session does not match the open image".to_string();
                    log_warn!(
                        "session import rejected: signature mismatch ({} vs {})",
                        loaded.filename,
                        self.session.filename
                    );
                    return;
                }
                self.session.action_stack = loaded.action_stack;
                self.status = format!(
                    "Imported session ({} actions)",
                    self.session.action_stack.len()
                );
                self.schedule_render(ctx);
            }
            Err(e) => {
                self.status = e.clone();
                log_err!("session import failed: {}", e);
            }
        }
    }

    fn run_operation(&mut self, ctx: &egui::Context) {
        let selection = self.image_view.selection.clone();
        let mut appended = 0;

        // Both dropdowns may be set; the filter lands first.
        if let Some(filter) = self.controls.pending_filter {
            self.session.action_stack.push(Action {
                operation: Operation::Filter(filter),
                selection: selection.clone(),
            });
            appended += 1;
        }
        if let Some(enhancement) = self.controls.pending_enhance {
            self.session.action_stack.push(Action {
                operation: Operation::Enhance {
                    enhancement,
                    enhancement_factor: self.controls.enhancement_factor,
                },
                selection,
            });
            appended += 1;
        }

        if appended == 0 {
            self.status = "Pick a filter or an enhancement first".to_string();
            return;
        }

        self.controls.reset_pending();
        self.schedule_render(ctx);
    }

    fn undo(&mut self, ctx: &egui::Context) {
        match self.session.action_stack.undo() {
            Some(action) => {
                self.status = format!("Undid {}", action.describe());
                log_info!("undo: {}", action.describe());
                self.schedule_render(ctx);
            }
            None => self.status = "Nothing to undo".to_string(),
        }
    }
}

impl eframe::App for RetouchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.receive_renders(ctx);

        if self.first_frame {
            self.first_frame = false;
            self.schedule_render(ctx);
        }

        let busy = self.pending_jobs > 0;

        egui::SidePanel::left("controls")
            .resizable(false)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Retouch");
                ui.separator();

                let event = self.controls.show(ui, busy);
                match event {
                    Some(ControlEvent::OpenImage) => self.open_image(ctx),
                    Some(ControlEvent::SaveImage) => self.save_image(),
                    Some(ControlEvent::ExportSession) => self.export_session(),
                    Some(ControlEvent::ImportSession) => self.import_session(ctx),
                    Some(ControlEvent::RunOperation) => self.run_operation(ctx),
                    Some(ControlEvent::Undo) => self.undo(ctx),
                    None => {}
                }

                // The display-format radio re-encodes the current image.
                if self.controls.display_format != self.rendered_format {
                    self.schedule_render(ctx);
                }

                ui.separator();
                self.histogram_panel.show(ui, self.histogram.as_ref());

                ui.separator();
                if let Some(keep) = self.history_panel.show(ui, &self.session.action_stack)
                    && !busy
                {
                    self.session.action_stack.truncate(keep);
                    self.status = format!("Reverted to {} edits", keep);
                    self.schedule_render(ctx);
                }
            });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if busy {
                    ui.spinner();
                }
                ui.label(&self.status);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let cache_mb = self
                        .cache
                        .lock()
                        .map(|c| c.memory_usage() as f64 / (1024.0 * 1024.0))
                        .unwrap_or(0.0);
                    ui.weak(format!(
                        "{} — {} edits — cache {:.1} MB",
                        self.session.filename,
                        self.session.action_stack.len(),
                        cache_mb
                    ));
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.image_view.show(ui, self.controls.selection_mode);
        });
    }
}
