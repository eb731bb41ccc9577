//! Main application for the YouTube Downloader GUI

// Command-line configuration
mod cli;
// External downloader (yt-dlp) invocation
mod downloader;
// Typed errors shown to the user
mod error;
// Tracing setup
mod logging;
// Data models for requests, quality and status
mod model;
// Owns state and runs background work
mod orchestrator;
// yt-dlp output parsing
mod progress;
// Quality to format expression
mod selector;
// Application state and update function
mod state;
// Thumbnail fetching module
mod thumbnail;
// Single-slot download worker
mod worker;

use std::sync::Arc;

use clap::Parser;
// eframe/egui for GUI application framework
use eframe::{App, Frame, egui};
use egui::{Color32, ColorImage, RichText, TextureHandle, TextureOptions};
// FileDialog for folder selection dialogs
use rfd::FileDialog;
use tokio::runtime::Runtime;

use downloader::{YtDlp, locate_tool};
use model::{Quality, Status};
use orchestrator::Orchestrator;
use state::{AppState, Message, NoticeLevel};

/// Program entry point: parses flags, starts the runtime and launches the GUI
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::Args::parse();
    logging::init_tracing(&args.log_level);

    let program = locate_tool(args.tool)?;
    let tool = YtDlp::new(program).with_leading_args(args.tool_args);
    tracing::info!(tool = %tool.program().display(), "starting");

    // Background work runs here; the handle is passed down explicitly
    let rt = Runtime::new()?;
    let handle = rt.handle().clone();
    let state = AppState::new(args.download_dir.unwrap_or_default(), args.quality);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("📥 YouTube Downloader with Preview")
            .with_inner_size([550.0, 500.0])
            .with_resizable(false),
        ..Default::default()
    };
    eframe::run_native(
        "YouTube Downloader",
        options,
        Box::new(move |cc| {
            // Built here so the worker and metadata tasks get the real repaint hook
            let ctx = cc.egui_ctx.clone();
            let orchestrator =
                Orchestrator::new(handle, Arc::new(tool), state, Arc::new(move || ctx.request_repaint()));
            Box::new(DownloaderApp::new(orchestrator))
        }),
    )?;
    drop(rt);
    Ok(())
}

/// Presentation layer: renders `AppState` and turns input into messages
struct DownloaderApp {
    orchestrator: Orchestrator,
    /// Texture for the current preview thumbnail
    thumbnail: Option<TextureHandle>,
    /// Preview revision the texture was built from
    thumbnail_revision: u64,
}

impl DownloaderApp {
    fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator, thumbnail: None, thumbnail_revision: 0 }
    }

    fn sync_thumbnail(&mut self, ctx: &egui::Context) {
        let state = self.orchestrator.state();
        if state.preview_revision() == self.thumbnail_revision {
            return;
        }
        self.thumbnail_revision = state.preview_revision();
        self.thumbnail = state.preview.thumbnail().map(|thumb| {
            let size = [thumb.width as usize, thumb.height as usize];
            let image = ColorImage::from_rgba_unmultiplied(size, &thumb.rgba);
            ctx.load_texture("thumbnail", image, TextureOptions::default())
        });
    }
}

fn status_color(status: &Status) -> Color32 {
    match status {
        Status::Downloading | Status::Fetching => Color32::LIGHT_BLUE,
        Status::Succeeded => Color32::GREEN,
        Status::Failed(_) => Color32::RED,
        Status::Idle => Color32::GRAY,
    }
}

impl App for DownloaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        // 1️⃣ Apply finished background work
        self.orchestrator.pump();
        self.sync_thumbnail(ctx);

        let mut outbox = Vec::new();
        let state = self.orchestrator.state();
        let busy = state.status.is_busy();

        // 2️⃣ Main panel
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label("Paste a YouTube video link below:");
                let mut url = state.url.clone();
                let response = ui.add(egui::TextEdit::singleline(&mut url).desired_width(420.0));
                if response.changed() {
                    outbox.push(Message::UrlEdited(url));
                }
                // Metadata is fetched when the field loses focus
                if response.lost_focus() {
                    outbox.push(Message::UrlCommitted);
                }

                ui.label(RichText::new(state.preview.caption()).italics());
                if let Some(tex) = &self.thumbnail {
                    ui.image(tex);
                } else if matches!(state.preview, model::Preview::Loading(_)) {
                    ui.add(egui::Spinner::new());
                }

                ui.add_space(8.0);
                ui.label("Choose Quality:");
                let mut quality = state.quality;
                egui::ComboBox::from_id_source("quality")
                    .selected_text(quality.label())
                    .show_ui(ui, |ui| {
                        for q in Quality::ALL {
                            ui.selectable_value(&mut quality, q, q.label());
                        }
                    });
                if quality != state.quality {
                    outbox.push(Message::QualityChosen(quality));
                }

                // Folder selection
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    let mut destination = state.destination.clone();
                    if ui
                        .add(egui::TextEdit::singleline(&mut destination).desired_width(330.0))
                        .changed()
                    {
                        outbox.push(Message::DestinationEdited(destination));
                    }
                    if ui.button("📁 Browse").clicked() {
                        if let Some(folder) = FileDialog::new().pick_folder() {
                            outbox.push(Message::DestinationEdited(folder.display().to_string()));
                        }
                    }
                });

                ui.add_space(12.0);
                if ui.add_enabled(!busy, egui::Button::new("🎬 Download Video")).clicked() {
                    outbox.push(Message::DownloadClicked);
                }

                ui.add_space(8.0);
                if busy {
                    match state.progress {
                        Some(fraction) => {
                            ui.add(egui::ProgressBar::new(fraction).desired_width(300.0).show_percentage());
                        }
                        None => {
                            ui.add(egui::Spinner::new());
                        }
                    }
                }
                ui.label(
                    RichText::new(state.status.text())
                        .italics()
                        .color(status_color(&state.status)),
                );
                // Where the finished download landed, if yt-dlp said so
                if let Some(path) = state.saved_file() {
                    ui.label(RichText::new(format!("📄 {}", path.display())).small());
                }
            });
        });

        // 3️⃣ Warning / error dialog
        if let Some(notice) = &state.notice {
            let icon = match notice.level {
                NoticeLevel::Warning => "⚠",
                NoticeLevel::Error => "❌",
            };
            egui::Window::new(notice.title)
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(format!("{icon} {}", notice.message));
                    if ui.button("OK").clicked() {
                        outbox.push(Message::DismissNotice);
                    }
                });
        }

        for message in outbox {
            self.orchestrator.dispatch(message);
        }

        // Keep the spinner moving while a download runs
        if busy {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
