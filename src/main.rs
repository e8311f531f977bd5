//! IPTV Directory
//! Browse a playlist by category and hand channels off to an external player

// Hide console window on Windows release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::Parser;
use eframe::egui;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

mod catalog;
mod config;
mod error;
mod ingest;
mod m3u_parser;
mod models;
mod player;

use catalog::Browser;
use config::AppConfig;
use ingest::{IngestOutcome, LoadGeneration, PlaylistSource};
use models::ChannelRecord;
use player::{ExternalPlayer, PlayerSession};

const CONSOLE_LINES: usize = 500;

#[derive(Parser, Debug)]
#[command(name = "iptv_directory")]
#[command(about = "Browse an IPTV playlist by category and play channels in an external player")]
struct Args {
    /// Playlist URL or local file (overrides the configured one)
    #[arg(long)]
    playlist: Option<String>,

    /// Play the channel with this slug once the playlist is loaded
    /// (name with whitespace replaced by '-')
    #[arg(long)]
    play: Option<String>,

    /// External player command (overrides the configured one)
    #[arg(long)]
    player: Option<String>,
}

/// Get current local time as HH:MM:SS
fn timestamp_now() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "iptv_directory=info".into());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Background task messages
enum TaskResult {
    Ingested {
        generation: u64,
        outcome: IngestOutcome,
    },
    PlayerLog(String),
}

/// What the channel area shows
enum LoadState {
    Loading,
    Ready(Browser),
    Empty,
    Failed(String),
}

fn main() -> Result<(), eframe::Error> {
    init_tracing();
    let args = Args::parse();

    let mut config = AppConfig::load();
    if let Some(playlist) = args.playlist {
        config.playlist_url = playlist;
    }
    if let Some(player) = args.player {
        config.external_player = player;
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 700.0])
            .with_min_inner_size([640.0, 480.0]),
        vsync: true,
        ..Default::default()
    };

    let pending_play = args.play;
    eframe::run_native(
        "IPTV Directory",
        options,
        Box::new(move |cc| {
            if config.dark_mode {
                cc.egui_ctx.set_visuals(egui::Visuals::dark());
            } else {
                cc.egui_ctx.set_visuals(egui::Visuals::light());
            }
            Ok(Box::new(DirectoryApp::new(config, pending_play)))
        }),
    )
}

struct DirectoryApp {
    config: AppConfig,
    state: LoadState,
    load_generation: LoadGeneration,
    epg_url: Option<String>,
    status_message: String,

    // Deep link to resolve once the catalog is ready
    pending_play: Option<String>,

    session: PlayerSession,
    player: ExternalPlayer,

    // Background task channel
    task_receiver: Receiver<TaskResult>,
    task_sender: Sender<TaskResult>,

    // Settings panel
    show_settings: bool,
    playlist_input: String,
    player_input: String,

    console_log: Vec<String>,
    show_console: bool,
}

impl DirectoryApp {
    fn new(config: AppConfig, pending_play: Option<String>) -> Self {
        let (task_sender, task_receiver) = mpsc::channel();
        let playlist_input = config.playlist_url.clone();
        let player_input = config.external_player.clone();

        let mut app = Self {
            config,
            state: LoadState::Loading,
            load_generation: LoadGeneration::default(),
            epg_url: None,
            status_message: String::new(),
            pending_play,
            session: PlayerSession::default(),
            player: ExternalPlayer::default(),
            task_receiver,
            task_sender,
            show_settings: false,
            playlist_input,
            player_input,
            console_log: Vec::new(),
            show_console: false,
        };
        app.load_playlist();
        app
    }

    fn log(&mut self, message: &str) {
        tracing::info!("{}", message);
        self.console_log.push(format!("[{}] {}", timestamp_now(), message));
        // Keep last 500 lines
        if self.console_log.len() > CONSOLE_LINES {
            self.console_log.remove(0);
        }
    }

    /// Fetch and parse on a worker thread; the result arrives as `TaskResult::Ingested`.
    /// Starting a new load supersedes any fetch still in flight.
    fn load_playlist(&mut self) {
        let source = PlaylistSource::parse(&self.config.playlist_url);
        let user_agent = self.config.user_agent.clone();
        let timeout = self.config.fetch_timeout();
        let sender = self.task_sender.clone();
        let generation = self.load_generation.advance();

        self.state = LoadState::Loading;
        self.status_message = "Loading playlist...".to_string();
        self.log(&format!("[INFO] Loading playlist: {}", source));

        thread::spawn(move || {
            let outcome = ingest::ingest(&source, &user_agent, timeout);
            let _ = sender.send(TaskResult::Ingested { generation, outcome });
        });
    }

    fn handle_ingested(&mut self, outcome: IngestOutcome) {
        match outcome {
            IngestOutcome::Loaded { catalog, epg_url } => {
                self.log(&format!("[INFO] Loaded {} channels", catalog.len()));
                if let Some(url) = &epg_url {
                    self.log(&format!("[INFO] Playlist advertises EPG: {}", url));
                }
                self.status_message = format!("{} channels", catalog.len());
                self.epg_url = epg_url;
                self.state = LoadState::Ready(Browser::new(catalog));
                self.resolve_pending_play();
            }
            IngestOutcome::Empty => {
                self.log("[WARN] Playlist fetched but contained no playable channels");
                self.status_message = "No channels".to_string();
                self.state = LoadState::Empty;
            }
            IngestOutcome::FetchFailed(e) => {
                self.log(&format!("[ERROR] {}", e));
                self.status_message = "Could not load channels".to_string();
                self.state = LoadState::Failed(e.to_string());
            }
        }
    }

    fn resolve_pending_play(&mut self) {
        let Some(slug) = self.pending_play.take() else {
            return;
        };
        let found = match &self.state {
            LoadState::Ready(browser) => browser.catalog().find_by_slug(&slug).cloned(),
            _ => None,
        };
        match found {
            Some(channel) => self.play_channel(channel),
            None => self.log(&format!("[WARN] No channel matches '{}'", slug)),
        }
    }

    fn play_channel(&mut self, channel: ChannelRecord) {
        let player = self.config.player_command().to_string();
        self.log(&format!("[PLAY] {} | Player: {}", channel.name, player));
        self.log(&format!("[PLAY] URL: {} ({})", channel.stream_uri, channel.stream_type.as_str()));

        let (line_sender, line_receiver) = mpsc::channel();
        match self
            .player
            .launch(&player, &channel, &self.config.user_agent, line_sender)
        {
            Ok(pid) => {
                self.log(&format!("[PLAY] Player launched successfully (PID: {})", pid));
                self.status_message = format!("Playing {}", channel.name);
                forward_player_lines(line_receiver, self.task_sender.clone());
            }
            Err(e) => {
                self.log(&format!("[ERROR] Failed to launch player '{}': {}", player, e));
                self.status_message = format!("Failed to launch '{}'", player);
            }
        }
        self.session.open(channel);
    }

    fn close_player(&mut self) {
        if self.session.close() {
            self.player.stop();
            self.log("[PLAY] Player closed");
            self.status_message.clear();
        }
    }

    fn poll_tasks(&mut self) {
        while let Ok(result) = self.task_receiver.try_recv() {
            match result {
                TaskResult::Ingested { generation, outcome } => {
                    if self.load_generation.is_current(generation) {
                        self.handle_ingested(outcome);
                    } else {
                        tracing::debug!(generation, "dropping superseded playlist load");
                    }
                }
                TaskResult::PlayerLog(line) => self.log(&format!("[PLAYER] {}", line)),
            }
        }

        if let Some(code) = self.player.reap(&mut self.session) {
            self.status_message.clear();
            match code {
                Some(0) | None => self.log("[PLAY] Player exited"),
                Some(code) => self.log(&format!("[WARN] Player exited with code {}", code)),
            }
        }
    }
}

/// Relay player stderr into the task channel so it lands in the console
fn forward_player_lines(lines: Receiver<String>, sender: Sender<TaskResult>) {
    thread::spawn(move || {
        for line in lines {
            if sender.send(TaskResult::PlayerLog(line)).is_err() {
                break;
            }
        }
    });
}

impl eframe::App for DirectoryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_tasks();

        self.show_header(ctx);
        self.show_status_bar(ctx);
        if self.show_console {
            self.show_console_panel(ctx);
        }
        self.show_player_panel(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_channels(ui);
        });

        if self.show_settings {
            self.show_settings_window(ctx);
        }

        // Keep polling background work
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

impl DirectoryApp {
    fn show_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("📺 IPTV Directory");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("⚙ Settings").clicked() {
                        self.show_settings = !self.show_settings;
                    }
                    let console_label = if self.show_console { "Hide Console" } else { "Console" };
                    if ui.button(console_label).clicked() {
                        self.show_console = !self.show_console;
                    }
                });
            });

            let mut clicked: Option<String> = None;
            if let LoadState::Ready(browser) = &self.state {
                ui.add_space(4.0);
                ui.horizontal_wrapped(|ui| {
                    let active = browser.filter().label().to_string();
                    for (label, count) in browser.category_counts() {
                        let text = format!("{} ({})", label, count);
                        if ui.selectable_label(*label == active, text).clicked() {
                            clicked = Some(label.clone());
                        }
                    }
                });
                ui.add_space(4.0);
            }

            if let Some(label) = clicked {
                let summary = match &mut self.state {
                    LoadState::Ready(browser) => {
                        let shown = browser.select_category(&label);
                        Some((shown, browser.filtered_len()))
                    }
                    _ => None,
                };
                if let Some((shown, total)) = summary {
                    self.log(&format!("[INFO] Category '{}': showing {} of {}", label, shown, total));
                }
            }
        });
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status_message);
                if let Some(url) = &self.epg_url {
                    ui.separator();
                    ui.label(egui::RichText::new(format!("EPG: {}", url)).weak());
                }
            });
        });
    }

    fn show_player_panel(&mut self, ctx: &egui::Context) {
        enum Action {
            Minimize,
            Restore,
            Close,
        }
        let mut action: Option<Action> = None;

        match &self.session {
            PlayerSession::Closed => {}
            PlayerSession::Open(channel) => {
                egui::TopBottomPanel::bottom("player_view")
                    .resizable(false)
                    .show(ctx, |ui| {
                        ui.add_space(6.0);
                        ui.horizontal(|ui| {
                            ui.vertical(|ui| {
                                ui.label(egui::RichText::new(&channel.name).strong().size(18.0));
                                ui.label(egui::RichText::new(&channel.category).weak());
                                ui.label(egui::RichText::new(&channel.stream_uri).monospace().small());
                            });
                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                if ui.button("✖ Exit").clicked() {
                                    action = Some(Action::Close);
                                }
                                if ui.button("🗕 Minimize").clicked() {
                                    action = Some(Action::Minimize);
                                }
                            });
                        });
                        ui.add_space(6.0);
                    });
            }
            PlayerSession::Minimized(channel) => {
                egui::TopBottomPanel::bottom("player_mini").show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        let summary = format!("▶ {} · {}", channel.name, channel.category);
                        if ui
                            .add(egui::Label::new(summary).sense(egui::Sense::click()))
                            .on_hover_text("Restore player")
                            .clicked()
                        {
                            action = Some(Action::Restore);
                        }
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("✖").clicked() {
                                action = Some(Action::Close);
                            }
                        });
                    });
                });
            }
        }

        match action {
            Some(Action::Minimize) => {
                self.session.minimize();
            }
            Some(Action::Restore) => {
                self.session.restore();
            }
            Some(Action::Close) => self.close_player(),
            None => {}
        }
    }

    fn show_channels(&mut self, ui: &mut egui::Ui) {
        let mut to_play: Option<ChannelRecord> = None;
        let mut retry = false;
        let mut load_more = false;

        match &self.state {
            LoadState::Loading => {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
            }
            LoadState::Failed(reason) => {
                ui.vertical_centered(|ui| {
                    ui.add_space(50.0);
                    ui.label("Could not load channels. Please check your internet connection and try again.");
                    ui.label(egui::RichText::new(reason).weak());
                    if ui.button("Retry").clicked() {
                        retry = true;
                    }
                });
            }
            LoadState::Empty => {
                ui.vertical_centered(|ui| {
                    ui.add_space(50.0);
                    ui.label("The playlist contains no playable channels.");
                    if ui.button("Retry").clicked() {
                        retry = true;
                    }
                });
            }
            LoadState::Ready(browser) => {
                ui.heading(browser.header_title());
                ui.separator();

                let page = browser.visible_page();
                if page.is_empty() {
                    ui.vertical_centered(|ui| {
                        ui.add_space(50.0);
                        ui.label("No channels match the current filters.");
                    });
                    return;
                }

                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        for &record in &page.records {
                            if channel_row(ui, record) {
                                to_play = Some(record.clone());
                            }
                        }

                        if page.has_more {
                            ui.add_space(8.0);
                            ui.vertical_centered(|ui| {
                                if ui.button("Load more").clicked() {
                                    load_more = true;
                                }
                            });
                        }
                    });
            }
        }

        if load_more {
            if let LoadState::Ready(browser) = &mut self.state {
                browser.load_more();
            }
        }
        if let Some(channel) = to_play {
            self.play_channel(channel);
        }
        if retry {
            self.load_playlist();
        }
    }

    fn show_settings_window(&mut self, ctx: &egui::Context) {
        let mut open = self.show_settings;
        let mut apply = false;

        egui::Window::new("Settings")
            .open(&mut open)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("Playlist URL or file:");
                ui.horizontal(|ui| {
                    ui.text_edit_singleline(&mut self.playlist_input);
                    if ui.button("📂").on_hover_text("Open playlist file").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Playlist", &["m3u", "m3u8"])
                            .pick_file()
                        {
                            self.playlist_input = path.display().to_string();
                        }
                    }
                });
                ui.label("External player (empty = ffplay):");
                ui.text_edit_singleline(&mut self.player_input);
                ui.add_space(6.0);
                if ui.button("Save & Reload").clicked() {
                    apply = true;
                }
            });

        if apply {
            self.config.playlist_url = self.playlist_input.trim().to_string();
            self.config.external_player = self.player_input.trim().to_string();
            self.config.save();
            open = false;
            self.load_playlist();
        }
        self.show_settings = open;
    }

    fn show_console_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("console")
            .resizable(true)
            .default_height(160.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.strong("Console Log");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("🗑 Clear").clicked() {
                            self.console_log.clear();
                            self.console_log.push(format!("[{}] Console cleared", timestamp_now()));
                        }
                    });
                });
                ui.separator();

                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for line in &self.console_log {
                            let color = if line.contains("[ERROR]") {
                                egui::Color32::RED
                            } else if line.contains("[WARN]") {
                                egui::Color32::YELLOW
                            } else if line.contains("[INFO]") {
                                egui::Color32::LIGHT_BLUE
                            } else if line.contains("[PLAY]") {
                                egui::Color32::GREEN
                            } else {
                                egui::Color32::GRAY
                            };
                            ui.label(egui::RichText::new(line).monospace().color(color));
                        }
                    });
            });
    }
}

/// One list row; returns true when clicked
fn channel_row(ui: &mut egui::Ui, record: &ChannelRecord) -> bool {
    let mut clicked = false;
    ui.horizontal(|ui| {
        if ui.button("▶").clicked() {
            clicked = true;
        }
        let name = ui.add(
            egui::Label::new(egui::RichText::new(&record.name).strong()).sense(egui::Sense::click()),
        );
        if name.on_hover_text(&record.logo_url).clicked() {
            clicked = true;
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            // No language tag gets the broadcast glyph
            if record.has_language() {
                ui.label(&record.language);
            } else {
                ui.label("📡");
            }
            match record.flag() {
                Some(flag) => ui.label(flag),
                None => ui.label(egui::RichText::new(&record.country_code).weak()),
            };
        });
    });
    clicked
}
