//! Chat screen
//!
//! One event loop owns all UI state. Stream tasks report through the
//! [`ChatClient`] channel, which is drained before every frame.

use super::input::InputBuffer;
use super::markdown::render_markdown;
use super::settings::{SettingsAction, SettingsItem, SettingsView};
use super::theme::Palette;
use super::toast::{ToastLevel, Toasts};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use lightchat_core::chat::{ChatEvent, ChatPhase, ChatSession, ContextWindow, MessageRole};
use lightchat_core::client::{fetch_available_api_key, resolve_api_key, ChatClient, ChatTransport};
use lightchat_core::export::{default_export_dir, export_conversation, ExportFormat, RenderContext};
use lightchat_core::{ClientConfig, LightChatError, Preferences};
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use unicode_width::UnicodeWidthStr;

const APP_TITLE: &str = "LightChat";
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Result of a background fallback-key fetch.
#[derive(Debug)]
struct KeyFetch {
    /// Set when the user asked for it from the API key settings.
    requested: bool,
    result: std::result::Result<String, String>,
}

pub struct ChatApp {
    session: ChatSession,
    client: ChatClient,
    events: mpsc::UnboundedReceiver<ChatEvent>,
    prefs: Preferences,
    /// Fallback key from the server; memory only.
    server_key: String,
    http: reqwest::Client,
    server_url: String,
    export_dir: PathBuf,
    key_tx: mpsc::UnboundedSender<KeyFetch>,
    key_rx: mpsc::UnboundedReceiver<KeyFetch>,
    input: InputBuffer,
    settings: SettingsView,
    toasts: Toasts,
    scroll_from_bottom: u16,
    history_height: u16,
    should_quit: bool,
}

impl ChatApp {
    pub fn new(
        config: &ClientConfig,
        prefs: Preferences,
        transport: Arc<dyn ChatTransport>,
        http: reqwest::Client,
    ) -> Self {
        let mut session = ChatSession::new(ContextWindow::new(config.context_messages));
        session.set_system_role(prefs.system_role());
        let (client, events) = ChatClient::new(transport);
        let (key_tx, key_rx) = mpsc::unbounded_channel();

        Self {
            session,
            client,
            events,
            prefs,
            server_key: String::new(),
            http,
            server_url: config.server_url.clone(),
            export_dir: config.export_dir.clone().unwrap_or_else(default_export_dir),
            key_tx,
            key_rx,
            input: InputBuffer::default(),
            settings: SettingsView::default(),
            toasts: Toasts::default(),
            scroll_from_bottom: 0,
            history_height: 0,
            should_quit: false,
        }
    }

    pub async fn run<B: Backend>(mut self, terminal: &mut Terminal<B>) -> Result<()> {
        self.request_server_key(false);

        while !self.should_quit {
            self.drain_background();
            self.toasts.tick(Instant::now());
            terminal.draw(|frame| self.render(frame))?;

            if event::poll(POLL_INTERVAL)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    Event::Paste(text) => self.handle_paste(&text),
                    _ => {}
                }
            }
        }

        if self.session.stop() {
            tracing::info!("Cancelled in-flight request on exit");
        }
        Ok(())
    }

    fn api_key(&self) -> Option<String> {
        resolve_api_key(self.prefs.api_key(), &self.server_key)
    }

    fn toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toasts.show(level, message, Instant::now());
    }

    fn report(&mut self, error: LightChatError) {
        if error.is_warning() {
            self.toast(ToastLevel::Warning, error.to_string());
        } else {
            tracing::error!("Action failed: {}", error);
            self.toast(ToastLevel::Error, error.to_string());
        }
    }

    fn request_server_key(&self, requested: bool) {
        let http = self.http.clone();
        let server_url = self.server_url.clone();
        let tx = self.key_tx.clone();
        tokio::spawn(async move {
            let result = fetch_available_api_key(&http, &server_url)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(KeyFetch { requested, result });
        });
    }

    /// Fold finished stream events and key fetches into state.
    pub fn drain_background(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            if let ChatEvent::Cancelled { .. } = &event {
                self.toast(ToastLevel::Success, "Stopped");
            }
            self.session.apply(event);
        }
        while let Ok(fetch) = self.key_rx.try_recv() {
            self.apply_key_fetch(fetch);
        }
    }

    fn apply_key_fetch(&mut self, fetch: KeyFetch) {
        match fetch.result {
            Ok(key) => {
                self.server_key = key;
                if !fetch.requested {
                    tracing::debug!("Fallback API key available: {}", !self.server_key.is_empty());
                    return;
                }
                if let Err(e) = self.prefs.set_api_key("") {
                    self.report(e);
                    return;
                }
                self.settings.close();
                if self.server_key.is_empty() {
                    self.toast(ToastLevel::Warning, "The server has no API key to share");
                } else {
                    self.toast(ToastLevel::Success, "Using the server API key");
                }
            }
            Err(message) => {
                tracing::warn!("Failed to fetch fallback API key: {}", message);
                if fetch.requested {
                    self.toast(ToastLevel::Error, message);
                }
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.settings.is_open() {
            let action = self.settings.handle_key(key);
            self.apply_settings_action(action);
            return;
        }

        if ctrl {
            match key.code {
                KeyCode::Char('r') => self.regenerate(),
                KeyCode::Char('t') => self.toggle_theme(),
                KeyCode::Char('l') => self.clear_history(),
                KeyCode::Char('e') => self.export(ExportFormat::Markdown),
                // Many terminals send Ctrl-H as Backspace.
                KeyCode::Char('w') => self.export(ExportFormat::Html),
                KeyCode::Char('j') => self.export(ExportFormat::Json),
                KeyCode::Char('o') => self.export(ExportFormat::Png),
                KeyCode::Char('p') => self.export(ExportFormat::Pdf),
                KeyCode::Char('s') => self.settings.open_menu(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Enter => self.submit(),
            KeyCode::Esc => {
                if self.session.stop() {
                    tracing::debug!("Stop requested");
                }
            }
            KeyCode::PageUp => self.scroll_up(),
            KeyCode::PageDown => self.scroll_down(),
            KeyCode::Char(c) => self.input.insert(c),
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Home => self.input.move_home(),
            KeyCode::End => self.input.move_end(),
            _ => {}
        }
    }

    /// Pasted newlines become spaces; the input is single-line.
    pub fn handle_paste(&mut self, text: &str) {
        let text = text.replace("\r\n", " ").replace(['\n', '\r'], " ");
        match &mut self.settings {
            SettingsView::Editing { input, .. } => input.insert_str(&text),
            SettingsView::Menu { .. } => {}
            SettingsView::Closed => self.input.insert_str(&text),
        }
    }

    fn submit(&mut self) {
        let api_key = self.api_key();
        match self.session.submit(self.input.text(), api_key) {
            Ok(Some(request)) => {
                self.input.clear();
                self.scroll_from_bottom = 0;
                self.client.spawn(request);
            }
            Ok(None) => {}
            Err(e) => self.report(e),
        }
    }

    fn regenerate(&mut self) {
        let api_key = self.api_key();
        match self.session.regenerate(api_key) {
            Ok(request) => {
                self.scroll_from_bottom = 0;
                self.client.spawn(request);
            }
            Err(e) => self.report(e),
        }
    }

    fn clear_history(&mut self) {
        match self.session.clear_history() {
            Ok(()) => {
                self.scroll_from_bottom = 0;
                self.toast(ToastLevel::Success, "History cleared");
            }
            Err(e) => self.report(e),
        }
    }

    fn toggle_theme(&mut self) {
        if let Err(e) = self.prefs.toggle_theme() {
            self.report(e);
        }
    }

    fn export(&mut self, format: ExportFormat) {
        let context = RenderContext {
            title: APP_TITLE.to_string(),
            theme: self.prefs.theme(),
            user_avatar: self.prefs.user_avatar().to_string(),
            robot_avatar: self.prefs.robot_avatar().to_string(),
        };
        let renderer = format.renderer();
        match export_conversation(self.session.messages(), renderer.as_ref(), &context, &self.export_dir) {
            Ok(path) => self.toast(ToastLevel::Success, format!("Exported to {}", path.display())),
            Err(e) => self.report(e),
        }
    }

    fn apply_settings_action(&mut self, action: SettingsAction) {
        match action {
            SettingsAction::None => {}
            SettingsAction::Edit(item) => {
                let current = match item {
                    SettingsItem::RobotAvatar => self.prefs.robot_avatar(),
                    SettingsItem::UserAvatar => self.prefs.user_avatar(),
                    SettingsItem::SystemRole => self.prefs.system_role(),
                    SettingsItem::ApiKey => self.prefs.api_key(),
                }
                .to_string();
                self.settings.begin_edit(item, &current);
            }
            SettingsAction::Save { item, value } => {
                let saved = match item {
                    SettingsItem::RobotAvatar => self.prefs.set_robot_avatar(&value),
                    SettingsItem::UserAvatar => self.prefs.set_user_avatar(&value),
                    SettingsItem::SystemRole => self.prefs.set_system_role(&value).map(|()| {
                        self.session.set_system_role(value.as_str());
                    }),
                    SettingsItem::ApiKey => self.prefs.set_api_key(&value),
                };
                match saved {
                    Ok(()) => self.toast(ToastLevel::Success, format!("{} saved", item.label())),
                    Err(e) => self.report(e),
                }
            }
            SettingsAction::FetchApiKey => {
                self.toast(ToastLevel::Success, "Requesting an API key from the server");
                self.request_server_key(true);
            }
        }
    }

    fn scroll_up(&mut self) {
        let step = (self.history_height / 2).max(1);
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(step);
    }

    fn scroll_down(&mut self) {
        let step = (self.history_height / 2).max(1);
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(step);
    }

    fn render(&mut self, frame: &mut Frame) {
        let palette = Palette::for_theme(self.prefs.theme());
        let area = frame.area();
        frame.render_widget(Block::default().style(palette.base()), area);

        let banner_height = if self.session.error_banner().is_some() { 3 } else { 0 };
        let [header, history, banner, input, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(banner_height),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(area);

        self.render_header(frame, header, &palette);
        self.render_history(frame, history, &palette);
        if let Some(message) = self.session.error_banner() {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.error))
                .title(" Error ");
            let paragraph = Paragraph::new(message.to_string())
                .style(Style::default().fg(palette.error))
                .wrap(Wrap { trim: true })
                .block(block);
            frame.render_widget(paragraph, banner);
        }
        self.render_input(frame, input, &palette);
        self.render_status(frame, status, &palette);

        if self.settings.is_open() {
            self.render_settings(frame, area, &palette);
        }
        self.render_toast(frame, area, &palette);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let line = Line::from(vec![
            Span::styled(format!(" {} ", APP_TITLE), palette.title()),
            Span::styled(
                format!("Chat with the assistant via {}", self.server_url),
                palette.dim(),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn history_lines(&self, palette: &Palette) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for message in self.session.messages() {
            match message.role {
                MessageRole::User => {
                    lines.push(speaker_line(self.prefs.user_avatar(), "You", palette.user));
                    for text in message.content.lines() {
                        lines.push(Line::from(Span::styled(
                            text.to_string(),
                            Style::default().fg(palette.foreground),
                        )));
                    }
                }
                MessageRole::Assistant => {
                    lines.push(speaker_line(self.prefs.robot_avatar(), "Assistant", palette.assistant));
                    lines.extend(render_markdown(&message.content, palette));
                }
                MessageRole::System => continue,
            }
            lines.push(Line::default());
        }

        if self.session.is_loading() {
            lines.push(speaker_line(self.prefs.robot_avatar(), "Assistant", palette.assistant));
            let mut draft = render_markdown(self.session.draft(), palette);
            let cursor = Span::styled("▌", Style::default().fg(palette.accent));
            match draft.last_mut() {
                Some(last) => last.spans.push(cursor),
                None => draft.push(Line::from(cursor)),
            }
            lines.extend(draft);
        }
        lines
    }

    fn render_history(&mut self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let block = Block::default()
            .borders(Borders::TOP | Borders::BOTTOM)
            .border_style(Style::default().fg(palette.border));
        let inner = block.inner(area);
        self.history_height = inner.height;

        // Measured with the same word wrapper that draws the paragraph.
        let paragraph = Paragraph::new(self.history_lines(palette)).wrap(Wrap { trim: false });
        let total = u16::try_from(paragraph.line_count(inner.width)).unwrap_or(u16::MAX);
        let max_scroll = total.saturating_sub(inner.height);
        self.scroll_from_bottom = self.scroll_from_bottom.min(max_scroll);
        let offset = max_scroll - self.scroll_from_bottom;

        let paragraph = paragraph.scroll((offset, 0)).block(block);
        frame.render_widget(paragraph, area);
    }

    fn render_input(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let title = if self.session.is_loading() {
            " Answering… (Esc to stop) "
        } else {
            " Ask anything (Enter to send) "
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.accent))
            .title(title);
        let inner = block.inner(area);
        frame.render_widget(
            Paragraph::new(self.input.text().to_string())
                .style(Style::default().fg(palette.foreground))
                .block(block),
            area,
        );
        if !self.settings.is_open() {
            let column = (self.input.cursor_column() as u16).min(inner.width.saturating_sub(1));
            frame.set_cursor_position((inner.x + column, inner.y));
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let hints =
            "^R regenerate  ^T theme  ^L clear  ^E/^W/^J/^O/^P export md/html/json/png/pdf  ^S settings  ^C quit";
        let line = Line::from(vec![
            Span::styled(format!(" {} ", phase_label(self.session.phase())), palette.title()),
            Span::styled(hints, palette.dim()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_settings(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        match &self.settings {
            SettingsView::Closed => {}
            SettingsView::Menu { selected } => {
                let popup = centered_rect(area, 40, SettingsItem::ALL.len() as u16 + 2);
                let items: Vec<ListItem> = SettingsItem::ALL
                    .iter()
                    .map(|item| ListItem::new(item.label()))
                    .collect();
                let list = List::new(items)
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .title(" Settings ")
                            .border_style(Style::default().fg(palette.accent)),
                    )
                    .style(palette.base())
                    .highlight_style(Style::default().fg(palette.accent).add_modifier(Modifier::REVERSED))
                    .highlight_symbol("> ");
                let mut state = ListState::default().with_selected(Some(*selected));
                frame.render_widget(Clear, popup);
                frame.render_stateful_widget(list, popup, &mut state);
            }
            SettingsView::Editing { item, input } => {
                let popup = centered_rect(area, 60, 6);
                let block = Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", item.label()))
                    .border_style(Style::default().fg(palette.accent));
                let inner = block.inner(popup);
                let text = vec![
                    Line::from(Span::styled(input.text().to_string(), Style::default().fg(palette.foreground))),
                    Line::default(),
                    Line::from(Span::styled(item.hint(), palette.dim())),
                    Line::from(Span::styled("Enter save · Esc cancel", palette.dim())),
                ];
                frame.render_widget(Clear, popup);
                frame.render_widget(Paragraph::new(text).style(palette.base()).block(block), popup);
                let column = (input.cursor_column() as u16).min(inner.width.saturating_sub(1));
                frame.set_cursor_position((inner.x + column, inner.y));
            }
        }
    }

    fn render_toast(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let Some(toast) = self.toasts.current() else {
            return;
        };
        let color = match toast.level {
            ToastLevel::Success => palette.success,
            ToastLevel::Warning => palette.warning,
            ToastLevel::Error => palette.error,
        };
        let width = (toast.message.width() as u16 + 4).min(area.width);
        let popup = Rect {
            x: area.x + area.width.saturating_sub(width + 1),
            y: area.y + 1,
            width,
            height: 3.min(area.height),
        };
        let paragraph = Paragraph::new(toast.message.clone())
            .alignment(Alignment::Center)
            .style(palette.base().fg(color))
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color)));
        frame.render_widget(Clear, popup);
        frame.render_widget(paragraph, popup);
    }
}

fn speaker_line(avatar: &str, name: &str, color: ratatui::style::Color) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("{} ", avatar)),
        Span::styled(name.to_string(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
    ])
}

fn phase_label(phase: ChatPhase) -> &'static str {
    match phase {
        ChatPhase::Idle => "Ready",
        ChatPhase::Requesting => "Connecting",
        ChatPhase::Streaming => "Answering",
        ChatPhase::Cancelling => "Stopping",
        ChatPhase::Archived => "Done",
        ChatPhase::Cancelled => "Stopped",
        ChatPhase::Errored => "Error",
    }
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
