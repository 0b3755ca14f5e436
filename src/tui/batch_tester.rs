//! TUI for submitting a proxy batch and browsing the results

use crate::config::Config;
use crate::proxy::{
    CsvExporter, DetailViewer, ExportOutcome, Orchestrator, ProxyTestResult, SubmissionState,
    TestStatus,
};
use crate::Result;
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use tokio::time::Duration;
use tracing::warn;

const HELP_TEXT: &str =
    "Tab: switch focus | F5/Ctrl+S: test | Enter: details | e: export CSV | q: quit";

/// Which pane receives key input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Proxies,
    Threads,
    Results,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Proxies => Focus::Threads,
            Focus::Threads => Focus::Results,
            Focus::Results => Focus::Proxies,
        }
    }
}

/// Modal message shown over the UI until dismissed
#[derive(Debug, Clone)]
struct Notice {
    title: String,
    body: String,
    is_error: bool,
}

/// Batch tester TUI application state
pub struct BatchTesterApp {
    orchestrator: Orchestrator,
    exporter: CsvExporter,
    detail: DetailViewer,
    /// Raw proxy text, one proxy per line
    input: String,
    /// Thread count as typed
    threads: String,
    focus: Focus,
    table_state: TableState,
    notice: Option<Notice>,
    should_quit: bool,
}

impl BatchTesterApp {
    pub fn new(config: &Config) -> Self {
        Self {
            orchestrator: Orchestrator::new(config.client()),
            exporter: config.exporter(),
            detail: DetailViewer::new(),
            input: String::new(),
            threads: config.default_threads.to_string(),
            focus: Focus::Proxies,
            table_state: TableState::default(),
            notice: None,
            should_quit: false,
        }
    }

    /// Pre-fill the proxy input
    pub fn with_input(mut self, input: String) -> Self {
        self.input = input;
        self
    }

    /// Run the TUI application
    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_app(&mut terminal).await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableBracketedPaste
        )?;
        terminal.show_cursor()?;

        result
    }

    async fn run_app<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            terminal.draw(|f| self.ui(f))?;

            if event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key);
                        if self.should_quit {
                            break;
                        }
                    }
                    Event::Paste(text) => self.handle_paste(&text),
                    _ => {}
                }
            }

            if self.orchestrator.poll() {
                self.on_results_changed();
            }

            // Let the request task make progress between frames
            tokio::task::yield_now().await;
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        // Popups swallow input until closed
        if self.notice.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ')) {
                self.notice = None;
            }
            return;
        }
        if self.detail.is_open() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                self.detail.close();
            }
            return;
        }

        match key.code {
            KeyCode::F(5) => return self.submit(),
            KeyCode::Char('s') if ctrl => return self.submit(),
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return;
            }
            _ => {}
        }

        match self.focus {
            Focus::Proxies => match key.code {
                KeyCode::Char(c) if !ctrl => self.input.push(c),
                KeyCode::Enter => self.input.push('\n'),
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Esc => self.focus = Focus::Results,
                _ => {}
            },
            Focus::Threads => match key.code {
                KeyCode::Char(c) if !ctrl && (c.is_ascii_digit() || c == '-') => {
                    self.threads.push(c)
                }
                KeyCode::Backspace => {
                    self.threads.pop();
                }
                KeyCode::Enter => self.submit(),
                KeyCode::Esc => self.focus = Focus::Results,
                _ => {}
            },
            Focus::Results => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                KeyCode::Down => self.move_selection(1),
                KeyCode::Up => self.move_selection(-1),
                KeyCode::Enter => self.open_detail(),
                KeyCode::Char('e') => self.export(),
                _ => {}
            },
        }
    }

    /// Insert pasted text into the focused input in one go
    fn handle_paste(&mut self, text: &str) {
        if self.notice.is_some() || self.detail.is_open() {
            return;
        }
        match self.focus {
            Focus::Proxies => {
                let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
                self.input.push_str(&normalized);
            }
            Focus::Threads => self
                .threads
                .extend(text.chars().filter(|c| c.is_ascii_digit() || *c == '-')),
            Focus::Results => {}
        }
    }

    fn submit(&mut self) {
        let max_threads = self.threads.trim().parse::<i64>().ok();
        self.detail.close();
        // A rejected submission is reported through the orchestrator state
        let _ = self.orchestrator.submit(&self.input, max_threads);
        self.on_results_changed();
    }

    fn on_results_changed(&mut self) {
        let select = if self.orchestrator.results().is_empty() {
            None
        } else {
            Some(0)
        };
        self.table_state.select(select);
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.orchestrator.results().len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len as isize) as usize;
        self.table_state.select(Some(next));
    }

    fn selected_record(&self) -> Option<&ProxyTestResult> {
        self.table_state
            .selected()
            .and_then(|i| self.orchestrator.results().get(i))
    }

    fn open_detail(&mut self) {
        let Some(record) = self.selected_record().cloned() else {
            return;
        };
        // Rows without a successful lookup offer no detail action
        if record.has_detail() {
            if let Err(e) = self.detail.open(&record) {
                warn!(error = %e, "Detail view unavailable");
            }
        }
    }

    fn export(&mut self) {
        self.notice = Some(match self.exporter.export(self.orchestrator.results()) {
            Ok(ExportOutcome::Written { path, rows }) => Notice {
                title: "导出成功".to_string(),
                body: format!("已导出 {} 个成功代理到 {}", rows, path.display()),
                is_error: false,
            },
            Ok(ExportOutcome::NothingToExport) => Notice {
                title: "无成功代理".to_string(),
                body: crate::proxy::export::NOTHING_TO_EXPORT.to_string(),
                is_error: false,
            },
            Err(e) => Notice {
                title: "下载失败".to_string(),
                body: e.to_string(),
                is_error: true,
            },
        });
    }

    fn ui(&mut self, f: &mut Frame) {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Min(0),    // Body
                Constraint::Length(1), // Help
            ])
            .split(f.size());

        let title = Paragraph::new("代理批量有效性测试工具")
            .style(Style::default().fg(Color::Cyan))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(title, outer[0]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(33), Constraint::Percentage(67)])
            .split(outer[1]);

        self.render_sidebar(f, columns[0]);
        self.render_results(f, columns[1]);

        let help = Paragraph::new(HELP_TEXT).style(Style::default().fg(Color::DarkGray));
        f.render_widget(help, outer[2]);

        if self.detail.is_open() {
            self.render_detail(f);
        }
        if let Some(notice) = &self.notice {
            Self::render_notice(f, notice);
        }
    }

    fn render_sidebar(&self, f: &mut Frame, area: Rect) {
        let state = self.orchestrator.state();
        let message = state.message();
        let show_stats = self.orchestrator.is_loading() || !self.orchestrator.results().is_empty();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),                                    // Proxy input
                Constraint::Length(3),                                 // Threads
                Constraint::Length(if message.is_some() { 4 } else { 0 }), // Error banner
                Constraint::Length(if show_stats { 3 } else { 0 }),    // Stats
            ])
            .split(area);

        let input = Paragraph::new(self.input.as_str())
            .wrap(Wrap { trim: false })
            .block(Self::focus_block("代理列表 (一行一个)", self.focus == Focus::Proxies));
        f.render_widget(input, chunks[0]);

        let threads = Paragraph::new(self.threads.as_str())
            .block(Self::focus_block("最大并发线程数", self.focus == Focus::Threads));
        f.render_widget(threads, chunks[1]);

        if let Some(message) = message {
            let banner = Paragraph::new(message)
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title("错误"));
            f.render_widget(banner, chunks[2]);
        }

        if show_stats {
            let results = self.orchestrator.results();
            let total = if results.is_empty() && self.orchestrator.is_loading() {
                "-".to_string()
            } else {
                results.len().to_string()
            };
            let mut spans = vec![
                Span::raw(format!("总数: {}  ", total)),
                Span::styled(
                    format!("成功: {}  ", results.success_count),
                    Style::default().fg(Color::Green),
                ),
                Span::styled(
                    format!("失败: {}", results.error_count),
                    Style::default().fg(Color::Red),
                ),
            ];
            if results.unrecognized_count > 0 {
                spans.push(Span::styled(
                    format!("  异常: {}", results.unrecognized_count),
                    Style::default().fg(Color::Yellow),
                ));
            }
            let stats = Paragraph::new(Line::from(spans))
                .block(Block::default().borders(Borders::ALL).title("测试统计"));
            f.render_widget(stats, chunks[3]);
        }
    }

    fn render_results(&mut self, f: &mut Frame, area: Rect) {
        let title = match self.orchestrator.state() {
            SubmissionState::Loading => "测试结果 - 正在努力测试代理中...".to_string(),
            _ => format!("测试结果 ({})", self.orchestrator.results().len()),
        };

        let header = Row::new(vec![
            "原始代理", "状态", "检测IP", "国家", "城市", "响应 (ms)", "错误信息", "详情",
        ])
        .style(Style::default().add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = self
            .orchestrator
            .results()
            .records
            .iter()
            .map(|record| {
                let color = match record.status {
                    TestStatus::Success => Color::Green,
                    TestStatus::Error => Color::Red,
                    TestStatus::Unrecognized(_) => Color::Yellow,
                };
                Row::new(vec![
                    Cell::from(record.proxy.clone()),
                    Cell::from(record.status.label().to_string()).style(Style::default().fg(color)),
                    Cell::from(record.ip_cell().to_string()),
                    Cell::from(record.country_cell().to_string()),
                    Cell::from(record.city_cell().to_string()),
                    Cell::from(record.response_time_cell()),
                    Cell::from(record.error_cell().to_string()),
                    Cell::from(if record.has_detail() { "查看详情" } else { "" }),
                ])
            })
            .collect();

        let widths = [
            Constraint::Percentage(22),
            Constraint::Length(6),
            Constraint::Length(16),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Min(10),
            Constraint::Length(8),
        ];

        let table = Table::new(rows)
            .header(header)
            .block(Self::focus_block(&title, self.focus == Focus::Results))
            .widths(&widths)
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn render_detail(&self, f: &mut Frame) {
        let Some(record) = self.detail.selected() else {
            return;
        };
        let area = centered_rect(60, 70, f.size());

        let lines: Vec<Line> = self
            .detail
            .rows()
            .into_iter()
            .map(|row| {
                Line::from(vec![
                    Span::styled(row.label, Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(": "),
                    Span::raw(row.value),
                ])
            })
            .collect();

        let popup = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("代理地理位置详情: {}", record.proxy))
                    .border_style(Style::default().fg(Color::Cyan)),
            );
        f.render_widget(Clear, area);
        f.render_widget(popup, area);
    }

    fn render_notice(f: &mut Frame, notice: &Notice) {
        let area = centered_rect(50, 20, f.size());
        let color = if notice.is_error { Color::Red } else { Color::Yellow };
        let popup = Paragraph::new(notice.body.as_str())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(notice.title.as_str())
                    .border_style(Style::default().fg(color)),
            );
        f.render_widget(Clear, area);
        f.render_widget(popup, area);
    }

    fn focus_block(title: &str, focused: bool) -> Block<'static> {
        let border_style = if focused {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Block::default()
            .borders(Borders::ALL)
            .title(title.to_string())
            .border_style(border_style)
    }
}

/// Rect of the given percentage size centered in `area`
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
