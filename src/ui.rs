use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::poll::{PollState, PollStatus};

pub struct Dashboard {
    pub should_quit: bool,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self { should_quit: false }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn render(&self, frame: &mut Frame, config: &Config, state: &PollState) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // title
                Constraint::Min(9),    // node + gateway
                Constraint::Min(7),    // actions + system info
                Constraint::Length(1), // footer
            ])
            .split(frame.area());

        let top = halves(rows[1]);
        let bottom = halves(rows[2]);

        self.render_title(frame, rows[0]);
        self.render_node_status(frame, top[0], config, state);
        self.render_gateway_status(frame, top[1], config);
        self.render_quick_actions(frame, bottom[0]);
        self.render_system_info(frame, bottom[1], config);
        self.render_footer(frame, rows[3], config, state);
    }

    fn render_title(&self, frame: &mut Frame, area: Rect) {
        let title = Paragraph::new(Line::from(Span::styled(
            "Gateway Dashboard",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        frame.render_widget(title, area);
    }

    fn render_node_status(&self, frame: &mut Frame, area: Rect, config: &Config, state: &PollState) {
        let mut lines: Vec<Line> = Vec::new();

        if state.status == PollStatus::Loading {
            lines.push(Line::from("Loading..."));
        }
        if let Some(err) = &state.error {
            lines.push(Line::from(Span::styled(
                format!("Error: {}", err),
                Style::default().fg(Color::Red),
            )));
        }

        if let Some(node) = &state.data {
            let label_style = if node.catching_up {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default().fg(Color::Black).bg(Color::Green)
            };

            lines.push(field("Network", node.network.clone(), Color::Cyan));
            lines.push(field("Version", node.version.clone(), Color::Cyan));
            lines.push(field(
                "Block Height",
                node.latest_block_height.clone(),
                Color::Green,
            ));
            lines.push(field(
                "Latest Block Time",
                node.block_time_display(),
                Color::Yellow,
            ));
            lines.push(Line::from(vec![
                Span::styled("Status: ", Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(format!(" {} ", node.sync_label()), label_style),
            ]));
        }

        let stale_after = config.stale_after();
        if state.is_stale(Instant::now(), stale_after) {
            lines.push(Line::from(Span::styled(
                format!("Stale: no update for over {}s", stale_after.as_secs()),
                Style::default().fg(Color::Yellow),
            )));
        }

        if lines.is_empty() {
            lines.push(Line::from(Span::styled(
                "(waiting for first poll)",
                Style::default().fg(Color::DarkGray),
            )));
        }

        let paragraph = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Node Status").borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_gateway_status(&self, frame: &mut Frame, area: Rect, config: &Config) {
        let lines = vec![
            Line::from(Span::styled(
                "Gateway service is currently disabled",
                Style::default().fg(Color::Yellow),
            )),
            Line::from(Span::styled(
                "The gateway service was temporarily disabled due to configuration issues.",
                Style::default().fg(Color::Gray),
            )),
            Line::from(vec![
                Span::raw("Forwarding: "),
                Span::styled(
                    config.gateway_url.as_str().to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
            ]),
        ];

        let paragraph = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Gateway Status").borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_quick_actions(&self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            key_hint("o", "Open Node RPC"),
            key_hint("d", "Open Documentation"),
            key_hint("r", "Refresh now"),
            key_hint("q", "Quit"),
        ];

        let paragraph = Paragraph::new(lines)
            .block(Block::default().title("Quick Actions").borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_system_info(&self, frame: &mut Frame, area: Rect, config: &Config) {
        let lines = vec![
            field("Node RPC", host_port(&config.node_url), Color::Cyan),
            field("Node gRPC", config.grpc_addr.clone(), Color::Cyan),
            field(
                "Gateway",
                format!("{} (disabled)", host_port(&config.gateway_url)),
                Color::Gray,
            ),
            field("Documentation", host_port(&config.docs_url), Color::Cyan),
        ];

        let paragraph = Paragraph::new(lines)
            .block(Block::default().title("System Info").borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect, config: &Config, state: &PollState) {
        let updated = match state.last_updated {
            Some(at) => ago(at.elapsed()),
            None => "never".to_string(),
        };
        let mut spans = vec![
            Span::raw("Updates every "),
            Span::styled(
                format!("{}s", config.poll_interval.as_secs_f64()),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw(" | Updated: "),
            Span::styled(updated, Style::default().fg(Color::Yellow)),
        ];
        if state.is_refreshing() {
            spans.push(Span::styled(" | refreshing", Style::default().fg(Color::DarkGray)));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

fn halves(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area)
}

fn field(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(value, Style::default().fg(color)),
    ])
}

fn key_hint(key: &str, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("'{}'", key), Style::default().fg(Color::Yellow)),
        Span::raw(format!(" {}", action)),
    ])
}

fn host_port(url: &url::Url) -> String {
    let host = url.host_str().unwrap_or("?");
    match url.port_or_known_default() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

fn ago(elapsed: Duration) -> String {
    if elapsed < Duration::from_secs(1) {
        "< 1s ago".to_string()
    } else {
        format!("{}s ago", elapsed.as_secs())
    }
}
