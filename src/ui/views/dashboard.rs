use crate::query::{Query, QueryState};
use crate::store::types::{DailyCount, TicketStats};
use crate::store::CachedStoreClient;
use crate::ui::view::{View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{BarChart, Block, Borders, Paragraph};

const TRAILING_DAYS: u32 = 14;

/// Both aggregates fetched in parallel
#[derive(Clone)]
struct DashboardData {
  stats: TicketStats,
  daily: Vec<DailyCount>,
}

/// Overview of workspace activity: status/priority counts plus a per-day
/// creation chart over a trailing window.
pub struct DashboardView {
  query: Query<DashboardData>,
}

impl DashboardView {
  pub fn new(client: CachedStoreClient) -> Self {
    let mut query = Query::new(move || {
      let client = client.clone();
      async move {
        let (stats, daily) = tokio::join!(
          client.ticket_stats(),
          client.tickets_per_day(TRAILING_DAYS),
        );

        Ok(DashboardData {
          stats: stats.map_err(|e| e.to_string())?,
          daily: daily.map_err(|e| e.to_string())?,
        })
      }
    });
    query.fetch();

    Self { query }
  }

  fn render_tiles(&self, frame: &mut Frame, area: Rect, stats: &TicketStats) {
    let tiles = [
      ("Total", stats.total, Color::White),
      ("Open", stats.open, Color::Cyan),
      ("In Progress", stats.in_progress, Color::Yellow),
      ("Closed", stats.closed, Color::Green),
    ];

    let chunks = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Ratio(1, 4); 4])
      .split(area);

    for ((label, value, color), chunk) in tiles.iter().zip(chunks.iter()) {
      let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
      let lines = vec![
        Line::from(Span::styled(*label, Style::default().fg(Color::DarkGray))),
        Line::from(Span::styled(
          value.to_string(),
          Style::default().fg(*color).bold(),
        )),
      ];
      frame.render_widget(Paragraph::new(lines).block(block), *chunk);
    }
  }

  fn render_priorities(&self, frame: &mut Frame, area: Rect, stats: &TicketStats) {
    let line = Line::from(vec![
      Span::styled(" Priorities: ", Style::default().fg(Color::DarkGray)),
      Span::styled(
        format!("low {}", stats.low),
        Style::default().fg(Color::DarkGray),
      ),
      Span::raw("  "),
      Span::styled(
        format!("medium {}", stats.medium),
        Style::default().fg(Color::White),
      ),
      Span::raw("  "),
      Span::styled(
        format!("high {}", stats.high),
        Style::default().fg(Color::Red),
      ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
  }

  fn render_chart(&self, frame: &mut Frame, area: Rect, daily: &[DailyCount]) {
    let block = Block::default()
      .title(format!(" Created per day (last {} days) ", TRAILING_DAYS))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::DarkGray));

    if daily.is_empty() {
      let paragraph = Paragraph::new("No tickets created in this window.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let labels: Vec<String> = daily.iter().map(|d| d.day.format("%d/%m").to_string()).collect();
    let bars: Vec<(&str, u64)> = labels
      .iter()
      .map(|l| l.as_str())
      .zip(daily.iter().map(|d| d.count))
      .collect();

    let chart = BarChart::default()
      .block(block)
      .bar_width(5)
      .bar_gap(1)
      .bar_style(Style::default().fg(Color::Cyan))
      .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
      .data(&bars[..]);

    frame.render_widget(chart, area);
  }
}

impl View for DashboardView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    match self.query.state() {
      QueryState::Loading | QueryState::Idle => {
        let block = Block::default()
          .title(" Dashboard (loading...) ")
          .borders(Borders::ALL)
          .border_style(Style::default().fg(Color::Blue));
        let paragraph = Paragraph::new("Loading stats...")
          .block(block)
          .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
      }
      QueryState::Error(e) => {
        let block = Block::default()
          .title(" Dashboard ")
          .borders(Borders::ALL)
          .border_style(Style::default().fg(Color::Blue));
        let paragraph = Paragraph::new(format!("Error: {}\n\nPress 'r' to retry.", e))
          .block(block)
          .style(Style::default().fg(Color::Red));
        frame.render_widget(paragraph, area);
      }
      QueryState::Success(_) => {
        let data = self.query.data().cloned();
        if let Some(data) = data {
          let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
              Constraint::Length(4), // Stat tiles
              Constraint::Length(1), // Priority line
              Constraint::Min(5),    // Chart
            ])
            .split(area);

          self.render_tiles(frame, chunks[0], &data.stats);
          self.render_priorities(frame, chunks[1], &data.stats);
          self.render_chart(frame, chunks[2], &data.daily);
        }
      }
    }
  }

  fn breadcrumb_label(&self) -> String {
    "Dashboard".to_string()
  }

  fn tick(&mut self) {
    self.query.poll();
  }
}
