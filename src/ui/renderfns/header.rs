use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, workspace, principal, and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, title: &str, store_url: &str, email: Option<&str>) {
  let domain = extract_domain(store_url);

  let mut spans = vec![
    Span::styled(" deskview ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", title), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", domain), Style::default().fg(Color::DarkGray)),
  ];

  if let Some(email) = email {
    spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
    spans.push(Span::styled(
      format!(" {} ", email),
      Style::default().fg(Color::Yellow),
    ));
  }

  spans.push(Span::raw("  "));
  spans.push(Span::styled("<:>", Style::default().fg(Color::Cyan)));
  spans.push(Span::styled(" command", Style::default().fg(Color::DarkGray)));
  spans.push(Span::raw("   "));
  spans.push(Span::styled("<q>", Style::default().fg(Color::Cyan)));
  spans.push(Span::styled(" back", Style::default().fg(Color::DarkGray)));

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}

/// Extract domain from the store URL
fn extract_domain(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_extract_domain() {
    assert_eq!(
      extract_domain("https://myproject.example.co"),
      "myproject.example.co"
    );
    assert_eq!(
      extract_domain("https://store.company.com/rest"),
      "store.company.com"
    );
    assert_eq!(extract_domain("http://localhost:54321"), "localhost:54321");
  }
}
