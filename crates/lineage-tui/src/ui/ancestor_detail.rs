//! Ancestor detail pane — right panel.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, Portrait};

/// Render the detail pane into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let Some(record) = app.selected_record() else {
    return;
  };
  let row = app.row_state(record);

  let block = Block::default()
    .title(format!(" {} ", row.name))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let inner = block.inner(area);
  f.render_widget(block, area);

  let label_style = Style::default()
    .fg(Color::Cyan)
    .add_modifier(Modifier::BOLD);
  let dim = Style::default().fg(Color::DarkGray);

  let portrait_line = match row.portrait {
    Portrait::Loaded { size } => Line::from(vec![
      Span::styled(format!("{:<10}", "portrait"), label_style),
      Span::raw(format!("cached, {}", human_size(size))),
    ]),
    Portrait::Pending => Line::from(vec![
      Span::styled(format!("{:<10}", "portrait"), label_style),
      Span::styled("loading…", dim),
    ]),
    Portrait::Unknown => Line::from(vec![
      Span::styled(format!("{:<10}", "portrait"), label_style),
      Span::styled("none on record", dim),
    ]),
  };

  let mut lines = vec![
    Line::from(vec![
      Span::styled(format!("{:<10}", "name"), label_style),
      Span::raw(row.name.clone()),
    ]),
    Line::from(vec![
      Span::styled(format!("{:<10}", "lifespan"), label_style),
      Span::raw(row.lifespan.clone()),
    ]),
    portrait_line,
  ];

  if let Some(href) = &record.image_link_href {
    lines.push(Line::from(vec![
      Span::styled(format!("{:<10}", "link"), label_style),
      Span::styled(href.clone(), dim),
    ]));
  }

  f.render_widget(Paragraph::new(lines), inner);
}

fn human_size(bytes: usize) -> String {
  if bytes >= 1024 * 1024 {
    format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
  } else if bytes >= 1024 {
    format!("{:.1} KiB", bytes as f64 / 1024.0)
  } else {
    format!("{bytes} B")
  }
}
