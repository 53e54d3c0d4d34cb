//! Explore tab: the profiling sections as one scrollable page.

use ratatui::{
    layout::Rect,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::report::Section;
use crate::themes::Theme;

/// Styled lines for `sections`: a title, its body, then a blank line.
pub fn section_lines<'a>(sections: &'a [Section], theme: &Theme) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    for section in sections {
        lines.push(Line::from(Span::styled(section.title.as_str(), theme.header)));
        lines.extend(
            section
                .lines
                .iter()
                .map(|l| Line::from(Span::styled(l.as_str(), theme.text))),
        );
        lines.push(Line::from(""));
    }
    lines
}

/// Render the sections scrolled down by `scroll` lines.
pub fn render_explore(frame: &mut Frame, area: Rect, sections: &[Section], scroll: u16, theme: &Theme) {
    let text = Text::from(section_lines(sections, theme));
    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(Span::styled(" Explore (PgUp/PgDn to scroll) ", theme.header)),
        )
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}
