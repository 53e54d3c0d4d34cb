use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Key bindings shown in the dashboard footer, as `(keys, action)`.
pub const KEY_HINTS: &[(&str, &str)] = &[
    ("Tab/←/→", "tab"),
    ("↑/↓", "cohort"),
    ("Space", "toggle"),
    ("c", "clear"),
    ("[/]", "start"),
    ("{/}", "end"),
    ("r", "reset"),
    ("PgUp/PgDn", "scroll"),
    ("q", "quit"),
];

/// One footer line listing every key binding.
pub fn key_hints_line(theme: &Theme) -> Line<'static> {
    let mut spans = Vec::with_capacity(KEY_HINTS.len() * 3);
    for (i, (keys, action)) in KEY_HINTS.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", theme.dim));
        }
        spans.push(Span::styled(*keys, theme.info));
        spans.push(Span::styled(format!(" {action}"), theme.dim));
    }
    Line::from(spans)
}
