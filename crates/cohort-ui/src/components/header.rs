use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Decoration placed either side of the application title.
pub const MARKERS: &str = "◆ ◇";

/// Dashboard header rendering four lines:
///
/// 1. Application title (ALL CAPS).
/// 2. A 60-column `=` separator.
/// 3. Dataset and filter summary in `[ dataset | filter ]` format.
/// 4. An empty line.
pub struct Header<'a> {
    /// Short dataset description, e.g. `"23,970 requests"`.
    pub dataset: &'a str,
    /// Active filter, as rendered by `CohortFilter`'s `Display`.
    pub filter: &'a str,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(dataset: &'a str, filter: &'a str, theme: &'a Theme) -> Self {
        Self {
            dataset,
            filter,
            theme,
        }
    }

    /// Render the header as exactly four lines.
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let separator = "=".repeat(60);

        vec![
            Line::from(vec![
                Span::styled(MARKERS, self.theme.separator),
                Span::styled(" CASH ADVANCE COHORT DASHBOARD ", self.theme.header),
                Span::styled(MARKERS, self.theme.separator),
            ]),
            Line::from(Span::styled(separator, self.theme.separator)),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(self.dataset, self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(self.filter, self.theme.value),
                Span::styled(" ]", self.theme.label),
            ]),
            Line::from(""),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_header_has_four_lines() {
        let theme = Theme::dark();
        let lines = Header::new("7 requests", "cohorts: all", &theme).to_lines();
        assert_eq!(lines.len(), 4);
        assert!(text(&lines[3]).is_empty());
    }

    #[test]
    fn test_header_title_line() {
        let theme = Theme::dark();
        let lines = Header::new("7 requests", "cohorts: all", &theme).to_lines();
        let title = text(&lines[0]);
        assert!(title.contains("CASH ADVANCE COHORT DASHBOARD"), "got: {title}");
        assert!(title.starts_with(MARKERS));
    }

    #[test]
    fn test_header_separator_is_sixty_columns() {
        let theme = Theme::dark();
        let lines = Header::new("", "", &theme).to_lines();
        let sep = text(&lines[1]);
        assert_eq!(sep.chars().count(), 60);
        assert!(sep.chars().all(|c| c == '='));
    }

    #[test]
    fn test_header_info_line() {
        let theme = Theme::light();
        let lines = Header::new("7 requests", "cohorts: 2020-01 | activity: all", &theme).to_lines();
        assert_eq!(lines[2].spans.len(), 5);
        assert_eq!(
            text(&lines[2]),
            "[ 7 requests | cohorts: 2020-01 | activity: all ]"
        );
    }
}
