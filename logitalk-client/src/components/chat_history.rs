/// Widget for displaying the chat transcript
use logitalk_protocol::{DisplayEvent, EventKind};
use ratatui::{
    prelude::{Buffer, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, List, ListDirection, Padding, Widget},
};
use time::{format_description::FormatItem, macros::format_description};

const TIMESTAMP: &[FormatItem<'static>] = format_description!("[hour]:[minute]:[second]");

/// Display events in a window that scrolls up as new ones arrive
#[derive(Debug)]
pub struct ChatHistory<'a> {
    history: Vec<Text<'a>>,
    list: List<'a>,
}

impl<'a> Default for ChatHistory<'a> {
    fn default() -> Self {
        Self {
            history: Vec::new(),
            list: Self::list(),
        }
    }
}

impl Widget for ChatHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Widget::render(&self, area, buf)
    }
}

impl Widget for &ChatHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut items = self.history.clone();
        items.reverse();
        self.list.clone().items(items).render(area, buf);
    }
}

impl<'a> ChatHistory<'a> {
    /// Add an event to the bottom of the transcript
    pub fn push(&mut self, event: DisplayEvent) {
        self.history.push(decorate(event));
    }

    fn list() -> List<'a> {
        List::default().direction(ListDirection::BottomToTop).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .padding(Padding::horizontal(1))
                .title("LogiTalk"),
        )
    }
}

fn decorate<'a>(event: DisplayEvent) -> Text<'a> {
    let style = match event.kind() {
        EventKind::Received => Style::default(),
        EventKind::Echo => Style::default().fg(Color::Blue),
        EventKind::Notice => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::ITALIC),
    };
    let timestamp = event.at().format(TIMESTAMP).unwrap_or_default();
    Text::from(Line::from(vec![
        Span::styled(format!("{timestamp} "), Style::default().fg(Color::DarkGray)),
        Span::styled(event.text().to_owned(), style),
    ]))
}

#[cfg(test)]
mod test {
    use super::{decorate, ChatHistory};
    use logitalk_protocol::DisplayEvent;
    use ratatui::{
        prelude::{Buffer, Rect},
        style::Color,
        widgets::Widget,
    };

    #[test]
    fn test_decorate_styles_by_kind() {
        let text = decorate(DisplayEvent::echo("Bob: hi"));
        let spans = &text.lines[0].spans;
        assert_eq!(spans[1].content, "Bob: hi");
        assert_eq!(spans[1].style.fg, Some(Color::Blue));

        let text = decorate(DisplayEvent::received("A: hi"));
        assert_eq!(text.lines[0].spans[1].style.fg, None);

        let text = decorate(DisplayEvent::notice("Disconnected from server"));
        assert_eq!(text.lines[0].spans[1].style.fg, Some(Color::Yellow));
    }

    #[test]
    fn test_renders_newest_at_bottom() {
        let mut history = ChatHistory::default();
        history.push(DisplayEvent::received("A: first"));
        history.push(DisplayEvent::received("B: second"));

        let area = Rect::new(0, 0, 40, 6);
        let mut buf = Buffer::empty(area);
        (&history).render(area, &mut buf);

        let rows: Vec<String> = (0..area.height)
            .map(|y| (0..area.width).map(|x| buf.get(x, y).symbol()).collect())
            .collect();
        let first = rows.iter().position(|row| row.contains("A: first")).unwrap();
        let second = rows.iter().position(|row| row.contains("B: second")).unwrap();
        assert!(first < second);
    }
}
