/// Single-line message input
use ratatui::{
    prelude::{Buffer, Rect},
    style::{Color, Style},
    widgets::{Block, BorderType, Borders, Padding, Paragraph, Widget},
};

const PLACEHOLDER: &str = "Type a message and press Enter";

/// Edits the TextInput understands
#[derive(Debug)]
pub enum TextInputAction {
    /// Inserts a character at the cursor
    Char(char),
    MoveRight,
    MoveLeft,
    MoveHome,
    MoveEnd,
    /// Deletes the character before the cursor
    Backspace,
    /// Deletes the character under the cursor
    Delete,
    Clear,
}

/// Message being composed. The cursor counts characters, not bytes.
#[derive(Debug, Default)]
pub struct TextInput {
    cursor: usize,
    input: String,
}

impl Widget for TextInput {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Widget::render(&self, area, buf)
    }
}

impl Widget for &TextInput {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let paragraph = if self.input.is_empty() {
            Paragraph::new(PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
        } else {
            Paragraph::new(self.input.as_str())
        };
        paragraph
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .padding(Padding::horizontal(1))
                    .title("Message"),
            )
            .render(area, buf)
    }
}

impl TextInput {
    pub fn action(&mut self, action: TextInputAction) {
        use TextInputAction::*;
        match action {
            Char(c) => self.enter_char(c),
            MoveRight => self.cursor = (self.cursor + 1).min(self.char_count()),
            MoveLeft => self.cursor = self.cursor.saturating_sub(1),
            MoveHome => self.cursor = 0,
            MoveEnd => self.cursor = self.char_count(),
            Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.remove_at(self.cursor);
                }
            }
            Delete => self.remove_at(self.cursor),
            Clear => {
                self.input.clear();
                self.cursor = 0;
            }
        }
    }

    /// Positions cursor properly given the `Rect` of this input box
    pub fn cursor_position(&self, area: Rect) -> (u16, u16) {
        let offset = u16::try_from(self.cursor).unwrap_or(u16::MAX);
        (area.x.saturating_add(offset).saturating_add(2), area.y + 1)
    }

    pub fn get_input(&self) -> String {
        self.input.clone()
    }

    fn char_count(&self) -> usize {
        self.input.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_index)
            .map_or(self.input.len(), |(i, _)| i)
    }

    fn enter_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.input.insert(at, c);
        self.cursor += 1;
    }

    fn remove_at(&mut self, char_index: usize) {
        if char_index < self.char_count() {
            let at = self.byte_index(char_index);
            self.input.remove(at);
        }
    }
}

#[cfg(test)]
mod test {
    use super::{TextInput, TextInputAction::*};
    use ratatui::prelude::Rect;

    fn typed(text: &str) -> TextInput {
        let mut input = TextInput::default();
        for c in text.chars() {
            input.action(Char(c));
        }
        input
    }

    #[test]
    fn test_editing_multibyte_text() {
        let mut input = typed("Привіт");
        input.action(MoveLeft);
        input.action(Backspace);
        assert_eq!(input.get_input(), "Привт");

        input.action(Char('і'));
        input.action(MoveHome);
        input.action(Delete);
        assert_eq!(input.get_input(), "ривіт");

        input.action(MoveEnd);
        input.action(Char('!'));
        assert_eq!(input.get_input(), "ривіт!");
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut input = typed("ab");
        input.action(MoveRight);
        input.action(Delete);
        assert_eq!(input.get_input(), "ab");
        assert_eq!(input.cursor_position(Rect::new(0, 0, 20, 3)), (4, 1));

        input.action(MoveHome);
        input.action(MoveLeft);
        input.action(Backspace);
        assert_eq!(input.get_input(), "ab");
        assert_eq!(input.cursor_position(Rect::new(0, 0, 20, 3)), (2, 1));

        input.action(Clear);
        assert_eq!(input.get_input(), "");
    }
}
