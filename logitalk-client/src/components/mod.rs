pub mod chat_history;
pub mod text_input;
