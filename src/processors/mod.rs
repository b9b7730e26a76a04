pub mod chat;
pub mod whisper;
