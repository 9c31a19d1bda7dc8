pub mod telegram;

pub use telegram::{TelegramConfig, TelegramNotifier};
