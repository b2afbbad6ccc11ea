use chrono::{DateTime, Local};
use ratatui::widgets::ListState;

use crate::chat::Message;
use crate::poll::{ChatSink, Notice};

/// One rendered transcript entry.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TranscriptLine {
    pub message: Message,
    /// Local time the line was appended, shown next to it.
    pub received_at: DateTime<Local>,
}

pub struct App {
    /// Our nickname, shown in the input box title.
    pub nick: String,
    /// Everything shown so far, oldest first.
    pub transcript: Vec<TranscriptLine>,
    /// Text being typed.
    pub input: String,
    /// List selection state for scrolling.
    pub list_state: ListState,
    /// Whether polling is running (the view has focus).
    pub live: bool,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last notice or status message.
    pub status: String,
}

impl App {
    pub fn new(nick: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            transcript: Vec::new(),
            input: String::new(),
            list_state: ListState::default(),
            live: false,
            quit: false,
            status: "Connecting…".into(),
        }
    }

    /// Take the current input line, leaving the box empty.
    pub fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input)
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        if self.transcript.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.transcript.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.transcript.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if !self.transcript.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if !self.transcript.is_empty() {
            self.list_state.select(Some(self.transcript.len() - 1));
        }
    }
}

impl ChatSink for App {
    /// Append and follow the tail so new lines are visible.
    fn on_messages_appended(&mut self, messages: &[Message]) {
        let now = Local::now();
        self.transcript
            .extend(messages.iter().cloned().map(|message| TranscriptLine {
                message,
                received_at: now,
            }));
        self.status = format!("{} new", messages.len());
        self.select_last();
    }

    fn on_notice(&mut self, notice: Notice) {
        self.status = match notice {
            Notice::Network => "Network error, will retry".into(),
            Notice::Request(reason) => format!("Server error: {reason}"),
        };
    }
}
