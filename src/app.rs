//! Terminal application state: the live timeline of delivered messages.

use ratatui::widgets::ListState;

use crate::message::Message;

/// Oldest messages fall off the timeline beyond this many.
pub const TIMELINE_LIMIT: usize = 1000;

pub struct App {
    /// Delivered messages, newest first.
    pub timeline: Vec<Message>,
    /// List selection state for scrolling.
    pub list_state: ListState,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Whether the user has asked for the config file to be re-read.
    pub reload_requested: bool,
    /// Last status message.
    pub status: String,
}

impl App {
    pub fn new() -> Self {
        Self {
            timeline: Vec::new(),
            list_state: ListState::default(),
            quit: false,
            reload_requested: false,
            status: "Starting…".into(),
        }
    }

    /// Put a freshly emitted message at the top of the timeline.
    ///
    /// A selection stays on the message it pointed at.
    pub fn push_message(&mut self, message: Message) {
        if message.is_error {
            self.status = message.text.clone();
        } else {
            self.status = format!("New from {}", message.source_name);
        }

        self.timeline.insert(0, message);
        self.timeline.truncate(TIMELINE_LIMIT);

        if let Some(i) = self.list_state.selected() {
            self.list_state
                .select(Some((i + 1).min(self.timeline.len() - 1)));
        }
    }

    /// Link of the selected message, if it has one.
    pub fn selected_link(&self) -> Option<&str> {
        self.list_state
            .selected()
            .and_then(|i| self.timeline.get(i))
            .and_then(|m| m.feed_link.as_deref())
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        if self.timeline.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.timeline.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.timeline.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if !self.timeline.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if !self.timeline.is_empty() {
            self.list_state.select(Some(self.timeline.len() - 1));
        }
    }
}
