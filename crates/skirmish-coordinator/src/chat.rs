//! Global chat relay.

use chrono::NaiveDateTime;
use skirmish_protocol::{PlayerId, ServerEvent};

use crate::{ChatRecord, Coordinator, Persistence};

/// Chat time stamp, e.g. `Mar-05 02:07PM`.
pub fn format_time_stamp(at: NaiveDateTime) -> String {
    at.format("%b-%d %I:%M%p").to_string()
}

impl<S: Persistence> Coordinator<S> {
    /// Stores a chat line and broadcasts it to every connected client.
    ///
    /// A storage failure is logged; the line is still broadcast.
    pub fn chat(&mut self, sender: PlayerId, username: String, message: String) {
        let entry = ChatRecord {
            user_id: sender,
            message: message.clone(),
        };
        if let Err(e) = self.store.record(&entry) {
            tracing::error!(%sender, error = %e, "could not save chat message");
        }

        let time_stamp = format_time_stamp(chrono::Local::now().naive_local());
        self.sessions.broadcast(&ServerEvent::Chat {
            username,
            message,
            time_stamp,
        });
    }
}
