//! Message forwarding, presence and friend-visit dispatch.

use serde_json::Value;
use skirmish_protocol::{Payload, PlayerId, Presence, ServerEvent, VisitAction, payload_target};

use crate::{Coordinator, MatchError, Persistence};

/// Attaches the authenticated sender to a relayed payload.
///
/// Overwrites any `sender` the client put there itself.
pub(crate) fn stamp_sender(mut payload: Payload, sender: PlayerId) -> Payload {
    payload.insert("sender".into(), Value::from(sender.0));
    payload
}

impl<S: Persistence> Coordinator<S> {
    /// Relays a gameplay payload to `target` as `forwarded`.
    ///
    /// Delivered only if the target is in a match and connected. The
    /// sender's own match is not checked.
    pub fn forward(
        &self,
        sender: PlayerId,
        target: PlayerId,
        payload: Payload,
    ) -> Result<(), MatchError> {
        if !self.matches.is_playing(target) {
            return Err(MatchError::InvalidState(format!(
                "forward from {sender} to {target}: target is not in a match"
            )));
        }
        if !self.sessions.is_connected(target) {
            return Err(MatchError::PlayerNotFound(target));
        }
        self.send_to(target, ServerEvent::Forwarded(stamp_sender(payload, sender)));
        Ok(())
    }

    /// Presence of `target`; `InMatch` wins over `Online`.
    pub fn presence(&self, target: PlayerId) -> Presence {
        if self.matches.is_playing(target) {
            Presence::InMatch
        } else if self.sessions.is_connected(target) {
            Presence::Online
        } else {
            Presence::Offline
        }
    }

    /// Answers an online-status query to the requester only.
    pub fn check_presence(&self, requester: PlayerId, target: PlayerId) -> Presence {
        let status = self.presence(target);
        self.send_to(requester, ServerEvent::OnlineStatus { target, status });
        status
    }

    /// Dispatches an `island_visit` request from `sender`.
    ///
    /// `accept` starts a visit, `leave`/`kick` end the sender's visit,
    /// anything else is relayed to the target with `sender` attached.
    /// The target must be connected in every case.
    pub fn island_visit(&mut self, sender: PlayerId, payload: Payload) -> Result<(), MatchError> {
        let target = payload_target(&payload)?;
        let request = payload
            .get("request")
            .and_then(Value::as_str)
            .map(VisitAction::parse)
            .ok_or_else(|| MatchError::InvalidState("island_visit without request".into()))?;

        if !self.sessions.is_connected(target) {
            return Err(MatchError::PlayerNotFound(target));
        }
        tracing::debug!(%sender, %target, request = request.as_str(), "island visit");

        match request {
            VisitAction::Accept => self.accept_friend_visit(sender, target, payload).map(|_| ()),
            VisitAction::Leave | VisitAction::Kick => {
                let match_id = self.matches.match_of(sender).cloned().ok_or_else(|| {
                    MatchError::InvalidState(format!("player {sender} is not on a visit"))
                })?;
                self.end_visit(&match_id, sender, &request)
            }
            VisitAction::Other(_) => {
                self.send_to(target, ServerEvent::IslandVisit(stamp_sender(payload, sender)));
                Ok(())
            }
        }
    }
}
