use std::{convert::Infallible, time::Duration};

use axum::{
    extract::{Query, State},
    response::{
        Sse,
        sse::{Event, KeepAlive},
    },
};
use products_crm::ChangeEvent;
use tokio::sync::broadcast;
use tokio_stream::{
    Stream, StreamExt,
    wrappers::{BroadcastStream, errors::BroadcastStreamRecvError},
};
use tracing::{debug, info, warn};

use crate::{
    auth::AuthUser,
    http::AppState,
    opportunities::{Scope, ScopeQuery},
};

const KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Fan-out of committed opportunity changes to connected subscribers.
#[derive(Clone, Debug)]
pub struct ChangeHub {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Never blocks; with no subscribers the event is dropped.
    pub fn publish(&self, event: ChangeEvent) {
        let kind = event.kind.as_str();
        match self.sender.send(event) {
            Ok(receivers) => debug!(kind, receivers, "change published"),
            Err(_) => debug!(kind, "change dropped, no subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

pub async fn opportunity_events(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<ScopeQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let see_all = query.scope == Scope::All && user.is_admin();
    let viewer = user.id;
    info!(user_id = %viewer, see_all, "realtime subscriber connected");

    let stream = BroadcastStream::new(state.hub.subscribe()).filter_map(move |message| {
        let change = match message {
            Ok(change) => change,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(user_id = %viewer, skipped, "realtime subscriber lagged");
                return None;
            }
        };
        if !see_all && !change.visible_to(viewer) {
            return None;
        }
        Event::default()
            .event(change.kind.as_str())
            .json_data(&change)
            .ok()
            .map(Ok)
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE).text("keep-alive"))
}
