//! Per-client bookkeeping: the set of filters a client currently holds, so
//! disconnect/unsubscribe can unwind every subscription without the caller
//! having to remember them. Records each filter's QoS alongside it so
//! removal can match the exact `(ClientId, Qos)` value stored in the
//! subscription map.

use std::collections::HashMap;

use crate::broker::types::{ClientId, Qos};

#[derive(Default)]
pub(crate) struct Session {
    filters: HashMap<String, Qos>,
}

impl Session {
    pub(crate) fn record(&mut self, filter: &str, qos: Qos) {
        self.filters.insert(filter.to_string(), qos);
    }

    pub(crate) fn forget(&mut self, filter: &str) -> Option<Qos> {
        self.filters.remove(filter)
    }

    pub(crate) fn into_filters(self) -> Vec<(String, Qos)> {
        self.filters.into_iter().collect()
    }
}

#[derive(Default)]
pub(crate) struct SessionTable {
    sessions: HashMap<ClientId, Session>,
}

impl SessionTable {
    pub(crate) fn connect(&mut self, client: ClientId) {
        self.sessions.entry(client).or_default();
    }

    pub(crate) fn session_mut(&mut self, client: &ClientId) -> Option<&mut Session> {
        self.sessions.get_mut(client)
    }

    pub(crate) fn disconnect(&mut self, client: &ClientId) -> Option<Session> {
        self.sessions.remove(client)
    }
}
