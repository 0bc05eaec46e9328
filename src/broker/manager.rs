//! `BrokerCore`: a single in-process actor wiring the Subscription Map and
//! Retained Map together the way an MQTT connection layer would, dispatching
//! commands over `tokio::mpsc` with oneshot reply channels. One actor owns
//! the whole trie rather than sharding per root topic.

use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};

use crate::broker::session::SessionTable;
use crate::broker::types::{ClientId, Message, Qos};
use crate::config::BrokerConfig;
use crate::routing::{MultiSubscriptionMap, RetainedMap};

/// Single source of truth for outbound senders, resolved by `ClientId` at
/// publish time.
type ClientRegistry = Arc<DashMap<ClientId, mpsc::UnboundedSender<Arc<Message>>>>;

enum Command {
    Connect { client: ClientId, sender: mpsc::UnboundedSender<Arc<Message>> },
    Subscribe { client: ClientId, filter: String, qos: Qos, reply: oneshot::Sender<()> },
    Unsubscribe { client: ClientId, filter: String, reply: oneshot::Sender<()> },
    Publish { topic: String, payload: Bytes, qos: Qos, retain: bool, reply: oneshot::Sender<usize> },
    Disconnect { client: ClientId, reply: oneshot::Sender<()> },
}

struct Actor {
    subs: MultiSubscriptionMap<(ClientId, Qos)>,
    retained: RetainedMap<Bytes>,
    sessions: SessionTable,
    clients: ClientRegistry,
    rx: mpsc::Receiver<Command>,
}

impl Actor {
    async fn run(mut self) {
        while let Some(cmd) = self.rx.recv().await {
            match cmd {
                Command::Connect { client, sender } => {
                    self.clients.insert(client.clone(), sender);
                    self.sessions.connect(client);
                }
                Command::Subscribe { client, filter, qos, reply } => {
                    self.subscribe(client, &filter, qos);
                    let _ = reply.send(());
                }
                Command::Unsubscribe { client, filter, reply } => {
                    self.unsubscribe(&client, &filter);
                    let _ = reply.send(());
                }
                Command::Publish { topic, payload, qos, retain, reply } => {
                    let sent = self.publish(&topic, payload, qos, retain);
                    let _ = reply.send(sent);
                }
                Command::Disconnect { client, reply } => {
                    self.disconnect(&client);
                    let _ = reply.send(());
                }
            }
        }
        tracing::debug!("broker actor channel closed, exiting");
    }

    fn subscribe(&mut self, client: ClientId, filter: &str, qos: Qos) {
        if let Err(err) = self.subs.insert(filter, (client.clone(), qos)) {
            tracing::warn!(%err, filter, "rejected subscribe");
            return;
        }
        if let Some(session) = self.sessions.session_mut(&client) {
            session.record(filter, qos);
        }
        tracing::debug!(?client, filter, ?qos, "subscribed");

        let Some(sender) = self.clients.get(&client).map(|s| s.clone()) else { return };
        self.retained.find(filter, |payload: &Bytes| {
            let msg = Arc::new(Message { topic: filter.to_string(), payload: payload.clone(), qos });
            let _ = sender.send(msg);
        });
    }

    fn unsubscribe(&mut self, client: &ClientId, filter: &str) {
        let qos = self
            .sessions
            .session_mut(client)
            .and_then(|s| s.forget(filter))
            .unwrap_or(Qos::AtMostOnce);
        self.subs.remove(filter, &(client.clone(), qos));
        tracing::debug!(?client, filter, "unsubscribed");
    }

    fn publish(&mut self, topic: &str, payload: Bytes, qos: Qos, retain: bool) -> usize {
        if retain {
            if payload.is_empty() {
                self.retained.remove(topic);
            } else if let Err(err) = self.retained.insert_or_update(topic, payload.clone()) {
                tracing::warn!(%err, topic, "rejected retained publish");
            }
        }

        // Coalesce duplicate sessions to their maximum subscribed QoS.
        let mut coalesced: Vec<(ClientId, Qos)> = Vec::new();
        self.subs.find(topic, |pair: &(ClientId, Qos)| {
            let client = pair.0.clone();
            let sub_qos = pair.1;
            match coalesced.iter_mut().find(|existing| existing.0 == client) {
                Some(existing) => {
                    if sub_qos > existing.1 {
                        existing.1 = sub_qos;
                    }
                }
                None => coalesced.push((client, sub_qos)),
            }
        });

        let mut sent = 0;
        for (client, sub_qos) in coalesced {
            let Some(sender) = self.clients.get(&client).map(|s| s.clone()) else { continue };
            let delivery_qos = std::cmp::min(sub_qos, qos);
            let msg = Arc::new(Message { topic: topic.to_string(), payload: payload.clone(), qos: delivery_qos });
            if sender.send(msg).is_ok() {
                sent += 1;
            }
        }
        tracing::debug!(topic, sent, "published");
        sent
    }

    fn disconnect(&mut self, client: &ClientId) {
        self.clients.remove(client);
        if let Some(session) = self.sessions.disconnect(client) {
            for (filter, qos) in session.into_filters() {
                self.subs.remove(&filter, &(client.clone(), qos));
            }
        }
        tracing::debug!(?client, "disconnected");
    }
}

/// Handle to the broker actor: clone freely, send commands, await replies.
#[derive(Clone)]
pub struct BrokerCore {
    tx: mpsc::Sender<Command>,
}

impl BrokerCore {
    pub fn spawn(config: &BrokerConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.actor_channel_capacity);
        let actor = Actor {
            subs: MultiSubscriptionMap::new(),
            retained: RetainedMap::new(),
            sessions: SessionTable::default(),
            clients: Arc::new(DashMap::new()),
            rx,
        };
        tokio::spawn(actor.run());
        Self { tx }
    }

    /// Registers a new client connection, returning its freshly-minted id.
    pub async fn connect(&self, sender: mpsc::UnboundedSender<Arc<Message>>) -> ClientId {
        let client = ClientId::new();
        let _ = self.tx.send(Command::Connect { client: client.clone(), sender }).await;
        client
    }

    pub async fn subscribe(&self, client: ClientId, filter: &str, qos: Qos) {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::Subscribe { client, filter: filter.to_string(), qos, reply }).await.is_ok() {
            let _ = rx.await;
        }
    }

    pub async fn unsubscribe(&self, client: ClientId, filter: &str) {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::Unsubscribe { client, filter: filter.to_string(), reply }).await.is_ok() {
            let _ = rx.await;
        }
    }

    /// Returns the number of subscribers the message was delivered to.
    pub async fn publish(&self, topic: &str, payload: Bytes, qos: Qos, retain: bool) -> usize {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::Publish { topic: topic.to_string(), payload, qos, retain, reply }).await.is_ok() {
            rx.await.unwrap_or(0)
        } else {
            0
        }
    }

    pub async fn disconnect(&self, client: ClientId) {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::Disconnect { client, reply }).await.is_ok() {
            let _ = rx.await;
        }
    }
}
