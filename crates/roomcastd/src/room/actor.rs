//! Room actor - owns a room's client set and fans out broadcasts.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Reply send failures are ignored (the caller went away)
//! - Delivery failures are logged, never escalated to the publisher

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use roomcast_core::{ClientId, RoomId};

use super::client::{Client, Registration};
use super::commands::{RoomCommand, RoomStats};

/// The room actor - sole owner of one room's client set.
///
/// Runs in a single task and processes commands sequentially, so every
/// broadcast sees the membership produced by exactly the commands queued
/// before it.
pub struct RoomActor {
    /// Room this actor serves
    room_id: RoomId,

    /// Command receiver
    receiver: mpsc::Receiver<RoomCommand>,

    /// Registered clients keyed by client id
    clients: HashMap<ClientId, Client>,

    /// When the client set last became empty
    idle_since: Option<Instant>,
}

impl RoomActor {
    /// Creates a new room actor with an empty client set.
    pub fn new(room_id: RoomId, receiver: mpsc::Receiver<RoomCommand>) -> Self {
        Self {
            room_id,
            receiver,
            clients: HashMap::new(),
            idle_since: Some(Instant::now()),
        }
    }

    /// Runs the actor event loop.
    ///
    /// Processes commands until every sender has been dropped.
    pub async fn run(mut self) {
        debug!(room_id = %self.room_id, "Room actor starting");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!(
            room_id = %self.room_id,
            clients = self.clients.len(),
            "Room actor stopped"
        );
    }

    /// Dispatches a command to the appropriate handler.
    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Attach { client, respond_to } => {
                self.handle_attach(client);
                let _ = respond_to.send(());
            }
            RoomCommand::Detach {
                client_id,
                registration,
            } => {
                self.handle_detach(&client_id, registration);
            }
            RoomCommand::Broadcast {
                ciphertext,
                respond_to,
            } => {
                let delivered = self.handle_broadcast(&ciphertext);
                let _ = respond_to.send(delivered);
            }
            RoomCommand::Snapshot { respond_to } => {
                let _ = respond_to.send(self.stats());
            }
        }
    }

    // ========================================================================
    // Command Handlers
    // ========================================================================

    fn handle_attach(&mut self, client: Client) {
        let client_id = client.id.clone();

        if self.clients.insert(client_id.clone(), client).is_some() {
            debug!(
                room_id = %self.room_id,
                client_id = %client_id,
                "Client re-attached, previous registration replaced"
            );
        }
        self.idle_since = None;

        info!(
            room_id = %self.room_id,
            client_id = %client_id,
            total_clients = self.clients.len(),
            "Client attached"
        );
    }

    fn handle_detach(&mut self, client_id: &ClientId, registration: Registration) {
        match self.clients.get(client_id) {
            Some(client) if client.registration() == registration => {
                self.clients.remove(client_id);
            }
            Some(client) => {
                debug!(
                    room_id = %self.room_id,
                    client_id = %client_id,
                    stale = %registration,
                    current = %client.registration(),
                    "Stale detach ignored, client was re-attached"
                );
                return;
            }
            None => {
                debug!(
                    room_id = %self.room_id,
                    client_id = %client_id,
                    "Detach for unknown client ignored"
                );
                return;
            }
        }

        if self.clients.is_empty() {
            self.idle_since = Some(Instant::now());
        }

        info!(
            room_id = %self.room_id,
            client_id = %client_id,
            total_clients = self.clients.len(),
            "Client detached"
        );
    }

    /// Hands `ciphertext` to every registered client without waiting.
    ///
    /// A full delivery channel loses this one message for that one
    /// client. A closed channel means its Detach is already queued.
    fn handle_broadcast(&self, ciphertext: &str) -> usize {
        let mut delivered = 0;

        for (client_id, client) in &self.clients {
            match client.try_deliver(ciphertext.to_string()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        room_id = %self.room_id,
                        client_id = %client_id,
                        "Client delivery channel full, message dropped"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(
                        room_id = %self.room_id,
                        client_id = %client_id,
                        "Client channel closed, awaiting detach"
                    );
                }
            }
        }

        debug!(
            room_id = %self.room_id,
            delivered,
            total_clients = self.clients.len(),
            "Broadcast delivered"
        );

        delivered
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns the number of registered clients.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    fn stats(&self) -> RoomStats {
        RoomStats {
            clients: self.clients.len(),
            idle_since: self.idle_since,
        }
    }
}
