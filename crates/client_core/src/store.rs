//! Owned snapshot of the last server list received from the directory.

use std::sync::{Mutex, MutexGuard, PoisonError};

use shared::{
    domain::{Server, ServerId},
    protocol::Envelope,
};

#[derive(Debug, Clone)]
pub enum StoreMutation {
    /// A fresh list from the directory.
    Replace(Envelope),
    /// Swap in an updated record with the same id; unknown ids are ignored.
    Patch(Server),
    /// Put a newly created record first; the cache adopts `response` metadata.
    Prepend { response: Envelope, server: Server },
    /// Drop the record with `id`; the cache adopts `response` metadata.
    Remove { response: Envelope, id: ServerId },
}

#[derive(Default)]
pub struct ServerStore {
    snapshot: Mutex<Option<Envelope>>,
}

impl ServerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Envelope>> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Option<Envelope> {
        self.lock().clone()
    }

    pub fn snapshot_or_empty(&self) -> Envelope {
        self.snapshot().unwrap_or_default()
    }

    /// Applies `mutation` atomically and returns the resulting snapshot.
    pub fn apply(&self, mutation: StoreMutation) -> Envelope {
        let mut guard = self.lock();
        let next = match mutation {
            StoreMutation::Replace(envelope) => envelope,
            StoreMutation::Patch(server) => {
                let Some(current) = guard.as_mut() else {
                    return Envelope::default();
                };
                if let Some(slot) = current
                    .data
                    .servers
                    .as_mut()
                    .and_then(|servers| servers.iter_mut().find(|s| s.id == server.id))
                {
                    *slot = server;
                }
                return current.clone();
            }
            StoreMutation::Prepend { response, server } => {
                let existing = guard
                    .as_ref()
                    .map(|current| current.servers().to_vec())
                    .unwrap_or_default();
                let mut servers = Vec::with_capacity(existing.len() + 1);
                servers.push(server);
                servers.extend(existing);
                response.rebased(servers)
            }
            StoreMutation::Remove { response, id } => {
                let remaining = guard
                    .as_ref()
                    .map(|current| {
                        current
                            .servers()
                            .iter()
                            .filter(|s| s.id != id)
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                response.rebased(remaining)
            }
        };
        *guard = Some(next.clone());
        next
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::Status;

    use super::*;

    fn server(id: i64, status: Status) -> Server {
        Server {
            id: ServerId(id),
            ip_address: format!("192.168.1.{id}"),
            name: format!("node-{id}"),
            memory: "8 GB".to_string(),
            server_type: "Personal PC".to_string(),
            image_url: None,
            status,
        }
    }

    fn ids(envelope: &Envelope) -> Vec<i64> {
        envelope.servers().iter().map(|s| s.id.0).collect()
    }

    fn seeded() -> ServerStore {
        let store = ServerStore::new();
        store.apply(StoreMutation::Replace(Envelope::with_servers(
            "Servers retrieved",
            vec![
                server(1, Status::ServerDown),
                server(2, Status::ServerDown),
                server(3, Status::ServerDown),
            ],
        )));
        store
    }

    #[test]
    fn patch_replaces_only_matching_record() {
        let store = seeded();
        let next = store.apply(StoreMutation::Patch(server(2, Status::ServerUp)));
        assert_eq!(ids(&next), vec![1, 2, 3]);
        assert_eq!(next.servers()[1].status, Status::ServerUp);
        assert_eq!(next.servers()[0].status, Status::ServerDown);
        assert_eq!(next.servers()[2].status, Status::ServerDown);
        assert_eq!(next.message, "Servers retrieved");
    }

    #[test]
    fn patch_with_unknown_id_leaves_list_alone() {
        let store = seeded();
        let before = store.snapshot().expect("seeded");
        let after = store.apply(StoreMutation::Patch(server(9, Status::ServerUp)));
        assert_eq!(before, after);
    }

    #[test]
    fn patch_before_first_load_keeps_store_empty() {
        let store = ServerStore::new();
        let next = store.apply(StoreMutation::Patch(server(1, Status::ServerUp)));
        assert!(next.servers().is_empty());
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn prepend_puts_new_record_first_and_adopts_response() {
        let store = seeded();
        let response = Envelope::with_server("Server created", server(4, Status::ServerUp));
        let next = store.apply(StoreMutation::Prepend {
            response,
            server: server(4, Status::ServerUp),
        });
        assert_eq!(ids(&next), vec![4, 1, 2, 3]);
        assert_eq!(next.message, "Server created");
        assert!(next.server().is_none());
    }

    #[test]
    fn prepend_on_empty_store_starts_a_list() {
        let store = ServerStore::new();
        let next = store.apply(StoreMutation::Prepend {
            response: Envelope::default(),
            server: server(1, Status::ServerDown),
        });
        assert_eq!(ids(&next), vec![1]);
    }

    #[test]
    fn remove_keeps_relative_order() {
        let store = seeded();
        let next = store.apply(StoreMutation::Remove {
            response: Envelope::with_servers("Server deleted", Vec::new()),
            id: ServerId(2),
        });
        assert_eq!(ids(&next), vec![1, 3]);
        assert_eq!(store.snapshot().map(|e| ids(&e)), Some(vec![1, 3]));
    }
}
