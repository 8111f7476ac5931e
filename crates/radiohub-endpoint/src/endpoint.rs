use std::collections::HashMap;

use radiohub_frame::{KeyValueStore, WireMessage};

/// Result key naming the decoded message.
pub const EVENT_KEY: &str = "Event";
/// Result key carrying a decode problem that is still reported upward.
pub const ERROR_KEY: &str = "Error";

/// Payload decoder. Receives the frame with its CRC already removed and
/// returns `false` when the payload is too short to decode.
pub type DecodeFn = fn(&WireMessage, &mut KeyValueStore) -> bool;

/// One row of a [`MessageTable`].
#[derive(Debug, Clone, Copy)]
pub struct MessageEntry {
    pub id: u8,
    pub name: &'static str,
    pub decode: DecodeFn,
}

impl MessageEntry {
    pub const fn new(id: u8, name: &'static str, decode: DecodeFn) -> Self {
        Self { id, name, decode }
    }
}

/// Message id to name and decoder.
#[derive(Debug, Clone, Default)]
pub struct MessageTable {
    entries: HashMap<u8, MessageEntry>,
}

impl MessageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from static rows. Later rows win on duplicate ids.
    pub fn from_entries(entries: &[MessageEntry]) -> Self {
        let mut table = Self::new();
        for entry in entries {
            table.insert(*entry);
        }
        table
    }

    /// Insert or replace the row for `entry.id`.
    pub fn insert(&mut self, entry: MessageEntry) -> Option<MessageEntry> {
        self.entries.insert(entry.id, entry)
    }

    pub fn get(&self, message_id: u8) -> Option<&MessageEntry> {
        self.entries.get(&message_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows ordered by message id.
    pub fn entries(&self) -> Vec<&MessageEntry> {
        let mut entries: Vec<&MessageEntry> = self.entries.values().collect();
        entries.sort_unstable_by_key(|entry| entry.id);
        entries
    }
}

/// A protocol collaborator addressed by a 1-byte endpoint id.
pub trait Endpoint {
    fn id(&self) -> u8;

    fn name(&self) -> &str;

    fn table(&self) -> &MessageTable;

    /// Turn a CRC-stripped frame into key/value records.
    ///
    /// Known messages get an `Event` record with their name followed by
    /// whatever their decoder appends; a decoder rejecting a short payload
    /// makes this return `false`. Unknown message ids still count as decoded
    /// and carry an `Error` record.
    fn decode(&self, msg: &WireMessage, result: &mut KeyValueStore) -> bool {
        let message_id = msg.message_id();
        match self.table().get(message_id) {
            Some(entry) => {
                result.append(EVENT_KEY, entry.name);
                (entry.decode)(msg, result)
            }
            None => {
                let text = format!("unsupported message id: {message_id} received");
                result.append(ERROR_KEY, text);
                true
            }
        }
    }
}

/// Endpoint defined entirely by its id, name and message table.
#[derive(Debug, Clone)]
pub struct TableEndpoint {
    id: u8,
    name: String,
    table: MessageTable,
}

impl TableEndpoint {
    pub fn new(id: u8, name: impl Into<String>, table: MessageTable) -> Self {
        Self {
            id,
            name: name.into(),
            table,
        }
    }
}

impl Endpoint for TableEndpoint {
    fn id(&self) -> u8 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn table(&self) -> &MessageTable {
        &self.table
    }
}
