use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A customer placing orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub client_id: u64,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

/// How strongly a client record matches submitted contact details.
/// Ordered so that an email match outranks a phone match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ContactMatch {
    None,
    Phone,
    Email,
}

impl Client {
    /// Email is compared case-insensitively; blank values never match.
    pub fn contact_match(&self, email: &str, phone: &str) -> ContactMatch {
        let email = email.trim();
        if !email.is_empty() && self.email.trim().eq_ignore_ascii_case(email) {
            return ContactMatch::Email;
        }
        let phone = phone.trim();
        if !phone.is_empty() && self.phone.trim() == phone {
            return ContactMatch::Phone;
        }
        ContactMatch::None
    }
}

/// Payload for creating a new client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientCreate {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for updating an existing client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Name shown when an order points at a client the lookup does not know.
pub const UNKNOWN_CLIENT: &str = "Unknown";

/// Resolves `Order::client_id` references. Built from every known client,
/// deactivated ones included, so old orders keep their names.
#[derive(Debug, Default)]
pub struct ClientLookup<'a> {
    by_id: HashMap<u64, &'a Client>,
}

impl<'a> ClientLookup<'a> {
    pub fn new(clients: &'a [Client]) -> Self {
        Self {
            by_id: clients.iter().map(|c| (c.client_id, c)).collect(),
        }
    }

    pub fn get(&self, client_id: u64) -> Option<&'a Client> {
        self.by_id.get(&client_id).copied()
    }

    pub fn name_of(&self, client_id: u64) -> &'a str {
        self.get(client_id).map_or(UNKNOWN_CLIENT, |c| c.name.as_str())
    }
}
