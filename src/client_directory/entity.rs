use crate::actor_framework::Entity;
use crate::domain::{Client, ClientCreate, ClientPatch, ContactMatch};

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl Entity for Client {
    type Id = u64;
    type CreatePayload = ClientCreate;
    type Patch = ClientPatch;

    fn id(&self) -> &u64 { &self.client_id }

    /// Creates a new Client from creation parameters.
    ///
    /// # Errors
    /// Rejects a blank name.
    fn from_create(id: u64, payload: ClientCreate) -> Result<Self, String> {
        let name = non_blank(payload.name).ok_or_else(|| "client name is required".to_string())?;
        Ok(Self {
            client_id: id,
            name,
            phone: payload.phone.trim().to_string(),
            email: payload.email.trim().to_lowercase(),
            address: payload.address,
            notes: payload.notes,
            created_at: payload.created_at,
            active: true,
        })
    }

    fn is_active(&self) -> bool { self.active }

    /// Updates the client's contact details.
    ///
    /// # Fields Updated
    /// Any field present in the patch. A name cannot be blanked.
    fn on_update(&mut self, patch: ClientPatch) -> Result<(), String> {
        if let Some(name) = patch.name {
            self.name = non_blank(name).ok_or_else(|| "client name is required".to_string())?;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone.trim().to_string();
        }
        if let Some(email) = patch.email {
            self.email = email.trim().to_lowercase();
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        Ok(())
    }

    fn on_deactivate(&mut self) -> Result<(), String> {
        self.active = false;
        Ok(())
    }

    /// Email matches outrank phone matches.
    fn match_rank(&self, payload: &ClientCreate) -> u8 {
        match self.contact_match(&payload.email, &payload.phone) {
            ContactMatch::Email => 2,
            ContactMatch::Phone => 1,
            ContactMatch::None => 0,
        }
    }

    /// A returning customer refreshes their name and address; blank form
    /// fields keep what is on file.
    fn on_merge(&mut self, payload: ClientCreate) -> Result<(), String> {
        if let Some(name) = non_blank(payload.name) {
            self.name = name;
        }
        if let Some(address) = non_blank(payload.address) {
            self.address = address;
        }
        Ok(())
    }
}
