use chrono::NaiveDate;

use super::money::parse_price;

/// Raw order form as received from the public or admin form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderSubmission {
    pub client_name: String,
    pub client_phone: String,
    pub client_email: String,
    pub client_address: String,
    /// `YYYY-MM-DD`
    pub delivery_date: String,
    pub items_text: String,
    pub notes: String,
    pub price: String,
    /// Honeypot field. Humans never see it, so it must stay empty.
    pub website: String,
}

/// Contact details extracted from a submission, normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactDetails {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSubmission {
    pub contact: ContactDetails,
    pub delivery_date: NaiveDate,
    pub price_minor_units: Option<i64>,
    pub items_text: String,
    pub notes: String,
}

pub fn parse_delivery_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid delivery date: {raw}"))
}

impl OrderSubmission {
    pub fn validate(&self) -> Result<ValidSubmission, String> {
        if !self.website.trim().is_empty() {
            return Err("submission rejected".to_string());
        }

        let name = self.client_name.trim();
        if name.is_empty() || self.delivery_date.trim().is_empty() {
            return Err("client name and delivery date are required".to_string());
        }

        let delivery_date = parse_delivery_date(&self.delivery_date)?;
        let price_minor_units = parse_price(&self.price)?;

        Ok(ValidSubmission {
            contact: ContactDetails {
                name: name.to_string(),
                phone: self.client_phone.trim().to_string(),
                email: self.client_email.trim().to_lowercase(),
                address: self.client_address.trim().to_string(),
            },
            delivery_date,
            price_minor_units,
            items_text: self.items_text.clone(),
            notes: self.notes.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> OrderSubmission {
        OrderSubmission {
            client_name: " Alice Chan ".into(),
            client_email: "Alice@Example.com".into(),
            delivery_date: "2024-03-05".into(),
            price: "880".into(),
            ..Default::default()
        }
    }

    #[test]
    fn validates_and_normalizes() {
        let valid = submission().validate().unwrap();
        assert_eq!(valid.contact.name, "Alice Chan");
        assert_eq!(valid.contact.email, "alice@example.com");
        assert_eq!(valid.delivery_date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(valid.price_minor_units, Some(88000));
    }

    #[test]
    fn honeypot_rejects() {
        let mut s = submission();
        s.website = "http://spam.example".into();
        assert!(s.validate().is_err());
    }

    #[test]
    fn missing_or_malformed_fields_reject() {
        let mut s = submission();
        s.client_name = "  ".into();
        assert!(s.validate().is_err());

        let mut s = submission();
        s.delivery_date = "05/03/2024".into();
        assert!(s.validate().is_err());

        let mut s = submission();
        s.price = "-3".into();
        assert!(s.validate().is_err());
    }
}
