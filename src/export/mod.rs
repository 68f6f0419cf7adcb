//! CSV exports of orders and clients. Column order is fixed; only active
//! records are written.

use thiserror::Error;

use crate::domain::{format_minor_units, Client, ClientLookup, Order};
use crate::sequencer::compare_public_ids;

pub const ORDER_COLUMNS: [&str; 8] = [
    "order_id",
    "public_id",
    "client_name",
    "delivery_date",
    "status",
    "price",
    "items_text",
    "notes",
];

pub const CLIENT_COLUMNS: [&str; 7] = [
    "client_id",
    "name",
    "phone",
    "email",
    "address",
    "notes",
    "created_at",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV buffer error: {0}")]
    Buffer(String),
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Buffer(e.to_string()))
}

/// Orders by delivery date, then public id. A missing price is an empty
/// cell.
pub fn export_orders_csv(orders: &[Order], clients: &ClientLookup<'_>) -> Result<String, ExportError> {
    let mut rows: Vec<&Order> = orders.iter().filter(|o| o.active).collect();
    rows.sort_by(|a, b| {
        a.delivery_date
            .cmp(&b.delivery_date)
            .then_with(|| compare_public_ids(&a.public_id, &b.public_id))
    });

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(ORDER_COLUMNS)?;
    for order in rows {
        let price = order.price_minor_units.map(format_minor_units).unwrap_or_default();
        writer.write_record([
            order.order_id.to_string().as_str(),
            order.public_id.as_str(),
            clients.name_of(order.client_id),
            order.delivery_date.format("%Y-%m-%d").to_string().as_str(),
            order.status.as_str(),
            price.as_str(),
            order.items_text.as_str(),
            order.notes.as_str(),
        ])?;
    }
    finish(writer)
}

/// Clients by name. `created_at` is RFC 3339 in UTC.
pub fn export_clients_csv(clients: &[Client]) -> Result<String, ExportError> {
    let mut rows: Vec<&Client> = clients.iter().filter(|c| c.active).collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.client_id.cmp(&b.client_id)));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CLIENT_COLUMNS)?;
    for client in rows {
        writer.write_record([
            client.client_id.to_string().as_str(),
            client.name.as_str(),
            client.phone.as_str(),
            client.email.as_str(),
            client.address.as_str(),
            client.notes.as_str(),
            client.created_at.to_rfc3339().as_str(),
        ])?;
    }
    finish(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderStatus;
    use crate::lifecycle::fixtures::{order, stamp};
    use chrono::NaiveDate;

    fn client(client_id: u64, name: &str, address: &str) -> Client {
        Client {
            client_id,
            name: name.to_string(),
            phone: "+8525550001".to_string(),
            email: "alice@example.com".to_string(),
            address: address.to_string(),
            notes: String::new(),
            created_at: stamp(),
            active: true,
        }
    }

    #[test]
    fn orders_render_price_and_quote_commas() {
        let clients = vec![client(1, "Chan, Alice", "")];
        let lookup = ClientLookup::new(&clients);
        let mut o = order(1, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(), OrderStatus::Pending);
        o.price_minor_units = Some(123450);
        o.notes = "say \"hi\"".to_string();

        let csv = export_orders_csv(&[o], &lookup).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("order_id,public_id,client_name,delivery_date,status,price,items_text,notes")
        );
        assert_eq!(
            lines.next(),
            Some("1,2024-001,\"Chan, Alice\",2024-03-05,pending,1234.50,Roses and eucalyptus,\"say \"\"hi\"\"\"")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn inactive_records_never_appear() {
        let mut gone = client(2, "Archived Ltd", "");
        gone.active = false;
        let clients = vec![client(1, "Alice Chan", "12 Flower Street\nCentral"), gone];
        let lookup = ClientLookup::new(&clients);

        let mut archived = order(9, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(), OrderStatus::Pending);
        archived.active = false;
        let orders = export_orders_csv(&[archived], &lookup).unwrap();
        assert_eq!(orders.lines().count(), 1);

        let exported = export_clients_csv(&clients).unwrap();
        assert!(!exported.contains("Archived Ltd"));
        assert!(exported.contains("\"12 Flower Street\nCentral\""));
        assert!(exported.contains("2024-03-01T08:30:00+00:00"));
    }

    #[test]
    fn missing_price_is_blank() {
        let lookup = ClientLookup::default();
        let mut o = order(1, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(), OrderStatus::Fulfilled);
        o.price_minor_units = None;
        let csv = export_orders_csv(&[o], &lookup).unwrap();
        assert!(csv.contains(",fulfilled,,"));
        assert!(csv.contains("Unknown"));
    }

    #[test]
    fn rows_follow_numeric_identifier_order() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        let mut wide = order(1, date, OrderStatus::Pending);
        wide.public_id = "2024-1000".to_string();
        let mut narrow = order(2, date, OrderStatus::Pending);
        narrow.public_id = "2024-999".to_string();

        let csv = export_orders_csv(&[wide, narrow], &ClientLookup::default()).unwrap();
        let ids: Vec<&str> = csv.lines().skip(1).filter_map(|line| line.split(',').nth(1)).collect();
        assert_eq!(ids, vec!["2024-999", "2024-1000"]);
    }
}
