//! iCalendar (RFC 5545) delivery feed.
//!
//! One all-day `VEVENT` per scheduled order. Output depends only on the
//! order data and the feed settings: event order is fixed, UIDs derive from
//! `order_id` and stamps from `updated_at`, so an unchanged order set
//! always yields byte-identical output.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ClientLookup, Order};
use crate::sequencer::compare_public_ids;

const MAX_LINE_OCTETS: usize = 75;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub prod_id: String,
    /// Right-hand side of every event UID.
    pub uid_domain: String,
    pub calendar_name: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            prod_id: "-//Order Tracker//Orders//EN".to_string(),
            uid_domain: "order-tracker".to_string(),
            calendar_name: "Deliveries".to_string(),
        }
    }
}

/// Escapes a TEXT value: backslash, semicolon, comma and line breaks.
pub fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                escaped.push_str("\\n");
            }
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Appends `line` to `out`, folded at 75 octets and terminated by CRLF.
/// Folds never split a UTF-8 sequence.
fn push_line(out: &mut String, line: &str) {
    let mut rest = line;
    let mut limit = MAX_LINE_OCTETS;
    loop {
        if rest.len() <= limit {
            out.push_str(rest);
            out.push_str("\r\n");
            return;
        }
        let mut cut = limit;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        out.push_str(&rest[..cut]);
        out.push_str("\r\n ");
        rest = &rest[cut..];
        // continuation lines carry the leading space
        limit = MAX_LINE_OCTETS - 1;
    }
}

fn format_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

pub fn event_uid(order_id: u64, config: &CalendarConfig) -> String {
    format!("order-{order_id}@{}", config.uid_domain)
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        "N/A"
    } else {
        value
    }
}

fn push_event(out: &mut String, order: &Order, clients: &ClientLookup<'_>, config: &CalendarConfig) {
    let client = clients.get(order.client_id);
    let client_name = clients.name_of(order.client_id);
    let address = client.map_or("", |c| c.address.as_str());
    let stamp = format_stamp(order.updated_at);
    let end = order.delivery_date.succ_opt().unwrap_or(order.delivery_date);

    let description = [
        format!("Order ID: {}", order.public_id),
        format!("Items: {}", or_na(&order.items_text)),
        format!("Address: {}", or_na(address)),
    ]
    .iter()
    .map(|line| escape_text(line))
    .collect::<Vec<_>>()
    .join("\\n");

    push_line(out, "BEGIN:VEVENT");
    push_line(out, &format!("UID:{}", event_uid(order.order_id, config)));
    push_line(out, &format!("DTSTAMP:{stamp}"));
    push_line(out, &format!("LAST-MODIFIED:{stamp}"));
    push_line(out, &format!("DTSTART;VALUE=DATE:{}", format_date(order.delivery_date)));
    push_line(out, &format!("DTEND;VALUE=DATE:{}", format_date(end)));
    push_line(out, &format!("SUMMARY:{}", escape_text(&format!("Delivery – {client_name}"))));
    push_line(out, &format!("DESCRIPTION:{description}"));
    push_line(out, "TRANSP:TRANSPARENT");
    push_line(out, "END:VEVENT");
}

/// Active, non-cancelled orders in feed order: delivery date, then public
/// id, then internal id.
pub fn feed_orders(orders: &[Order]) -> Vec<&Order> {
    let mut scheduled: Vec<&Order> = orders.iter().filter(|o| o.is_scheduled()).collect();
    scheduled.sort_by(|a, b| {
        a.delivery_date
            .cmp(&b.delivery_date)
            .then_with(|| compare_public_ids(&a.public_id, &b.public_id))
            .then_with(|| a.order_id.cmp(&b.order_id))
    });
    scheduled
}

/// Builds the feed document. `tz` is the IANA zone announced to clients.
pub fn build_calendar_feed(
    orders: &[Order],
    clients: &ClientLookup<'_>,
    config: &CalendarConfig,
    tz: &str,
) -> String {
    let mut out = String::new();
    push_line(&mut out, "BEGIN:VCALENDAR");
    push_line(&mut out, "VERSION:2.0");
    push_line(&mut out, &format!("PRODID:{}", config.prod_id));
    push_line(&mut out, "CALSCALE:GREGORIAN");
    push_line(&mut out, "METHOD:PUBLISH");
    push_line(&mut out, &format!("X-WR-CALNAME:{}", escape_text(&config.calendar_name)));
    push_line(&mut out, &format!("X-WR-TIMEZONE:{tz}"));
    for order in feed_orders(orders) {
        push_event(&mut out, order, clients, config);
    }
    push_line(&mut out, "END:VCALENDAR");
    out
}

/// Active orders grouped by delivery date, earliest first, for the
/// calendar page. Cancelled orders stay visible here.
pub fn group_by_delivery_date(orders: &[Order]) -> BTreeMap<NaiveDate, Vec<&Order>> {
    let mut grouped: BTreeMap<NaiveDate, Vec<&Order>> = BTreeMap::new();
    for order in orders.iter().filter(|o| o.active) {
        grouped.entry(order.delivery_date).or_default().push(order);
    }
    for day in grouped.values_mut() {
        day.sort_by(|a, b| compare_public_ids(&a.public_id, &b.public_id).then_with(|| a.order_id.cmp(&b.order_id)));
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Client, OrderStatus};
    use crate::lifecycle::fixtures::{order, stamp};

    fn ymd(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn clients() -> Vec<Client> {
        vec![Client {
            client_id: 1,
            name: "Chan, Alice; Florist\\Co".to_string(),
            phone: String::new(),
            email: String::new(),
            address: "12 Flower Street\nCentral".to_string(),
            notes: String::new(),
            created_at: stamp(),
            active: true,
        }]
    }

    fn unfold(feed: &str) -> String {
        feed.replace("\r\n ", "")
    }

    #[test]
    fn feed_is_deterministic_and_order_independent() {
        let clients = clients();
        let lookup = ClientLookup::new(&clients);
        let config = CalendarConfig::default();
        let mut orders = vec![
            order(3, ymd(3, 9), OrderStatus::Pending),
            order(1, ymd(3, 5), OrderStatus::Fulfilled),
            order(2, ymd(3, 5), OrderStatus::Pending),
        ];

        let first = build_calendar_feed(&orders, &lookup, &config, "Europe/London");
        let second = build_calendar_feed(&orders, &lookup, &config, "Europe/London");
        assert_eq!(first, second);

        orders.reverse();
        assert_eq!(first, build_calendar_feed(&orders, &lookup, &config, "Europe/London"));

        let uids: Vec<&str> = first.lines().filter(|l| l.starts_with("UID:")).collect();
        assert_eq!(
            uids,
            vec!["UID:order-1@order-tracker", "UID:order-2@order-tracker", "UID:order-3@order-tracker"]
        );
    }

    #[test]
    fn excludes_cancelled_and_inactive_orders() {
        let clients = clients();
        let lookup = ClientLookup::new(&clients);
        let mut archived = order(2, ymd(3, 6), OrderStatus::Pending);
        archived.active = false;
        let orders = vec![order(1, ymd(3, 5), OrderStatus::Cancelled), archived, order(3, ymd(3, 7), OrderStatus::Pending)];

        let feed = build_calendar_feed(&orders, &lookup, &CalendarConfig::default(), "UTC");
        assert_eq!(feed.matches("BEGIN:VEVENT").count(), 1);
        assert!(feed.contains("UID:order-3@order-tracker"));
    }

    #[test]
    fn events_are_all_day_with_escaped_text() {
        let clients = clients();
        let lookup = ClientLookup::new(&clients);
        let orders = vec![order(7, ymd(2, 29), OrderStatus::Pending)];

        let feed = unfold(&build_calendar_feed(&orders, &lookup, &CalendarConfig::default(), "Europe/London"));
        assert!(feed.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
        assert!(feed.ends_with("END:VCALENDAR\r\n"));
        assert!(feed.contains("DTSTART;VALUE=DATE:20240229\r\n"));
        assert!(feed.contains("DTEND;VALUE=DATE:20240301\r\n"));
        assert!(feed.contains("DTSTAMP:20240301T083000Z\r\n"));
        assert!(feed.contains("SUMMARY:Delivery – Chan\\, Alice\\; Florist\\\\Co\r\n"));
        assert!(feed.contains(
            "DESCRIPTION:Order ID: 2024-007\\nItems: Roses and eucalyptus\\nAddress: 12 Flower Street\\nCentral\r\n"
        ));
    }

    #[test]
    fn unknown_client_and_blank_fields() {
        let lookup = ClientLookup::default();
        let mut o = order(4, ymd(3, 5), OrderStatus::Pending);
        o.items_text = String::new();
        let feed = unfold(&build_calendar_feed(&[o], &lookup, &CalendarConfig::default(), "UTC"));
        assert!(feed.contains("SUMMARY:Delivery – Unknown\r\n"));
        assert!(feed.contains("Items: N/A\\nAddress: N/A"));
    }

    #[test]
    fn long_lines_fold_at_75_octets_on_char_boundaries() {
        let mut out = String::new();
        let line = format!("SUMMARY:{}", "花".repeat(60));
        push_line(&mut out, &line);

        for physical in out.split("\r\n").filter(|l| !l.is_empty()) {
            assert!(physical.len() <= MAX_LINE_OCTETS, "{} octets", physical.len());
        }
        assert_eq!(unfold(&out), format!("{line}\r\n"));
    }

    #[test]
    fn escape_handles_crlf_once() {
        assert_eq!(escape_text("a\r\nb\nc"), "a\\nb\\nc");
    }

    #[test]
    fn grouping_keeps_dates_ascending() {
        let orders = vec![
            order(2, ymd(3, 9), OrderStatus::Pending),
            order(1, ymd(3, 5), OrderStatus::Cancelled),
            order(3, ymd(3, 5), OrderStatus::Pending),
        ];
        let grouped = group_by_delivery_date(&orders);
        let dates: Vec<NaiveDate> = grouped.keys().copied().collect();
        assert_eq!(dates, vec![ymd(3, 5), ymd(3, 9)]);
        assert_eq!(grouped[&ymd(3, 5)].len(), 2);
    }

    #[test]
    fn wide_sequences_keep_numeric_order() {
        let mut wide = order(1, ymd(3, 5), OrderStatus::Pending);
        wide.public_id = "2024-1000".into();
        let mut narrow = order(2, ymd(3, 5), OrderStatus::Pending);
        narrow.public_id = "2024-999".into();
        let orders = vec![wide, narrow];

        let feed: Vec<u64> = feed_orders(&orders).iter().map(|o| o.order_id).collect();
        assert_eq!(feed, vec![2, 1]);
        let day: Vec<u64> = group_by_delivery_date(&orders)[&ymd(3, 5)].iter().map(|o| o.order_id).collect();
        assert_eq!(day, vec![2, 1]);
    }
}
