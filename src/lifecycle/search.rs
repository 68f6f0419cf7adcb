use crate::domain::{Client, ClientLookup, Order, OrderStatus};
use crate::sequencer::compare_public_ids;

/// Filter for the order list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    /// `None` lists every status.
    pub status: Option<OrderStatus>,
    /// Case-insensitive substring over client name, email, phone and
    /// public id. Blank matches everything.
    pub query: String,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Active orders matching `filter`, earliest delivery first.
pub fn filter_orders<'a>(
    orders: &'a [Order],
    clients: &ClientLookup<'_>,
    filter: &OrderFilter,
) -> Vec<&'a Order> {
    let needle = filter.query.trim().to_lowercase();
    let mut matched: Vec<&Order> = orders
        .iter()
        .filter(|o| o.active)
        .filter(|o| filter.status.map_or(true, |status| o.status == status))
        .filter(|o| {
            if needle.is_empty() || contains_ci(&o.public_id, &needle) {
                return true;
            }
            clients.get(o.client_id).is_some_and(|c| {
                contains_ci(&c.name, &needle)
                    || contains_ci(&c.email, &needle)
                    || contains_ci(&c.phone, &needle)
            })
        })
        .collect();
    matched.sort_by(|a, b| {
        a.delivery_date
            .cmp(&b.delivery_date)
            .then_with(|| compare_public_ids(&a.public_id, &b.public_id))
    });
    matched
}

/// Active clients whose name, email or phone contains `query`, by name.
pub fn search_clients<'a>(clients: &'a [Client], query: &str) -> Vec<&'a Client> {
    let needle = query.trim().to_lowercase();
    let mut matched: Vec<&Client> = clients
        .iter()
        .filter(|c| c.active)
        .filter(|c| {
            needle.is_empty()
                || contains_ci(&c.name, &needle)
                || contains_ci(&c.email, &needle)
                || contains_ci(&c.phone, &needle)
        })
        .collect();
    matched.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.client_id.cmp(&b.client_id)));
    matched
}

/// Active orders for one client, latest delivery first.
pub fn orders_for_client(orders: &[Order], client_id: u64) -> Vec<&Order> {
    let mut matched: Vec<&Order> = orders
        .iter()
        .filter(|o| o.active && o.client_id == client_id)
        .collect();
    matched.sort_by(|a, b| b.delivery_date.cmp(&a.delivery_date));
    matched
}
