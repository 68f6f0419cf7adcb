use chrono::{Datelike, Months, NaiveDate, TimeDelta};
use serde::Serialize;

use crate::domain::{Order, OrderStatus};

/// Days in the "this week" window, today included.
pub const WEEK_DAYS: i64 = 7;

/// How many orders the dashboard lists as recent.
pub const RECENT_ORDERS: usize = 10;

/// Counts shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardAggregates {
    /// Active orders still pending.
    pub unfulfilled: usize,
    pub due_today: usize,
    /// Delivery in `today ..= today + 6`.
    pub due_week: usize,
    /// Delivery anywhere in the calendar month containing today, earlier
    /// days of the month included.
    pub due_month: usize,
}

/// Inclusive bounds of the 7-day window starting at `today`.
pub fn week_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let end = today
        .checked_add_signed(TimeDelta::days(WEEK_DAYS - 1))
        .unwrap_or(NaiveDate::MAX);
    (today, end)
}

/// Inclusive bounds of the calendar month containing `today`.
pub fn month_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = today.with_day(1).unwrap_or(today);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX);
    (first, last)
}

pub fn compute_dashboard_aggregates(orders: &[Order], today: NaiveDate) -> DashboardAggregates {
    let (week_start, week_end) = week_window(today);
    let (month_start, month_end) = month_window(today);
    let within = |date: NaiveDate, start: NaiveDate, end: NaiveDate| start <= date && date <= end;

    orders.iter().filter(|o| o.active).fold(
        DashboardAggregates::default(),
        |mut acc, order| {
            if order.status == OrderStatus::Pending {
                acc.unfulfilled += 1;
            }
            if order.is_scheduled() {
                let date = order.delivery_date;
                acc.due_today += usize::from(date == today);
                acc.due_week += usize::from(within(date, week_start, week_end));
                acc.due_month += usize::from(within(date, month_start, month_end));
            }
            acc
        },
    )
}

/// The `limit` most recently created active orders, newest first.
pub fn recent_orders(orders: &[Order], limit: usize) -> Vec<&Order> {
    let mut recent: Vec<&Order> = orders.iter().filter(|o| o.active).collect();
    recent.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.order_id.cmp(&a.order_id))
    });
    recent.truncate(limit);
    recent
}
