pub mod classroom;
pub mod metric_events;
pub mod users;
