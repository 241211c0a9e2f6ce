//! Dashboard session: wires the ports to aggregation, ordering and visibility.

mod dashboard;
mod loader;
mod settings;

pub use dashboard::{DashboardPorts, DashboardSession, DashboardView};
pub use loader::{CollectionLoader, CollectionSnapshot, DASHBOARD_COLLECTIONS};
pub use settings::SessionSettings;
