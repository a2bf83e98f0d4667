pub mod config;
pub mod dashboard;
pub mod event_bus;
pub mod module_context;
pub mod modules;
pub mod services;
pub mod view;

#[cfg(test)]
pub mod test_utils;

pub use dashboard::Dashboard;
pub use module_context::{ModuleContext, ModuleEventSender};
