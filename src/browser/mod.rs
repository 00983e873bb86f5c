pub mod driver;
pub mod network;
pub mod selector;
pub mod session;
pub mod wait;

pub use driver::{Browser, DomEvent};
pub use selector::Selector;
