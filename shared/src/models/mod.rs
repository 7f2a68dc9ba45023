//! Data models shared between the pager server and its clients.

pub mod manager_pin;
pub mod order;

pub use manager_pin::{ManagerPinConfig, SetManagerPinRequest, SetManagerPinResponse};
pub use order::{CookingType, Order, OrderCreate, OrderPhase, OrderStatus, OrderUpdate};
