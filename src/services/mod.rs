pub mod coupon_service;
pub mod inventory_service;
pub mod ledger_service;
pub mod order_service;
pub mod writeoff_service;

pub use coupon_service::*;
pub use inventory_service::*;
pub use ledger_service::*;
pub use order_service::*;
pub use writeoff_service::*;
