pub mod coupon;
pub mod inventory;
pub mod order;
pub mod pagination;
pub mod wallet;

pub use coupon::*;
pub use inventory::*;
pub use order::*;
pub use pagination::*;
pub use wallet::*;
