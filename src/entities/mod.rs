pub mod balances;
pub mod coupons;
pub mod deals;
pub mod order_items;
pub mod orders;
pub mod skus;
pub mod stock_logs;
pub mod user_coupons;

pub use balances as balance_entity;
pub use coupons as coupon_entity;
pub use deals as deal_entity;
pub use order_items as order_item_entity;
pub use orders as order_entity;
pub use skus as sku_entity;
pub use stock_logs as stock_log_entity;
pub use user_coupons as user_coupon_entity;

pub use balances::Asset;
pub use coupons::{CouponStatus, CouponType};
pub use deals::DealType;
pub use orders::OrderStatus;
pub use stock_logs::StockChangeType;
pub use user_coupons::UserCouponStatus;
