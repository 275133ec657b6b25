pub mod order_no;

pub use order_no::{generate_order_no, new_id};
