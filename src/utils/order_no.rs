use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU32, Ordering};

static SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// 生成订单号：秒级时间戳 + 进程内自增序号（6位）
///
/// Unique within one process for up to a million orders per second.
/// Uniqueness across processes relies on the `orders.order_no` unique index.
pub fn generate_order_no(now: DateTime<Utc>) -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed) % 1_000_000;
    format!("{}{:06}", now.format("%Y%m%d%H%M%S"), seq)
}

/// 生成实体主键（去掉连字符的 UUID v4）
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_order_no_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).unwrap();
        let no = generate_order_no(now);
        assert_eq!(no.len(), 20);
        assert!(no.starts_with("20260301083000"));
        assert!(no.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_order_no_unique_for_same_instant() {
        let now = Utc::now();
        let a = generate_order_no(now);
        let b = generate_order_no(now);
        assert_ne!(a, b);
    }

    #[test]
    fn test_new_id() {
        let id = new_id();
        assert_eq!(id.len(), 32);
        assert!(!id.contains('-'));
        assert_ne!(id, new_id());
    }
}
