use crate::entities::{CouponStatus, CouponType, coupon_entity, user_coupon_entity};
use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCoupon {
    pub title: String,
    pub description: Option<String>,
    pub coupon_type: CouponType,
    pub value: i64,
    pub min_spend: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// `None` 表示不限量
    pub total_count: Option<i32>,
    pub status: CouponStatus,
}

/// Admin-side coupon edit. Only set fields are written.
#[derive(Debug, Clone, Default)]
pub struct CouponPatch {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) end_time: Option<DateTime<Utc>>,
    pub(crate) total_count: Option<i32>,
    pub(crate) status: Option<CouponStatus>,
}

impl CouponPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }

    /// -1 lifts the cap.
    pub fn total_count(mut self, total_count: i32) -> Self {
        self.total_count = Some(total_count);
        self
    }

    pub fn status(mut self, status: CouponStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub(crate) fn apply(self, am: &mut coupon_entity::ActiveModel) {
        if let Some(v) = self.title {
            am.title = Set(v);
        }
        if let Some(v) = self.description {
            am.description = Set(Some(v));
        }
        if let Some(v) = self.end_time {
            am.end_time = Set(v);
        }
        if let Some(v) = self.total_count {
            am.total_count = Set(v);
        }
        if let Some(v) = self.status {
            am.status = Set(v);
        }
    }
}

/// A held coupon together with the rule it was issued from.
#[derive(Debug, Clone, Serialize)]
pub struct CouponRedemption {
    pub user_coupon: user_coupon_entity::Model,
    pub coupon: coupon_entity::Model,
}
