use crate::entities::UserCouponStatus;
use crate::error::{AppError, AppResult};
use crate::models::CouponRedemption;
use crate::services::CouponService;

const WRITEOFF_PREFIX: &str = "writeoff:";

/// 门店核销：用户出示券码（即 user coupon id），店员确认后核销。
/// 没有订单金额，所以不校验门槛和有效期。
#[derive(Clone)]
pub struct WriteOffService {
    coupons: CouponService,
}

impl WriteOffService {
    pub fn new(coupons: CouponService) -> Self {
        Self { coupons }
    }

    pub async fn verify_coupon_code(&self, code: &str) -> AppResult<CouponRedemption> {
        let user_coupon = match self.coupons.get_user_coupon(code).await {
            Ok(uc) => uc,
            Err(AppError::CouponNotFound) => return Err(AppError::InvalidCode),
            Err(e) => return Err(e),
        };
        if user_coupon.status != UserCouponStatus::Unused {
            return Err(AppError::InvalidCode);
        }

        let coupon = match self.coupons.get_coupon(&user_coupon.coupon_id).await {
            Ok(c) => c,
            Err(AppError::CouponNotFound) => return Err(AppError::InvalidCode),
            Err(e) => return Err(e),
        };

        Ok(CouponRedemption {
            user_coupon,
            coupon,
        })
    }

    pub async fn write_off_coupon(&self, code: &str, staff_id: &str) -> AppResult<()> {
        let marker = writeoff_marker(staff_id);
        match self.coupons.use_coupon(code, &marker).await {
            Ok(()) => {
                log::info!("Coupon {code} written off by staff {staff_id}");
                Ok(())
            }
            Err(AppError::CouponUsed) => Err(AppError::InvalidCode),
            Err(e) => Err(e),
        }
    }
}

pub fn writeoff_marker(staff_id: &str) -> String {
    format!("{WRITEOFF_PREFIX}{staff_id}")
}

/// 判断 user coupon 上记录的 order_id 是否来自门店核销
pub fn is_writeoff_marker(order_id: &str) -> bool {
    order_id.starts_with(WRITEOFF_PREFIX)
}
