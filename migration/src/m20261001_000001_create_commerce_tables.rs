use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    OrderNo,
    UserId,
    TotalAmount,
    PayAmount,
    Discount,
    Status,
    PayMethod,
    TransactionId,
    AddressSnapshot,
    Note,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum OrderItems {
    Table,
    Id,
    OrderId,
    ProductId,
    SkuId,
    Title,
    SkuSpec,
    Price,
    Quantity,
    Amount,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Skus {
    Table,
    Id,
    ProductId,
    Code,
    Title,
    Price,
    Stock,
    CreatedAt,
    UpdatedAt,
}

/// 库存流水，只追加不修改
#[derive(DeriveIden)]
enum StockLogs {
    Table,
    Id,
    SkuId,
    OrderId,
    Quantity,
    ChangeType,
    StockBefore,
    StockAfter,
    Reason,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Coupons {
    Table,
    Id,
    Title,
    Description,
    CouponType,
    Value,
    MinSpend,
    StartTime,
    EndTime,
    TotalCount,
    TakenCount,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum UserCoupons {
    Table,
    Id,
    UserId,
    CouponId,
    Status,
    UsedAt,
    OrderId,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 订单表
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Orders::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Orders::OrderNo).string_len(32).not_null())
                    .col(ColumnDef::new(Orders::UserId).string_len(36).not_null())
                    .col(
                        ColumnDef::new(Orders::TotalAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Orders::PayAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Orders::Discount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Orders::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Orders::PayMethod).string_len(16).null())
                    .col(ColumnDef::new(Orders::TransactionId).string_len(64).null())
                    .col(ColumnDef::new(Orders::AddressSnapshot).text().null())
                    .col(ColumnDef::new(Orders::Note).string_len(255).null())
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_orders_order_no_unique")
                    .table(Orders::Table)
                    .col(Orders::OrderNo)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_orders_user")
                    .table(Orders::Table)
                    .col(Orders::UserId)
                    .to_owned(),
            )
            .await?;

        // 订单明细（下单时的价格快照）
        manager
            .create_table(
                Table::create()
                    .table(OrderItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderItems::OrderId).string_len(36).not_null())
                    .col(ColumnDef::new(OrderItems::ProductId).string_len(36).not_null())
                    .col(ColumnDef::new(OrderItems::SkuId).string_len(36).not_null())
                    .col(ColumnDef::new(OrderItems::Title).string_len(128).not_null())
                    .col(ColumnDef::new(OrderItems::SkuSpec).string_len(255).null())
                    .col(ColumnDef::new(OrderItems::Price).big_integer().not_null())
                    .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                    .col(ColumnDef::new(OrderItems::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(OrderItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_order_items_order")
                    .table(OrderItems::Table)
                    .col(OrderItems::OrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Skus::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Skus::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Skus::ProductId).string_len(36).not_null())
                    .col(ColumnDef::new(Skus::Code).string_len(64).null())
                    .col(ColumnDef::new(Skus::Title).string_len(128).null())
                    .col(ColumnDef::new(Skus::Price).big_integer().not_null())
                    .col(
                        ColumnDef::new(Skus::Stock)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Skus::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Skus::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StockLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StockLogs::SkuId).string_len(36).not_null())
                    .col(ColumnDef::new(StockLogs::OrderId).string_len(64).null())
                    .col(ColumnDef::new(StockLogs::Quantity).integer().not_null())
                    .col(ColumnDef::new(StockLogs::ChangeType).string_len(16).not_null())
                    .col(ColumnDef::new(StockLogs::StockBefore).integer().not_null())
                    .col(ColumnDef::new(StockLogs::StockAfter).integer().not_null())
                    .col(ColumnDef::new(StockLogs::Reason).string_len(255).null())
                    .col(
                        ColumnDef::new(StockLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_stock_logs_sku")
                    .table(StockLogs::Table)
                    .col(StockLogs::SkuId)
                    .to_owned(),
            )
            .await?;

        // 优惠券规则，total_count = -1 表示不限量
        manager
            .create_table(
                Table::create()
                    .table(Coupons::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Coupons::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Coupons::Title).string_len(64).not_null())
                    .col(ColumnDef::new(Coupons::Description).string_len(255).null())
                    .col(ColumnDef::new(Coupons::CouponType).string_len(16).not_null())
                    .col(ColumnDef::new(Coupons::Value).big_integer().not_null())
                    .col(
                        ColumnDef::new(Coupons::MinSpend)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Coupons::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Coupons::EndTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Coupons::TotalCount)
                            .integer()
                            .not_null()
                            .default(-1),
                    )
                    .col(
                        ColumnDef::new(Coupons::TakenCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Coupons::Status)
                            .string_len(16)
                            .not_null()
                            .default("enabled"),
                    )
                    .col(
                        ColumnDef::new(Coupons::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Coupons::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserCoupons::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserCoupons::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserCoupons::UserId).string_len(36).not_null())
                    .col(ColumnDef::new(UserCoupons::CouponId).string_len(36).not_null())
                    .col(
                        ColumnDef::new(UserCoupons::Status)
                            .string_len(16)
                            .not_null()
                            .default("unused"),
                    )
                    .col(
                        ColumnDef::new(UserCoupons::UsedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(UserCoupons::OrderId).string_len(64).null())
                    .col(
                        ColumnDef::new(UserCoupons::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 每个用户每张券最多领取一次
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_coupons_user_coupon_unique")
                    .table(UserCoupons::Table)
                    .col(UserCoupons::UserId)
                    .col(UserCoupons::CouponId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserCoupons::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Coupons::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StockLogs::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Skus::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrderItems::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
