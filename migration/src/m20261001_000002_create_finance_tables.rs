use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Balances {
    Table,
    Id,
    UserId,
    Asset,
    Total,
    Frozen,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Deals {
    Table,
    Id,
    UserId,
    Asset,
    DealType,
    Amount,
    Balance,
    RelatedId,
    Description,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 钱包余额与流水
/// - balances: (user_id, asset) 唯一，首笔交易时惰性创建
/// - deals: 只追加，balance 列为本笔交易后的余额快照，用于对账
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Balances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Balances::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Balances::UserId).string_len(36).not_null())
                    .col(
                        ColumnDef::new(Balances::Asset)
                            .string_len(16)
                            .not_null()
                            .default("money"),
                    )
                    .col(
                        ColumnDef::new(Balances::Total)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Balances::Frozen)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Balances::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Balances::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ON CONFLICT (user_id, asset) DO NOTHING 依赖该唯一索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_balances_user_asset_unique")
                    .table(Balances::Table)
                    .col(Balances::UserId)
                    .col(Balances::Asset)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Deals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Deals::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Deals::UserId).string_len(36).not_null())
                    .col(ColumnDef::new(Deals::Asset).string_len(16).not_null())
                    .col(ColumnDef::new(Deals::DealType).string_len(32).not_null())
                    .col(ColumnDef::new(Deals::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Deals::Balance).big_integer().not_null())
                    .col(ColumnDef::new(Deals::RelatedId).string_len(64).null())
                    .col(ColumnDef::new(Deals::Description).string_len(255).null())
                    .col(
                        ColumnDef::new(Deals::CreatedAt)
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
                    .name("idx_deals_user_asset")
                    .table(Deals::Table)
                    .col(Deals::UserId)
                    .col(Deals::Asset)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Deals::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Balances::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
