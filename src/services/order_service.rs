use crate::clock::SharedClock;
use crate::entities::{OrderStatus, order_entity as orders, order_item_entity as order_items};
use crate::error::{AppError, AppResult};
use crate::models::{
    NewOrder, NewOrderItem, OrderPatch, OrderQuery, PaginatedResponse, PaginationParams,
    PlacedOrder,
};
use crate::utils::{generate_order_no, new_id};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// 订单状态机
///
/// 每次状态流转都在事务内对订单行加排他锁后重新读取状态，
/// 守卫条件只针对锁内读到的值判断。
#[derive(Clone)]
pub struct OrderService {
    pool: DatabaseConnection,
    clock: SharedClock,
}

impl OrderService {
    pub fn new(pool: DatabaseConnection, clock: SharedClock) -> Self {
        Self { pool, clock }
    }

    pub async fn create(&self, req: NewOrder, items: Vec<NewOrderItem>) -> AppResult<PlacedOrder> {
        self.create_in(&self.pool, req, items).await
    }

    /// 创建订单及其明细，任意一条明细写入失败整单回滚
    pub async fn create_in<C>(
        &self,
        conn: &C,
        req: NewOrder,
        items: Vec<NewOrderItem>,
    ) -> AppResult<PlacedOrder>
    where
        C: TransactionTrait,
    {
        validate_order(&req, &items)?;

        let now = self.clock.now();
        let order_id = new_id();
        let order_no = match req.order_no {
            Some(no) if !no.trim().is_empty() => no,
            _ => generate_order_no(now),
        };

        let txn = conn.begin().await?;

        let order = orders::ActiveModel {
            id: Set(order_id.clone()),
            order_no: Set(order_no),
            user_id: Set(req.user_id),
            total_amount: Set(req.total_amount),
            pay_amount: Set(req.pay_amount),
            discount: Set(req.discount),
            status: Set(OrderStatus::Pending),
            pay_method: Set(None),
            transaction_id: Set(None),
            address_snapshot: Set(req.address_snapshot),
            note: Set(req.note),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut saved = Vec::with_capacity(items.len());
        for item in items {
            let amount = item.amount();
            let row = order_items::ActiveModel {
                order_id: Set(order_id.clone()),
                product_id: Set(item.product_id),
                sku_id: Set(item.sku_id),
                title: Set(item.title),
                sku_spec: Set(item.sku_spec),
                price: Set(item.price),
                quantity: Set(item.quantity),
                amount: Set(amount),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            saved.push(row);
        }

        txn.commit().await?;
        log::info!(
            "Order created: id={} no={} user={} items={}",
            order.id,
            order.order_no,
            order.user_id,
            saved.len()
        );

        Ok(PlacedOrder {
            order,
            items: saved,
        })
    }

    pub async fn pay(
        &self,
        order_id: &str,
        pay_method: &str,
        transaction_id: &str,
    ) -> AppResult<orders::Model> {
        self.pay_in(&self.pool, order_id, pay_method, transaction_id)
            .await
    }

    pub async fn pay_in<C>(
        &self,
        conn: &C,
        order_id: &str,
        pay_method: &str,
        transaction_id: &str,
    ) -> AppResult<orders::Model>
    where
        C: TransactionTrait,
    {
        let patch = OrderPatch::new()
            .pay_method(pay_method)
            .transaction_id(transaction_id);
        self.transition_in(conn, order_id, OrderStatus::Paid, patch)
            .await
    }

    /// Pay with extra fields, e.g. the amount actually captured by the gateway.
    pub async fn pay_with(&self, order_id: &str, patch: OrderPatch) -> AppResult<orders::Model> {
        self.transition_in(&self.pool, order_id, OrderStatus::Paid, patch)
            .await
    }

    pub async fn ship(&self, order_id: &str) -> AppResult<orders::Model> {
        self.ship_in(&self.pool, order_id).await
    }

    pub async fn ship_in<C>(&self, conn: &C, order_id: &str) -> AppResult<orders::Model>
    where
        C: TransactionTrait,
    {
        self.transition_in(conn, order_id, OrderStatus::Shipping, OrderPatch::new())
            .await
    }

    pub async fn confirm(&self, order_id: &str) -> AppResult<orders::Model> {
        self.confirm_in(&self.pool, order_id).await
    }

    pub async fn confirm_in<C>(&self, conn: &C, order_id: &str) -> AppResult<orders::Model>
    where
        C: TransactionTrait,
    {
        self.transition_in(conn, order_id, OrderStatus::Done, OrderPatch::new())
            .await
    }

    pub async fn cancel(&self, order_id: &str) -> AppResult<orders::Model> {
        self.cancel_in(&self.pool, order_id).await
    }

    pub async fn cancel_in<C>(&self, conn: &C, order_id: &str) -> AppResult<orders::Model>
    where
        C: TransactionTrait,
    {
        self.transition_in(conn, order_id, OrderStatus::Closed, OrderPatch::new())
            .await
    }

    async fn transition_in<C>(
        &self,
        conn: &C,
        order_id: &str,
        to: OrderStatus,
        patch: OrderPatch,
    ) -> AppResult<orders::Model>
    where
        C: TransactionTrait,
    {
        let txn = conn.begin().await?;

        // SELECT * FROM orders WHERE id = ? FOR UPDATE
        let order = orders::Entity::find_by_id(order_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::OrderNotFound(order_id.to_string()))?;

        let from = order.status;
        if !from.can_transition_to(to) {
            // txn 在这里被 drop，自动回滚
            return Err(AppError::InvalidState { from, to });
        }

        let mut am = order.into_active_model();
        patch.apply(&mut am);
        am.status = Set(to);
        am.updated_at = Set(self.clock.now());
        let updated = am.update(&txn).await?;

        txn.commit().await?;
        log::info!("Order {order_id} status: {from} -> {to}");
        Ok(updated)
    }

    pub async fn get_order(&self, order_id: &str) -> AppResult<orders::Model> {
        orders::Entity::find_by_id(order_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::OrderNotFound(order_id.to_string()))
    }

    pub async fn get_items(&self, order_id: &str) -> AppResult<Vec<order_items::Model>> {
        let items = order_items::Entity::find()
            .filter(order_items::Column::OrderId.eq(order_id))
            .order_by_asc(order_items::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(items)
    }

    /// 用户订单列表，按创建时间倒序分页
    pub async fn list_user_orders(
        &self,
        user_id: &str,
        query: OrderQuery,
    ) -> AppResult<PaginatedResponse<orders::Model>> {
        let params = PaginationParams::new(query.page, query.page_size);

        let mut select = orders::Entity::find().filter(orders::Column::UserId.eq(user_id));
        if let Some(status) = query.status {
            select = select.filter(orders::Column::Status.eq(status));
        }

        let total = select.clone().count(&self.pool).await?;
        let data = select
            .order_by_desc(orders::Column::CreatedAt)
            .order_by_desc(orders::Column::OrderNo)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(data, &params, total))
    }
}

fn validate_order(req: &NewOrder, items: &[NewOrderItem]) -> AppResult<()> {
    if req.user_id.trim().is_empty() {
        return Err(AppError::ValidationError("Order user is required".into()));
    }
    if items.is_empty() {
        return Err(AppError::ValidationError(
            "Order must contain at least one item".into(),
        ));
    }
    if req.total_amount < 0 || req.pay_amount < 0 || req.discount < 0 {
        return Err(AppError::ValidationError(
            "Order amounts must not be negative".into(),
        ));
    }
    for item in items {
        if item.quantity <= 0 {
            return Err(AppError::InvalidQuantity(item.quantity));
        }
        if item.price < 0 {
            return Err(AppError::ValidationError(format!(
                "Item {} has a negative price",
                item.sku_id
            )));
        }
    }
    Ok(())
}
