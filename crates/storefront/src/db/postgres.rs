//! `PostgreSQL` implementation of the store traits.
//!
//! Queries are built at runtime with `sqlx::query` so the crate compiles
//! without a live database. Every statement of a unit of work runs on the
//! connection held by [`PgTx`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{Acquire, PgPool, Postgres, Row};

use cartwright_core::{
    Amount, CartLineInput, Email, OrderId, OrderLineId, PaymentInfo, ProductId, Quantity,
    ShippingInfo, UserId,
};

use super::{
    CartStore, Catalog, OrderBook, RepositoryError, StockCheck, StockLedger, Store, Transaction,
    UserDirectory, conflict_on_unique, not_found_on_foreign_key,
};
use crate::models::{
    CartItemView, NewOrder, NewProduct, NewUser, Order, OrderItemView, OrderLine, OrderView,
    Product, Rating, Role, User,
};

const PRODUCT_COLUMNS: &str = "p.id, p.title, p.price, p.description, p.category, p.image, \
                               p.rating_rate, p.rating_count, p.stock, p.created_at";

const USER_COLUMNS: &str = "id, email, name, role, created_at, shipping_address, \
                            shipping_address2, shipping_country, shipping_state, shipping_zip, \
                            card_name, card_number, card_expiry";

/// Store backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// An open `PostgreSQL` transaction. Rolled back on drop.
pub struct PgTx {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl Store for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(PgTx { tx })
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

impl Transaction for PgTx {
    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}

impl PgTx {
    async fn stock_of(
        &mut self,
        product: ProductId,
    ) -> Result<Option<(String, i32)>, RepositoryError> {
        let row = sqlx::query("SELECT title, stock FROM shop.product WHERE id = $1")
            .bind(product)
            .fetch_optional(&mut *self.tx)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some((row.try_get("title")?, row.try_get("stock")?)))
    }
}

impl StockLedger for PgTx {
    async fn check_available(
        &mut self,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<StockCheck, RepositoryError> {
        Ok(match self.stock_of(product).await? {
            None => StockCheck::NotFound,
            Some((title, available)) if available < quantity.get() => {
                StockCheck::Insufficient { title, available }
            }
            Some(_) => StockCheck::Ok,
        })
    }

    async fn decrement(
        &mut self,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<StockCheck, RepositoryError> {
        // The row lock taken by UPDATE makes a concurrent decrement wait and
        // then re-evaluate `stock >= $2` against the committed value.
        let result = sqlx::query(
            r"
            UPDATE shop.product
            SET stock = stock - $2
            WHERE id = $1 AND stock >= $2
            ",
        )
        .bind(product)
        .bind(quantity.get())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(StockCheck::Ok);
        }

        Ok(match self.stock_of(product).await? {
            None => StockCheck::NotFound,
            Some((title, available)) => StockCheck::Insufficient { title, available },
        })
    }

    async fn increment(
        &mut self,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<i32, RepositoryError> {
        let row = sqlx::query(
            r"
            UPDATE shop.product
            SET stock = LEAST(stock::bigint + $2, 2147483647)::int
            WHERE id = $1
            RETURNING stock
            ",
        )
        .bind(product)
        .bind(i64::from(quantity.get()))
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.try_get("stock")?)
    }

    async fn set_level(&mut self, product: ProductId, level: u32) -> Result<i32, RepositoryError> {
        let level = i32::try_from(level)
            .map_err(|_| RepositoryError::Conflict(format!("stock level {level} out of range")))?;

        let row = sqlx::query("UPDATE shop.product SET stock = $2 WHERE id = $1 RETURNING stock")
            .bind(product)
            .bind(level)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.try_get("stock")?)
    }
}

impl CartStore for PgTx {
    async fn cart_lines(&mut self, user: UserId) -> Result<Vec<CartItemView>, RepositoryError> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}, c.quantity
            FROM shop.cart_item c
            JOIN shop.product p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.created_at, c.id
            "
        ))
        .bind(user)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(CartItemView {
                    product: product_from_row(row)?,
                    qty: quantity_from_row(row, "quantity")?,
                })
            })
            .collect()
    }

    async fn replace_cart(
        &mut self,
        user: UserId,
        lines: &[CartLineInput],
    ) -> Result<(), RepositoryError> {
        let (products, quantities) = split_lines(lines);

        sqlx::query("DELETE FROM shop.cart_item WHERE user_id = $1 AND product_id <> ALL($2)")
            .bind(user)
            .bind(&products)
            .execute(&mut *self.tx)
            .await?;

        if lines.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r"
            INSERT INTO shop.cart_item (user_id, product_id, quantity)
            SELECT $1, t.product_id, t.quantity
            FROM UNNEST($2::int4[], $3::int4[]) WITH ORDINALITY AS t(product_id, quantity, ord)
            ORDER BY t.ord
            ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity
            ",
        )
        .bind(user)
        .bind(&products)
        .bind(&quantities)
        .execute(&mut *self.tx)
        .await
        .map_err(not_found_on_foreign_key)?;

        Ok(())
    }

    async fn merge_cart(
        &mut self,
        user: UserId,
        lines: &[CartLineInput],
    ) -> Result<(), RepositoryError> {
        if lines.is_empty() {
            return Ok(());
        }
        let (products, quantities) = split_lines(lines);

        sqlx::query(
            r"
            INSERT INTO shop.cart_item AS c (user_id, product_id, quantity)
            SELECT $1, t.product_id, t.quantity
            FROM UNNEST($2::int4[], $3::int4[]) WITH ORDINALITY AS t(product_id, quantity, ord)
            ORDER BY t.ord
            ON CONFLICT (user_id, product_id) DO UPDATE
            SET quantity = LEAST(c.quantity::bigint + EXCLUDED.quantity, 2147483647)::int
            ",
        )
        .bind(user)
        .bind(&products)
        .bind(&quantities)
        .execute(&mut *self.tx)
        .await
        .map_err(not_found_on_foreign_key)?;

        Ok(())
    }

    async fn clear_cart(&mut self, user: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.cart_item WHERE user_id = $1")
            .bind(user)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }
}

impl OrderBook for PgTx {
    async fn insert_order(&mut self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query(
            r"
            INSERT INTO shop.order (user_id, total)
            VALUES ($1, $2)
            RETURNING id, created_at
            ",
        )
        .bind(order.user_id)
        .bind(order.total.as_decimal())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(not_found_on_foreign_key)?;

        let order_id: OrderId = row.try_get("id")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        let mut lines = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            let row = sqlx::query(
                r"
                INSERT INTO shop.order_item (order_id, product_id, quantity)
                VALUES ($1, $2, $3)
                RETURNING id
                ",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity.get())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(not_found_on_foreign_key)?;

            lines.push(OrderLine {
                id: row.try_get("id")?,
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
            });
        }

        Ok(Order {
            id: order_id,
            user_id: order.user_id,
            total: order.total,
            created_at,
            lines,
        })
    }

    async fn orders_for_user(&mut self, user: UserId) -> Result<Vec<OrderView>, RepositoryError> {
        let order_rows = sqlx::query(
            r"
            SELECT id, user_id, total, created_at
            FROM shop.order
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user)
        .fetch_all(&mut *self.tx)
        .await?;

        let mut orders = order_rows
            .iter()
            .map(|row| {
                let total: Decimal = row.try_get("total")?;
                Ok(OrderView {
                    id: row.try_get("id")?,
                    user_id: row.try_get("user_id")?,
                    total: Amount::new(total).map_err(|e| {
                        RepositoryError::DataCorruption(format!("invalid order total: {e}"))
                    })?,
                    created_at: row.try_get("created_at")?,
                    items: Vec::new(),
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        if orders.is_empty() {
            return Ok(orders);
        }

        let ids: Vec<i32> = orders.iter().map(|o| o.id.as_i32()).collect();
        let item_rows = sqlx::query(&format!(
            r"
            SELECT oi.id AS line_id, oi.order_id, oi.quantity, {PRODUCT_COLUMNS}
            FROM shop.order_item oi
            JOIN shop.product p ON p.id = oi.product_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.id
            "
        ))
        .bind(&ids)
        .fetch_all(&mut *self.tx)
        .await?;

        let index: HashMap<OrderId, usize> =
            orders.iter().enumerate().map(|(i, o)| (o.id, i)).collect();

        for row in &item_rows {
            let order_id: OrderId = row.try_get("order_id")?;
            let product = product_from_row(row)?;
            let item = OrderItemView {
                id: row.try_get::<OrderLineId, _>("line_id")?,
                product_id: product.id,
                quantity: quantity_from_row(row, "quantity")?,
                product,
            };
            if let Some(order) = index.get(&order_id).and_then(|&i| orders.get_mut(i)) {
                order.items.push(item);
            }
        }

        Ok(orders)
    }
}

impl UserDirectory for PgTx {
    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM shop.user WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn create_user(&mut self, user: &NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query(&format!(
            r"
            INSERT INTO shop.user (email, name, role)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        user_from_row(&row)
    }

    async fn hold_user(&mut self, id: UserId) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT 1 AS held FROM shop.user WHERE id = $1 FOR KEY SHARE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.is_some())
    }

    async fn save_profile(
        &mut self,
        id: UserId,
        shipping: &ShippingInfo,
        payment: &PaymentInfo,
    ) -> Result<(), RepositoryError> {
        // Savepoint: a failed profile write must not abort the order.
        let mut savepoint = (&mut *self.tx).begin().await?;

        let result = sqlx::query(
            r"
            UPDATE shop.user SET
                shipping_address  = COALESCE($2, shipping_address),
                shipping_address2 = COALESCE($3, shipping_address2),
                shipping_country  = COALESCE($4, shipping_country),
                shipping_state    = COALESCE($5, shipping_state),
                shipping_zip      = COALESCE($6, shipping_zip),
                card_name         = COALESCE($7, card_name),
                card_number       = COALESCE($8, card_number),
                card_expiry       = COALESCE($9, card_expiry)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(shipping.shipping_address.as_deref())
        .bind(shipping.shipping_address2.as_deref())
        .bind(shipping.shipping_country.as_deref())
        .bind(shipping.shipping_state.as_deref())
        .bind(shipping.shipping_zip.as_deref())
        .bind(payment.card_name.as_deref())
        .bind(payment.card_number.as_deref())
        .bind(payment.card_expiry.as_deref())
        .execute(&mut *savepoint)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        savepoint.commit().await?;
        Ok(())
    }
}

impl Catalog for PgTx {
    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn insert_product(&mut self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query(&format!(
            r"
            INSERT INTO shop.product AS p
                (title, price, description, category, image, rating_rate, rating_count, stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.title)
        .bind(product.price)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.image.as_deref())
        .bind(product.rating.rate)
        .bind(product.rating.count)
        .bind(product.stock)
        .fetch_one(&mut *self.tx)
        .await?;

        product_from_row(&row)
    }
}

fn split_lines(lines: &[CartLineInput]) -> (Vec<i32>, Vec<i32>) {
    lines
        .iter()
        .map(|l| (l.product_id.as_i32(), l.quantity.get()))
        .unzip()
}

fn product_from_row(row: &PgRow) -> Result<Product, RepositoryError> {
    Ok(Product {
        id: row.try_get::<ProductId, _>("id")?,
        title: row.try_get("title")?,
        price: row.try_get("price")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        image: row.try_get("image")?,
        rating: Rating {
            rate: row.try_get("rating_rate")?,
            count: row.try_get("rating_count")?,
        },
        stock: row.try_get("stock")?,
        created_at: row.try_get("created_at")?,
    })
}

fn quantity_from_row(row: &PgRow, column: &str) -> Result<Quantity, RepositoryError> {
    let raw: i32 = row.try_get(column)?;
    Quantity::new(i64::from(raw))
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid quantity in database: {e}")))
}

fn user_from_row(row: &PgRow) -> Result<User, RepositoryError> {
    let email: String = row.try_get("email")?;
    let email = Email::parse(&email)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))?;
    let role: String = row.try_get("role")?;
    let role = role
        .parse::<Role>()
        .map_err(RepositoryError::DataCorruption)?;

    Ok(User {
        id: row.try_get("id")?,
        email,
        name: row.try_get("name")?,
        role,
        created_at: row.try_get("created_at")?,
        shipping: ShippingInfo {
            shipping_address: row.try_get("shipping_address")?,
            shipping_address2: row.try_get("shipping_address2")?,
            shipping_country: row.try_get("shipping_country")?,
            shipping_state: row.try_get("shipping_state")?,
            shipping_zip: row.try_get("shipping_zip")?,
        },
        payment: PaymentInfo {
            card_name: row.try_get("card_name")?,
            card_number: row.try_get("card_number")?,
            card_expiry: row.try_get("card_expiry")?,
        },
    })
}
