//! In-memory store for tests and local development.
//!
//! `begin` takes an owned lock on the whole state and works on a copy;
//! `commit` writes the copy back and dropping the transaction discards it.
//! Transactions are therefore fully serialized, which is stricter than the
//! per-row locking `PostgreSQL` gives but observably equivalent for the
//! ledger's guarantees.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use cartwright_core::{
    CartLineInput, OrderId, OrderLineId, PaymentInfo, ProductId, Quantity, ShippingInfo, UserId,
};

use super::{
    CartStore, Catalog, OrderBook, RepositoryError, StockCheck, StockLedger, Store, Transaction,
    UserDirectory,
};
use crate::models::{
    CartItemView, NewOrder, NewProduct, NewUser, Order, OrderItemView, OrderLine, OrderView,
    Product, User,
};

/// Operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    ProfileWrite,
    OrderInsert,
    CartClear,
}

#[derive(Debug, Clone, Copy)]
struct CartRow {
    seq: u64,
    user: UserId,
    product: ProductId,
    quantity: Quantity,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    products: BTreeMap<ProductId, Product>,
    users: BTreeMap<UserId, User>,
    cart: Vec<CartRow>,
    orders: Vec<Order>,
    faults: HashSet<Fault>,
    next_product: i32,
    next_user: i32,
    next_order: i32,
    next_line: i32,
    next_cart_seq: u64,
}

impl MemoryState {
    fn fail_if(&self, fault: Fault) -> Result<(), RepositoryError> {
        if self.faults.contains(&fault) {
            return Err(RepositoryError::Injected(fault));
        }
        Ok(())
    }

    fn require_lines_known(
        &self,
        user: UserId,
        lines: &[CartLineInput],
    ) -> Result<(), RepositoryError> {
        let products_known = lines
            .iter()
            .all(|l| self.products.contains_key(&l.product_id));
        if !products_known || !self.users.contains_key(&user) {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn cart_row_mut(&mut self, user: UserId, product: ProductId) -> Option<&mut CartRow> {
        self.cart
            .iter_mut()
            .find(|r| r.user == user && r.product == product)
    }

    fn push_cart_row(&mut self, user: UserId, line: CartLineInput) {
        self.next_cart_seq += 1;
        self.cart.push(CartRow {
            seq: self.next_cart_seq,
            user,
            product: line.product_id,
            quantity: line.quantity,
        });
    }

    fn insert_product(&mut self, product: &NewProduct) -> Product {
        self.next_product += 1;
        let product = Product {
            id: ProductId::new(self.next_product),
            title: product.title.clone(),
            price: product.price,
            description: product.description.clone(),
            category: product.category.clone(),
            image: product.image.clone(),
            rating: product.rating,
            stock: product.stock,
            created_at: Utc::now(),
        };
        self.products.insert(product.id, product.clone());
        product
    }

    fn insert_user(&mut self, user: &NewUser) -> Result<User, RepositoryError> {
        if self.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        self.next_user += 1;
        let user = User {
            id: UserId::new(self.next_user),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            created_at: Utc::now(),
            shipping: ShippingInfo::default(),
            payment: PaymentInfo::default(),
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }
}

/// Store that keeps everything in process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

/// An open in-memory transaction.
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    work: MemoryState,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a product directly (fixtures).
    pub async fn add_product(&self, product: NewProduct) -> Product {
        self.state.lock().await.insert_product(&product)
    }

    /// Insert a user directly (fixtures).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    pub async fn add_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        self.state.lock().await.insert_user(&user)
    }

    /// Delete a user and their cart, as an account deletion would.
    pub async fn remove_user(&self, id: UserId) -> bool {
        let mut state = self.state.lock().await;
        state.cart.retain(|r| r.user != id);
        state.users.remove(&id).is_some()
    }

    /// Current committed stock for a product.
    pub async fn stock(&self, id: ProductId) -> Option<i32> {
        self.state.lock().await.products.get(&id).map(|p| p.stock)
    }

    /// Number of committed orders across all users.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    /// Committed user record.
    pub async fn user(&self, id: UserId) -> Option<User> {
        self.state.lock().await.users.get(&id).cloned()
    }

    /// Committed cart of a user as `(product, qty)` pairs in cart order.
    pub async fn cart(&self, user: UserId) -> Vec<(ProductId, i32)> {
        self.state
            .lock()
            .await
            .cart
            .iter()
            .filter(|r| r.user == user)
            .map(|r| (r.product, r.quantity.get()))
            .collect()
    }

    /// Make an operation fail for the rest of this store's life.
    pub async fn inject(&self, fault: Fault) {
        self.state.lock().await.faults.insert(fault);
    }
}

impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, RepositoryError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let work = guard.clone();
        Ok(MemoryTx { guard, work })
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

impl Transaction for MemoryTx {
    async fn commit(self) -> Result<(), RepositoryError> {
        let Self { mut guard, work } = self;
        *guard = work;
        Ok(())
    }
}

impl StockLedger for MemoryTx {
    async fn check_available(
        &mut self,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<StockCheck, RepositoryError> {
        Ok(match self.work.products.get(&product) {
            None => StockCheck::NotFound,
            Some(p) if p.stock < quantity.get() => StockCheck::Insufficient {
                title: p.title.clone(),
                available: p.stock,
            },
            Some(_) => StockCheck::Ok,
        })
    }

    async fn decrement(
        &mut self,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<StockCheck, RepositoryError> {
        Ok(match self.work.products.get_mut(&product) {
            None => StockCheck::NotFound,
            Some(p) if p.stock < quantity.get() => StockCheck::Insufficient {
                title: p.title.clone(),
                available: p.stock,
            },
            Some(p) => {
                p.stock -= quantity.get();
                StockCheck::Ok
            }
        })
    }

    async fn increment(
        &mut self,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<i32, RepositoryError> {
        let p = self
            .work
            .products
            .get_mut(&product)
            .ok_or(RepositoryError::NotFound)?;
        p.stock = p.stock.saturating_add(quantity.get());
        Ok(p.stock)
    }

    async fn set_level(&mut self, product: ProductId, level: u32) -> Result<i32, RepositoryError> {
        let level = i32::try_from(level)
            .map_err(|_| RepositoryError::Conflict(format!("stock level {level} out of range")))?;
        let p = self
            .work
            .products
            .get_mut(&product)
            .ok_or(RepositoryError::NotFound)?;
        p.stock = level;
        Ok(p.stock)
    }
}

impl CartStore for MemoryTx {
    async fn cart_lines(&mut self, user: UserId) -> Result<Vec<CartItemView>, RepositoryError> {
        let mut rows: Vec<&CartRow> = self.work.cart.iter().filter(|r| r.user == user).collect();
        rows.sort_by_key(|r| r.seq);

        Ok(rows
            .into_iter()
            .filter_map(|r| {
                self.work.products.get(&r.product).map(|p| CartItemView {
                    product: p.clone(),
                    qty: r.quantity,
                })
            })
            .collect())
    }

    async fn replace_cart(
        &mut self,
        user: UserId,
        lines: &[CartLineInput],
    ) -> Result<(), RepositoryError> {
        if !lines.is_empty() {
            self.work.require_lines_known(user, lines)?;
        }

        self.work
            .cart
            .retain(|r| r.user != user || lines.iter().any(|l| l.product_id == r.product));

        for line in lines {
            match self.work.cart_row_mut(user, line.product_id) {
                Some(row) => row.quantity = line.quantity,
                None => self.work.push_cart_row(user, *line),
            }
        }
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
        self.work.require_lines_known(user, lines)?;

        for line in lines {
            match self.work.cart_row_mut(user, line.product_id) {
                Some(row) => row.quantity = row.quantity.saturating_add(line.quantity),
                None => self.work.push_cart_row(user, *line),
            }
        }
        Ok(())
    }

    async fn clear_cart(&mut self, user: UserId) -> Result<u64, RepositoryError> {
        self.work.fail_if(Fault::CartClear)?;
        let before = self.work.cart.len();
        self.work.cart.retain(|r| r.user != user);
        Ok((before - self.work.cart.len()) as u64)
    }
}

impl OrderBook for MemoryTx {
    async fn insert_order(&mut self, order: &NewOrder) -> Result<Order, RepositoryError> {
        self.work.fail_if(Fault::OrderInsert)?;
        self.work.require_lines_known(order.user_id, &order.lines)?;

        self.work.next_order += 1;
        let order_id = OrderId::new(self.work.next_order);
        let lines = order
            .lines
            .iter()
            .map(|line| {
                self.work.next_line += 1;
                OrderLine {
                    id: OrderLineId::new(self.work.next_line),
                    order_id,
                    product_id: line.product_id,
                    quantity: line.quantity,
                }
            })
            .collect();

        let created = Order {
            id: order_id,
            user_id: order.user_id,
            total: order.total,
            created_at: Utc::now(),
            lines,
        };
        self.work.orders.push(created.clone());
        Ok(created)
    }

    async fn orders_for_user(&mut self, user: UserId) -> Result<Vec<OrderView>, RepositoryError> {
        let mut orders: Vec<&Order> = self
            .work
            .orders
            .iter()
            .filter(|o| o.user_id == user)
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(orders
            .into_iter()
            .map(|o| OrderView {
                id: o.id,
                user_id: o.user_id,
                total: o.total,
                created_at: o.created_at,
                items: o
                    .lines
                    .iter()
                    .filter_map(|l| {
                        self.work.products.get(&l.product_id).map(|p| OrderItemView {
                            id: l.id,
                            product_id: l.product_id,
                            quantity: l.quantity,
                            product: p.clone(),
                        })
                    })
                    .collect(),
            })
            .collect())
    }
}

impl UserDirectory for MemoryTx {
    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.work.users.get(&id).cloned())
    }

    async fn create_user(&mut self, user: &NewUser) -> Result<User, RepositoryError> {
        self.work.insert_user(user)
    }

    async fn hold_user(&mut self, id: UserId) -> Result<bool, RepositoryError> {
        Ok(self.work.users.contains_key(&id))
    }

    async fn save_profile(
        &mut self,
        id: UserId,
        shipping: &ShippingInfo,
        payment: &PaymentInfo,
    ) -> Result<(), RepositoryError> {
        self.work.fail_if(Fault::ProfileWrite)?;
        let user = self
            .work
            .users
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;

        overwrite(&mut user.shipping.shipping_address, shipping.shipping_address.as_deref());
        overwrite(&mut user.shipping.shipping_address2, shipping.shipping_address2.as_deref());
        overwrite(&mut user.shipping.shipping_country, shipping.shipping_country.as_deref());
        overwrite(&mut user.shipping.shipping_state, shipping.shipping_state.as_deref());
        overwrite(&mut user.shipping.shipping_zip, shipping.shipping_zip.as_deref());
        overwrite(&mut user.payment.card_name, payment.card_name.as_deref());
        overwrite(&mut user.payment.card_number, payment.card_number.as_deref());
        overwrite(&mut user.payment.card_expiry, payment.card_expiry.as_deref());
        Ok(())
    }
}

impl Catalog for MemoryTx {
    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.work.products.get(&id).cloned())
    }

    async fn insert_product(&mut self, product: &NewProduct) -> Result<Product, RepositoryError> {
        Ok(self.work.insert_product(product))
    }
}

fn overwrite(dst: &mut Option<String>, src: Option<&str>) {
    if let Some(value) = src {
        *dst = Some(value.to_owned());
    }
}
