//! Order transaction engine.
//!
//! Turns a validated cart into an order in one all-or-nothing unit:
//!
//! 1. consult the payment gate (no storage touched on denial)
//! 2. re-check the user inside the transaction
//! 3. check every line against live stock
//! 4. insert the order and its lines
//! 5. decrement stock with the conditional ledger write, in product id order
//! 6. clear the user's stored cart
//! 7. optionally save the shipping/payment profile (best-effort)
//!
//! Any failure in steps 2-6 drops the transaction, so stock, orders and the
//! cart are exactly as they were before the call.

mod error;

pub use error::CheckoutError;

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use cartwright_core::cart::as_integer;
use cartwright_core::{
    Amount, CartLineInput, CheckoutStage, PaymentInfo, RawCartLine, ShippingInfo, UserId,
};

use crate::db::{
    CartStore, OrderBook, StockCheck, StockLedger, Store, Transaction, UserDirectory,
};
use crate::models::{NewOrder, PlacedOrder};
use crate::services::payment::{PaymentDecision, PaymentGate};

/// A checkout request as posted by a client, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSubmission {
    #[serde(default)]
    pub user_id: Value,
    #[serde(default)]
    pub cart_items: Value,
    #[serde(default)]
    pub total_amount: Value,
    #[serde(default)]
    pub shipping: Value,
    #[serde(default)]
    pub payment: Value,
    #[serde(default)]
    pub save_to_profile: bool,
}

/// A validated checkout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrder {
    pub user_id: UserId,
    /// One entry per submitted item, in submission order.
    pub lines: Vec<CartLineInput>,
    pub total: Amount,
    pub shipping: ShippingInfo,
    pub payment: PaymentInfo,
    pub save_to_profile: bool,
}

impl CheckoutSubmission {
    /// Check every field without touching storage.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation` naming the first bad field.
    pub fn validate(self) -> Result<PlaceOrder, CheckoutError> {
        let user_id = as_integer(&self.user_id)
            .and_then(UserId::from_positive)
            .ok_or(CheckoutError::MISSING_USER)?;

        let items = match &self.cart_items {
            Value::Array(items) if !items.is_empty() => items,
            _ => return Err(CheckoutError::EMPTY_CART),
        };

        let total =
            Amount::from_declared(&self.total_amount).map_err(|_| CheckoutError::INVALID_TOTAL)?;

        let lines = items
            .iter()
            .map(|item| RawCartLine::from_value(item).validate())
            .collect::<Option<Vec<_>>>()
            .ok_or(CheckoutError::INVALID_ITEM)?;

        Ok(PlaceOrder {
            user_id,
            lines,
            total,
            shipping: profile_part(self.shipping)?,
            payment: profile_part(self.payment)?,
            save_to_profile: self.save_to_profile,
        })
    }
}

fn profile_part<T: Default + serde::de::DeserializeOwned>(
    value: Value,
) -> Result<T, CheckoutError> {
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value).map_err(|_| CheckoutError::INVALID_PROFILE)
}

/// Places orders against a store, consulting a payment gate.
pub struct CheckoutService<S> {
    store: S,
    gate: Arc<dyn PaymentGate>,
}

impl<S: Clone> Clone for CheckoutService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<S: Store> CheckoutService<S> {
    #[must_use]
    pub fn new(store: S, gate: Arc<dyn PaymentGate>) -> Self {
        Self { store, gate }
    }

    /// Place an order.
    ///
    /// # Errors
    ///
    /// - `PaymentDenied` if the gate declines (nothing is read or written)
    /// - `NotFound` for an unknown user or product
    /// - `OutOfStock` naming the first line that cannot be filled
    /// - `Repository` / `Internal` for infrastructure faults
    ///
    /// On every error the store is left unchanged.
    #[instrument(
        skip_all,
        fields(user_id = %order.user_id, lines = order.lines.len(), order_id = tracing::field::Empty)
    )]
    pub async fn place_order(&self, order: PlaceOrder) -> Result<PlacedOrder, CheckoutError> {
        let mut stage = CheckoutStage::default();

        match self.run(&order, &mut stage).await {
            Ok(placed) => {
                tracing::Span::current().record("order_id", placed.order_id.as_i32());
                tracing::info!(total = %placed.total, ?stage, "Order placed");
                Ok(placed)
            }
            Err(err) => {
                let stage = stage.reject(err.reason()).unwrap_or(stage);
                match &err {
                    CheckoutError::Repository(_) | CheckoutError::Internal(_) => {
                        tracing::error!(error = %err, ?stage, "Checkout failed");
                    }
                    _ => tracing::info!(error = %err, ?stage, "Checkout rejected"),
                }
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        order: &PlaceOrder,
        stage: &mut CheckoutStage,
    ) -> Result<PlacedOrder, CheckoutError> {
        if self.gate.authorize() == PaymentDecision::Denied {
            return Err(CheckoutError::PaymentDenied);
        }
        advance(stage)?;

        let mut tx = self.store.begin().await?;

        if !tx.hold_user(order.user_id).await? {
            return Err(CheckoutError::UNKNOWN_USER);
        }

        for line in &order.lines {
            stock_outcome(tx.check_available(line.product_id, line.quantity).await?)?;
        }
        advance(stage)?;

        let created = tx
            .insert_order(&NewOrder {
                user_id: order.user_id,
                total: order.total,
                lines: order.lines.clone(),
            })
            .await?;

        // Row locks are taken in product id order so concurrent checkouts
        // over the same products cannot deadlock.
        for line in decrement_order(&order.lines) {
            stock_outcome(tx.decrement(line.product_id, line.quantity).await?)?;
        }

        let cleared = tx.clear_cart(order.user_id).await?;
        tracing::debug!(cleared, "Cart cleared");

        if order.save_to_profile
            && let Err(e) = tx
                .save_profile(order.user_id, &order.shipping, &order.payment)
                .await
        {
            tracing::warn!(error = %e, "Failed to save checkout profile");
        }

        tx.commit().await?;
        advance(stage)?;

        Ok(PlacedOrder::from(&created))
    }
}

fn advance(stage: &mut CheckoutStage) -> Result<(), CheckoutError> {
    *stage = stage
        .advance()
        .map_err(|e| CheckoutError::Internal(e.to_string()))?;
    Ok(())
}

fn decrement_order(lines: &[CartLineInput]) -> Vec<&CartLineInput> {
    let mut sorted: Vec<&CartLineInput> = lines.iter().collect();
    sorted.sort_by_key(|line| line.product_id);
    sorted
}

fn stock_outcome(check: StockCheck) -> Result<(), CheckoutError> {
    match check {
        StockCheck::Ok => Ok(()),
        StockCheck::Insufficient { title, .. } => Err(CheckoutError::OutOfStock { title }),
        StockCheck::NotFound => Err(CheckoutError::UNKNOWN_PRODUCT),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cartwright_core::{CheckoutStage, Email, ProductId, Quantity, RejectReason};
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::db::{Fault, MemoryStore};
    use crate::models::{NewProduct, NewUser, Role};
    use crate::services::payment::{AlwaysApprove, FixedDecision};

    struct Fixture {
        store: MemoryStore,
        user: UserId,
        p1: ProductId,
        p2: ProductId,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let user = store
            .add_user(NewUser {
                email: Email::parse("ada@example.com").unwrap(),
                name: "Ada".to_owned(),
                role: Role::Customer,
            })
            .await
            .unwrap();
        let p1 = store
            .add_product(NewProduct::basic("P1", Decimal::new(1000, 2), 1))
            .await;
        let p2 = store
            .add_product(NewProduct::basic("P2", Decimal::new(250, 2), 10))
            .await;
        Fixture {
            store,
            user: user.id,
            p1: p1.id,
            p2: p2.id,
        }
    }

    fn order(user: UserId, lines: &[(ProductId, i64)]) -> PlaceOrder {
        PlaceOrder {
            user_id: user,
            lines: lines
                .iter()
                .map(|&(p, q)| CartLineInput::new(p, Quantity::new(q).unwrap()))
                .collect(),
            total: Amount::new(Decimal::new(1500, 2)).unwrap(),
            shipping: ShippingInfo::default(),
            payment: PaymentInfo::default(),
            save_to_profile: false,
        }
    }

    fn approving(store: &MemoryStore) -> CheckoutService<MemoryStore> {
        CheckoutService::new(store.clone(), Arc::new(AlwaysApprove))
    }

    async fn seed_cart(f: &Fixture) {
        let mut tx = f.store.begin().await.unwrap();
        tx.replace_cart(
            f.user,
            &[CartLineInput::new(f.p2, Quantity::new(2).unwrap())],
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
    }

    #[test]
    fn test_validate_messages() {
        let err = CheckoutSubmission::default().validate().unwrap_err();
        assert_eq!(err.to_string(), "userId is required (login/register first)");

        let err = CheckoutSubmission {
            user_id: json!(1),
            cart_items: json!([]),
            ..CheckoutSubmission::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "Cart is empty");

        let err = CheckoutSubmission {
            user_id: json!("1"),
            cart_items: json!([{"id": 1, "qty": 1}]),
            total_amount: json!("abc"),
            ..CheckoutSubmission::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid totalAmount");

        let err = CheckoutSubmission {
            user_id: json!(1),
            cart_items: json!([{"id": 1, "qty": 1}]),
            total_amount: json!(1e12),
            ..CheckoutSubmission::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid totalAmount");

        let err = CheckoutSubmission {
            user_id: json!(1),
            cart_items: json!([{"id": 1, "qty": 1}, {"id": 2, "qty": 0}]),
            total_amount: json!(10),
            ..CheckoutSubmission::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid cart item");
    }

    #[test]
    fn test_validate_keeps_duplicate_lines() {
        let order = CheckoutSubmission {
            user_id: json!(3),
            cart_items: json!([{"id": 1, "qty": 1}, {"id": 1, "qty": 2}]),
            total_amount: json!(12.5),
            shipping: json!({"shippingZip": "12345"}),
            save_to_profile: true,
            ..CheckoutSubmission::default()
        }
        .validate()
        .unwrap();

        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.total.to_string(), "12.50");
        assert_eq!(order.shipping.shipping_zip.as_deref(), Some("12345"));
        assert!(order.payment.is_empty());
    }

    #[tokio::test]
    async fn test_successful_checkout_commits_everything() {
        let f = fixture().await;
        seed_cart(&f).await;

        let placed = approving(&f.store)
            .place_order(order(f.user, &[(f.p1, 1), (f.p2, 3)]))
            .await
            .unwrap();

        assert_eq!(placed.total.to_string(), "15.00");
        assert_eq!(f.store.stock(f.p1).await, Some(0));
        assert_eq!(f.store.stock(f.p2).await, Some(7));
        assert_eq!(f.store.order_count().await, 1);
        assert!(f.store.cart(f.user).await.is_empty());
    }

    #[tokio::test]
    async fn test_out_of_stock_rolls_back_whole_order() {
        let f = fixture().await;
        seed_cart(&f).await;

        let err = approving(&f.store)
            .place_order(order(f.user, &[(f.p2, 1), (f.p1, 2)]))
            .await
            .unwrap_err();

        assert!(matches!(&err, CheckoutError::OutOfStock { title } if title == "P1"));
        assert_eq!(f.store.stock(f.p1).await, Some(1));
        assert_eq!(f.store.stock(f.p2).await, Some(10));
        assert_eq!(f.store.order_count().await, 0);
        assert_eq!(f.store.cart(f.user).await, vec![(f.p2, 2)]);
    }

    #[tokio::test]
    async fn test_duplicate_lines_cannot_overdraw() {
        let f = fixture().await;

        let err = approving(&f.store)
            .place_order(order(f.user, &[(f.p1, 1), (f.p1, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::OutOfStock { .. }));
        assert_eq!(f.store.stock(f.p1).await, Some(1));
        assert_eq!(f.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_payment_denial_has_no_effect() {
        let f = fixture().await;
        seed_cart(&f).await;
        let service = CheckoutService::new(
            f.store.clone(),
            Arc::new(FixedDecision(PaymentDecision::Denied)),
        );

        let err = service
            .place_order(order(f.user, &[(f.p2, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::PaymentDenied));
        assert_eq!(err.reason(), RejectReason::PaymentDenied);
        assert_eq!(f.store.stock(f.p2).await, Some(10));
        assert_eq!(f.store.cart(f.user).await, vec![(f.p2, 2)]);
    }

    #[tokio::test]
    async fn test_deleted_user_is_rejected() {
        let f = fixture().await;
        f.store.remove_user(f.user).await;

        let err = approving(&f.store)
            .place_order(order(f.user, &[(f.p2, 1)]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "User not found. Please login again.");
        assert_eq!(f.store.stock(f.p2).await, Some(10));
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let f = fixture().await;

        let err = approving(&f.store)
            .place_order(order(f.user, &[(f.p2, 1), (ProductId::new(99), 1)]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Product not found");
        assert_eq!(f.store.stock(f.p2).await, Some(10));
    }

    #[tokio::test]
    async fn test_storage_fault_after_writes_rolls_back() {
        let f = fixture().await;
        seed_cart(&f).await;
        f.store.inject(Fault::CartClear).await;

        let err = approving(&f.store)
            .place_order(order(f.user, &[(f.p2, 4)]))
            .await
            .unwrap_err();

        assert_eq!(err.reason(), RejectReason::Internal);
        assert_eq!(f.store.stock(f.p2).await, Some(10));
        assert_eq!(f.store.order_count().await, 0);
        assert_eq!(f.store.cart(f.user).await, vec![(f.p2, 2)]);
    }

    #[tokio::test]
    async fn test_order_insert_fault_rolls_back() {
        let f = fixture().await;
        seed_cart(&f).await;
        f.store.inject(Fault::OrderInsert).await;

        let err = approving(&f.store)
            .place_order(order(f.user, &[(f.p1, 1), (f.p2, 2)]))
            .await
            .unwrap_err();

        assert_eq!(err.reason(), RejectReason::Internal);
        assert_eq!(f.store.stock(f.p1).await, Some(1));
        assert_eq!(f.store.stock(f.p2).await, Some(10));
        assert_eq!(f.store.order_count().await, 0);
        assert_eq!(f.store.cart(f.user).await, vec![(f.p2, 2)]);
    }

    #[test]
    fn test_decrements_run_in_product_id_order() {
        let line = |id, qty| CartLineInput::new(ProductId::new(id), Quantity::new(qty).unwrap());
        let lines = [line(7, 1), line(2, 3), line(7, 2), line(5, 1)];

        let order: Vec<(i32, i32)> = decrement_order(&lines)
            .iter()
            .map(|l| (l.product_id.as_i32(), l.quantity.get()))
            .collect();

        assert_eq!(order, vec![(2, 3), (5, 1), (7, 1), (7, 2)]);
    }

    #[tokio::test]
    async fn test_profile_failure_does_not_block_order() {
        let f = fixture().await;
        f.store.inject(Fault::ProfileWrite).await;

        let mut request = order(f.user, &[(f.p2, 1)]);
        request.save_to_profile = true;
        request.shipping.shipping_zip = Some("99999".to_owned());

        approving(&f.store).place_order(request).await.unwrap();

        assert_eq!(f.store.order_count().await, 1);
        let user = f.store.user(f.user).await.unwrap();
        assert!(user.shipping.shipping_zip.is_none());
    }

    #[tokio::test]
    async fn test_profile_saved_when_requested() {
        let f = fixture().await;

        let mut request = order(f.user, &[(f.p2, 1)]);
        request.save_to_profile = true;
        request.payment.card_name = Some("A Lovelace".to_owned());

        approving(&f.store).place_order(request).await.unwrap();

        let user = f.store.user(f.user).await.unwrap();
        assert_eq!(user.payment.card_name.as_deref(), Some("A Lovelace"));
    }

    #[tokio::test]
    async fn test_concurrent_last_unit() {
        let f = fixture().await;
        let service = approving(&f.store);

        let (a, b) = tokio::join!(
            service.place_order(order(f.user, &[(f.p1, 1)])),
            service.place_order(order(f.user, &[(f.p1, 1)])),
        );

        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes.iter().any(
            |r| matches!(r, Err(CheckoutError::OutOfStock { title }) if title == "P1")
        ));
        assert_eq!(f.store.stock(f.p1).await, Some(0));
        assert_eq!(f.store.order_count().await, 1);
    }

    #[test]
    fn test_stage_is_rejected_from_open_stage() {
        let stage = CheckoutStage::PaymentChecked;
        assert_eq!(
            stage.reject(CheckoutError::EMPTY_CART.reason()).unwrap(),
            CheckoutStage::Rejected(RejectReason::Validation)
        );
    }
}
