//! Catalog access used by the core (lookup and seeding).

use std::future::Future;

use cartwright_core::ProductId;

use super::RepositoryError;
use crate::models::{NewProduct, Product};

pub trait Catalog {
    fn find_product(
        &mut self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    fn insert_product(
        &mut self,
        product: &NewProduct,
    ) -> impl Future<Output = Result<Product, RepositoryError>> + Send;
}
