//! Seed the catalog (and optionally customer accounts) from a YAML file.
//!
//! ```yaml
//! products:
//!   - title: Fjallraven Backpack
//!     price: "109.95"
//!     category: men's clothing
//!     description: Fits 15 inch laptops
//!     image: https://example.com/backpack.jpg
//!     rating: { rate: 3.9, count: 120 }
//!     stock: 25
//! users:
//!   - email: jane@example.com
//!     name: Jane Doe
//! ```
//!
//! Products are inserted in one transaction. Each user gets its own, so an
//! email that already exists is skipped without undoing the rest.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use cartwright_storefront::db::{Catalog, PgStore, RepositoryError, Store, Transaction, UserDirectory};
use cartwright_storefront::models::{NewProduct, NewUser};

use super::{CommandError, connect};

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub products: Vec<NewProduct>,
    #[serde(default)]
    pub users: Vec<NewUser>,
}

/// Parse and validate a seed file.
///
/// # Errors
///
/// Returns `CommandError::Invalid` for malformed YAML or a product with an
/// empty title, a negative price or negative stock.
pub fn parse(content: &str) -> Result<SeedFile, CommandError> {
    let seed: SeedFile =
        serde_yaml::from_str(content).map_err(|e| CommandError::Invalid(e.to_string()))?;

    let errors: Vec<String> = seed
        .products
        .iter()
        .enumerate()
        .filter_map(|(i, p)| {
            if p.title.trim().is_empty() {
                Some(format!("products[{i}]: title is empty"))
            } else if p.price.is_sign_negative() {
                Some(format!("products[{i}] ({}): price is negative", p.title))
            } else if p.stock < 0 {
                Some(format!("products[{i}] ({}): stock is negative", p.title))
            } else {
                None
            }
        })
        .collect();

    if errors.is_empty() {
        Ok(seed)
    } else {
        Err(CommandError::Invalid(errors.join("; ")))
    }
}

/// Seed the database from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or validated, or a database
/// operation fails. No product is written unless every product insert succeeds.
pub async fn run(file_path: &str) -> Result<(), CommandError> {
    let path = Path::new(file_path);
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CommandError::Invalid(format!("{file_path}: {e}")))?;

    // Validate before connecting to database
    let seed = parse(&content)?;
    info!(
        path = %file_path,
        products = seed.products.len(),
        users = seed.users.len(),
        "Parsed seed file"
    );

    let store = PgStore::new(connect().await?);
    let mut tx = store.begin().await?;

    for product in &seed.products {
        let created = tx.insert_product(product).await?;
        info!(product_id = %created.id, title = %created.title, stock = created.stock, "Product created");
    }

    tx.commit().await?;

    let mut skipped = 0_usize;
    for user in &seed.users {
        let mut tx = store.begin().await?;
        match tx.create_user(user).await {
            Ok(created) => {
                tx.commit().await?;
                info!(user_id = %created.id, email = %created.email, "User created");
            }
            Err(RepositoryError::Conflict(_)) => {
                warn!(email = %user.email, "User already exists, skipping");
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(skipped, "Seeding complete");
    Ok(())
}
