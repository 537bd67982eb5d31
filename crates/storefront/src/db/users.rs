//! User directory: account lookup and default profile fields.

use std::future::Future;

use cartwright_core::{PaymentInfo, ShippingInfo, UserId};

use super::RepositoryError;
use crate::models::{NewUser, User};

pub trait UserDirectory {
    /// Get a user by id.
    fn find_user(
        &mut self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Create a user.
    ///
    /// Fails with `RepositoryError::Conflict` if the email is taken.
    fn create_user(
        &mut self,
        user: &NewUser,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// Check that the user exists and keep it from being deleted until the
    /// transaction ends. Returns `false` for an unknown user.
    fn hold_user(
        &mut self,
        id: UserId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Overwrite the default profile fields that are `Some` in the inputs.
    ///
    /// A failure here leaves the rest of the transaction usable.
    fn save_profile(
        &mut self,
        id: UserId,
        shipping: &ShippingInfo,
        payment: &PaymentInfo,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}
