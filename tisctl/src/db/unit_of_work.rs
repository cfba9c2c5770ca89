//! Units of work bound to the acting user.
//!
//! Mutating data access goes through [`run_in_transaction`]. Before the operation runs, the
//! caller's user id is written into the transaction-local setting `app.current_user_id` via
//! `set_config(..., true)`, so database triggers and row-level policies see who is acting.
//! PostgreSQL discards the setting when the transaction ends, so it never leaks to other
//! transactions sharing the pooled connection.
//!
//! ```ignore
//! let driver = run_in_transaction(&state.db, &context, |conn| {
//!     Box::pin(async move { Ok(Drivers::new(conn).create(&request).await?) })
//! })
//! .await?;
//! ```

use futures::future::BoxFuture;
use sqlx::{PgConnection, PgPool};
use tracing::{instrument, warn};

use crate::{
    auth::identity::RequestContext,
    errors::{Error, Result},
    types::UserId,
};

/// Name of the transaction-local setting carrying the acting user id.
pub const ACTING_USER_SETTING: &str = "app.current_user_id";

/// Run `operation` inside a transaction bound to the context's acting user.
///
/// - A context without an identity, or with user id 0, runs without a binding.
/// - If the operation fails the transaction is rolled back and the operation's error is
///   returned unchanged.
/// - If the commit fails the result is [`Error::CommitFailed`] and none of the operation's
///   writes may be assumed applied.
///
/// Dropping the returned future before it completes (client disconnect, request timeout)
/// drops the open transaction, which rolls it back.
#[instrument(skip_all, fields(acting_user = ?context.acting_user_id()), err)]
pub async fn run_in_transaction<T, F>(pool: &PgPool, context: &RequestContext, operation: F) -> Result<T>
where
    F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T>> + Send,
    T: Send,
{
    let mut tx = pool.begin().await.map_err(|e| Error::Database(e.into()))?;

    if let Some(user_id) = context.acting_user_id() {
        bind_acting_user(&mut *tx, user_id).await?;
    }

    match operation(&mut *tx).await {
        Ok(value) => {
            tx.commit().await.map_err(|source| Error::CommitFailed { source })?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Rollback after failed operation also failed: {rollback_err}");
            }
            Err(e)
        }
    }
}

/// Bind the acting user id for the remainder of the current transaction.
pub async fn bind_acting_user(conn: &mut PgConnection, user_id: UserId) -> Result<()> {
    sqlx::query("SELECT set_config($1, $2, true)")
        .bind(ACTING_USER_SETTING)
        .bind(user_id.to_string())
        .execute(conn)
        .await
        .map_err(|e| Error::Database(e.into()))?;
    Ok(())
}

/// Read the acting user id bound on this connection, if any.
pub async fn acting_user_id(conn: &mut PgConnection) -> Result<Option<UserId>> {
    sqlx::query_scalar::<_, Option<UserId>>("SELECT NULLIF(current_setting($1, true), '')::INTEGER")
        .bind(ACTING_USER_SETTING)
        .fetch_one(conn)
        .await
        .map_err(|e| Error::Database(e.into()))
}
