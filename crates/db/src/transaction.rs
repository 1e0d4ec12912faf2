//! Transaction scopes for repository calls.
//!
//! Every repository method takes a [`TxScope`]. A multi-step write opens one
//! [`UnitOfWork`] and passes [`TxScope::Shared`] to each step, so all steps
//! commit or roll back together. [`TxScope::Auto`] gives the call its own
//! transaction that commits when the call succeeds, so consecutive `Auto`
//! calls are independent and a later failure leaves earlier ones committed.

use boardhop_common::{AppError, AppResult};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::warn;

use crate::db_err;

/// An open transaction shared by the steps of one logical write.
///
/// Dropping an unfinished unit of work rolls the transaction back, which
/// also covers a cancelled request future.
pub struct UnitOfWork {
    tx: Option<DatabaseTransaction>,
}

impl UnitOfWork {
    /// Begin a transaction on the pool.
    pub async fn begin(db: &DatabaseConnection) -> AppResult<Self> {
        let tx = db.begin().await.map_err(db_err("begin transaction"))?;
        Ok(Self { tx: Some(tx) })
    }

    /// Scope that joins this unit of work.
    #[must_use]
    pub const fn scope(&self) -> TxScope<'_> {
        TxScope::Shared(self)
    }

    /// Whether the transaction is still open.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.tx.is_some()
    }

    /// Commit. Fails with [`AppError::NoActiveTransaction`] once finished.
    pub async fn commit(&mut self) -> AppResult<()> {
        let tx = self.tx.take().ok_or(AppError::NoActiveTransaction)?;
        tx.commit().await.map_err(db_err("commit transaction"))
    }

    /// Roll back. Fails with [`AppError::NoActiveTransaction`] once finished.
    pub async fn rollback(&mut self) -> AppResult<()> {
        let tx = self.tx.take().ok_or(AppError::NoActiveTransaction)?;
        tx.rollback().await.map_err(db_err("rollback transaction"))
    }

    fn transaction(&self) -> AppResult<&DatabaseTransaction> {
        self.tx.as_ref().ok_or(AppError::NoActiveTransaction)
    }
}

/// How a repository call obtains its transaction.
#[derive(Clone, Copy)]
pub enum TxScope<'a> {
    /// Run inside a caller-owned unit of work. The caller commits.
    Shared(&'a UnitOfWork),
    /// Open, commit and roll back a transaction for this call alone.
    Auto,
}

impl<'a> TxScope<'a> {
    pub(crate) async fn open(self, db: &DatabaseConnection) -> AppResult<ScopedTx<'a>> {
        match self {
            Self::Shared(uow) => uow.transaction().map(ScopedTx::Joined),
            Self::Auto => db
                .begin()
                .await
                .map(ScopedTx::Owned)
                .map_err(db_err("begin transaction")),
        }
    }
}

/// Transaction handle for the duration of one repository call.
pub(crate) enum ScopedTx<'a> {
    Joined(&'a DatabaseTransaction),
    Owned(DatabaseTransaction),
}

impl ScopedTx<'_> {
    pub(crate) fn conn(&self) -> &DatabaseTransaction {
        match self {
            Self::Joined(tx) => tx,
            Self::Owned(tx) => tx,
        }
    }

    /// Finish the call. A joined transaction is left to its owner.
    pub(crate) async fn settle<T>(self, result: AppResult<T>) -> AppResult<T> {
        let Self::Owned(tx) = self else {
            return result;
        };

        match result {
            Ok(value) => {
                tx.commit().await.map_err(db_err("commit transaction"))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Failed to roll back per-call transaction");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::render_log;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_commit_twice_reports_no_active_transaction() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let mut uow = UnitOfWork::begin(&db).await.unwrap();
        assert!(uow.is_active());
        uow.commit().await.unwrap();
        assert!(!uow.is_active());

        assert!(matches!(uow.commit().await, Err(AppError::NoActiveTransaction)));
        assert!(matches!(uow.rollback().await, Err(AppError::NoActiveTransaction)));
    }

    #[tokio::test]
    async fn test_shared_scope_after_finish_fails() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let mut uow = UnitOfWork::begin(&db).await.unwrap();
        uow.rollback().await.unwrap();

        let result = uow.scope().open(&db).await;
        assert!(matches!(result, Err(AppError::NoActiveTransaction)));
    }

    #[tokio::test]
    async fn test_auto_scope_rolls_back_on_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let tx = TxScope::Auto.open(&db).await.unwrap();
        let result: AppResult<()> = tx
            .settle(Err(AppError::Database("insert post: boom".to_string())))
            .await;
        assert!(result.is_err());

        let log = render_log(&db.into_transaction_log());
        assert!(log.contains("ROLLBACK"));
        assert!(!log.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_shared_scope_leaves_commit_to_owner() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let mut uow = UnitOfWork::begin(&db).await.unwrap();
        let tx = uow.scope().open(&db).await.unwrap();
        tx.settle(Ok(())).await.unwrap();
        assert!(uow.is_active());
        uow.commit().await.unwrap();
        drop(uow);

        let log = render_log(&db.into_transaction_log());
        assert_eq!(log.matches("COMMIT").count(), 1);
    }
}
