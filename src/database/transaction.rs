use std::future::Future;
use std::pin::Pin;

use crate::database::store::{WorkflowStore, WorkflowTransaction};
use crate::error::AppError;

#[derive(Debug)]
pub struct DatabaseTransaction;

impl DatabaseTransaction {
    /// Run a closure inside a transaction: commit on `Ok`, roll back on `Err`
    pub async fn run<T, F>(store: &dyn WorkflowStore, f: F) -> Result<T, AppError>
    where
        F: for<'a> FnOnce(
            &'a mut dyn WorkflowTransaction,
        )
            -> Pin<Box<dyn Future<Output = Result<T, AppError>> + Send + 'a>>,
        T: Send,
    {
        let mut tx = store.begin().await?;

        let outcome = f(&mut *tx).await;

        match outcome {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                log::warn!("Transaction failed with error: {}, rolling back", err);
                if let Err(rollback_err) = tx.rollback().await {
                    log::error!(
                        "Rollback failed after error (orig: {}, rollback: {})",
                        err,
                        rollback_err
                    );
                }
                Err(err)
            }
        }
    }
}
