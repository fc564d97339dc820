pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;

use std::sync::Arc;

use sqlx::PgPool;

pub use config::Config;
pub use error::AppError;
pub use services::{EscalationScheduler, EscalationSettings, WorkflowEngine, WorkflowPorts};

use database::repositories::{
    PgEmployeeDirectory, PgIncidenceSink, PgNotificationSink, PgShiftExceptionSink,
    PgWorkflowStore,
};

/// Wire every workflow port to its Postgres adapter
pub fn postgres_ports(pool: PgPool) -> WorkflowPorts {
    WorkflowPorts {
        store: Arc::new(PgWorkflowStore::new(pool.clone())),
        directory: Arc::new(PgEmployeeDirectory::new(pool.clone())),
        notifications: Arc::new(PgNotificationSink::new(pool.clone())),
        incidences: Arc::new(PgIncidenceSink::new(pool.clone())),
        shift_exceptions: Arc::new(PgShiftExceptionSink::new(pool)),
    }
}
