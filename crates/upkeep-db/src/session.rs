use crate::Error;
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{Executor, MySql};
use upkeep_core::ScriptSession;

/// One pooled connection held for a whole script. Statements are sent as
/// plain text queries, so each one commits on its own under autocommit.
pub struct DbSession {
    conn: PoolConnection<MySql>,
}

impl DbSession {
    pub fn new(conn: PoolConnection<MySql>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl ScriptSession for DbSession {
    async fn execute(&mut self, sql: &str) -> upkeep_core::Result<u64> {
        let result = (&mut *self.conn)
            .execute(sql)
            .await
            .map_err(Error::from)?;

        Ok(result.rows_affected())
    }
}
