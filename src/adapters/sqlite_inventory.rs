//! A SQLite-backed `InventoryStore`, standing in for "the relational
//! inventory repository" spec §1 explicitly excludes implementing. Used only
//! so the `fleetwatch` binary has something concrete to run against; the
//! core engine never depends on this module directly.

use crate::contracts::inventory::{
    Container, ContainerPatch, InventoryStore, ListFilter, NewContainer, Sort, SortField, SortOrder,
    UNBOUNDED,
};
use crate::contracts::Status;
use crate::errors::{MonitorError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

pub struct SqliteInventoryStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteInventoryStore {
    pub fn open(db_path: &str) -> anyhow::Result<Self> {
        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::new(manager)?;
        let conn = pool.get()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS containers (
                container_id   TEXT PRIMARY KEY,
                container_name TEXT NOT NULL,
                ipv4           TEXT NOT NULL,
                status         TEXT NOT NULL,
                created_at     TEXT NOT NULL,
                updated_at     TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { pool })
    }

    fn get(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| MonitorError::Transient(anyhow::anyhow!(e)))
    }
}

fn row_to_container(row: &rusqlite::Row<'_>) -> rusqlite::Result<Container> {
    let status: String = row.get(3)?;
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;
    Ok(Container {
        container_id: row.get(0)?,
        container_name: row.get(1)?,
        ipv4: row.get(2)?,
        status: if status == "ON" { Status::On } else { Status::Off },
        created_at: created_at.parse().unwrap_or_else(|_| Utc::now()),
        updated_at: updated_at.parse().unwrap_or_else(|_| Utc::now()),
    })
}

#[async_trait]
impl InventoryStore for SqliteInventoryStore {
    async fn list(
        &self,
        _filter: ListFilter,
        from: i64,
        limit: i64,
        sort: Sort,
    ) -> Result<(Vec<Container>, u64)> {
        crate::contracts::inventory::validate_pagination(from, limit)?;
        let conn = self.get()?;

        let total: u64 = conn
            .query_row("SELECT COUNT(*) FROM containers", [], |r| r.get::<_, i64>(0))
            .map_err(|e| MonitorError::Transient(anyhow::anyhow!(e)))? as u64;

        let order_col = match sort.field {
            SortField::ContainerId => "container_id",
            SortField::UpdatedAt => "updated_at",
        };
        let order_dir = match sort.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let sql = format!(
            "SELECT container_id, container_name, ipv4, status, created_at, updated_at
             FROM containers ORDER BY {order_col} {order_dir} LIMIT ? OFFSET ?"
        );
        let fetch_limit: i64 = if limit == UNBOUNDED { -1 } else { limit };
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| MonitorError::Transient(anyhow::anyhow!(e)))?;
        let rows = stmt
            .query_map([fetch_limit, from - 1], row_to_container)
            .map_err(|e| MonitorError::Transient(anyhow::anyhow!(e)))?;
        let containers = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| MonitorError::Transient(anyhow::anyhow!(e)))?;

        Ok((containers, total))
    }

    async fn update(&self, id: &str, patch: ContainerPatch) -> Result<()> {
        let conn = self.get()?;
        let now: DateTime<Utc> = Utc::now();
        let affected = if let (Some(status), Some(ipv4)) = (patch.status, patch.ipv4.clone()) {
            conn.execute(
                "UPDATE containers SET status = ?1, ipv4 = ?2, updated_at = ?3 WHERE container_id = ?4",
                rusqlite::params![status.as_str(), ipv4, now.to_rfc3339(), id],
            )
        } else if let Some(status) = patch.status {
            conn.execute(
                "UPDATE containers SET status = ?1, updated_at = ?2 WHERE container_id = ?3",
                rusqlite::params![status.as_str(), now.to_rfc3339(), id],
            )
        } else if let Some(ipv4) = patch.ipv4 {
            conn.execute(
                "UPDATE containers SET ipv4 = ?1, updated_at = ?2 WHERE container_id = ?3",
                rusqlite::params![ipv4, now.to_rfc3339(), id],
            )
        } else {
            Ok(0)
        }
        .map_err(|e| MonitorError::Transient(anyhow::anyhow!(e)))?;

        if affected == 0 {
            return Err(MonitorError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let conn = self.get()?;
        conn.execute("DELETE FROM containers WHERE container_id = ?1", [id])
            .map_err(|e| MonitorError::Transient(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn create(&self, input: NewContainer) -> Result<Container> {
        let conn = self.get()?;
        let now = Utc::now();
        conn.execute(
            "INSERT INTO containers (container_id, container_name, ipv4, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            rusqlite::params![
                input.container_id,
                input.container_name,
                input.ipv4,
                Status::Off.as_str(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| MonitorError::Transient(anyhow::anyhow!(e)))?;

        Ok(Container {
            container_id: input.container_id,
            container_name: input.container_name,
            ipv4: input.ipv4,
            status: Status::Off,
            created_at: now,
            updated_at: now,
        })
    }
}
