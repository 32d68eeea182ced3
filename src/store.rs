//! Generic save / load / delete contracts over the guard and session

use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::Error;
use crate::guard::write_key;
use crate::models::{require_trimmed, Record};
use crate::ServiceCore;

/// Typed access to one record type's table.
///
/// Handles the full write path: validate and map, guard against duplicate
/// and overlapping calls, check connectivity and profile, then upsert by id.
pub struct Collection<T: Record> {
    core: Arc<ServiceCore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> Collection<T> {
    pub(crate) fn new(core: Arc<ServiceCore>) -> Self {
        Self {
            core,
            _marker: PhantomData,
        }
    }

    /// Persist the record via upsert-by-id and return the stored shape.
    ///
    /// Validation and auth failures are raised before any network attempt.
    /// An identical save repeated inside the duplicate-suppression window is
    /// a no-op that returns the caller's own sanitized input.
    pub async fn save(&self, entity: &T) -> Result<T, Error> {
        let mut row = entity.to_row()?;

        let identity = self.core.session.current_identity().ok_or_else(|| {
            Error::auth_required(format!("writing to {} requires a signed-in user", T::TABLE))
        })?;
        T::set_owner(&mut row, &identity.id);

        let payload = serde_json::to_value(&row)?;
        let operation = format!("save_{}", T::TABLE);
        let key = write_key(&operation, entity.id().trim(), Some(entity.name().trim()));

        let core = self.core.clone();
        let request = payload.clone();
        let result = self
            .core
            .guard
            .run_deduped(&key, payload, move || async move {
                core.session.ensure_connected().await?;
                let identity = core.session.current_identity();
                let token = core.session.access_token();
                core.profile
                    .ensure(identity.as_ref(), token.as_deref())
                    .await?;

                let mut upsert = core.rest.table(T::TABLE).upsert(request).on_conflict("id");
                if let Some(token) = token.as_deref() {
                    upsert = upsert.auth(token);
                }
                let rows: Vec<Value> = upsert.execute().await?;
                rows.into_iter().next().ok_or_else(|| {
                    Error::Serialization(format!("{} upsert returned no rows", T::TABLE))
                })
            })
            .await;

        match result {
            Ok(value) => {
                let row: T::Row = serde_json::from_value(value)?;
                Ok(T::from_row(row))
            }
            Err(err) => {
                log::error!("{} failed for user {}: {}", operation, identity.id, err);
                Err(err)
            }
        }
    }

    /// Load every visible record, newest first.
    ///
    /// An empty table is an empty vec, never an error; rows missing id or
    /// name are dropped before mapping.
    pub async fn load_all(&self) -> Result<Vec<T>, Error> {
        if self.core.session.current_identity().is_none() {
            log::warn!(
                "loading {} without an identity; row-level security may return nothing",
                T::TABLE
            );
        }

        self.core.session.ensure_connected().await?;

        let mut select = self
            .core
            .rest
            .table(T::TABLE)
            .select("*")
            .order(T::ORDER_COLUMN, false);
        if let Some(token) = self.core.session.access_token().as_deref() {
            select = select.auth(token);
        }

        let rows: Vec<T::Row> = select.execute().await.map_err(|err| {
            log::error!("load_{} failed: {}", T::TABLE, err);
            err
        })?;

        Ok(rows
            .into_iter()
            .filter(|row| T::row_is_valid(row))
            .map(T::from_row)
            .collect())
    }

    /// Delete a record by id, under the in-flight lock for the operation.
    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        let id = require_trimmed("id", id)?;

        let identity = self.core.session.current_identity().ok_or_else(|| {
            Error::auth_required(format!(
                "deleting from {} requires a signed-in user",
                T::TABLE
            ))
        })?;

        let operation = format!("delete_{}", T::TABLE);
        let key = write_key(&operation, &id, None);

        let core = self.core.clone();
        let target = id.clone();
        let result = self
            .core
            .guard
            .run_locked(&key, async move {
                core.session.ensure_connected().await?;
                let token = core.session.access_token();
                let mut delete = core.rest.table(T::TABLE).delete().eq("id", &target);
                if let Some(token) = token.as_deref() {
                    delete = delete.auth(token);
                }
                delete.execute().await?;
                Ok(Value::Null)
            })
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                log::error!("{} {} failed for user {}: {}", operation, id, identity.id, err);
                Err(err)
            }
        }
    }
}
