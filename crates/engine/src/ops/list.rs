use base64::Engine as _;
use chrono::{DateTime, Utc};
use sea_orm::{Condition, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Operation, ResultEngine, operations};

use super::{Engine, with_tx};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct OperationsCursor {
    registered_at: DateTime<Utc>,
    operation_id: String,
}

impl OperationsCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid operations cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid operations cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid operations cursor".to_string()))
    }
}

impl Engine {
    /// Lists the operations of an account, with cursor-based pagination.
    ///
    /// Pagination is newest → older by `(registered_at DESC, operation_id
    /// DESC)`. The returned cursor is `None` on the last page.
    pub async fn list_operations_page(
        &self,
        account_id: Uuid,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultEngine<(Vec<Operation>, Option<String>)> {
        with_tx!(self, |db_tx| {
            // Unknown accounts fail instead of returning an empty page.
            self.load_account(&db_tx, account_id).await?;

            let limit_plus_one = limit.saturating_add(1);
            let mut query = operations::Entity::find()
                .filter(operations::Column::AccountId.eq(account_id.to_string()))
                .order_by_desc(operations::Column::RegisteredAt)
                .order_by_desc(operations::Column::Id)
                .limit(limit_plus_one);

            if let Some(cursor) = cursor {
                let cursor = OperationsCursor::decode(cursor)?;
                query = query.filter(
                    Condition::any()
                        .add(operations::Column::RegisteredAt.lt(cursor.registered_at))
                        .add(
                            Condition::all()
                                .add(operations::Column::RegisteredAt.eq(cursor.registered_at))
                                .add(operations::Column::Id.lt(cursor.operation_id)),
                        ),
                );
            }

            let rows: Vec<operations::Model> = query.all(&db_tx).await?;
            let has_more = rows.len() > limit as usize;

            let mut out: Vec<Operation> = Vec::with_capacity(rows.len().min(limit as usize));
            for model in rows.into_iter().take(limit as usize) {
                out.push(Operation::try_from(model)?);
            }

            let next_cursor = if has_more {
                out.last()
                    .map(|op| OperationsCursor {
                        registered_at: op.registered_at,
                        operation_id: op.id.to_string(),
                    })
                    .map(|c| c.encode())
                    .transpose()?
            } else {
                None
            };

            Ok((out, next_cursor))
        })
    }
}
