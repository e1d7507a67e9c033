use products_crm::{Opportunity, OpportunityPatch, Stage, board::Board};
use tracing::debug;
use uuid::Uuid;

use crate::{
    backend::Backend,
    error::{ClientError, OPP_ERROR},
    store::OpportunityStore,
};

pub fn board<B: Backend>(store: &OpportunityStore<B>) -> Board {
    Board::from_records(store.records())
}

/// Drop handler: a card dropped on its own column is a no-op; otherwise one
/// stage-only update is sent. On failure the local list is left as it was.
pub async fn move_card<B: Backend>(
    store: &mut OpportunityStore<B>,
    id: Uuid,
    stage: Stage,
) -> Result<Option<Opportunity>, ClientError> {
    let current = store
        .get(id)
        .map(|record| record.stage)
        .ok_or_else(|| ClientError::new(OPP_ERROR, format!("unknown opportunity {id}")))?;
    if current == stage {
        debug!(%id, stage = %stage, "card dropped on its own column");
        return Ok(None);
    }
    store.update(id, OpportunityPatch::stage(stage)).await.map(Some)
}
