use products_crm::{
    export::{ExportError, export_opportunities},
    table::TableQuery,
};

use crate::{backend::Backend, store::OpportunityStore};

/// CSV of exactly the rows the table currently shows.
pub fn export_visible<B: Backend>(
    store: &OpportunityStore<B>,
    query: &TableQuery,
) -> Result<String, ExportError> {
    export_opportunities(query.apply(store.records()))
}
