use std::sync::Arc;

use futures::StreamExt;
use products_crm::{
    ChangeEvent, ChangeKind, Opportunity, OpportunityDraft, OpportunityPatch,
    validation::{validate_draft, validate_patch},
};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    backend::{Backend, ChangeStream, Scope},
    error::{ClientError, OPP_ERROR},
};

/// In-memory list of the caller's opportunities, newest first.
///
/// Local mutations and remote pushes both write straight into the list; the
/// last one applied wins. Failed calls leave the list untouched and are
/// recorded in [`error`](Self::error) as well as returned.
pub struct OpportunityStore<B> {
    backend: Arc<B>,
    scope: Scope,
    records: Vec<Opportunity>,
    loading: bool,
    error: Option<ClientError>,
}

impl<B: Backend> OpportunityStore<B> {
    pub fn new(backend: Arc<B>, scope: Scope) -> Self {
        Self {
            backend,
            scope,
            records: Vec::new(),
            loading: false,
            error: None,
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn records(&self) -> &[Opportunity] {
        &self.records
    }

    pub fn get(&self, id: Uuid) -> Option<&Opportunity> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&ClientError> {
        self.error.as_ref()
    }

    pub async fn fetch(&mut self) -> Result<(), ClientError> {
        self.loading = true;
        let result = self.backend.list_opportunities(self.scope).await;
        self.loading = false;
        match result {
            Ok(records) => {
                debug!(count = records.len(), "opportunities loaded");
                self.records = records;
                self.error = None;
                Ok(())
            }
            Err(err) => Err(self.fail(ClientError::from_backend(OPP_ERROR, err))),
        }
    }

    pub async fn create(&mut self, draft: OpportunityDraft) -> Result<Opportunity, ClientError> {
        validate_draft(&draft).map_err(|err| ClientError::validation(err.to_string()))?;
        match self.backend.create_opportunity(&draft).await {
            Ok(record) => {
                self.upsert(record.clone());
                Ok(record)
            }
            Err(err) => Err(self.fail(ClientError::from_backend(OPP_ERROR, err))),
        }
    }

    pub async fn update(
        &mut self,
        id: Uuid,
        patch: OpportunityPatch,
    ) -> Result<Opportunity, ClientError> {
        validate_patch(&patch).map_err(|err| ClientError::validation(err.to_string()))?;
        match self.backend.update_opportunity(id, &patch).await {
            Ok(record) => {
                self.upsert(record.clone());
                Ok(record)
            }
            Err(err) => Err(self.fail(ClientError::from_backend(OPP_ERROR, err))),
        }
    }

    pub async fn delete(&mut self, id: Uuid) -> Result<(), ClientError> {
        match self.backend.delete_opportunity(id).await {
            Ok(()) => {
                self.records.retain(|r| r.id != id);
                Ok(())
            }
            Err(err) => Err(self.fail(ClientError::from_backend(OPP_ERROR, err))),
        }
    }

    /// Merges one pushed change: replace in place by id, or prepend if new.
    pub fn apply_change(&mut self, change: ChangeEvent) {
        match (change.kind, change.record) {
            (ChangeKind::Delete, _) => self.records.retain(|r| r.id != change.id),
            (_, Some(record)) => self.upsert(record),
            (kind, None) => warn!(kind = kind.as_str(), id = %change.id, "change without record"),
        }
    }

    fn upsert(&mut self, record: Opportunity) {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => *slot = record,
            None => self.records.insert(0, record),
        }
    }

    fn fail(&mut self, err: ClientError) -> ClientError {
        warn!(error = %err, "opportunity call failed");
        self.error = Some(err.clone());
        err
    }
}

/// Store shared between UI code and the realtime pump.
pub type SharedStore<B> = Arc<Mutex<OpportunityStore<B>>>;

/// Aborts the pump when dropped.
#[derive(Debug)]
pub struct RealtimeHandle {
    task: JoinHandle<()>,
}

impl RealtimeHandle {
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RealtimeHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Pumps `stream` into `store` until the stream ends or the handle goes away.
pub fn spawn_realtime<B>(store: SharedStore<B>, mut stream: ChangeStream) -> RealtimeHandle
where
    B: Backend + 'static,
{
    let task = tokio::spawn(async move {
        while let Some(item) = stream.next().await {
            match item {
                Ok(change) => store.lock().await.apply_change(change),
                Err(err) => warn!(error = %err, "skipping change feed item"),
            }
        }
        info!("change feed closed");
    });
    RealtimeHandle { task }
}


#[cfg(test)]
mod tests {
    use super::testing::{Call, FakeBackend, record};
    use super::*;
    use products_crm::Stage;
    use reqwest::StatusCode;

    fn names(store: &OpportunityStore<FakeBackend>) -> Vec<&str> {
        store.records().iter().map(|r| r.name.as_str()).collect()
    }

    async fn loaded(records: Vec<Opportunity>) -> OpportunityStore<FakeBackend> {
        let backend = FakeBackend::default();
        *backend.listing.lock().unwrap() = records;
        let mut store = OpportunityStore::new(Arc::new(backend), Scope::Mine);
        store.fetch().await.unwrap();
        store
    }

    #[tokio::test]
    async fn fetch_loads_the_list() {
        let store = loaded(vec![record("Uno", Stage::Prospecto)]).await;
        assert_eq!(names(&store), vec!["Uno"]);
        assert!(!store.loading());
        assert_eq!(store.backend().calls(), vec![Call::List(Scope::Mine)]);
    }

    #[tokio::test]
    async fn non_positive_value_is_rejected_without_a_call() {
        let mut store = loaded(vec![]).await;
        let draft = OpportunityDraft::new("Flota Norte", "Transportes", "Lucía", 0.0);
        let err = store.create(draft).await.unwrap_err();
        assert_eq!(err.code, "VALIDATION");
        assert_eq!(store.backend().calls(), vec![Call::List(Scope::Mine)]);
    }

    #[tokio::test]
    async fn short_name_is_rejected_without_a_call() {
        let mut store = loaded(vec![]).await;
        let draft = OpportunityDraft::new("ab", "Transportes", "Lucía", 10.0);
        assert!(store.create(draft).await.is_err());
        assert_eq!(store.backend().calls().len(), 1);
    }

    #[tokio::test]
    async fn created_record_is_prepended() {
        let mut store = loaded(vec![record("Vieja", Stage::Prospecto)]).await;
        let draft = OpportunityDraft::new("Nueva", "Transportes", "Lucía", 10.0);
        store.create(draft).await.unwrap();
        assert_eq!(names(&store), vec!["Nueva", "Vieja"]);
    }

    #[tokio::test]
    async fn remote_insert_prepends_and_update_replaces_in_place() {
        let first = record("Uno", Stage::Prospecto);
        let second = record("Dos", Stage::Prospecto);
        let third = record("Tres", Stage::Prospecto);
        let mut store = loaded(vec![first, second.clone(), third]).await;

        store.apply_change(ChangeEvent::inserted(record("Cero", Stage::Calificado)));
        assert_eq!(names(&store), vec!["Cero", "Uno", "Dos", "Tres"]);

        let mut renamed = second;
        renamed.name = "Dos bis".into();
        store.apply_change(ChangeEvent::updated(renamed));
        assert_eq!(names(&store), vec!["Cero", "Uno", "Dos bis", "Tres"]);
    }

    #[tokio::test]
    async fn remote_delete_removes_the_record() {
        let gone = record("Uno", Stage::Prospecto);
        let mut store = loaded(vec![gone.clone(), record("Dos", Stage::Prospecto)]).await;
        store.apply_change(ChangeEvent::deleted(gone.id, gone.owner_id));
        assert_eq!(names(&store), vec!["Dos"]);
    }

    #[tokio::test]
    async fn backend_failures_surface_as_opp_errors() {
        let backend = Arc::new(FakeBackend::failing(StatusCode::INTERNAL_SERVER_ERROR));
        let mut store = OpportunityStore::new(backend, Scope::All);
        let err = store.fetch().await.unwrap_err();
        assert_eq!(err.code, "OPP_ERROR");
        assert_eq!(store.error(), Some(&err));
        assert!(!store.loading());
    }

    #[tokio::test]
    async fn realtime_pump_applies_changes() {
        let store: SharedStore<FakeBackend> = Arc::new(Mutex::new(
            OpportunityStore::new(Arc::new(FakeBackend::default()), Scope::Mine),
        ));
        let incoming = record("Remota", Stage::Propuesta);
        let stream = futures::stream::iter(vec![Ok(ChangeEvent::inserted(incoming))]).boxed();
        let handle = spawn_realtime(store.clone(), stream);
        for _ in 0..50 {
            if handle.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(store.lock().await.records()[0].name, "Remota");
    }
}
