use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use crm_client::{
    Backend, ClientConfig, HttpBackend, OpportunityStore, Scope, SharedStore, spawn_realtime,
};
use crm_tests::{TestServer, migrated_pool, postgres_image};
use futures::StreamExt;
use products_crm::{
    ChangeKind, OpportunityDraft, OpportunityPatch, SignUpRequest, Stage,
};
use testcontainers::clients::Cli;
use tokio::sync::Mutex;

async fn backend_for(server: &TestServer, email: &str, admin: bool) -> Result<Arc<HttpBackend>> {
    let backend = Arc::new(HttpBackend::new(&ClientConfig {
        api_url: server.base_url(),
        ..ClientConfig::default()
    }));
    backend
        .sign_up(&SignUpRequest {
            email: email.into(),
            password: "secreto1".into(),
            name: "Tester".into(),
            role: Some(if admin {
                platform_authn::Role::Admin
            } else {
                platform_authn::Role::Employee
            }),
        })
        .await?;
    Ok(backend)
}

#[tokio::test]
async fn owner_sees_own_changes_and_nobody_elses() -> Result<()> {
    let docker = Cli::default();
    let container = docker.run(postgres_image());
    let pool = migrated_pool(container.get_host_port_ipv4(5432)).await?;
    let server = TestServer::start(pool).await?;

    let ana = backend_for(&server, "ana@nexo.test", false).await?;
    let beto = backend_for(&server, "beto@nexo.test", false).await?;
    let boss = backend_for(&server, "jefa@nexo.test", true).await?;

    let mut ana_feed = ana.subscribe(Scope::Mine).await?;
    let mut boss_feed = boss.subscribe(Scope::All).await?;
    // Give both subscriptions time to register with the hub.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let foreign = beto
        .create_opportunity(&OpportunityDraft::new("De Beto", "Beto SA", "Beto", 50.0))
        .await?;
    let mine = ana
        .create_opportunity(&OpportunityDraft::new("De Ana", "Ana SA", "Ana", 75.0))
        .await?;
    ana.update_opportunity(mine.id, &OpportunityPatch::stage(Stage::Calificado))
        .await?;

    let first = next_change(&mut ana_feed).await?;
    assert_eq!(first.kind, ChangeKind::Insert);
    assert_eq!(first.id, mine.id);
    let second = next_change(&mut ana_feed).await?;
    assert_eq!(second.kind, ChangeKind::Update);
    assert_eq!(second.record.map(|r| r.stage), Some(Stage::Calificado));

    let seen_by_boss = next_change(&mut boss_feed).await?;
    assert_eq!(seen_by_boss.id, foreign.id);
    Ok(())
}

#[tokio::test]
async fn realtime_pump_keeps_store_in_sync() -> Result<()> {
    let docker = Cli::default();
    let container = docker.run(postgres_image());
    let pool = migrated_pool(container.get_host_port_ipv4(5432)).await?;
    let server = TestServer::start(pool).await?;

    let ana = backend_for(&server, "ana@nexo.test", false).await?;
    let store: SharedStore<HttpBackend> =
        Arc::new(Mutex::new(OpportunityStore::new(ana.clone(), Scope::Mine)));
    store.lock().await.fetch().await?;
    let feed = ana.subscribe(Scope::Mine).await?;
    let _handle = spawn_realtime(store.clone(), feed);
    tokio::time::sleep(Duration::from_millis(300)).await;

    // Bypasses the store; only the feed can tell it about this record.
    let created = ana
        .create_opportunity(&OpportunityDraft::new("Remota", "Remota SA", "Ana", 10.0))
        .await?;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if store.lock().await.get(created.id).is_some() {
            break;
        }
        anyhow::ensure!(tokio::time::Instant::now() < deadline, "change never arrived");
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    ana.delete_opportunity(created.id).await?;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while store.lock().await.get(created.id).is_some() {
        anyhow::ensure!(tokio::time::Instant::now() < deadline, "delete never arrived");
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    Ok(())
}

async fn next_change(
    feed: &mut crm_client::ChangeStream,
) -> Result<products_crm::ChangeEvent> {
    let item = tokio::time::timeout(Duration::from_secs(5), feed.next())
        .await
        .context("timed out waiting for change")?
        .context("feed closed")?;
    Ok(item?)
}
