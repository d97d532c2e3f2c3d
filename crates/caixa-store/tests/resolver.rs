//! Resolution and provisioning against the in-memory backend.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use caixa_core::{ClientName, FolderId, Sheet, Transaction};
use caixa_store::memory::{MemoryBackend, Operation, ROOT_FOLDER};
use caixa_store::{Resolver, StoreBackend};
use rust_decimal::Decimal;

const FOLDER: &str = "1AbCdEfClientsFolder";

fn setup() -> (Arc<MemoryBackend>, Resolver) {
    let backend = Arc::new(MemoryBackend::new());
    let resolver = Resolver::new(backend.clone(), FolderId::new(FOLDER));
    (backend, resolver)
}

fn client(name: &str) -> ClientName {
    ClientName::new(name).expect("valid client name")
}

#[tokio::test]
async fn acme_is_provisioned_once_in_the_parent_folder() {
    let (backend, resolver) = setup();

    let first = resolver.resolve(&client("Acme")).await.unwrap();
    assert!(first.created);

    let id = first.store.container_id().clone();
    let container = backend.open_container(&id).await.unwrap();
    assert_eq!(container.name, "Acme");
    assert_eq!(
        container.worksheet_titles(),
        ["Clientes e Fornecedores", "Metas do Ano", "Receitas", "Despesas"]
    );
    assert_eq!(backend.parents(&id), [FolderId::new(FOLDER)]);

    let second = resolver.resolve(&client("Acme")).await.unwrap();
    assert!(!second.created);
    assert_eq!(second.store.container_id(), &id);
    assert_eq!(backend.container_count(), 1);
}

#[tokio::test]
async fn provisioned_store_has_no_placeholder_or_root_parent() {
    let (backend, resolver) = setup();
    let store = resolver.resolve(&client("Padaria")).await.unwrap().store;

    let container = backend.open_container(store.container_id()).await.unwrap();
    assert_eq!(container.worksheets.len(), Sheet::ALL.len());
    assert!(!container.worksheet_titles().contains(&"Sheet1"));
    assert!(
        !backend
            .parents(store.container_id())
            .contains(&FolderId::new(ROOT_FOLDER))
    );
}

#[tokio::test]
async fn second_resolve_only_reads() {
    let (backend, resolver) = setup();
    resolver.resolve(&client("Acme")).await.unwrap();
    backend.clear_calls();

    resolver.resolve(&client("Acme")).await.unwrap();
    assert_eq!(backend.calls(), [Operation::Find, Operation::Open]);
}

#[tokio::test]
async fn clients_get_separate_stores() {
    let (backend, resolver) = setup();
    let acme = resolver.resolve(&client("Acme")).await.unwrap().store;
    let padaria = resolver.resolve(&client("Padaria")).await.unwrap().store;
    assert_ne!(acme.container_id(), padaria.container_id());

    acme.income()
        .add(&Transaction {
            amount: Decimal::from(10),
            date: None,
            description: "venda".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(acme.income().list().await.unwrap().len(), 1);
    assert!(padaria.income().list().await.unwrap().is_empty());
    assert_eq!(backend.container_count(), 2);
}

#[tokio::test]
async fn names_are_matched_exactly() {
    let (backend, resolver) = setup();
    resolver.resolve(&client("Acme")).await.unwrap();
    let other = resolver.resolve(&client("acme")).await.unwrap();
    assert!(other.created);
    assert_eq!(backend.container_count(), 2);
}

#[tokio::test]
async fn trashed_store_is_provisioned_again() {
    let (backend, resolver) = setup();
    let first = resolver.resolve(&client("Acme")).await.unwrap().store;
    backend.trash(first.container_id());

    let second = resolver.resolve(&client("Acme")).await.unwrap();
    assert!(second.created);
    assert_ne!(second.store.container_id(), first.container_id());
}

#[tokio::test]
async fn spreadsheet_outside_the_folder_is_ignored() {
    let (backend, resolver) = setup();
    let stray = backend.create_container("Acme").await.unwrap();

    let resolution = resolver.resolve(&client("Acme")).await.unwrap();
    assert!(resolution.created);
    assert_ne!(resolution.store.container_id(), &stray.id);
}

#[tokio::test]
async fn first_of_several_matches_wins() {
    let (backend, resolver) = setup();
    let folder = FolderId::new(FOLDER);
    let mut ids = Vec::new();
    for _ in 0..2 {
        let container = backend.create_container("Acme").await.unwrap();
        backend.move_to_folder(&container.id, &folder).await.unwrap();
        ids.push(container.id);
    }

    let resolution = resolver.resolve(&client("Acme")).await.unwrap();
    assert!(!resolution.created);
    assert_eq!(resolution.store.container_id(), &ids[0]);
}
