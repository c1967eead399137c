use statements_ingest::{JsonExtractor, Organization, Resolver};
use statements_ledger::{FileOutcome, Ingestor, SqliteStore, TransactionStore};
use std::path::PathBuf;
use std::sync::Arc;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn setup() -> (Ingestor, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().expect("open db"));
    store.migrate().expect("migrate");
    let ingestor = Ingestor::new(
        Arc::new(JsonExtractor),
        store.clone(),
        Resolver::new(Organization::default()),
    )
    .with_max_concurrent_files(2);
    (ingestor, store)
}

fn batch() -> Vec<PathBuf> {
    vec![fixture("sber_statement.json"), fixture("vtb_statement.json")]
}

/// Two statements ingested concurrently: headers, stop markers and rows after
/// them are dropped, five transactions land in storage.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_two_banks_concurrently() {
    let (ingestor, store) = setup();

    let report = ingestor.ingest_batch(batch()).await;

    assert!(!report.has_errors(), "{:?}", report.files);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.inserted(), 5);
    assert_eq!(store.count().unwrap(), 5);
    assert_eq!(
        report.message(),
        "Files uploaded and processed successfully: 2"
    );

    let sber = &report.files[0];
    assert_eq!(sber.statement_type.as_deref(), Some("СБЕР"));
    assert_eq!(sber.stats.records, 3);
    assert_eq!(sber.stats.inserted, 3);

    let vtb = &report.files[1];
    assert_eq!(vtb.stats.records, 2);
    assert_eq!(vtb.stats.inserted, 2);
}

#[tokio::test]
async fn test_reingest_is_idempotent() {
    let (ingestor, store) = setup();

    let first = ingestor.ingest_batch(batch()).await;
    assert_eq!(first.inserted(), 5);

    let second = ingestor.ingest_batch(batch()).await;
    assert!(!second.has_errors());
    assert_eq!(second.inserted(), 0);
    let duplicates: usize = second.files.iter().map(|f| f.stats.duplicates).sum();
    assert_eq!(duplicates, 5);
    assert_eq!(store.count().unwrap(), 5);
}

#[tokio::test]
async fn test_same_file_twice_in_one_batch() {
    let (ingestor, store) = setup();
    let file = fixture("vtb_statement.json");

    let report = ingestor.ingest_batch(vec![file.clone(), file]).await;

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.inserted(), 2);
    assert_eq!(store.count().unwrap(), 2);
}

#[tokio::test]
async fn test_resolved_rows_follow_dialect_rules() {
    let (ingestor, store) = setup();
    ingestor.ingest_batch(batch()).await;

    let sber = store
        .transactions_for_account("40702810000000012345")
        .unwrap();
    assert_eq!(sber.len(), 3);
    let first = &sber[0];
    assert_eq!(first.date, "2024-03-05");
    assert_eq!(first.debit, "1500.00");
    assert_eq!(first.credit, "0.00");
    assert_eq!(first.debit_account, "40702810000000012345");
    assert_eq!(first.inn, "7712345678");
    assert_eq!(first.name, "ООО Ромашка");
    assert_eq!(first.credit_account, "40702810900000054321");
    assert_eq!(first.name_c, "ООО Лютик");
    assert_eq!(first.payment_description, "Оплата по счету № 7 от 01.03.2024");

    let second = &sber[1];
    assert_eq!(second.debit_account, "");
    assert_eq!(second.inn, "7700000002");
    assert_eq!(second.credit, "20000.50");

    let vtb = store
        .transactions_for_account("40702810500000000777")
        .unwrap();
    assert_eq!(vtb.len(), 2);
    let incoming = &vtb[0];
    assert_eq!(incoming.date, "2024-03-11");
    assert_eq!(incoming.credit_account, "40702810500000000777");
    assert_eq!(incoming.inn_c, "7712345678");
    assert_eq!(incoming.debit_account, "40702810000000012345");
    assert_eq!(incoming.inn, Organization::default().inn);
    assert_eq!(incoming.document_number, "5501");
    assert_eq!(incoming.payment_description, "Оплата электроэнергии");

    let outgoing = &vtb[1];
    assert_eq!(outgoing.date, "2024-03-12");
    assert_eq!(outgoing.debit_account, "40702810500000000777");
    assert_eq!(outgoing.name, "АО Энергосбыт");
    assert_eq!(outgoing.name_c, Organization::default().name);
}

#[tokio::test]
async fn test_missing_file_marks_batch_erroneous() {
    let (ingestor, store) = setup();

    let report = ingestor
        .ingest_batch(vec![
            fixture("vtb_statement.json"),
            fixture("does_not_exist.json"),
        ])
        .await;

    assert!(report.has_errors());
    assert_eq!(report.succeeded(), 1);
    assert!(matches!(report.files[1].outcome, FileOutcome::Failure(_)));
    assert_eq!(store.count().unwrap(), 2);
}
