//! End-to-end ingestion scenarios against a live PostgreSQL database
//!
//! The embedding service is a wiremock double returning deterministic
//! vectors. Run with: `DATABASE_URL=postgres://... cargo test -- --ignored`


use test_helpers::{build_harness, mock_embedding_service, reset_schema, test_pool, TEST_DIMENSIONS};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use knowledge_core::model::{DocumentStatus, JobStatus, JobType, KnowledgeBaseCreate};
use knowledge_core::vector_store::VectorStore;

/// ~100 words so a 64-word window with overlap 4 yields exactly two chunks
fn hundred_words() -> String {
    (0..100).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
}

#[tokio::test]
#[ignore = "requires PostgreSQL with pgvector (set DATABASE_URL)"]
async fn text_ingest_happy_path() {
    let pool = test_pool().await;
    reset_schema(&pool).await;
    let embedding_server = mock_embedding_service().await;
    let harness = build_harness(pool, &embedding_server).await;

    let client_id = Uuid::new_v4();
    let mut create = KnowledgeBaseCreate::new("Happy Path");
    create.chunk_size = 64;
    create.chunk_overlap = 4;
    let base = harness
        .service
        .create_knowledge_base(client_id, create)
        .await
        .unwrap();

    let document = harness
        .service
        .create_text_document(client_id, base.id, Some("words"), &hundred_words(), None)
        .await
        .unwrap();
    assert_eq!(document.status, DocumentStatus::Pending);

    let jobs = harness
        .repository
        .list_jobs_for_document(document.id)
        .await
        .unwrap();
    let job = &jobs[0];
    assert_eq!(job.job_type, JobType::Ingest);

    harness
        .pipeline
        .process_document_ingestion(document.id, Some(job.id))
        .await;

    let document = harness
        .repository
        .get_document(document.id, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(document.status, DocumentStatus::Ready);
    assert!(document.error_message.is_none());
    assert!(document.extra_metadata.get("last_processed_at").is_some());
    assert!(document.processing_started_at.unwrap() <= document.processing_finished_at.unwrap());

    // Two windows: [w0..w63] and [w60..w99]
    assert_eq!(
        harness
            .repository
            .count_chunks_for_document(document.id)
            .await
            .unwrap(),
        2
    );

    let results = harness
        .repository
        .vector_store()
        .similarity_search(&[base.id], &test_helpers::embed_text("w0"), 10, None)
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().any(|r| r.content.starts_with("w0 ")));
    assert!(results.iter().any(|r| r.content.starts_with("w60 ")));
    assert!(results.iter().all(|r| r.token_count > 0));

    let job = harness
        .repository
        .get_job(job.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.attempts, 1);
    let messages: Vec<&str> = job.logs.iter().map(|l| l.message.as_str()).collect();
    assert_eq!(messages, vec!["Started ingestion", "Ingestion completed"]);
}

#[tokio::test]
#[ignore = "requires PostgreSQL with pgvector (set DATABASE_URL)"]
async fn reingest_is_idempotent_and_replaces_chunk_ids() {
    let pool = test_pool().await;
    reset_schema(&pool).await;
    let embedding_server = mock_embedding_service().await;
    let harness = build_harness(pool, &embedding_server).await;

    let client_id = Uuid::new_v4();
    let base = harness
        .service
        .create_knowledge_base(client_id, KnowledgeBaseCreate::new("Reingest"))
        .await
        .unwrap();
    let document = harness
        .service
        .create_text_document(client_id, base.id, None, &hundred_words(), None)
        .await
        .unwrap();

    let first_job = harness.repository.list_jobs_for_document(document.id).await.unwrap()[0].id;
    harness
        .pipeline
        .process_document_ingestion(document.id, Some(first_job))
        .await;

    let store = harness.repository.vector_store();
    let first_ids = store.chunk_ids_for_document(document.id).await.unwrap();
    let first_count = first_ids.len();
    assert!(first_count > 0);

    // Reprocess: pending again, a fresh reprocess job, then a second pass
    let reprocessed = harness
        .service
        .reprocess_document(client_id, document.id)
        .await
        .unwrap();
    assert_eq!(reprocessed.status, DocumentStatus::Pending);

    let jobs = harness
        .repository
        .list_jobs_for_document(document.id)
        .await
        .unwrap();
    assert_eq!(jobs.len(), 2);
    let reprocess_job = jobs
        .iter()
        .find(|j| j.job_type == JobType::Reprocess)
        .unwrap();

    harness
        .pipeline
        .process_document_ingestion(document.id, Some(reprocess_job.id))
        .await;

    let document = harness
        .repository
        .get_document(document.id, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(document.status, DocumentStatus::Ready);

    // Same chunk count and content, brand new ids
    let second_ids = store.chunk_ids_for_document(document.id).await.unwrap();
    assert_eq!(second_ids.len(), first_count);
    assert!(second_ids.iter().all(|id| !first_ids.contains(id)));

    let reprocess_job = harness
        .repository
        .get_job(reprocess_job.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reprocess_job.status, JobStatus::Completed);
    assert_eq!(reprocess_job.attempts, 1);
}

#[tokio::test]
#[ignore = "requires PostgreSQL with pgvector (set DATABASE_URL)"]
async fn empty_text_document_fails_cleanly() {
    let pool = test_pool().await;
    reset_schema(&pool).await;
    let embedding_server = mock_embedding_service().await;
    let harness = build_harness(pool, &embedding_server).await;

    let client_id = Uuid::new_v4();
    let base = harness
        .service
        .create_knowledge_base(client_id, KnowledgeBaseCreate::new("Empty"))
        .await
        .unwrap();

    // Whitespace-only content passes the boundary check but has no words
    let document = harness
        .service
        .create_text_document(client_id, base.id, None, "   \n  ", None)
        .await
        .unwrap();
    let job = harness.repository.list_jobs_for_document(document.id).await.unwrap()[0].id;

    harness
        .pipeline
        .process_document_ingestion(document.id, Some(job))
        .await;

    let document = harness
        .repository
        .get_document(document.id, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(document.status, DocumentStatus::Error);
    assert!(document
        .error_message
        .as_deref()
        .unwrap()
        .contains("Document content is empty"));

    let job = harness.repository.get_job(job).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.finished_at.is_some());
}

#[tokio::test]
#[ignore = "requires PostgreSQL with pgvector (set DATABASE_URL)"]
async fn embedding_failure_marks_document_and_keeps_old_chunks() {
    let pool = test_pool().await;
    reset_schema(&pool).await;
    let embedding_server = mock_embedding_service().await;
    let harness = build_harness(pool.clone(), &embedding_server).await;

    let client_id = Uuid::new_v4();
    let base = harness
        .service
        .create_knowledge_base(client_id, KnowledgeBaseCreate::new("Flaky"))
        .await
        .unwrap();
    let document = harness
        .service
        .create_text_document(client_id, base.id, None, &hundred_words(), None)
        .await
        .unwrap();
    let job = harness.repository.list_jobs_for_document(document.id).await.unwrap()[0].id;
    harness
        .pipeline
        .process_document_ingestion(document.id, Some(job))
        .await;
    let chunk_count = harness
        .repository
        .count_chunks_for_document(document.id)
        .await
        .unwrap();
    assert!(chunk_count > 0);

    // Second pass against a broken embedding service
    let broken_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&broken_server)
        .await;
    let broken_harness = build_harness(pool, &broken_server).await;

    let reprocessed = broken_harness
        .service
        .reprocess_document(client_id, document.id)
        .await
        .unwrap();
    let retry_job = broken_harness
        .repository
        .list_jobs_for_document(document.id)
        .await
        .unwrap()
        .into_iter()
        .find(|j| j.job_type == JobType::Reprocess)
        .unwrap();

    broken_harness
        .pipeline
        .process_document_ingestion(reprocessed.id, Some(retry_job.id))
        .await;

    let document = broken_harness
        .repository
        .get_document(document.id, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(document.status, DocumentStatus::Error);
    assert!(document
        .error_message
        .as_deref()
        .unwrap()
        .contains("upstream exploded"));

    let retry_job = broken_harness
        .repository
        .get_job(retry_job.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(retry_job.status, JobStatus::Failed);

    // The previous successful ingestion's chunks are untouched
    assert_eq!(
        broken_harness
            .repository
            .count_chunks_for_document(document.id)
            .await
            .unwrap(),
        chunk_count
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL with pgvector (set DATABASE_URL)"]
async fn url_ingest_strips_scripts_and_stamps_fetch_time() {
    let pool = test_pool().await;
    reset_schema(&pool).await;
    let embedding_server = mock_embedding_service().await;
    let harness = build_harness(pool, &embedding_server).await;

    let page_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><p>Hello</p><script>bad()</script><p>World</p></body></html>",
        ))
        .mount(&page_server)
        .await;

    let client_id = Uuid::new_v4();
    let base = harness
        .service
        .create_knowledge_base(client_id, KnowledgeBaseCreate::new("Web"))
        .await
        .unwrap();
    let document = harness
        .service
        .create_url_document(
            client_id,
            base.id,
            &format!("{}/article", page_server.uri()),
            Some("an article"),
            None,
        )
        .await
        .unwrap();

    let job = harness.repository.list_jobs_for_document(document.id).await.unwrap()[0].id;
    harness
        .pipeline
        .process_document_ingestion(document.id, Some(job))
        .await;

    let document = harness
        .repository
        .get_document(document.id, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(document.status, DocumentStatus::Ready);
    assert!(document.extra_metadata.get("last_fetched_at").is_some());

    // Visible text made it into chunks; script bodies did not
    let results = harness
        .repository
        .vector_store()
        .similarity_search(
            &[base.id],
            &test_helpers::embed_text("Hello\nWorld"),
            10,
            None,
        )
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].content.contains("Hello"));
    assert!(results[0].content.contains("World"));
    assert!(!results[0].content.contains("bad()"));

    // Both artifacts exist under the document directory
    let doc_dir = harness
        .storage_root
        .path()
        .join(client_id.to_string())
        .join(base.id.to_string())
        .join(document.id.to_string());
    assert!(doc_dir.join("text.meta.txt").is_file());
    assert!(doc_dir.join("text.url.txt").is_file());
}

#[tokio::test]
#[ignore = "requires PostgreSQL with pgvector (set DATABASE_URL)"]
async fn upload_boundary_validation() {
    let pool = test_pool().await;
    reset_schema(&pool).await;
    let embedding_server = mock_embedding_service().await;
    let harness = build_harness(pool, &embedding_server).await;

    let client_id = Uuid::new_v4();
    let base = harness
        .service
        .create_knowledge_base(client_id, KnowledgeBaseCreate::new("Uploads"))
        .await
        .unwrap();

    // Empty payload
    let empty = harness
        .service
        .upload_document(client_id, base.id, Some("a.txt"), Some("text/plain"), b"", None, None)
        .await;
    assert!(empty.is_err());

    // Over the 2MB harness limit
    let oversized = vec![0u8; 3 * 1024 * 1024];
    let too_big = harness
        .service
        .upload_document(
            client_id,
            base.id,
            Some("big.txt"),
            Some("text/plain"),
            &oversized,
            None,
            None,
        )
        .await;
    assert!(too_big.is_err());

    // Valid upload records checksum and storage path, then ingests
    let document = harness
        .service
        .upload_document(
            client_id,
            base.id,
            Some("notes.txt"),
            Some("text/plain"),
            b"uploaded words to ingest",
            Some("some notes"),
            None,
        )
        .await
        .unwrap();
    assert!(document.storage_path.as_deref().unwrap().ends_with("source.txt"));
    assert_eq!(document.checksum.as_deref().unwrap().len(), 64);
    assert_eq!(document.content_preview.as_deref(), Some("some notes"));

    let job = harness.repository.list_jobs_for_document(document.id).await.unwrap()[0].id;
    harness
        .pipeline
        .process_document_ingestion(document.id, Some(job))
        .await;

    let document = harness
        .repository
        .get_document(document.id, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(document.status, DocumentStatus::Ready);
    assert_eq!(
        harness
            .repository
            .count_chunks_for_document(document.id)
            .await
            .unwrap(),
        1
    );

    // Every stored embedding has the configured dimension
    let results = harness
        .repository
        .vector_store()
        .similarity_search(
            &[base.id],
            &vec![0.5; TEST_DIMENSIONS],
            10,
            None,
        )
        .await
        .unwrap();
    assert!(!results.is_empty());
}
