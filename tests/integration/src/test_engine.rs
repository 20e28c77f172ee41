//! Retrieval engine scenarios against the scripted store.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tablekit_core::{
        AccessConfig, AccessError, ParallelSegment, PartitionCondition, QueryRequest,
        RetrievalEngine, cursor,
    };
    use tablekit_model::{AttributeValue, StoreError};

    use crate::{ScriptedStore, item, key, page};

    fn engine(store: Arc<ScriptedStore>) -> RetrievalEngine<ScriptedStore> {
        RetrievalEngine::new(store, AccessConfig::default())
    }

    fn partitioned(table: &str, partition: &str) -> QueryRequest {
        QueryRequest {
            partition: Some(PartitionCondition {
                attribute: "pk".to_owned(),
                value: AttributeValue::S(partition.to_owned()),
            }),
            range_attribute: Some("sk".to_owned()),
            ..QueryRequest::new(table)
        }
    }

    #[tokio::test]
    async fn test_should_concatenate_all_pages_on_full_retrieval() {
        let store = Arc::new(ScriptedStore::with_pages(vec![
            page(
                vec![item(&[("n", "1")]), item(&[("n", "2")]), item(&[("n", "3")])],
                Some(key(&[("pk", "P"), ("sk", "3")])),
            ),
            page(vec![item(&[("n", "4")]), item(&[("n", "5")])], None),
        ]));

        let result = engine(Arc::clone(&store))
            .run(&partitioned("things", "P"))
            .await
            .unwrap();

        assert_eq!(result.items.len(), 5);
        assert!(result.pagination_cursor.is_none());
        assert_eq!(store.recorded_page_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_should_stop_after_one_page_in_single_page_mode() {
        let last = key(&[("pk", "P"), ("sk", "3")]);
        let store = Arc::new(ScriptedStore::with_pages(vec![page(
            vec![item(&[("n", "1")]), item(&[("n", "2")])],
            Some(last.clone()),
        )]));

        let mut request = partitioned("things", "P");
        request.full_retrieval = false;
        let result = engine(Arc::clone(&store)).run(&request).await.unwrap();

        assert_eq!(result.items.len(), 2);
        assert_eq!(store.recorded_page_requests().len(), 1);
        // The exposed cursor decodes back to the store's own last key.
        let token = result.pagination_cursor.unwrap();
        assert_eq!(cursor::decode(&token), Some(last));
    }

    #[tokio::test]
    async fn test_should_reduce_per_call_limit_by_accumulated_items() {
        let next = || Some(key(&[("pk", "P"), ("sk", "x")]));
        let store = Arc::new(ScriptedStore::with_pages(vec![
            page(vec![item(&[("n", "1")]), item(&[("n", "2")])], next()),
            page(vec![item(&[("n", "3")]), item(&[("n", "4")])], next()),
            page(vec![item(&[("n", "5")])], next()),
        ]));

        let mut request = partitioned("things", "P");
        request.limit = Some(5);
        let result = engine(Arc::clone(&store)).run(&request).await.unwrap();

        // 2 + 2 + 1 accumulated; the limit stops the loop even though the
        // store still reports more pages, so the cursor survives.
        assert_eq!(result.items.len(), 5);
        assert!(result.pagination_cursor.is_some());

        let limits: Vec<Option<i32>> = store
            .recorded_page_requests()
            .iter()
            .map(|r| r.limit)
            .collect();
        assert_eq!(limits, vec![Some(5), Some(3), Some(1)]);
    }

    #[tokio::test]
    async fn test_should_omit_cursor_when_limit_lands_on_final_page() {
        let store = Arc::new(ScriptedStore::with_pages(vec![page(
            vec![item(&[("n", "1")]), item(&[("n", "2")])],
            None,
        )]));

        let mut request = partitioned("things", "P");
        request.limit = Some(2);
        let result = engine(store).run(&request).await.unwrap();

        assert_eq!(result.items.len(), 2);
        assert!(result.pagination_cursor.is_none());
    }

    #[tokio::test]
    async fn test_should_resume_from_supplied_cursor() {
        let resume_key = key(&[("pk", "P"), ("sk", "42")]);
        let store = Arc::new(ScriptedStore::with_pages(vec![page(
            vec![item(&[("n", "43")])],
            None,
        )]));

        let mut request = partitioned("things", "P");
        request.pagination_cursor = Some(cursor::encode(&resume_key));
        engine(Arc::clone(&store)).run(&request).await.unwrap();

        let requests = store.recorded_page_requests();
        assert_eq!(requests[0].exclusive_start_key, resume_key);
    }

    #[tokio::test]
    async fn test_should_treat_bad_cursor_as_absent() {
        let store = Arc::new(ScriptedStore::with_pages(vec![page(
            vec![item(&[("n", "1")])],
            None,
        )]));

        let mut request = partitioned("things", "P");
        request.pagination_cursor = Some("not-base64-json".to_owned());
        let result = engine(Arc::clone(&store)).run(&request).await.unwrap();

        assert_eq!(result.items.len(), 1);
        assert!(store.recorded_page_requests()[0]
            .exclusive_start_key
            .is_empty());
    }

    #[tokio::test]
    async fn test_should_propagate_remote_failure_without_partial_result() {
        let store = Arc::new(ScriptedStore::with_pages(vec![page(
            vec![item(&[("n", "1")])],
            Some(key(&[("pk", "P"), ("sk", "1")])),
        )]));
        store.push_error(StoreError::internal_error("backend unavailable"));

        let result = engine(Arc::clone(&store)).run(&partitioned("things", "P")).await;

        assert!(matches!(result, Err(AccessError::Store(_))));
        assert_eq!(store.recorded_page_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_should_pass_segment_descriptor_on_every_page_call() {
        let store = Arc::new(ScriptedStore::with_pages(vec![
            page(
                vec![item(&[("n", "1")])],
                Some(key(&[("pk", "P"), ("sk", "1")])),
            ),
            page(vec![item(&[("n", "2")])], None),
        ]));

        let mut request = QueryRequest::new("things");
        request.parallel_segment = Some(ParallelSegment { segment: 1, total: 4 });
        let result = engine(Arc::clone(&store)).run(&request).await.unwrap();

        assert_eq!(result.items.len(), 2);
        for issued in store.recorded_page_requests() {
            assert_eq!(issued.segment, Some(1));
            assert_eq!(issued.total_segments, Some(4));
            assert!(issued.key_condition_expression.is_none());
        }
    }

    #[tokio::test]
    async fn test_should_list_all_without_limit_or_cursor() {
        let store = Arc::new(ScriptedStore::with_pages(vec![
            page(
                vec![item(&[("n", "1")]), item(&[("n", "2")]), item(&[("n", "3")])],
                Some(key(&[("pk", "P"), ("sk", "3")])),
            ),
            page(vec![item(&[("n", "4")]), item(&[("n", "5")])], None),
        ]));

        let mut request = partitioned("things", "P");
        // list_all overrides both of these.
        request.limit = Some(1);
        request.full_retrieval = false;
        let items = engine(Arc::clone(&store)).list_all(&request).await.unwrap();

        assert_eq!(items.len(), 5);
        assert_eq!(store.recorded_page_requests().len(), 2);
        assert!(store.recorded_page_requests()[0].limit.is_none());
    }

    #[tokio::test]
    async fn test_should_return_empty_result_for_empty_table() {
        let store = Arc::new(ScriptedStore::with_pages(vec![]));

        let result = engine(store).run(&QueryRequest::new("things")).await.unwrap();

        assert!(result.items.is_empty());
        assert!(result.pagination_cursor.is_none());
    }
}
