//! Entity facade scenarios against the scripted store.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tablekit_core::{
        AccessConfig, AccessError, CreateConfig, Entity, EntityDefinition, GetOptions,
        IndexDefinition, KeyTemplate, NamedRangeQuery, QuerySpec, RangeKeyCondition,
        RangeOperation, TypeIndex,
    };
    use tablekit_model::{AttributeValue, PutRequest, UpdateRequest};

    use crate::{ScriptedStore, item, key, page};

    fn s(v: &str) -> AttributeValue {
        AttributeValue::S(v.to_owned())
    }

    /// A user entity: partition `USER#<id>`, constant range `#DATA`, an
    /// email index, and a `since` range-query preset.
    fn user_definition() -> EntityDefinition {
        EntityDefinition::new(
            "user",
            "app-data",
            KeyTemplate::derived(|params| {
                vec![s("USER"), params.get("id").cloned().unwrap_or(AttributeValue::Null(true))]
            }),
            "pk",
            KeyTemplate::derived(|_| vec![s("#DATA")]),
            "sk",
        )
        .with_index(
            "by_email",
            IndexDefinition {
                index_name: "gsi1".to_owned(),
                partition_template: KeyTemplate::segments(["EMAIL", ".email"]),
                partition_attribute: "gsi1pk".to_owned(),
                range_template: None,
                range_attribute: Some("gsi1sk".to_owned()),
            },
        )
        .with_range_query("since", NamedRangeQuery::new(RangeOperation::BiggerOrEqualThan))
        .with_type_index(TypeIndex {
            index_name: "type-index".to_owned(),
            type_attribute: "entity_type".to_owned(),
        })
    }

    fn entity(store: &Arc<ScriptedStore>) -> Entity<ScriptedStore> {
        Entity::new(
            Arc::new(user_definition()),
            Arc::clone(store),
            AccessConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_should_resolve_composite_key_for_get() {
        let store = Arc::new(ScriptedStore::with_pages(vec![]));
        let stored = item(&[("pk", "USER#42"), ("sk", "#DATA"), ("name", "ada")]);
        store.insert_item("app-data", &key(&[("pk", "USER#42"), ("sk", "#DATA")]), stored.clone());

        let found = entity(&store)
            .get(&item(&[("id", "42")]), GetOptions::default())
            .await
            .unwrap();

        assert_eq!(found, Some(stored));
        let reads = store.reads.lock().unwrap();
        assert_eq!(reads[0].1, key(&[("pk", "USER#42"), ("sk", "#DATA")]));
    }

    #[tokio::test]
    async fn test_should_return_none_for_absent_item() {
        let store = Arc::new(ScriptedStore::with_pages(vec![]));
        let found = entity(&store)
            .get(&item(&[("id", "missing")]), GetOptions::default())
            .await
            .unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_should_forward_resolved_key_to_delete() {
        let store = Arc::new(ScriptedStore::with_pages(vec![]));
        entity(&store).delete(&item(&[("id", "42")])).await.unwrap();

        let deletes = store.deletes.lock().unwrap();
        assert_eq!(deletes[0].0, "app-data");
        assert_eq!(deletes[0].1, key(&[("pk", "USER#42"), ("sk", "#DATA")]));
    }

    #[tokio::test]
    async fn test_should_batch_resolve_keys_without_dedup() {
        let store = Arc::new(ScriptedStore::with_pages(vec![]));
        let keys = vec![item(&[("id", "1")]), item(&[("id", "1")]), item(&[("id", "2")])];

        entity(&store)
            .batch_get(&keys, GetOptions::default())
            .await
            .unwrap();

        let batches = store.batch_reads.lock().unwrap();
        let (table, resolved) = &batches[0];
        assert_eq!(table, "app-data");
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0], resolved[1]);
    }

    #[tokio::test]
    async fn test_should_forward_creation_builder_output_verbatim() {
        let store = Arc::new(ScriptedStore::with_pages(vec![]));
        let definition = user_definition().with_creation_builder(|new_item, config| PutRequest {
            table_name: "app-data".to_owned(),
            item: new_item.clone(),
            condition_expression: (!config.allow_overwrite)
                .then(|| "(attribute_not_exists(#pk))".to_owned()),
            expression_attribute_names: [("#pk".to_owned(), "pk".to_owned())].into(),
            ..PutRequest::default()
        });
        let entity = Entity::new(Arc::new(definition), Arc::clone(&store), AccessConfig::default());

        entity
            .create(&item(&[("id", "42"), ("name", "ada")]), &CreateConfig::default())
            .await
            .unwrap();

        let writes = store.writes.lock().unwrap();
        assert_eq!(
            writes[0].condition_expression.as_deref(),
            Some("(attribute_not_exists(#pk))")
        );
        assert_eq!(writes[0].item.get("name"), Some(&s("ada")));
    }

    #[tokio::test]
    async fn test_should_reject_create_without_builder() {
        let store = Arc::new(ScriptedStore::with_pages(vec![]));
        let result = entity(&store)
            .create(&item(&[("id", "42")]), &CreateConfig::default())
            .await;
        assert!(matches!(result, Err(AccessError::UnsupportedOperation(_))));
    }

    #[tokio::test]
    async fn test_should_forward_update_builder_output_verbatim() {
        let store = Arc::new(ScriptedStore::with_pages(vec![]));
        let definition = user_definition().with_update_builder(|params| UpdateRequest {
            table_name: "app-data".to_owned(),
            key: [
                ("pk".to_owned(), s("USER#42")),
                ("sk".to_owned(), s("#DATA")),
            ]
            .into(),
            update_expression: Some("SET #name = :name".to_owned()),
            expression_attribute_names: [("#name".to_owned(), "name".to_owned())].into(),
            expression_attribute_values: [(
                ":name".to_owned(),
                params.get("name").cloned().unwrap_or(AttributeValue::Null(true)),
            )]
            .into(),
            ..UpdateRequest::default()
        });
        let entity = Entity::new(Arc::new(definition), Arc::clone(&store), AccessConfig::default());

        entity
            .update(&item(&[("id", "42"), ("name", "grace")]))
            .await
            .unwrap();

        let updates = store.updates.lock().unwrap();
        assert_eq!(updates[0].update_expression.as_deref(), Some("SET #name = :name"));
        assert_eq!(updates[0].expression_attribute_values.get(":name"), Some(&s("grace")));
    }

    #[tokio::test]
    async fn test_should_query_partition_with_inline_range_condition() {
        let store = Arc::new(ScriptedStore::with_pages(vec![page(
            vec![item(&[("sk", "ORDER#1")])],
            None,
        )]));

        let spec = QuerySpec {
            range_condition: Some(RangeKeyCondition::new(
                RangeOperation::BeginsWith,
                s("ORDER#"),
            )),
            ..QuerySpec::default()
        };
        let result = entity(&store)
            .query()
            .custom(&item(&[("id", "42")]), spec)
            .await
            .unwrap();

        assert_eq!(result.items.len(), 1);
        let requests = store.recorded_page_requests();
        assert_eq!(
            requests[0].key_condition_expression.as_deref(),
            Some("(#pk = :pk) AND (begins_with(#sk, :sk))")
        );
        assert_eq!(requests[0].expression_attribute_values.get(":pk"), Some(&s("USER#42")));
        assert!(requests[0].index_name.is_none());
    }

    #[tokio::test]
    async fn test_should_page_until_first_match_for_query_one() {
        let store = Arc::new(ScriptedStore::with_pages(vec![
            page(vec![], Some(key(&[("pk", "USER#42"), ("sk", "a")]))),
            page(vec![item(&[("sk", "b")])], Some(key(&[("pk", "USER#42"), ("sk", "b")]))),
        ]));

        let found = entity(&store)
            .query()
            .one(&item(&[("id", "42")]), QuerySpec::default())
            .await
            .unwrap();

        assert_eq!(found, Some(item(&[("sk", "b")])));
        let requests = store.recorded_page_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].limit, Some(1));
    }

    #[tokio::test]
    async fn test_should_strip_cursor_for_query_all() {
        let store = Arc::new(ScriptedStore::with_pages(vec![
            page(
                vec![item(&[("sk", "a")]), item(&[("sk", "b")])],
                Some(key(&[("pk", "USER#42"), ("sk", "b")])),
            ),
            page(vec![item(&[("sk", "c")])], None),
        ]));

        let items = entity(&store)
            .query()
            .all(&item(&[("id", "42")]), QuerySpec::default())
            .await
            .unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(store.recorded_page_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_should_bind_queries_to_index_keys() {
        let store = Arc::new(ScriptedStore::with_pages(vec![page(
            vec![item(&[("email", "ada@example.com")])],
            None,
        )]));

        let entity = entity(&store);
        let scope = entity.index("by_email").unwrap();
        scope
            .custom(&item(&[("email", "ada@example.com")]), QuerySpec::default())
            .await
            .unwrap();

        let requests = store.recorded_page_requests();
        assert_eq!(requests[0].index_name.as_deref(), Some("gsi1"));
        assert_eq!(requests[0].key_condition_expression.as_deref(), Some("(#gsi1pk = :gsi1pk)"));
        assert_eq!(
            requests[0].expression_attribute_values.get(":gsi1pk"),
            Some(&s("EMAIL#ada@example.com"))
        );
    }

    #[tokio::test]
    async fn test_should_reject_unknown_index() {
        let store = Arc::new(ScriptedStore::with_pages(vec![]));
        let entity = entity(&store);
        assert!(matches!(
            entity.index("nope").err(),
            Some(AccessError::UnknownIndex(_))
        ));
    }

    #[tokio::test]
    async fn test_should_prefill_range_condition_from_named_query() {
        let store = Arc::new(ScriptedStore::with_pages(vec![page(vec![], None)]));

        entity(&store)
            .query()
            .named(
                "since",
                &item(&[("id", "42"), ("value", "2024-06-01")]),
                QuerySpec::default(),
            )
            .await
            .unwrap();

        let requests = store.recorded_page_requests();
        assert_eq!(
            requests[0].key_condition_expression.as_deref(),
            Some("(#pk = :pk) AND (#sk >= :sk)")
        );
        assert_eq!(
            requests[0].expression_attribute_values.get(":sk"),
            Some(&s("2024-06-01"))
        );
    }

    #[tokio::test]
    async fn test_should_reject_unknown_named_query() {
        let store = Arc::new(ScriptedStore::with_pages(vec![]));
        let result = entity(&store)
            .query()
            .named("nope", &item(&[("id", "42")]), QuerySpec::default())
            .await;
        assert!(matches!(result, Err(AccessError::UnknownRangeQuery(_))));
    }

    #[tokio::test]
    async fn test_should_list_entities_through_type_index() {
        let store = Arc::new(ScriptedStore::with_pages(vec![
            page(
                vec![item(&[("id", "1")]), item(&[("id", "2")])],
                Some(key(&[("entity_type", "user"), ("pk", "USER#2")])),
            ),
            page(vec![item(&[("id", "3")])], None),
        ]));

        let items = entity(&store).list_all().await.unwrap();

        assert_eq!(items.len(), 3);
        let requests = store.recorded_page_requests();
        assert_eq!(requests[0].index_name.as_deref(), Some("type-index"));
        assert_eq!(
            requests[0].key_condition_expression.as_deref(),
            Some("(#entity_type = :entity_type)")
        );
        assert_eq!(
            requests[0].expression_attribute_values.get(":entity_type"),
            Some(&s("user"))
        );
    }

    #[tokio::test]
    async fn test_should_expose_cursor_from_single_page_listing() {
        let store = Arc::new(ScriptedStore::with_pages(vec![page(
            vec![item(&[("id", "1")])],
            Some(key(&[("entity_type", "user"), ("pk", "USER#1")])),
        )]));

        let spec = QuerySpec {
            full_retrieval: false,
            ..QuerySpec::default()
        };
        let result = entity(&store).list(spec).await.unwrap();

        assert_eq!(result.items.len(), 1);
        assert!(result.pagination_cursor.is_some());
    }

    #[tokio::test]
    async fn test_should_reject_listing_without_type_index() {
        let store = Arc::new(ScriptedStore::with_pages(vec![]));
        let mut definition = user_definition();
        definition.type_index = None;
        let entity = Entity::new(Arc::new(definition), Arc::clone(&store), AccessConfig::default());

        assert!(matches!(
            entity.list_all().await,
            Err(AccessError::UnsupportedOperation(_))
        ));
    }
}
