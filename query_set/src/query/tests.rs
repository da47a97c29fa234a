use crate::errors::{FilterError, QueryError, SchemaError};
use crate::executor::{QueryExecutor, Row};
use crate::query::aggregation::Aggregate;
use crate::query::filter::{FilterNode, Predicate, PredicateGroup};
use crate::query::sql_generation::{Dialect, SqlGenerator};
use crate::query::state::{Projection, QueryState};
use crate::query::update::UpdateSet;
use crate::query::{FilterOperator, QuerySet, SortOrder};
use crate::schema::{Model, TableSchema};
use crate::store::{ModelStore, SaveOutcome};
use crate::validation::ValidationError;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Person {
    id: i64,
    name: String,
    email: Option<String>,
    income: i64,
}

impl Model for Person {
    fn table_name() -> &'static str {
        "person"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "name", "email", "income"]
    }

    fn primary_key() -> &'static [&'static str] {
        &["id"]
    }
}

/// Renders every request with the standard dialect and answers with canned rows
#[derive(Debug, Default)]
struct RecordingExecutor {
    rows: Vec<Row>,
    affected: u64,
    statements: Mutex<Vec<(String, Vec<Value>)>>,
}

impl RecordingExecutor {
    fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    fn record(&self, sql: String, params: Vec<Value>) {
        self.statements.lock().unwrap().push((sql, params));
    }

    fn last(&self) -> (String, Vec<Value>) {
        self.statements.lock().unwrap().last().cloned().unwrap()
    }

    fn generator() -> SqlGenerator {
        SqlGenerator::new(Dialect::Standard)
    }
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Standard
    }

    async fn select(&self, state: &QueryState, projection: &Projection) -> Result<Vec<Row>, QueryError> {
        let statement = Self::generator().select(state, projection)?;
        self.record(statement.sql, statement.params);
        Ok(self.rows.clone())
    }

    async fn count(&self, state: &QueryState) -> Result<u64, QueryError> {
        let statement = Self::generator().count(state)?;
        self.record(statement.sql, statement.params);
        Ok(self.rows.len() as u64)
    }

    async fn aggregate(&self, state: &QueryState, aggregate: &Aggregate) -> Result<Value, QueryError> {
        let statement = Self::generator().aggregate(state, aggregate)?;
        self.record(statement.sql, statement.params);
        Ok(json!(20000))
    }

    async fn update(&self, state: &QueryState, changes: &UpdateSet) -> Result<u64, QueryError> {
        let statement = Self::generator().update(state, changes)?;
        self.record(statement.sql, statement.params);
        Ok(self.affected)
    }

    async fn delete(&self, state: &QueryState) -> Result<u64, QueryError> {
        let statement = Self::generator().delete(state)?;
        self.record(statement.sql, statement.params);
        Ok(self.affected)
    }

    async fn insert(&self, schema: &TableSchema, values: &UpdateSet) -> Result<u64, QueryError> {
        let statement = Self::generator().insert(schema, values);
        self.record(statement.sql, statement.params);
        Ok(1)
    }
}

fn person_row(id: i64, name: &str, income: i64) -> Row {
    Row::new(
        vec![
            "id".to_string(),
            "name".to_string(),
            "email".to_string(),
            "income".to_string(),
        ],
        vec![json!(id), json!(name), Value::Null, json!(income)],
    )
}

fn store_with(executor: RecordingExecutor) -> (ModelStore<Person>, Arc<RecordingExecutor>) {
    let executor = Arc::new(executor);
    let store = ModelStore::<Person>::new(executor.clone()).unwrap();
    (store, executor)
}

fn people() -> QuerySet<Person> {
    store_with(RecordingExecutor::default()).0.objects()
}

// ========================================
// Immutability
// ========================================

#[test]
fn test_fluent_methods_leave_receiver_untouched() {
    let base = people();
    let filtered = base.filter("name", "=", Some(json!("pero"))).unwrap();
    let ordered = filtered.order_by("income", "desc").unwrap();
    let paged = ordered.limit(Some(10), Some(20)).unwrap();

    assert!(base.filter_tree().is_none());
    assert!(base.order().is_empty());
    assert!(base.pagination().is_empty());

    assert_eq!(filtered.filter_tree().unwrap().len(), 1);
    assert!(filtered.order().is_empty());

    assert_eq!(ordered.order(), vec!["income desc".to_string()]);
    assert!(ordered.pagination().is_empty());

    assert_eq!(paged.pagination().limit(), Some(10));
    assert_eq!(paged.pagination().offset(), Some(20));
}

#[test]
fn test_branching_from_shared_prefix() {
    let base = people().filter("income", ">", Some(json!(1000))).unwrap();
    let left = base.filter("name", "like", Some(json!("p%"))).unwrap();
    let right = base.filter("email", "is null", None).unwrap();

    assert_eq!(base.filter_tree().unwrap().len(), 1);
    assert_eq!(left.filter_tree().unwrap().columns(), vec!["income", "name"]);
    assert_eq!(right.filter_tree().unwrap().columns(), vec!["income", "email"]);
}

#[test]
fn test_all_returns_equal_copy() {
    let base = people()
        .filter("name", "=", Some(json!("x")))
        .unwrap()
        .order_by_asc("id")
        .unwrap();
    let copy = base.all();

    assert_eq!(copy.state(), base.state());
}

// ========================================
// Filter composition
// ========================================

#[test]
fn test_chained_filters_equal_combined_group() {
    let chained = people()
        .filter("name", "=", Some(json!("a")))
        .unwrap()
        .filter("income", ">=", Some(json!(10)))
        .unwrap();

    let combined = people()
        .filter_group(PredicateGroup::and([
            Predicate::eq("name", json!("a")),
            Predicate::gte("income", json!(10)),
        ]))
        .unwrap();

    let (chained_sql, chained_params) = chained.filter_tree().unwrap().render().unwrap();
    let (combined_sql, combined_params) = combined.filter_tree().unwrap().render().unwrap();

    assert_eq!(chained_sql, "name = ? AND income >= ?");
    assert_eq!(combined_sql, "(name = ? AND income >= ?)");
    assert_eq!(chained_params, combined_params);
}

#[test]
fn test_or_group_keeps_placeholder_order() {
    let query = people()
        .filter("income", "<", Some(json!(100)))
        .unwrap()
        .filter_group(PredicateGroup::or([
            FilterNode::from(Predicate::is_null("email")),
            FilterNode::from(PredicateGroup::and([
                Predicate::like("name", "p%"),
                Predicate::between("income", json!(10), json!(20)),
            ])),
        ]))
        .unwrap();

    let (sql, params) = query.filter_tree().unwrap().render().unwrap();
    assert_eq!(
        sql,
        "income < ? AND (email IS NULL OR (name LIKE ? AND income BETWEEN ? AND ?))"
    );
    assert_eq!(params, vec![json!(100), json!("p%"), json!(10), json!(20)]);
}

#[test]
fn test_filter_op_matches_textual_operator() {
    let typed = people()
        .filter_op("id", FilterOperator::In, Some(json!([1, 2, 3])))
        .unwrap();
    let textual = people().filter("id", "IN", Some(json!([1, 2, 3]))).unwrap();

    assert_eq!(typed.state(), textual.state());
}

#[test]
fn test_unknown_operator_rejected_when_added() {
    let err = people().filter("name", "~=", Some(json!("x"))).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Filter(FilterError::UnknownOperation(ref op)) if op == "~="
    ));

    let err = people().filter("name", "xxx", Some(json!("x"))).unwrap_err();
    assert_eq!(err.to_string(), "Filter error: Unknown filter operation [XXX].");
}

#[test]
fn test_filter_on_unknown_column() {
    let err = people().filter("xxx", "=", Some(json!(1))).unwrap_err();
    match err {
        QueryError::Schema(schema) => {
            assert_eq!(schema.column(), "xxx");
            assert_eq!(
                schema.to_string(),
                "Invalid filter: Column [xxx] does not exist in table [person]."
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_group_with_unknown_column_rejected() {
    let err = people()
        .filter_group(PredicateGroup::or([
            Predicate::eq("name", json!("a")),
            Predicate::eq("nickname", json!("b")),
        ]))
        .unwrap_err();

    assert!(matches!(
        err,
        QueryError::Schema(SchemaError::FilterColumn { ref column, .. }) if column == "nickname"
    ));
}

// ========================================
// Ordering and pagination
// ========================================

#[test]
fn test_order_accumulates_in_call_order() {
    let query = people()
        .order_by("name", "asc")
        .unwrap()
        .order_by_dir("income", SortOrder::Desc)
        .unwrap()
        .order_by_asc("id")
        .unwrap();

    assert_eq!(
        query.order(),
        vec![
            "name asc".to_string(),
            "income desc".to_string(),
            "id asc".to_string()
        ]
    );
}

#[test]
fn test_order_rejects_bad_direction_and_column() {
    let err = people().order_by("name", "!!!").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation error: Invalid order direction [!!!]. Expected 'asc' or 'desc'."
    );

    let err = people().order_by("xxx", "asc").unwrap_err();
    assert!(matches!(err, QueryError::Schema(SchemaError::OrderColumn { .. })));
}

#[test]
fn test_limit_replaces_previous_window() {
    let query = people()
        .limit(Some(5), Some(10))
        .unwrap()
        .limit(Some(3), None)
        .unwrap();

    assert_eq!(query.pagination().limit(), Some(3));
    assert_eq!(query.pagination().offset(), None);
}

#[test]
fn test_limit_str_rejects_non_integers() {
    let err = people().limit_str(Some("x"), None).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Validation(ValidationError::InvalidLimit(_))
    ));

    let err = people().limit_str(Some("1"), Some("1.5")).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Validation(ValidationError::InvalidOffset(_))
    ));

    let query = people().limit_str(Some("7"), Some("2")).unwrap();
    assert_eq!(query.pagination().limit(), Some(7));
}

// ========================================
// Terminal methods
// ========================================

#[tokio::test]
async fn test_fetch_renders_full_select() {
    let (store, executor) = store_with(RecordingExecutor::with_rows(vec![person_row(1, "pero", 10000)]));

    let people = store
        .objects()
        .filter("income", ">=", Some(json!(5000)))
        .unwrap()
        .order_by_desc("name")
        .unwrap()
        .limit(Some(2), Some(4))
        .unwrap()
        .fetch()
        .await
        .unwrap();

    assert_eq!(
        people,
        vec![Person {
            id: 1,
            name: "pero".to_string(),
            email: None,
            income: 10000,
        }]
    );

    let (sql, params) = executor.last();
    assert_eq!(
        sql,
        "SELECT id, name, email, income FROM person WHERE income >= ? ORDER BY name DESC LIMIT 2 OFFSET 4"
    );
    assert_eq!(params, vec![json!(5000)]);
}

#[tokio::test]
async fn test_count_ignores_order_and_pagination() {
    let (store, executor) = store_with(RecordingExecutor::with_rows(vec![
        person_row(1, "a", 1),
        person_row(2, "b", 2),
    ]));

    let count = store
        .objects()
        .filter("name", "like", Some(json!("%")))
        .unwrap()
        .order_by_asc("id")
        .unwrap()
        .limit(Some(1), None)
        .unwrap()
        .count()
        .await
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(executor.last().0, "SELECT COUNT(*) FROM person WHERE name LIKE ?");
}

#[tokio::test]
async fn test_exists_follows_count() {
    let (store, _) = store_with(RecordingExecutor::default());
    assert!(!store.objects().exists().await.unwrap());

    let (store, _) = store_with(RecordingExecutor::with_rows(vec![person_row(1, "a", 1)]));
    assert!(store.objects().exists().await.unwrap());
}

#[tokio::test]
async fn test_single_requires_exactly_one_row() {
    let (store, _) = store_with(RecordingExecutor::default());
    let err = store.objects().single().await.unwrap_err();
    assert!(err.is_not_found());

    let (store, _) = store_with(RecordingExecutor::with_rows(vec![
        person_row(1, "a", 1),
        person_row(2, "b", 2),
    ]));
    let err = store.objects().single().await.unwrap_err();
    assert!(matches!(err, QueryError::MultipleResults { count: 2, .. }));

    let (store, _) = store_with(RecordingExecutor::with_rows(vec![person_row(3, "c", 3)]));
    assert_eq!(store.objects().single().await.unwrap().id, 3);
}

#[tokio::test]
async fn test_aggregates_validate_column() {
    let (store, executor) = store_with(RecordingExecutor::default());

    let avg = store
        .objects()
        .filter("name", "=", Some(json!("x")))
        .unwrap()
        .avg("income")
        .await
        .unwrap();
    assert_eq!(avg, json!(20000));
    assert_eq!(executor.last().0, "SELECT AVG(income) FROM person WHERE name = ?");

    store.objects().sum("income").await.unwrap();
    assert_eq!(executor.last().0, "SELECT SUM(income) FROM person");

    let err = store.objects().max("xxx").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Schema error: Error forming aggregate query. Column [xxx] does not exist in table [person]."
    );
}

#[tokio::test]
async fn test_values_projection() {
    let (store, executor) = store_with(RecordingExecutor::with_rows(vec![person_row(1, "pero", 10)]));

    let maps = store.objects().values(&["id", "name"]).await.unwrap();
    assert_eq!(executor.last().0, "SELECT id, name FROM person");
    assert_eq!(maps[0].get("name"), Some(&json!("pero")));

    let lists = store.objects().values_list(&[]).await.unwrap();
    assert_eq!(executor.last().0, "SELECT id, name, email, income FROM person");
    assert_eq!(lists[0], vec![json!(1), json!("pero"), Value::Null, json!(10)]);

    let err = store.objects().values(&["id", "xxx"]).await.unwrap_err();
    assert!(matches!(
        err,
        QueryError::Schema(SchemaError::ProjectionColumn { ref column, .. }) if column == "xxx"
    ));
}

#[tokio::test]
async fn test_distinct_skips_pagination() {
    let (store, executor) = store_with(RecordingExecutor::default());

    store
        .objects()
        .order_by_asc("name")
        .unwrap()
        .limit(Some(5), Some(5))
        .unwrap()
        .distinct(&["name"])
        .await
        .unwrap();

    assert_eq!(
        executor.last().0,
        "SELECT DISTINCT name FROM person ORDER BY name ASC"
    );
}

#[tokio::test]
async fn test_update_and_delete() {
    let (store, executor) = store_with(RecordingExecutor {
        affected: 3,
        ..RecordingExecutor::default()
    });

    let query = store
        .objects()
        .filter("income", "<", Some(json!(100)))
        .unwrap();

    let changes = UpdateSet::new().set("income", json!(100)).set("email", Value::Null);
    assert_eq!(query.update(&changes).await.unwrap(), 3);
    let (sql, params) = executor.last();
    assert_eq!(sql, "UPDATE person SET income = ?, email = ? WHERE income < ?");
    assert_eq!(params, vec![json!(100), Value::Null, json!(100)]);

    assert_eq!(query.delete().await.unwrap(), 3);
    assert_eq!(executor.last().0, "DELETE FROM person WHERE income < ?");

    let err = query
        .update(&UpdateSet::new().set("salary", json!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Schema(SchemaError::UpdateColumn { .. })));

    let err = query.update(&UpdateSet::new()).await.unwrap_err();
    assert!(matches!(
        err,
        QueryError::Validation(ValidationError::EmptyUpdate)
    ));
}

#[tokio::test]
async fn test_invalid_value_surfaces_at_execution() {
    let (store, _) = store_with(RecordingExecutor::default());
    let query = store.objects().filter("id", "in", Some(json!(1))).unwrap();

    let err = query.fetch().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Filter error: IN filter requires an array with one or more values."
    );
}

// ========================================
// Model store
// ========================================

#[tokio::test]
async fn test_get_filters_primary_key() {
    let (store, executor) = store_with(RecordingExecutor::with_rows(vec![person_row(7, "z", 1)]));

    let person = store.get(&[json!(7)]).await.unwrap();
    assert_eq!(person.id, 7);

    let (sql, params) = executor.last();
    assert_eq!(sql, "SELECT id, name, email, income FROM person WHERE id = ?");
    assert_eq!(params, vec![json!(7)]);
}

#[tokio::test]
async fn test_get_checks_key_arity() {
    let (store, _) = store_with(RecordingExecutor::default());
    let err = store.get(&[json!(1), json!(2)]).await.unwrap_err();

    assert!(matches!(
        err,
        QueryError::Validation(ValidationError::PrimaryKeyArity {
            expected: 1,
            given: 2,
            ..
        })
    ));
}

#[tokio::test]
async fn test_get_without_primary_key() {
    let schema = Arc::new(TableSchema::new("log", ["id", "name", "email", "income"], Vec::<String>::new()).unwrap());
    let store = ModelStore::<Person>::with_schema(schema, Arc::new(RecordingExecutor::default()));

    let err = store.get(&[json!(1)]).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation error: Primary key not defined for table [log]."
    );
}

// ========================================
// Instance writes
// ========================================

/// Row whose key the database assigns
#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Draft {
    id: Option<i64>,
    title: String,
}

impl Model for Draft {
    fn table_name() -> &'static str {
        "draft"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "title"]
    }

    fn primary_key() -> &'static [&'static str] {
        &["id"]
    }
}

fn pero() -> Person {
    Person {
        id: 5,
        name: "pero".to_string(),
        email: None,
        income: 300,
    }
}

fn statements(executor: &RecordingExecutor) -> Vec<(String, Vec<Value>)> {
    executor.statements.lock().unwrap().clone()
}

#[tokio::test]
async fn test_insert_writes_every_column() {
    let (store, executor) = store_with(RecordingExecutor::default());

    assert_eq!(store.insert(&pero()).await.unwrap(), 1);
    let (sql, params) = executor.last();
    assert_eq!(sql, "INSERT INTO person (id, name, email, income) VALUES (?, ?, ?, ?)");
    assert_eq!(params, vec![json!(5), json!("pero"), Value::Null, json!(300)]);
}

#[tokio::test]
async fn test_insert_leaves_null_key_to_database() {
    let executor = Arc::new(RecordingExecutor::default());
    let store = ModelStore::<Draft>::new(executor.clone()).unwrap();
    let draft = Draft {
        id: None,
        title: "notes".to_string(),
    };

    assert_eq!(store.save(&draft).await.unwrap(), SaveOutcome::Inserted);
    assert_eq!(
        statements(&executor),
        vec![(
            "INSERT INTO draft (title) VALUES (?)".to_string(),
            vec![json!("notes")]
        )]
    );

    let err = store.delete_instance(&draft).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation error: Primary key column [id] of table [draft] has no value."
    );
}

#[tokio::test]
async fn test_save_updates_existing_row() {
    let (store, executor) = store_with(RecordingExecutor {
        affected: 1,
        ..RecordingExecutor::default()
    });

    assert_eq!(store.save(&pero()).await.unwrap(), SaveOutcome::Updated);
    assert_eq!(
        statements(&executor),
        vec![(
            "UPDATE person SET name = ?, email = ?, income = ? WHERE id = ?".to_string(),
            vec![json!("pero"), Value::Null, json!(300), json!(5)]
        )]
    );
}

#[tokio::test]
async fn test_save_inserts_when_update_matches_nothing() {
    let (store, executor) = store_with(RecordingExecutor::default());

    assert_eq!(store.save(&pero()).await.unwrap(), SaveOutcome::Inserted);
    let sql: Vec<String> = statements(&executor).into_iter().map(|(sql, _)| sql).collect();
    assert_eq!(
        sql,
        vec![
            "UPDATE person SET name = ?, email = ?, income = ? WHERE id = ?",
            "INSERT INTO person (id, name, email, income) VALUES (?, ?, ?, ?)",
        ]
    );
}

#[tokio::test]
async fn test_instance_update_and_delete_target_primary_key() {
    let (store, executor) = store_with(RecordingExecutor {
        affected: 1,
        ..RecordingExecutor::default()
    });

    assert_eq!(store.update_instance(&pero()).await.unwrap(), 1);
    assert_eq!(
        executor.last().0,
        "UPDATE person SET name = ?, email = ?, income = ? WHERE id = ?"
    );

    assert_eq!(store.delete_instance(&pero()).await.unwrap(), 1);
    let (sql, params) = executor.last();
    assert_eq!(sql, "DELETE FROM person WHERE id = ?");
    assert_eq!(params, vec![json!(5)]);
}

#[tokio::test]
async fn test_save_requires_primary_key() {
    let schema = Arc::new(TableSchema::new("log", ["id", "name", "email", "income"], Vec::<String>::new()).unwrap());
    let executor = Arc::new(RecordingExecutor::default());
    let store = ModelStore::<Person>::with_schema(schema, executor.clone());

    let err = store.save(&pero()).await.unwrap_err();
    assert!(matches!(
        err,
        QueryError::Validation(ValidationError::NoPrimaryKey(ref table)) if table == "log"
    ));
    assert!(statements(&executor).is_empty());
}
