//! Shared models, mock connection and association scenarios.
//!
//! `LookupModel` rows point at `CachingModel` rows either through
//! `caching_model_id` alone or through `(caching_model_id, caching_model_id2)`.
//! `PostModel` rows point at `TagModel` rows through two text columns.
//! The scenarios run against every cache backend setup.

#![allow(dead_code)]

use asupersync::runtime::RuntimeBuilder;
use sqlcache::prelude::*;
use sqlcache::CompareOp;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub struct LookupModel {
    pub id: i64,
    pub caching_model_id: Option<i64>,
    pub caching_model_id2: Option<i64>,
}

impl Model for LookupModel {
    const TABLE_NAME: &'static str = "lookup_models";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::BigInt(self.id)),
            ("caching_model_id", self.caching_model_id.into()),
            ("caching_model_id2", self.caching_model_id2.into()),
        ]
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get_named("id")?,
            caching_model_id: row.get_named("caching_model_id")?,
            caching_model_id2: row.get_named("caching_model_id2")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachingModel {
    pub id: i64,
    pub id2: Option<i64>,
}

impl Model for CachingModel {
    const TABLE_NAME: &'static str = "caching_models";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![("id", Value::BigInt(self.id)), ("id2", self.id2.into())]
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get_named("id")?,
            id2: row.get_named("id2")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostModel {
    pub id: i64,
    pub tag_a: Option<String>,
    pub tag_b: Option<String>,
}

impl Model for PostModel {
    const TABLE_NAME: &'static str = "posts";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::BigInt(self.id)),
            ("tag_a", self.tag_a.clone().into()),
            ("tag_b", self.tag_b.clone().into()),
        ]
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get_named("id")?,
            tag_a: row.get_named("tag_a")?,
            tag_b: row.get_named("tag_b")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagModel {
    pub a: String,
    pub b: String,
    pub label: String,
}

impl Model for TagModel {
    const TABLE_NAME: &'static str = "tags";
    const PRIMARY_KEY: &'static [&'static str] = &["a", "b"];

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("a", self.a.clone().into()),
            ("b", self.b.clone().into()),
            ("label", self.label.clone().into()),
        ]
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            a: row.get_named("a")?,
            b: row.get_named("b")?,
            label: row.get_named("label")?,
        })
    }
}

pub fn post(id: i64, tag_a: &str, tag_b: &str) -> PostModel {
    PostModel {
        id,
        tag_a: Some(tag_a.to_string()),
        tag_b: Some(tag_b.to_string()),
    }
}

pub fn tag_row(a: &str, b: &str, label: &str) -> Row {
    Row::from_pairs(
        TagModel {
            a: a.to_string(),
            b: b.to_string(),
            label: label.to_string(),
        }
        .to_row(),
    )
}

pub fn lookup(id: i64, caching_model_id: Option<i64>, caching_model_id2: Option<i64>) -> LookupModel {
    LookupModel {
        id,
        caching_model_id,
        caching_model_id2,
    }
}

pub fn caching_row(id: i64, id2: Option<i64>) -> Row {
    Row::from_pairs(CachingModel { id, id2 }.to_row())
}

pub fn block_on<F: Future>(fut: F) -> F::Output {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    rt.block_on(fut)
}

pub fn unwrap_outcome<T>(outcome: Outcome<T, Error>) -> T {
    match outcome {
        Outcome::Ok(v) => v,
        Outcome::Err(e) => panic!("unexpected error: {e}"),
        Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
        Outcome::Panicked(p) => panic!("panicked: {p:?}"),
    }
}

#[derive(Default)]
struct MockState {
    fetch: Vec<Row>,
    sqls: Vec<String>,
}

/// Mock database holding a fetch set of rows.
///
/// Queries are recorded; `col = $n` conditions in the WHERE clause are
/// matched against the fetch set, anything else is ignored.
#[derive(Clone, Default)]
pub struct MockConnection {
    state: Arc<Mutex<MockState>>,
}

impl MockConnection {
    pub fn new(fetch: Vec<Row>) -> Self {
        let conn = Self::default();
        conn.set_fetch(fetch);
        conn
    }

    /// Replace the rows queries are answered from.
    pub fn set_fetch(&self, rows: Vec<Row>) {
        self.state.lock().expect("lock poisoned").fetch = rows;
    }

    /// Take the statements run since the last call.
    pub fn sqls(&self) -> Vec<String> {
        std::mem::take(&mut self.state.lock().expect("lock poisoned").sqls)
    }
}

fn matches_filters(row: &Row, sql: &str, params: &[Value]) -> bool {
    let Some((_, clause)) = sql.split_once(" WHERE ") else {
        return true;
    };
    let clause = clause.split(" LIMIT ").next().unwrap_or(clause);
    clause.split(" AND ").all(|part| {
        let Some((column, placeholder)) = part.split_once(" = $") else {
            return true;
        };
        let index = placeholder.parse::<usize>().expect("numbered placeholder") - 1;
        row.get_by_name(column) == params.get(index)
    })
}

impl Connection for MockConnection {
    fn query(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send {
        let mut state = self.state.lock().expect("lock poisoned");
        state.sqls.push(sql.to_string());
        let rows: Vec<Row> = state
            .fetch
            .iter()
            .filter(|row| matches_filters(row, sql, params))
            .cloned()
            .collect();
        drop(state);
        async move { Outcome::Ok(rows) }
    }
}

/// Setup where `caching_models` has a single-column primary key.
pub struct SingleKeyWorld {
    pub conn: MockConnection,
    pub caching_models: Arc<ModelClass<CachingModel>>,
    pub cm1: Arc<CachingModel>,
    pub cm2: Arc<CachingModel>,
}

/// Setup where `caching_models` has the primary key `(id, id2)`.
pub struct CompositeKeyWorld {
    pub conn: MockConnection,
    pub caching_models: Arc<ModelClass<CachingModel>>,
    pub cm12: Arc<CachingModel>,
    pub cm21: Arc<CachingModel>,
}

/// Setup where `tags` is keyed on two text columns and only the row
/// `("x,y", "z")` is cached.
pub struct TextKeyWorld {
    pub conn: MockConnection,
    pub tags: Arc<ModelClass<TagModel>>,
    pub xy_z: Arc<TagModel>,
}

pub fn text_key(values: &[&str]) -> CompositeKey {
    CompositeKey::new(values.iter().map(|v| Value::from(*v))).expect("non-null key")
}

/// Look up a text key through the class's backend and require a hit.
pub fn fetch_text_pk(
    class: &ModelClass<TagModel>,
    conn: &MockConnection,
    values: &[&str],
) -> Arc<TagModel> {
    let cx = Cx::for_testing();
    block_on(async {
        unwrap_outcome(class.primary_key_lookup(&cx, conn, &text_key(values)).await)
    })
    .expect("row present")
}

pub fn key(values: &[i64]) -> CompositeKey {
    CompositeKey::new(values.iter().copied().map(Value::BigInt)).expect("non-null key")
}

/// Look up `key` through the class's backend and require a hit.
pub fn fetch_pk(
    class: &ModelClass<CachingModel>,
    conn: &MockConnection,
    values: &[i64],
) -> Arc<CachingModel> {
    let cx = Cx::for_testing();
    block_on(async { unwrap_outcome(class.primary_key_lookup(&cx, conn, &key(values)).await) })
        .expect("row present")
}

pub fn resolve<S: Model, T: Model>(
    assoc: &ManyToOne<S, T>,
    conn: &MockConnection,
    record: &S,
) -> Option<Arc<T>> {
    let cx = Cx::for_testing();
    block_on(async { unwrap_outcome(assoc.resolve(&cx, conn, record).await) })
}

fn define(
    class: &Arc<ModelClass<CachingModel>>,
    options: AssociationOptions<LookupModel>,
) -> ManyToOne<LookupModel, CachingModel> {
    ManyToOne::new(
        "caching_model",
        &ModelClass::<LookupModel>::new(),
        Arc::clone(class),
        options,
    )
}

/// Resolve `caching_model` for `(id: 3, caching_model_id: 1)` and return
/// the statements it ran.
fn sqls_for(world: &SingleKeyWorld, options: AssociationOptions<LookupModel>) -> Vec<String> {
    let assoc = define(&world.caching_models, options);
    resolve(&assoc, &world.conn, &lookup(3, Some(1), None));
    world.conn.sqls()
}

pub mod pk_lookup {
    use super::*;

    pub fn uses_simple_primary_key_lookup(world: &SingleKeyWorld) {
        let assoc = define(&world.caching_models, AssociationOptions::new());
        assert!(world.conn.sqls().is_empty());

        let first = resolve(&assoc, &world.conn, &lookup(3, Some(1), None)).expect("cm1");
        let second = resolve(&assoc, &world.conn, &lookup(4, Some(2), None)).expect("cm2");
        assert!(Arc::ptr_eq(&first, &world.cm1));
        assert!(Arc::ptr_eq(&second, &world.cm2));
        assert!(world.conn.sqls().is_empty());

        world.conn.set_fetch(Vec::new());
        assert!(resolve(&assoc, &world.conn, &lookup(4, Some(3), None)).is_none());
        assert!(world.conn.sqls().is_empty());
    }

    pub fn null_foreign_key_is_none(world: &SingleKeyWorld) {
        let assoc = define(&world.caching_models, AssociationOptions::new());
        assert!(resolve(&assoc, &world.conn, &lookup(3, None, None)).is_none());
        assert!(world.conn.sqls().is_empty());
    }

    pub fn not_used_with_custom_key(world: &SingleKeyWorld) {
        let options = AssociationOptions::new().no_key().dataset(|l: &LookupModel| {
            Dataset::of::<CachingModel>().filter_eq("caching_model_id", l.caching_model_id)
        });
        assert!(!sqls_for(world, options).is_empty());
    }

    pub fn not_used_when_disabled(world: &SingleKeyWorld) {
        let options = AssociationOptions::new().pk_lookup(false);
        assert_eq!(
            sqls_for(world, options),
            ["SELECT * FROM caching_models WHERE id = $1 LIMIT 1"]
        );
    }

    pub fn not_used_with_other_primary_key(world: &SingleKeyWorld) {
        let options = AssociationOptions::new().primary_key(&["id2"]);
        assert_eq!(
            sqls_for(world, options),
            ["SELECT * FROM caching_models WHERE id2 = $1 LIMIT 1"]
        );
    }

    pub fn not_used_with_conditions(world: &SingleKeyWorld) {
        let options = AssociationOptions::new().conditions([("a", 1_i64)]);
        assert_eq!(
            sqls_for(world, options),
            ["SELECT * FROM caching_models WHERE id = $1 AND a = $2 LIMIT 1"]
        );
    }

    pub fn not_used_with_select(world: &SingleKeyWorld) {
        let options = AssociationOptions::new().select(&["a", "b"]);
        assert_eq!(
            sqls_for(world, options),
            ["SELECT a, b FROM caching_models WHERE id = $1 LIMIT 1"]
        );
    }

    pub fn not_used_with_block(world: &SingleKeyWorld) {
        let options = AssociationOptions::new().block(|ds| ds.filter("a", CompareOp::Gt, 1_i64));
        assert_eq!(
            sqls_for(world, options),
            ["SELECT * FROM caching_models WHERE id = $1 AND a > $2 LIMIT 1"]
        );
    }

    pub fn not_used_with_dataset(world: &SingleKeyWorld) {
        let options = AssociationOptions::new().dataset(|l: &LookupModel| {
            Dataset::of::<CachingModel>().filter_eq("id", l.caching_model_id)
        });
        assert_eq!(
            sqls_for(world, options),
            ["SELECT * FROM caching_models WHERE id = $1 LIMIT 1"]
        );
    }

    pub fn used_when_forced(world: &SingleKeyWorld) {
        let options = AssociationOptions::new().select(&["a", "b"]).pk_lookup(true);
        assert!(sqls_for(world, options).is_empty());
    }

    pub fn not_used_with_prepared_statements(world: &SingleKeyWorld) {
        let not_caching = Arc::new(ModelClass::<CachingModel>::new());
        let source = ModelClass::<LookupModel>::new().with_prepared_statements_associations(true);
        let assoc = ManyToOne::new(
            "caching_model",
            &source,
            not_caching,
            AssociationOptions::new(),
        );
        world.conn.set_fetch(vec![caching_row(1, None)]);

        let found = resolve(&assoc, &world.conn, &lookup(3, Some(1), None));
        assert_eq!(found.as_deref(), Some(&CachingModel { id: 1, id2: None }));
        assert!(!world.conn.sqls().is_empty());
    }

    pub fn used_with_prepared_statements_when_target_caches(world: &SingleKeyWorld) {
        let source = ModelClass::<LookupModel>::new().with_prepared_statements_associations(true);
        let assoc = ManyToOne::new(
            "caching_model",
            &source,
            Arc::clone(&world.caching_models),
            AssociationOptions::new(),
        );

        let found = resolve(&assoc, &world.conn, &lookup(3, Some(1), None)).expect("cm1");
        assert!(Arc::ptr_eq(&found, &world.cm1));
        assert!(world.conn.sqls().is_empty());
    }

    pub fn slot_memoizes_cached_target(world: &SingleKeyWorld) {
        let assoc = define(&world.caching_models, AssociationOptions::new());
        let record = lookup(3, Some(1), None);
        let slot = Associated::new();
        let cx = Cx::for_testing();

        block_on(async {
            unwrap_outcome(slot.load(&cx, &world.conn, &assoc, &record).await);
            unwrap_outcome(slot.load(&cx, &world.conn, &assoc, &record).await);
        });
        assert!(Arc::ptr_eq(slot.get().expect("loaded"), &world.cm1));
        assert!(world.conn.sqls().is_empty());
    }
}

pub mod composite_pk_lookup {
    use super::*;

    pub fn uses_simple_primary_key_lookup(world: &CompositeKeyWorld) {
        let assoc = ManyToOne::new(
            "caching_model2",
            &ModelClass::<LookupModel>::new(),
            Arc::clone(&world.caching_models),
            AssociationOptions::new().key(&["caching_model_id", "caching_model_id2"]),
        );
        assert!(world.conn.sqls().is_empty());

        let a = resolve(&assoc, &world.conn, &lookup(3, Some(1), Some(2))).expect("cm12");
        let b = resolve(&assoc, &world.conn, &lookup(3, Some(2), Some(1))).expect("cm21");
        assert!(Arc::ptr_eq(&a, &world.cm12));
        assert!(Arc::ptr_eq(&b, &world.cm21));
        assert!(world.conn.sqls().is_empty());

        world.conn.set_fetch(Vec::new());
        assert!(resolve(&assoc, &world.conn, &lookup(4, Some(2), Some(2))).is_none());
        assert!(world.conn.sqls().is_empty());
    }

    pub fn order_matters(world: &CompositeKeyWorld) {
        let swapped = ManyToOne::new(
            "caching_model2",
            &ModelClass::<LookupModel>::new(),
            Arc::clone(&world.caching_models),
            AssociationOptions::new()
                .key(&["caching_model_id", "caching_model_id2"])
                .primary_key(&["id2", "id"]),
        );
        assert_eq!(
            swapped.eligibility().reason(),
            Some(IneligibleReason::PrimaryKeyMismatch)
        );

        resolve(&swapped, &world.conn, &lookup(3, Some(1), Some(2)));
        assert_eq!(
            world.conn.sqls(),
            ["SELECT * FROM caching_models WHERE id2 = $1 AND id = $2 LIMIT 1"]
        );
    }

    pub fn single_column_key_is_an_error(world: &CompositeKeyWorld) {
        let assoc = define(&world.caching_models, AssociationOptions::new());
        assert_eq!(
            assoc.eligibility().reason(),
            Some(IneligibleReason::PrimaryKeyMismatch)
        );

        let cx = Cx::for_testing();
        let outcome = block_on(async {
            assoc
                .resolve(&cx, &world.conn, &lookup(3, Some(1), None))
                .await
        });
        assert!(matches!(outcome, Outcome::Err(Error::Custom(_))));
        assert!(world.conn.sqls().is_empty());
    }

    pub fn partial_null_key_is_none(world: &CompositeKeyWorld) {
        let assoc = ManyToOne::new(
            "caching_model2",
            &ModelClass::<LookupModel>::new(),
            Arc::clone(&world.caching_models),
            AssociationOptions::new().key(&["caching_model_id", "caching_model_id2"]),
        );
        assert!(resolve(&assoc, &world.conn, &lookup(3, Some(1), None)).is_none());
        assert!(world.conn.sqls().is_empty());
    }
}

pub mod text_pk_lookup {
    use super::*;

    fn define_tag(world: &TextKeyWorld) -> ManyToOne<PostModel, TagModel> {
        ManyToOne::new(
            "tag",
            &ModelClass::<PostModel>::new(),
            Arc::clone(&world.tags),
            AssociationOptions::new().key(&["tag_a", "tag_b"]),
        )
    }

    pub fn commas_in_key_components_do_not_collide(world: &TextKeyWorld) {
        let assoc = define_tag(world);
        assert!(assoc.eligibility().is_eligible());

        let found = resolve(&assoc, &world.conn, &post(1, "x,y", "z")).expect("xy_z");
        assert!(Arc::ptr_eq(&found, &world.xy_z));

        assert!(resolve(&assoc, &world.conn, &post(2, "x", "y,z")).is_none());
        assert!(world.conn.sqls().is_empty());
    }

    pub fn swapped_text_components_miss(world: &TextKeyWorld) {
        let assoc = define_tag(world);
        assert!(resolve(&assoc, &world.conn, &post(1, "z", "x,y")).is_none());
        assert!(world.conn.sqls().is_empty());
    }
}
