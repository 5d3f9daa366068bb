use rosterkit_core::{
    diff, open_db_in_memory, ListSurface, Record, RecordAttributes, RecordQuery, RecordStore,
    ReconcileError, RowRenderer, Snapshot, SqliteRecordStore, ViewReconciler,
};
use uuid::Uuid;

/// Surface double: keeps visible rows and a trace of applied operations.
#[derive(Default)]
struct TestSurface {
    rows: Vec<String>,
    trace: Vec<String>,
}

impl ListSurface for TestSurface {
    type Row = String;

    fn insert_row(&mut self, at: usize, row: String, animated: bool) {
        self.trace.push(format!("insert@{at} animated={animated}"));
        self.rows.insert(at, row);
    }

    fn remove_row(&mut self, at: usize, animated: bool) {
        self.trace.push(format!("remove@{at} animated={animated}"));
        self.rows.remove(at);
    }

    fn move_row(&mut self, from: usize, to: usize, animated: bool) {
        self.trace
            .push(format!("move@{from}->{to} animated={animated}"));
        let row = self.rows.remove(from);
        self.rows.insert(to, row);
    }

    fn reload_row(&mut self, at: usize, row: String, animated: bool) {
        self.trace.push(format!("reload@{at} animated={animated}"));
        self.rows[at] = row;
    }

    fn visible_row_count(&self) -> usize {
        self.rows.len()
    }
}

struct NameRenderer;

impl RowRenderer for NameRenderer {
    type Row = String;

    fn render(&mut self, record: &Record) -> String {
        record.name.clone()
    }
}

fn seeded_store(names: &[&str]) -> (SqliteRecordStore, Snapshot) {
    let mut store = SqliteRecordStore::new(open_db_in_memory().unwrap());
    for name in names {
        store.create(RecordAttributes::named(*name)).unwrap();
    }
    store.commit().unwrap();
    let snapshot = query_snapshot(&store);
    (store, snapshot)
}

fn query_snapshot(store: &SqliteRecordStore) -> Snapshot {
    let ids = store
        .query(&RecordQuery::default())
        .unwrap()
        .into_iter()
        .map(|record| record.uuid)
        .collect();
    Snapshot::from_ids(ids).unwrap()
}

#[test]
fn first_population_applies_without_animation() {
    let (store, snapshot) = seeded_store(&["banana", "Apple"]);
    let mut reconciler = ViewReconciler::new(TestSurface::default(), NameRenderer);

    let delta = diff(&Snapshot::empty(), &snapshot, &[]);
    reconciler.apply(&store, delta, true).unwrap();

    assert_eq!(reconciler.surface().rows, vec!["Apple", "banana"]);
    assert_eq!(reconciler.applied(), &snapshot);
    assert!(reconciler
        .surface()
        .trace
        .iter()
        .all(|entry| entry.ends_with("animated=false")));
}

#[test]
fn later_applies_animate_when_requested() {
    let (mut store, first) = seeded_store(&["banana"]);
    let mut reconciler = ViewReconciler::new(TestSurface::default(), NameRenderer);
    reconciler
        .apply(&store, diff(&Snapshot::empty(), &first, &[]), true)
        .unwrap();

    store.create(RecordAttributes::named("Apple")).unwrap();
    store.commit().unwrap();
    let second = query_snapshot(&store);
    reconciler
        .apply(&store, diff(&first, &second, &[]), true)
        .unwrap();

    assert_eq!(reconciler.surface().rows, vec!["Apple", "banana"]);
    assert!(reconciler
        .surface()
        .trace
        .last()
        .unwrap()
        .ends_with("animated=true"));
}

#[test]
fn reapplying_the_same_diff_is_a_no_op() {
    let (store, snapshot) = seeded_store(&["a", "b"]);
    let mut reconciler = ViewReconciler::new(TestSurface::default(), NameRenderer);

    let delta = diff(&Snapshot::empty(), &snapshot, &[]);
    reconciler.apply(&store, delta.clone(), true).unwrap();
    let trace_len = reconciler.surface().trace.len();

    reconciler.apply(&store, delta, true).unwrap();

    assert_eq!(reconciler.surface().trace.len(), trace_len);
    assert_eq!(reconciler.applied(), &snapshot);
}

#[test]
fn stale_diff_is_rejected() {
    let (store, snapshot) = seeded_store(&["a", "b"]);
    let mut reconciler = ViewReconciler::new(TestSurface::default(), NameRenderer);
    reconciler
        .apply(&store, diff(&Snapshot::empty(), &snapshot, &[]), true)
        .unwrap();

    // A diff computed against a foreign baseline cannot apply.
    let foreign = Snapshot::from_ids(vec![Uuid::new_v4()]).unwrap();
    let stale = diff(&foreign, &Snapshot::empty(), &[]);
    let err = reconciler.apply(&store, stale, true).unwrap_err();
    assert!(matches!(err, ReconcileError::StaleDiff));
    assert_eq!(reconciler.applied(), &snapshot);
}

#[test]
fn unresolvable_identity_leaves_view_untouched() {
    let (store, snapshot) = seeded_store(&["a", "b"]);
    let mut reconciler = ViewReconciler::new(TestSurface::default(), NameRenderer);
    reconciler
        .apply(&store, diff(&Snapshot::empty(), &snapshot, &[]), true)
        .unwrap();
    let rows_before = reconciler.surface().rows.clone();
    let trace_before = reconciler.surface().trace.len();

    // Target snapshot references an identity the store never saw.
    let ghost = Uuid::new_v4();
    let mut target_ids = snapshot.ids().to_vec();
    target_ids.push(ghost);
    let target = Snapshot::from_ids(target_ids).unwrap();

    let err = reconciler
        .apply(&store, diff(&snapshot, &target, &[]), true)
        .unwrap_err();

    assert!(matches!(err, ReconcileError::UnresolvedIdentity(id) if id == ghost));
    assert_eq!(reconciler.surface().rows, rows_before);
    assert_eq!(reconciler.surface().trace.len(), trace_before);
    assert_eq!(reconciler.applied(), &snapshot);
}

#[test]
fn successive_applies_serialize_and_land_on_latest() {
    let (mut store, first) = seeded_store(&["banana"]);
    let mut reconciler = ViewReconciler::new(TestSurface::default(), NameRenderer);
    reconciler
        .apply(&store, diff(&Snapshot::empty(), &first, &[]), true)
        .unwrap();

    store.create(RecordAttributes::named("Apple")).unwrap();
    store.commit().unwrap();
    let second = query_snapshot(&store);

    store.create(RecordAttributes::named("Cherry")).unwrap();
    store.commit().unwrap();
    let third = query_snapshot(&store);

    // Two diffs issued back to back; each applies fully before the next.
    reconciler
        .apply(&store, diff(&first, &second, &[]), true)
        .unwrap();
    reconciler
        .apply(&store, diff(&second, &third, &[]), true)
        .unwrap();

    assert_eq!(reconciler.applied(), &third);
    assert_eq!(
        reconciler.surface().rows,
        vec!["Apple", "banana", "Cherry"]
    );
}

#[test]
fn move_and_reload_follow_a_rename_that_reorders() {
    let (mut store, first) = seeded_store(&["Apple", "banana"]);
    let mut reconciler = ViewReconciler::new(TestSurface::default(), NameRenderer);
    reconciler
        .apply(&store, diff(&Snapshot::empty(), &first, &[]), true)
        .unwrap();

    let apple = first.ids()[0];
    store
        .update(apple, RecordAttributes::named("Cherry"))
        .unwrap();
    store.commit().unwrap();
    let second = query_snapshot(&store);

    reconciler
        .apply(&store, diff(&first, &second, &[apple]), true)
        .unwrap();

    assert_eq!(reconciler.surface().rows, vec!["banana", "Cherry"]);
    let moves = reconciler
        .surface()
        .trace
        .iter()
        .filter(|entry| entry.starts_with("move@"))
        .count();
    assert_eq!(moves, 1);
}
