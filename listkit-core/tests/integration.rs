//! Integration Tests for Collections and Adapters
//!
//! These tests drive a collection through its public API and check that a
//! bound list view ends up with the same layout as the collection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use listkit_core::change::{ChangeSet, ListAdapter, ListView, ALL_SECTIONS};
use listkit_core::collection::{IndexPath, ReactiveCollection, Section};
use listkit_core::config::CollectionConfig;
use listkit_core::observe::{queue, ImmediateDispatcher};
use listkit_core::{CollectionError, ListViewModel};

/// A list view that tracks its own row counts, asking the collection only
/// when it inserts or reloads, as a real table view would.
struct LayoutView {
    source: ReactiveCollection<u32>,
    rows: Vec<usize>,
    full_reloads: usize,
    batches: usize,
}

impl LayoutView {
    fn new(source: &ReactiveCollection<u32>) -> Self {
        let mut view = Self {
            source: source.clone(),
            rows: Vec::new(),
            full_reloads: 0,
            batches: 0,
        };
        view.reload_data();
        view.full_reloads = 0;
        view
    }

    fn source_layout(&self) -> Vec<usize> {
        (0..self.source.count())
            .map(|section| self.source.count_elements(section))
            .collect()
    }
}

impl ListView for LayoutView {
    fn number_of_sections(&self) -> usize {
        self.rows.len()
    }

    fn number_of_rows(&self, section: usize) -> usize {
        self.rows.get(section).copied().unwrap_or(0)
    }

    fn begin_updates(&mut self) {
        self.batches += 1;
    }

    fn insert_sections(&mut self, sections: &[usize]) {
        for &section in sections {
            let rows = self.source.count_elements(section);
            self.rows.insert(section, rows);
        }
    }

    fn delete_sections(&mut self, sections: &[usize]) {
        let mut sections = sections.to_vec();
        sections.sort_unstable_by(|a, b| b.cmp(a));
        for section in sections {
            self.rows.remove(section);
        }
    }

    fn reload_sections(&mut self, sections: &[usize]) {
        for &section in sections {
            self.rows[section] = self.source.count_elements(section);
        }
    }

    fn insert_rows(&mut self, index_paths: &[IndexPath]) {
        for path in index_paths {
            self.rows[path.section] += 1;
        }
    }

    fn delete_rows(&mut self, index_paths: &[IndexPath]) {
        for path in index_paths {
            self.rows[path.section] -= 1;
        }
    }

    fn reload_rows(&mut self, _index_paths: &[IndexPath]) {}

    fn move_row(&mut self, _from: IndexPath, _to: IndexPath) {}

    fn reload_data(&mut self) {
        self.rows = self.source_layout();
        self.full_reloads += 1;
    }
}

fn bound_view(source: &ReactiveCollection<u32>) -> (Arc<Mutex<LayoutView>>, listkit_core::observe::Subscription) {
    let view = Arc::new(Mutex::new(LayoutView::new(source)));
    let binding = ListAdapter::bind(source, &view);
    (view, binding)
}

fn assert_in_sync(view: &Arc<Mutex<LayoutView>>) {
    let view = view.lock();
    assert_eq!(view.rows, view.source_layout());
}

/// Test the append / insert / remove walkthrough.
#[test]
fn append_insert_remove_walkthrough() {
    let list = ReactiveCollection::new();
    list.append_section(Section::new("A", vec![1u32, 2]), None);
    assert_eq!(list.count(), 1);
    assert_eq!(list.count_elements(0), 2);

    list.insert_one(3, 0, 0, None);
    assert_eq!(list.section(0).unwrap().items(), &[3, 1, 2]);

    assert_eq!(list.remove(1, 0, None).unwrap(), 1);
    assert_eq!(list.section(0).unwrap().items(), &[3, 2]);
}

/// Test that failed section removal leaves everything untouched.
#[test]
fn failed_section_removal_changes_nothing() {
    let list = ReactiveCollection::new();
    list.append_section(Section::new("A", vec![1u32]), None);
    let before = list.snapshot();

    let published = Arc::new(AtomicUsize::new(0));
    let published_clone = published.clone();
    let _sub = list.changes().subscribe(move |_| {
        published_clone.fetch_add(1, Ordering::SeqCst);
    });

    for index in [-1, 1, 7] {
        let err = list.remove_section(index, None).unwrap_err();
        assert!(matches!(err, CollectionError::IndexOutOfRange { .. }));
    }
    assert_eq!(list.snapshot(), before);
    assert_eq!(published.load(Ordering::SeqCst), 0);
}

/// Test that remove_all twice is harmless and deletes every view section.
#[test]
fn remove_all_deletes_every_view_section() {
    let list = ReactiveCollection::new();
    list.append_sections(
        [
            Section::new("A", vec![1u32]),
            Section::new("B", vec![2, 3]),
            Section::new("C", vec![]),
        ],
        None,
    );
    let (view, _binding) = bound_view(&list);
    assert_eq!(view.lock().rows, vec![1, 2, 0]);

    list.remove_all(None);
    assert!(list.is_empty());
    assert!(view.lock().rows.is_empty());
    assert_eq!(view.lock().full_reloads, 0);

    list.remove_all(None);
    assert!(list.is_empty());
    // Nothing left to delete in the view, so the adapter reloads instead.
    assert_eq!(view.lock().full_reloads, 1);
}

/// Test that a delete-all change applied directly hits all three sections.
#[test]
fn delete_all_change_against_three_sections() {
    let list: ReactiveCollection<u32> = ReactiveCollection::new();
    list.reset_rows(vec![vec![1], vec![2], vec![3]], Some(false));

    let view = Arc::new(Mutex::new(LayoutView::new(&list)));
    let adapter = ListAdapter::new(&list, &view);

    adapter.apply(&ChangeSet::delete_section(ALL_SECTIONS, true));
    assert_eq!(view.lock().number_of_sections(), 0);
}

/// Test that a view stays in sync through a mixed sequence of edits.
#[test]
fn view_tracks_mixed_edits() {
    let list = ReactiveCollection::new();
    let (view, _binding) = bound_view(&list);

    list.append_section(Section::new("A", vec![5u32, 3, 9]), None);
    assert_in_sync(&view);
    list.insert(vec![7, 8], 1, 0, None);
    assert_in_sync(&view);
    list.append(vec![1], 4, None);
    assert_in_sync(&view);
    list.insert_section(Section::new("Z", vec![0]), 0, None).unwrap();
    assert_in_sync(&view);
    list.remove_paths(&[IndexPath::new(1, 0), IndexPath::new(1, 4), IndexPath::new(9, 9)], None);
    assert_in_sync(&view);
    list.sort_by(|a, b| a.cmp(b), 1, None).unwrap();
    assert_in_sync(&view);
    list.replace(42, 0, 0, None).unwrap();
    assert_in_sync(&view);
    list.reset_section(vec![1, 2, 3, 4], 2, None);
    assert_in_sync(&view);
    list.remove_section(0, None).unwrap();
    assert_in_sync(&view);
    assert_eq!(view.lock().full_reloads, 0);
    assert!(view.lock().batches > 0);

    list.reload(ALL_SECTIONS, None);
    assert_in_sync(&view);
    assert_eq!(view.lock().full_reloads, 1);
}

/// Test that a reset adding sections rebuilds the view.
#[test]
fn reset_growing_section_count_stays_in_sync() {
    let list = ReactiveCollection::new();
    list.append_section(Section::new("A", vec![1u32]), None);
    let (view, _binding) = bound_view(&list);

    list.reset_rows(vec![vec![1], vec![2, 3], vec![4]], None);
    assert_in_sync(&view);
    assert_eq!(view.lock().rows, vec![1, 2, 1]);
    assert_eq!(view.lock().full_reloads, 1);
}

/// Test that a reset removing sections rebuilds the view.
#[test]
fn reset_shrinking_section_count_stays_in_sync() {
    let list = ReactiveCollection::new();
    list.append_sections(
        [Section::new("A", vec![1u32]), Section::new("B", vec![2, 3])],
        None,
    );
    let (view, _binding) = bound_view(&list);

    list.reset(vec![Section::new("C", vec![4, 5, 6])], None);
    assert_in_sync(&view);
    assert_eq!(view.lock().rows, vec![3]);

    list.reset(vec![], None);
    assert_in_sync(&view);
    assert!(view.lock().rows.is_empty());
}

/// Test that non-animated edits reach the view as full reloads.
#[test]
fn non_animated_edits_reload_the_view() {
    let config = CollectionConfig {
        animated: false,
        ..CollectionConfig::default()
    };
    let list = ReactiveCollection::with_config(config);
    let (view, _binding) = bound_view(&list);

    list.append_section(Section::new("A", vec![1u32, 2]), None);
    list.remove(0, 0, None).unwrap();
    list.append_one(3, 0, Some(true));

    assert_in_sync(&view);
    let view = view.lock();
    assert_eq!(view.full_reloads, 2);
    assert_eq!(view.batches, 1);
}

/// Test that sorting reports moves that replay to the sorted order.
#[test]
fn sort_moves_replay_to_sorted_order() {
    let list = ReactiveCollection::new();
    list.append_section(Section::new("A", vec![4u32, 1, 3, 2]), None);
    let before = list.section(0).unwrap().into_items();

    let moves = Arc::new(Mutex::new(None));
    let moves_clone = moves.clone();
    let _sub = list.changes().subscribe(move |change| {
        if let ChangeSet::MoveElements { from, to, .. } = change {
            *moves_clone.lock() = Some((from.to_vec(), to.to_vec()));
        }
    });

    list.sort_by(|a, b| a.cmp(b), 0, None).unwrap();
    let after = list.section(0).unwrap().into_items();
    assert_eq!(after, vec![1, 2, 3, 4]);

    let (from, to) = moves.lock().take().expect("sort published moves");
    let mut replayed = before.clone();
    for (from, to) in from.iter().zip(&to) {
        replayed[to.row] = before[from.row];
    }
    assert_eq!(replayed, after);
}

/// Test that the view-model selection follows the collection.
#[test]
fn view_model_selection() {
    let vm = ListViewModel::new(ReactiveCollection::new());
    vm.items_source()
        .append_section(Section::new("A", vec!["x".to_string(), "y".to_string()]), None);

    assert_eq!(vm.select(IndexPath::new(0, 1)).as_deref(), Some("y"));
    vm.items_source().remove(1, 0, None).unwrap();
    assert_eq!(vm.select(IndexPath::new(0, 1)), None);
    assert_eq!(vm.selected_index().get(), Some(IndexPath::new(0, 1)));
}

/// Test that the adapter answers data-source queries after teardown.
#[test]
fn adapter_survives_collection_teardown() {
    let list = ReactiveCollection::new();
    list.append_section(Section::new("A", vec![1u32]), None);
    let view = Arc::new(Mutex::new(LayoutView::new(&list)));
    let adapter = ListAdapter::new(&list, &view);

    assert_eq!(adapter.element_for(IndexPath::new(0, 0)), Some(1));
    list.destroy();
    assert_eq!(adapter.number_of_sections(), 0);
    assert_eq!(adapter.element_for(IndexPath::new(0, 0)), None);
}

/// Test that a queued dispatcher defers delivery until the queue runs.
#[test]
fn queued_delivery_waits_for_the_ui_loop() {
    let (dispatcher, mut ui_queue) = queue();
    let list = ReactiveCollection::with_dispatcher(CollectionConfig::default(), Arc::new(dispatcher));

    let delivered = Arc::new(AtomicUsize::new(0));
    let delivered_clone = delivered.clone();
    let _sub = list.changes().subscribe(move |_| {
        delivered_clone.fetch_add(1, Ordering::SeqCst);
    });

    list.append_section(Section::new("A", vec![1u32]), None);
    list.append_one(2, 0, None);
    assert_eq!(delivered.load(Ordering::SeqCst), 0);

    ui_queue.run_pending();
    assert_eq!(delivered.load(Ordering::SeqCst), 2);
}

/// Test that the async queue runner delivers snapshots in order.
#[tokio::test]
async fn async_queue_runner_delivers_in_order() {
    let (dispatcher, ui_queue) = queue();
    let seen = Arc::new(Mutex::new(Vec::new()));

    {
        let list = ReactiveCollection::with_dispatcher(CollectionConfig::default(), Arc::new(dispatcher));
        let seen_clone = seen.clone();
        let _sub = list.sources().subscribe(move |sections: &Vec<Section<u32>>| {
            seen_clone.lock().push(sections.iter().map(Section::len).sum::<usize>());
        });
        list.append_section(Section::new("A", vec![1]), None);
        list.append(vec![2, 3], 0, None);
        // _sub and list drop here, closing the queue's last sender.
    }

    ui_queue.run().await;
    assert_eq!(*seen.lock(), vec![0, 1, 3]);
}

/// Test that an immediate dispatcher delivers before the call returns.
#[test]
fn immediate_dispatcher_delivers_inline() {
    let list = ReactiveCollection::with_dispatcher(CollectionConfig::default(), ImmediateDispatcher::shared());
    let delivered = Arc::new(AtomicUsize::new(0));
    let delivered_clone = delivered.clone();
    let _sub = list.changes().subscribe(move |_| {
        delivered_clone.fetch_add(1, Ordering::SeqCst);
    });

    list.append_section(Section::new("A", vec![1u32]), None);
    assert_eq!(delivered.load(Ordering::SeqCst), 1);
}
