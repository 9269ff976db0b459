use auditfeed::test_hooks::{replay_script, row_identities};
use auditfeed::{
    ActionVariant, ActorId, ActorRecord, AnchorRequest, ApplyError, BatchOutcome, EntityDirectory,
    Entry, EntryId, FeedController, FeedOptions, FeedUpdate, FetchDirection, FetchRequest,
    Fetcher, GroupingPolicy, Payload, ProjectionSnapshot, Renderer, ResolvedAnchor, RowTag,
    SectionKind, StableId, TapOutcome,
};
use std::cell::RefCell;
use std::rc::Rc;

struct NullDirectory;

impl EntityDirectory for NullDirectory {
    fn register_actors(&mut self, _actors: &[ActorRecord]) {}
}

struct RecordingDirectory {
    seen: Rc<RefCell<Vec<ActorRecord>>>,
}

impl EntityDirectory for RecordingDirectory {
    fn register_actors(&mut self, actors: &[ActorRecord]) {
        self.seen.borrow_mut().extend(actors.iter().cloned());
    }
}

#[derive(Default)]
struct RecordingFetcher {
    requests: Vec<FetchRequest>,
}

impl Fetcher for RecordingFetcher {
    fn fetch(&mut self, request: FetchRequest) {
        self.requests.push(request);
    }
}

#[derive(Default)]
struct CountingRenderer {
    fail_apply: bool,
    applied: usize,
    rebuilt: usize,
}

impl Renderer for CountingRenderer {
    fn apply(&mut self, _update: &FeedUpdate) -> Result<(), ApplyError> {
        if self.fail_apply {
            return Err(ApplyError::Inconsistent {
                row: 0,
                reason: "view holder out of sync".into(),
            });
        }
        self.applied += 1;
        Ok(())
    }

    fn rebuild(&mut self, _snapshot: &ProjectionSnapshot, _anchor: Option<&ResolvedAnchor>) {
        self.rebuilt += 1;
    }
}

fn feed() -> FeedController {
    FeedController::new(
        GroupingPolicy::default(),
        FeedOptions::default(),
        Box::new(NullDirectory),
    )
}

fn deletion(id: i64, actor: i64, author: &str) -> Entry {
    Entry {
        id: EntryId(id),
        timestamp: 1_700_000_000 + id,
        actor_id: ActorId(actor),
        action: ActionVariant::MessageDeleted {
            author: author.to_string(),
            service_action: false,
        },
        payload: Payload::text(format!("message {id}")),
    }
}

fn edit(id: i64, actor: i64) -> Entry {
    Entry {
        id: EntryId(id),
        timestamp: 1_700_000_000 + id,
        actor_id: ActorId(actor),
        action: ActionVariant::MessageEdited {
            author: format!("author-{actor}"),
        },
        payload: Payload::text(format!("edited {id}")),
    }
}

fn batch(controller: &FeedController, entries: Vec<Entry>) -> BatchOutcome {
    BatchOutcome {
        generation: controller.generation(),
        direction: FetchDirection::Older,
        entries,
        related_actors: Vec::new(),
    }
}

#[test]
fn initial_projection_is_a_single_loading_row() {
    let controller = feed();
    assert_eq!(controller.total_rows(), 1);
    let row = controller.resolve(0).expect("row 0 resolves");
    assert_eq!(row.kind, SectionKind::Loading);
    assert_eq!(row.stable_id, StableId::Fixed(RowTag::Loading));
}

#[test]
fn merging_a_batch_yields_a_replayable_script() {
    let mut controller = feed();
    let before = controller.snapshot().clone();
    let update = controller
        .on_batch(batch(&controller, vec![edit(1, 5), edit(2, 5)]), None)
        .expect("current generation");
    assert_eq!(controller.total_rows(), 3);
    assert_eq!(
        replay_script(before.rows(), update.snapshot.rows(), &update.script),
        row_identities(update.snapshot.rows()),
    );
}

#[test]
fn duplicate_entry_merge_changes_nothing() {
    let mut controller = feed();
    controller.on_batch(batch(&controller, vec![edit(1, 5)]), None);
    let update = controller
        .on_batch(
            BatchOutcome {
                generation: controller.generation(),
                direction: FetchDirection::Newer,
                entries: vec![edit(1, 9)],
                related_actors: Vec::new(),
            },
            None,
        )
        .expect("current generation");
    assert_eq!(controller.entries().len(), 1);
    assert!(update.script.is_empty());
    assert_eq!(controller.telemetry().duplicates_dropped_total(), 1);
}

#[test]
fn deletion_run_collapses_and_tapping_the_summary_expands_it() {
    let mut controller = feed();
    let entries: Vec<Entry> = (1..=4).map(|id| deletion(id, 9, "alice")).collect();
    controller.on_batch(batch(&controller, entries), None);

    assert_eq!(controller.total_rows(), 2);
    let summary = controller.resolve(1).expect("summary row");
    assert_eq!(summary.stable_id, StableId::Group(EntryId(4)));
    assert_eq!(summary.control, Some(EntryId(4)));

    let collapsed_ids = row_identities(controller.snapshot().rows());
    let before = controller.snapshot().clone();
    let update = match controller.on_row_tapped(1, None) {
        TapOutcome::Toggled(update) => update,
        other => panic!("expected toggle, got {other:?}"),
    };
    assert_eq!(controller.total_rows(), 5);
    assert!(controller.is_expanded(EntryId(4)));
    assert_eq!(
        replay_script(before.rows(), update.snapshot.rows(), &update.script),
        row_identities(update.snapshot.rows()),
    );

    // Tapping the expanded run's "show less" control restores the collapsed
    // sequence exactly.
    let last = controller.resolve(4).expect("last member row");
    assert_eq!(last.control, Some(EntryId(4)));
    match controller.on_row_tapped(4, None) {
        TapOutcome::Toggled(_) => {}
        other => panic!("expected toggle, got {other:?}"),
    }
    assert_eq!(row_identities(controller.snapshot().rows()), collapsed_ids);
}

#[test]
fn taps_on_plain_rows_pass_through() {
    let mut controller = feed();
    controller.on_batch(batch(&controller, vec![edit(1, 5)]), None);
    match controller.on_row_tapped(1, None) {
        TapOutcome::PassThrough(descriptor) => {
            assert_eq!(descriptor.stable_id, StableId::Entry(EntryId(1)));
        }
        other => panic!("expected pass-through, got {other:?}"),
    }
    assert!(matches!(
        controller.on_row_tapped(99, None),
        TapOutcome::OutOfRange
    ));
}

#[test]
fn stale_generation_batches_are_discarded_without_state_changes() {
    let mut controller = feed();
    let stale = batch(&controller, vec![edit(1, 5)]);
    controller.set_query("spam");
    assert!(controller.on_batch(stale, None).is_none());
    assert!(controller.entries().is_empty());
    assert_eq!(controller.telemetry().stale_responses_total(), 1);
}

#[test]
fn filter_change_resets_atomically_and_requests_a_full_rebuild() {
    let mut controller = feed();
    let entries: Vec<Entry> = (1..=4).map(|id| deletion(id, 9, "alice")).collect();
    controller.on_batch(batch(&controller, entries), None);
    controller.toggle_group(EntryId(4), None);

    let update = controller.set_query("alice");
    assert!(update.full_rebuild);
    assert!(update.script.is_empty());
    assert!(controller.entries().is_empty());
    assert!(!controller.is_expanded(EntryId(4)));
    assert_eq!(controller.query(), Some("alice"));

    // Header and its divider appear while a query is active.
    assert_eq!(controller.total_rows(), 3);
    let kinds: Vec<SectionKind> = (0..controller.total_rows())
        .filter_map(|row| controller.resolve(row).map(|descriptor| descriptor.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![SectionKind::Loading, SectionKind::Header, SectionKind::Divider],
    );
}

#[test]
fn reset_restarts_pagination_and_supersedes_in_flight_fetches() {
    let mut controller = feed();
    controller.set_query("flood");
    let in_flight = batch(&controller, vec![edit(1, 5)]);
    let update = controller.reset();
    assert!(update.full_rebuild);
    assert_eq!(controller.query(), Some("flood"));
    assert!(controller.on_batch(in_flight, None).is_none());
    assert!(controller.entries().is_empty());
}

#[test]
fn at_most_one_fetch_in_flight_per_direction() {
    let mut controller = feed();
    let mut fetcher = RecordingFetcher::default();
    assert!(controller.request_older(&mut fetcher));
    assert!(!controller.request_older(&mut fetcher));
    assert!(controller.request_newer(&mut fetcher));
    assert_eq!(fetcher.requests.len(), 2);
    assert_eq!(controller.telemetry().dropped_fetches_total(), 1);
}

#[test]
fn fetch_requests_carry_cursor_generation_and_query() {
    let mut controller = feed();
    let mut fetcher = RecordingFetcher::default();
    controller.on_batch(batch(&controller, vec![edit(7, 5), edit(9, 5)]), None);
    controller.request_older(&mut fetcher);
    let request = &fetcher.requests[0];
    assert_eq!(request.direction, FetchDirection::Older);
    assert_eq!(request.cursor, Some(EntryId(7)));
    assert_eq!(request.generation, 0);
    assert_eq!(request.query, None);

    controller.set_query("flood");
    controller.request_older(&mut fetcher);
    let request = &fetcher.requests[1];
    assert_eq!(request.cursor, None);
    assert_eq!(request.generation, 1);
    assert_eq!(request.query.as_deref(), Some("flood"));
}

#[test]
fn exhausted_older_pagination_swaps_loading_for_footer() {
    let mut controller = feed();
    controller.on_batch(batch(&controller, vec![edit(1, 5)]), None);
    let update = controller
        .on_batch(batch(&controller, Vec::new()), None)
        .expect("current generation");
    assert!(controller.end_reached());
    let kinds: Vec<SectionKind> = update
        .snapshot
        .rows()
        .iter()
        .map(|descriptor| descriptor.kind)
        .collect();
    assert_eq!(kinds, vec![SectionKind::Body, SectionKind::Footer]);
    assert!(!update.script.is_empty());
}

#[test]
fn anchor_survives_an_older_page_arriving_above_it() {
    let mut controller = feed();
    controller.on_batch(batch(&controller, vec![edit(10, 5), edit(11, 5)]), None);

    let anchor = AnchorRequest {
        stable_id: StableId::Entry(EntryId(10)),
        offset: 36,
    };
    assert_eq!(controller.snapshot().position_of(anchor.stable_id), Some(1));

    let update = controller
        .on_batch(batch(&controller, vec![edit(1, 5), edit(2, 5)]), Some(anchor))
        .expect("current generation");
    let resolved = update.anchor.expect("anchored row survives");
    assert_eq!(resolved.row, 3);
    assert_eq!(resolved.offset, 36);
}

#[test]
fn related_actors_are_registered_with_the_directory() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut controller = FeedController::new(
        GroupingPolicy::default(),
        FeedOptions::default(),
        Box::new(RecordingDirectory { seen: seen.clone() }),
    );
    let generation = controller.generation();
    controller.on_batch(
        BatchOutcome {
            generation,
            direction: FetchDirection::Older,
            entries: vec![edit(1, 5)],
            related_actors: vec![ActorRecord {
                id: ActorId(5),
                name: "alice".into(),
            }],
        },
        None,
    );
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(seen.borrow()[0].name, "alice");
}

#[test]
fn rejected_edit_scripts_fall_back_to_a_full_rebuild() {
    let mut controller = feed();
    let update = controller
        .on_batch(batch(&controller, vec![edit(1, 5)]), None)
        .expect("current generation");

    let mut failing = CountingRenderer {
        fail_apply: true,
        ..CountingRenderer::default()
    };
    controller.apply_update(&mut failing, &update);
    assert_eq!(failing.applied, 0);
    assert_eq!(failing.rebuilt, 1);
    assert_eq!(controller.telemetry().full_rebuilds_total(), 1);

    let mut healthy = CountingRenderer::default();
    controller.apply_update(&mut healthy, &update);
    assert_eq!(healthy.applied, 1);
    assert_eq!(healthy.rebuilt, 0);
    assert_eq!(controller.telemetry().incremental_updates_total(), 1);
}

#[test]
fn inline_filter_toggle_occupies_its_own_section() {
    let mut controller = FeedController::new(
        GroupingPolicy::default(),
        FeedOptions::default().with_filter_toggle(true),
        Box::new(NullDirectory),
    );
    let kinds: Vec<SectionKind> = controller
        .snapshot()
        .rows()
        .iter()
        .map(|descriptor| descriptor.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![SectionKind::Loading, SectionKind::Divider, SectionKind::Toggle],
    );

    let toggle_row = controller
        .snapshot()
        .position_of(StableId::Fixed(RowTag::Toggle))
        .expect("toggle row present");
    let update = controller.set_toggle_checked(true, None);
    assert_eq!(
        update.script.ops(),
        &[auditfeed::EditOp::Changed(toggle_row)],
    );
}

#[test]
fn telemetry_counts_the_silent_drop_taxonomy() {
    let mut controller = feed();
    controller.on_batch(
        batch(
            &controller,
            vec![
                edit(1, 5),
                edit(1, 5),
                Entry {
                    id: EntryId(2),
                    timestamp: 0,
                    actor_id: ActorId::NONE,
                    action: ActionVariant::Unsupported { code: 1 },
                    payload: Payload::default(),
                },
            ],
        ),
        None,
    );
    let telemetry = controller.telemetry();
    assert_eq!(telemetry.merged_total(), 1);
    assert_eq!(telemetry.duplicates_dropped_total(), 1);
    assert_eq!(telemetry.malformed_dropped_total(), 1);

    let snapshot = controller.telemetry().snapshot();
    assert_eq!(snapshot.merged_total, 1);
    assert_eq!(snapshot.malformed_dropped_total, 1);
}
