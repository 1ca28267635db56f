use pretty_assertions::assert_eq;
use redact_core::{
    render, Annotations, CharRange, Document, EditError, Origin, PiiType, RejectReason, Segment,
    SelectionState, Span, SpanSet, MANUAL_CONFIDENCE,
};

const TEXT: &str = "John Doe lives at 123 Main St";

fn john_doe() -> Span {
    Span::detected("John Doe", PiiType::Name, CharRange::new(0, 8), 0.95)
}

fn scenario_a() -> Annotations {
    let document = Document::new("doc-a", TEXT);
    let (spans, rejected) = SpanSet::from_detected(&document, vec![john_doe()]);
    assert!(rejected.is_empty());
    Annotations::initialize(document, spans)
}

fn selected(annotations: &Annotations) -> Vec<usize> {
    annotations.selection().indices().collect()
}

#[test]
fn initialize_selects_everything_and_is_clean() {
    let document = Document::new("doc", "alpha beta gamma");
    let (spans, _) = SpanSet::from_detected(
        &document,
        vec![
            Span::detected("alpha", PiiType::Name, CharRange::new(0, 5), 0.5),
            Span::detected("gamma", PiiType::Other, CharRange::new(11, 16), 0.99),
        ],
    );
    let annotations = Annotations::initialize(document, spans);

    assert_eq!(selected(&annotations), vec![0, 1]);
    assert!(!annotations.is_dirty());
    assert_eq!(annotations.baseline().span_count, 2);
}

#[test]
fn toggle_twice_restores_membership() {
    let mut annotations = scenario_a();
    let before = annotations.selection().clone();

    assert_eq!(annotations.toggle(0), Ok(false));
    assert!(annotations.is_dirty());
    assert_eq!(annotations.toggle(0), Ok(true));

    assert_eq!(annotations.selection(), &before);
    assert!(!annotations.is_dirty());
}

#[test]
fn toggle_out_of_range_is_rejected() {
    let mut annotations = scenario_a();
    assert_eq!(
        annotations.toggle(1),
        Err(EditError::IndexOutOfRange { index: 1, len: 1 })
    );
    assert_eq!(selected(&annotations), vec![0]);
}

#[test]
fn scenario_a_reset_restores_clean_selection() {
    let mut annotations = scenario_a();
    annotations.toggle(0).unwrap();
    assert!(annotations.selection().is_empty());

    annotations.reset_to_original();

    assert_eq!(selected(&annotations), vec![0]);
    assert!(!annotations.is_dirty());
}

#[test]
fn scenario_d_manual_insert_appends_selected_span() {
    let mut annotations = scenario_a();

    let index = annotations
        .insert_manual("Main St", PiiType::Address, 22)
        .expect("insert");

    assert_eq!(index, 1);
    assert_eq!(annotations.spans().len(), 2);
    assert!(annotations.selection().contains(1));
    let span = annotations.spans().get(1).unwrap();
    assert_eq!(span.range, CharRange::new(22, 29));
    assert_eq!(span.origin, Origin::Manual);
    assert_eq!(span.confidence, MANUAL_CONFIDENCE);
    assert!(annotations.is_dirty());
}

#[test]
fn manual_insert_requires_text_at_exact_offset() {
    // "123 Main St" starts at 18 and "Main St" at 22; offset 19 points into
    // "23 Main", so the text check must reject it.
    let mut annotations = scenario_a();
    assert_eq!(
        annotations.insert_manual("Main St", PiiType::Address, 19),
        Err(EditError::NotFound { offset: 19 })
    );
    assert_eq!(annotations.spans().len(), 1);
}

#[test]
fn scenario_e_overlapping_insert_is_rejected() {
    let mut annotations = scenario_a();
    let before = annotations.clone();

    let err = annotations
        .insert_manual("John", PiiType::Name, 0)
        .unwrap_err();

    assert_eq!(
        err,
        EditError::Overlap {
            range: CharRange::new(0, 4),
            existing: 0
        }
    );
    assert_eq!(annotations, before);
}

#[test]
fn overlap_rejection_is_symmetric() {
    let text = "abcdefghij";
    let first = ("cdef", 2);
    let second = ("efgh", 4);

    for (a, b) in [(first, second), (second, first)] {
        let mut annotations = Annotations::initialize(Document::new("doc", text), SpanSet::new());
        annotations.insert_manual(a.0, PiiType::Other, a.1).unwrap();
        assert!(matches!(
            annotations.insert_manual(b.0, PiiType::Other, b.1),
            Err(EditError::Overlap { existing: 0, .. })
        ));
    }
}

#[test]
fn touching_ranges_do_not_overlap() {
    let mut annotations = Annotations::initialize(Document::new("doc", "abcdef"), SpanSet::new());
    annotations.insert_manual("abc", PiiType::Other, 0).unwrap();
    annotations.insert_manual("def", PiiType::Other, 3).unwrap();
    assert_eq!(annotations.spans().len(), 2);
}

#[test]
fn insert_rejects_mismatch_out_of_bounds_and_empty() {
    let mut annotations = scenario_a();
    assert_eq!(
        annotations.insert_manual("Jane", PiiType::Name, 0),
        Err(EditError::NotFound { offset: 0 })
    );
    assert_eq!(
        annotations.insert_manual("St", PiiType::Address, 28),
        Err(EditError::NotFound { offset: 28 })
    );
    assert_eq!(
        annotations.insert_manual("", PiiType::Address, 3),
        Err(EditError::NotFound { offset: 3 })
    );
    assert_eq!(
        annotations.insert_manual("x", PiiType::Address, usize::MAX),
        Err(EditError::NotFound { offset: usize::MAX })
    );
    assert!(!annotations.is_dirty());
}

#[test]
fn repeated_text_is_located_by_offset_not_search() {
    let document = Document::new("doc", "Ann met Ann");
    let mut annotations = Annotations::initialize(document, SpanSet::new());

    annotations.insert_manual("Ann", PiiType::Name, 8).unwrap();
    annotations.insert_manual("Ann", PiiType::Name, 0).unwrap();

    let ranges: Vec<_> = annotations.spans().iter().map(|s| s.range).collect();
    assert_eq!(ranges, vec![CharRange::new(8, 11), CharRange::new(0, 3)]);
}

#[test]
fn inserting_after_deselect_keeps_count_dirty_even_when_selection_matches() {
    let document = Document::new("doc", "aa bb");
    let (spans, _) = SpanSet::from_detected(
        &document,
        vec![Span::detected("aa", PiiType::Other, CharRange::new(0, 2), 0.5)],
    );
    let mut annotations = Annotations::initialize(document, spans);
    annotations.toggle(0).unwrap();
    annotations.insert_manual("bb", PiiType::Other, 3).unwrap();
    annotations.toggle(1).unwrap();
    annotations.toggle(0).unwrap();

    // Same membership {0} as the baseline but one more span.
    assert_eq!(selected(&annotations), vec![0]);
    assert!(annotations.is_dirty());
}

#[test]
fn summary_is_recomputed_from_selection() {
    let mut annotations = scenario_a();
    annotations
        .insert_manual("123 Main St", PiiType::Address, 18)
        .unwrap();

    let summary = annotations.summary();
    assert_eq!(summary.active_count, 2);
    assert_eq!(summary.high_confidence_count, 1);
    assert_eq!(summary.per_type.get(&PiiType::Name), Some(&1));
    assert_eq!(summary.per_type.get(&PiiType::Address), Some(&1));

    annotations.toggle(0).unwrap();
    let summary = annotations.summary();
    assert_eq!(summary.active_count, 1);
    assert_eq!(summary.high_confidence_count, 0);
    assert_eq!(summary.per_type.get(&PiiType::Name), None);
}

#[test]
fn detected_spans_are_validated_before_render() {
    let document = Document::new("doc", "Jane Roe, 555-0100, jane@example.com");
    let detected = vec![
        Span::detected("Jane Roe", PiiType::Name, CharRange::new(0, 8), 0.97),
        Span::detected("Jane", PiiType::Name, CharRange::new(0, 4), 0.8),
        Span::detected("555-0100", PiiType::Phone, CharRange::new(10, 18), 1.4),
        Span::detected("nothing", PiiType::Other, CharRange::new(30, 99), 0.9),
        Span::detected("", PiiType::Other, CharRange::new(5, 5), 0.9),
        Span::detected("JANE@EXAMPLE.COM", PiiType::Email, CharRange::new(20, 36), 0.92),
    ];

    let (spans, rejected) = SpanSet::from_detected(&document, detected);

    assert_eq!(spans.len(), 3);
    let reasons: Vec<_> = rejected
        .iter()
        .map(|r| (r.source_index, r.reason.clone()))
        .collect();
    assert_eq!(
        reasons,
        vec![
            (1, RejectReason::OverlapsAccepted { accepted: 0 }),
            (3, RejectReason::OutOfBounds { char_len: 36 }),
            (4, RejectReason::EmptyRange),
        ]
    );
    assert_eq!(spans.get(1).unwrap().confidence, 1.0);
    assert_eq!(spans.get(2).unwrap().text, "jane@example.com");
}

#[test]
fn rendered_segments_round_trip_and_alternate() {
    let mut annotations = scenario_a();
    annotations
        .insert_manual("123", PiiType::Address, 18)
        .unwrap();
    annotations.insert_manual("St", PiiType::Address, 27).unwrap();
    annotations.toggle(0).unwrap();

    let segments = render(
        annotations.document(),
        annotations.spans(),
        annotations.selection(),
    );

    let joined: String = segments.iter().map(Segment::text).collect();
    assert_eq!(joined, TEXT);

    let mut last_start = 0;
    for pair in segments.windows(2) {
        assert!(!matches!(
            pair,
            [Segment::PlainText { .. }, Segment::PlainText { .. }]
        ));
    }
    for segment in &segments {
        if let Segment::Highlighted { span, .. } = segment {
            assert!(span.range.start >= last_start);
            last_start = span.range.start;
        }
    }

    let flags: Vec<_> = segments
        .iter()
        .filter_map(|segment| match segment {
            Segment::Highlighted {
                index, selected, ..
            } => Some((*index, *selected)),
            Segment::PlainText { .. } => None,
        })
        .collect();
    assert_eq!(flags, vec![(0, false), (1, true), (2, true)]);
}

#[test]
fn selection_all_covers_each_index() {
    let selection = SelectionState::all(3);
    assert_eq!(selection.indices().collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(selection.len(), 3);
}
