use flatwire_envelope::{
    Content, ContentRef, ContentType, Destination, DestinationArgs, DestinationKind, Envelope,
    EnvelopeArgs, EnvelopeBuilder, ErrorContent,
};
use flatwire_table::{Builder, Table};

const DESTINATION: usize = 0;
const CONTENT_TYPE: usize = 1;
const CONTENT: usize = 2;
const ID: usize = 3;

/// What one envelope field reads back as, for comparison across buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Observed {
    Destination(Option<String>),
    ContentType(u8),
    Content(Option<u16>),
    Id(i32),
}

/// Build an envelope slot by slot, skipping the fields whose bit is clear.
fn encode_with(present: [bool; 4]) -> Vec<u8> {
    let mut builder = Builder::new();
    let destination = present[DESTINATION].then(|| {
        Destination::create(
            &mut builder,
            &DestinationArgs { kind: DestinationKind::Topic, target: Some("/paxmon") },
        )
    });
    let content = present[CONTENT].then(|| {
        ErrorContent::create(
            &mut builder,
            &flatwire_envelope::ErrorArgs { code: 500, category: None, reason: None },
        )
    });

    let mut envelope = EnvelopeBuilder::new(&mut builder);
    if present[ID] {
        envelope.add_id(1_234_567);
    }
    if let Some(content) = content {
        envelope.add_content(content);
    }
    if let Some(destination) = destination {
        envelope.add_destination(destination);
    }
    if present[CONTENT_TYPE] {
        envelope.add_content_type(ContentType::Error as u8);
    }
    let root = envelope.finish();
    builder.finish(root);
    builder.into_finished_data()
}

fn observe(bytes: &[u8], field: usize) -> Observed {
    let envelope = Envelope::wrap(bytes).expect("wrap");
    match field {
        DESTINATION => Observed::Destination(
            envelope.destination().and_then(|d| d.target()).map(str::to_owned),
        ),
        CONTENT_TYPE => Observed::ContentType(envelope.content_type()),
        CONTENT => Observed::Content(
            envelope.content_as::<ErrorContent<'_>>().expect("content").map(|c| c.code()),
        ),
        _ => Observed::Id(envelope.id()),
    }
}

fn expected(field: usize, present: bool) -> Observed {
    match (field, present) {
        (DESTINATION, true) => Observed::Destination(Some("/paxmon".to_owned())),
        (DESTINATION, false) => Observed::Destination(None),
        (CONTENT_TYPE, true) => Observed::ContentType(ContentType::Error as u8),
        (CONTENT_TYPE, false) => Observed::ContentType(0),
        (CONTENT, true) => Observed::Content(Some(500)),
        (CONTENT, false) => Observed::Content(None),
        (_, true) => Observed::Id(1_234_567),
        (_, false) => Observed::Id(0),
    }
}

#[test]
fn tag_two_and_id_forty_two_write_two_slots() {
    let mut builder = Builder::new();
    let mut envelope = EnvelopeBuilder::new(&mut builder);
    envelope.add_content_type(2);
    envelope.add_id(42);
    let root = envelope.finish();
    builder.finish(root);

    let envelope = Envelope::wrap(builder.finished_data()).expect("wrap");
    let vtable = envelope.table().vtable().expect("vtable");
    assert_eq!(vtable.present_slots().count(), 2);
    assert_eq!(vtable.field_offset(0), 0);
    assert_ne!(vtable.field_offset(1), 0);
    assert_eq!(vtable.field_offset(2), 0);
    assert_ne!(vtable.field_offset(3), 0);

    assert!(envelope.destination().is_none());
    assert_eq!(envelope.content_type(), 2);
    assert_eq!(envelope.content_as::<Table<'_>>(), Ok(None));
    assert_eq!(envelope.id(), 42);
}

#[test]
fn every_presence_combination_reads_back() {
    for mask in 0_u8..16 {
        let present = [mask & 1 != 0, mask & 2 != 0, mask & 4 != 0, mask & 8 != 0];
        let bytes = encode_with(present);
        for field in [DESTINATION, CONTENT_TYPE, CONTENT, ID] {
            assert_eq!(
                observe(&bytes, field),
                expected(field, present[field]),
                "mask {mask:04b}, field {field}"
            );
        }
    }
}

#[test]
fn omitting_one_field_leaves_the_others_untouched() {
    let full = encode_with([true; 4]);
    for omitted in [DESTINATION, CONTENT_TYPE, CONTENT, ID] {
        let mut present = [true; 4];
        present[omitted] = false;
        let bytes = encode_with(present);
        for observed in [DESTINATION, CONTENT_TYPE, CONTENT, ID] {
            if observed == omitted {
                assert_eq!(observe(&bytes, observed), expected(observed, false));
            } else {
                assert_eq!(
                    observe(&bytes, observed),
                    observe(&full, observed),
                    "omitting {omitted} changed {observed}"
                );
            }
        }
    }
}

#[test]
fn repeated_reads_are_identical() {
    let bytes = encode_with([true; 4]);
    let envelope = Envelope::wrap(&bytes).expect("wrap");
    assert_eq!(envelope.destination(), envelope.destination());
    assert_eq!(envelope.content_type(), envelope.content_type());
    assert_eq!(envelope.content_as::<Table<'_>>(), envelope.content_as::<Table<'_>>());
    assert_eq!(envelope.content(), envelope.content());
    assert_eq!(envelope.id(), envelope.id());
    assert_eq!(Envelope::wrap(&bytes), Ok(envelope));
}

#[test]
fn envelopes_with_the_same_shape_share_a_vtable() {
    let mut builder = Builder::new();
    let first = Envelope::create(&mut builder, &EnvelopeArgs { id: 1, ..Default::default() });
    let vtables = builder.vtable_count();
    let used = builder.used_space();
    let second = Envelope::create(&mut builder, &EnvelopeArgs { id: 2, ..Default::default() });
    assert_eq!(builder.vtable_count(), vtables);
    assert!(builder.used_space() - used < used);
    assert_ne!(first, second);

    builder.finish(second);
    assert_eq!(Envelope::wrap(builder.finished_data()).expect("wrap").id(), 2);
}

#[test]
fn finished_buffer_is_readable_from_many_threads() {
    let mut builder = Builder::new();
    let content = ContentRef::no_message(&mut builder);
    let root = Envelope::create(
        &mut builder,
        &EnvelopeArgs { destination: None, content: Some(content), id: 77 },
    );
    builder.finish(root);
    let bytes = builder.into_finished_data();
    let envelope = Envelope::wrap(&bytes).expect("wrap");

    std::thread::scope(|scope| {
        let readers: Vec<_> = (0..4)
            .map(|_| scope.spawn(move || (envelope.id(), envelope.content())))
            .collect();
        for reader in readers {
            let (id, content) = reader.join().expect("reader thread");
            assert_eq!(id, 77);
            assert_eq!(content, Ok(Content::NoMessage));
        }
    });
}
