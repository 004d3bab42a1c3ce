use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use serde_json::Value;

use als_server::{MessageReader, MessageWriter};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-1.0e9f64..1.0e9).prop_map(Value::from),
        // Arbitrary unicode, Arabic text included.
        "\\PC*".prop_map(Value::from),
        Just(Value::from("اطبع(\"مرحبا\")")),
    ]
}

fn json_value() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(4, 32, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::from),
            prop::collection::hash_map("[a-zا-ي]{1,8}", inner, 0..6)
                .prop_map(|m| Value::from(serde_json::Map::from_iter(m))),
        ]
    })
}

proptest! {
    // Any JSON value survives frame + unframe unchanged.
    #[test]
    fn framing_round_trips_any_json(value in json_value()) {
        let buffer = SharedBuffer::default();
        let writer = MessageWriter::new(Box::new(buffer.clone()));
        writer.write_value(&value).unwrap();

        let mut reader = MessageReader::new(Box::new(Cursor::new(buffer.contents())));
        let payload = reader.read_frame().unwrap().expect("one frame");
        let parsed: Value = serde_json::from_slice(&payload).unwrap();
        prop_assert_eq!(parsed, value);
        prop_assert!(reader.read_frame().unwrap().is_none());
    }

    // A sequence of frames reads back in order with no interleaving.
    #[test]
    fn frame_sequences_round_trip(values in prop::collection::vec(json_value(), 1..8)) {
        let buffer = SharedBuffer::default();
        let writer = MessageWriter::new(Box::new(buffer.clone()));
        for value in &values {
            writer.write_value(value).unwrap();
        }

        let mut reader = MessageReader::new(Box::new(Cursor::new(buffer.contents())));
        for value in &values {
            let payload = reader.read_frame().unwrap().expect("frame");
            let parsed: Value = serde_json::from_slice(&payload).unwrap();
            prop_assert_eq!(&parsed, value);
        }
        prop_assert!(reader.read_frame().unwrap().is_none());
    }

    // Garbage bytes never panic the reader; they fail or parse.
    #[test]
    fn reader_never_panics_on_garbage(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut reader = MessageReader::new(Box::new(Cursor::new(bytes)));
        let _ = reader.read_frame();
    }
}
