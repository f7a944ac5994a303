mod support;

use blobscope::{CallbackTable, Error, Record, Session, Source, Value};
use support::{fixture, ints, text};

fn session() -> (Session, support::Offsets) {
    support::init();
    let (bytes, offsets) = fixture();

    let mut session = Session::new();
    session.install(Source::from_vec("fixture", bytes));

    (session, offsets)
}

fn record(value: &Value) -> &Record {
    value.as_record().unwrap()
}

#[test]
fn nested_structs() {
    let (mut session, _) = session();

    session.declare("one", "u8:aaa u16:bbb").unwrap();
    session.declare("two", "u32:ccc i16:ddd").unwrap();
    session.declare("three", "one:xxx two:yyy").unwrap();

    let values = session.read("three").unwrap();
    assert_eq!(values.len(), 1);
    assert_eq!(
        values[0].to_string(),
        "{xxx: {aaa: 1, bbb: 2}, yyy: {ccc: 3, ddd: -5}}"
    );
    assert_eq!(session.pos(), Some(9));

    let three = record(&values[0]);
    assert_eq!(record(three.get("xxx").unwrap()).field::<u16>("bbb").unwrap(), 2);
    assert_eq!(record(three.get("yyy").unwrap()).field::<i16>("ddd").unwrap(), -5);
}

#[test]
fn struct_arrays_and_strings() {
    let (mut session, offsets) = session();

    session.declare("one", "u32*8:aaa str#2*3:bbb str*3:ccc").unwrap();
    session.set_pos(offsets.u32_array).unwrap();

    let one = session.read_record("one").unwrap();
    assert_eq!(one.get("aaa"), Some(&ints(1000..1008)));
    assert_eq!(one.get("bbb"), Some(&text(&["x1", "x2", "x3"])));
    assert_eq!(one.get("ccc"), Some(&text(&["y1", "y2", "y3"])));
    assert_eq!(session.pos(), Some(offsets.fixed_wstrs));
}

#[test]
fn struct_wide_strings() {
    let (mut session, offsets) = session();

    session.declare("one", "wstr#3*4:bbb wstr*3:ccc").unwrap();
    session.set_pos(offsets.fixed_wstrs).unwrap();

    let one = session.read_record("one").unwrap();
    assert_eq!(one.get("bbb"), Some(&text(&["Раз", "Два", "Гоп", "Упс"])));
    assert_eq!(one.get("ccc"), Some(&text(&["Джаз", "Рок", "Классика"])));
    assert_eq!(session.pos(), Some(offsets.end));
}

#[test]
fn arrays_of_structs() {
    let (mut session, offsets) = session();

    session.declare("one", "u32*4:aaa").unwrap();
    session.set_pos(offsets.u32_array).unwrap();

    let values = session.read("one*2").unwrap();
    let [Value::Array(pair)] = values.as_slice() else {
        panic!("expected one array, got {values:?}");
    };

    assert_eq!(record(&pair[0]).get("aaa"), Some(&ints(1000..1004)));
    assert_eq!(record(&pair[1]).get("aaa"), Some(&ints(1004..1008)));
}

#[test]
fn voids() {
    let (mut session, _) = session();

    let values = session.read("void#1 void#2 u32 i16").unwrap();
    assert_eq!(values, [Value::Int(3), Value::Int(-5)]);

    session.set_pos(0).unwrap();
    session.declare("one", "u8:aaa void#2*3 i16:bbb").unwrap();
    let one = session.read_record("one").unwrap();
    assert_eq!(one.to_string(), "{aaa: 1, bbb: -5}");
    assert_eq!(session.pos(), Some(9));
}

#[test]
fn callbacks() {
    let (mut session, _) = session();

    session.set_callbacks(
        CallbackTable::new()
            .with("f2", || Value::Int(42))
            .with("f3", || Value::Int(37)),
    );
    session.declare("one", "@f2:aaa @f2:bbb @f3*4:ccc").unwrap();

    let one = session.read_record("one").unwrap();
    assert_eq!(one.to_string(), "{aaa: 42, bbb: 42, ccc: [37, 37, 37, 37]}");
    assert_eq!(session.pos(), Some(0));

    let err = session.read("u8 @f4").unwrap_err();
    assert!(matches!(err, Error::CallbackNotDefined(name) if name == "f4"));
    assert_eq!(session.pos(), Some(0));
}

#[test]
fn closure_callbacks() {
    let (mut session, _) = session();

    let mut table = CallbackTable::new();
    table.insert("pair", || vec![Value::Int(1), Value::Int(2)]);
    table.insert("empty", Vec::new);
    session.set_callbacks(table);

    assert!(matches!(
        session.read("@pair"),
        Err(Error::CallbackArity { count: 2, .. })
    ));
    assert!(matches!(
        session.read("@empty"),
        Err(Error::CallbackArity { count: 0, .. })
    ));
}

#[test]
fn circular_declarations() {
    let (mut session, _) = session();

    assert!(matches!(session.declare("a", "a:x"), Err(Error::SelfReference(_))));
    assert!(matches!(
        session.declare("a", "b:x"),
        Err(Error::MissingDefinition { .. })
    ));

    session.declare("a", "u8:x").unwrap();
    session.declare("b", "a:x").unwrap();
    assert!(matches!(
        session.declare("a", "b:x"),
        Err(Error::CircularDefinition { .. })
    ));

    assert_eq!(session.show("a").unwrap(), "1) u8:x\n");
    assert_eq!(session.show("b").unwrap(), "1) a:x\n");
}

#[test]
fn redeclared_structs_resolve_by_name() {
    let (mut session, _) = session();

    session.declare("inner", "u8:a").unwrap();
    session.declare("outer", "inner:x").unwrap();
    session.declare("inner", "u8:a u16:b").unwrap();

    let outer = session.read_record("outer").unwrap();
    assert_eq!(outer.to_string(), "{x: {a: 1, b: 2}}");
}

#[test]
fn errors_leave_session_usable() {
    let (mut session, _) = session();
    session.declare("one", "u8:aaa").unwrap();

    assert!(matches!(session.read("u8#2"), Err(Error::UnexpectedToken(_))));
    assert!(matches!(session.read("u8 ?"), Err(Error::UnknownToken(_))));
    assert!(matches!(session.read("void"), Err(Error::VoidWithoutLength)));
    assert!(matches!(session.read("two"), Err(Error::StructNotFound(_))));
    assert!(matches!(session.declare("two", "u8:a:b"), Err(Error::UnexpectedToken(_))));
    assert!(matches!(session.set_pos(1000), Err(Error::InvalidPosition { .. })));
    assert!(matches!(session.declare("two", "u8:a u16:a"), Err(Error::DuplicateField(_))));
    assert!(!session.registry().contains("two"));

    session.declare("empty", "").unwrap();
    assert!(matches!(
        session.read("u8 empty*18446744073709551615"),
        Err(Error::EmptyRepeat { .. })
    ));

    assert_eq!(session.pos(), Some(0));
    assert_eq!(session.read("one").unwrap()[0].to_string(), "{aaa: 1}");
}

#[test]
fn repeated_descriptors() {
    let (mut session, _) = session();

    assert_eq!(session.read("u8").unwrap(), [Value::Int(1)]);
    assert_eq!(session.read("u8").unwrap(), [Value::Int(2)]);
    assert_eq!(session.read("u8").unwrap(), [Value::Int(0)]);
}
