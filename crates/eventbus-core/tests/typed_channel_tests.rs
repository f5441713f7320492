//! Typed channel API forwarding to the dynamic router

mod test_utils;

use eventbus_core::{
    declare_channel, listener_method, ChannelDef, ErrorKind, EventBus, TypedChannel, Value,
};
use test_utils::{TestListener, TestPublisher};

declare_channel!(
    /// Float value changes from test publishers
    ValueChanged: TestPublisher => "Test.Value.Changed", on_value_changed
);

declare_channel!(PairEmitted: TestPublisher => "Test.Pair.Emitted", on_pair);

#[test]
fn test_channel_definition() {
    assert_eq!(ValueChanged::channel_tag().as_str(), "Test.Value.Changed");
    assert_eq!(<ValueChanged as ChannelDef>::SIGNAL_NAME, "on_value_changed");
    assert_eq!(TypedChannel::<PairEmitted>::tag().as_str(), "Test.Pair.Emitted");
}

#[test]
fn test_typed_round_trip() {
    let mut bus = EventBus::new();
    let publisher = TestPublisher::new("publisher");
    let listener = TestListener::new("listener");

    assert!(TypedChannel::<ValueChanged>::register(&mut bus, false));
    assert!(TypedChannel::<ValueChanged>::add_publisher(&mut bus, &publisher));
    assert!(TypedChannel::<ValueChanged>::add_listener(
        &mut bus,
        &listener,
        listener_method!(TestListener, on_value)
    ));

    assert_eq!(
        TypedChannel::<ValueChanged>::broadcast(&publisher, &[Value::Float(2.0)]),
        1
    );
    assert_eq!(listener.value_calls(), 1);

    assert!(TypedChannel::<ValueChanged>::remove_listener(
        &mut bus,
        &listener,
        listener_method!(TestListener, on_value)
    ));
    assert!(TypedChannel::<ValueChanged>::remove_publisher(&mut bus, &publisher));
    assert!(!publisher.on_value_changed.is_bound());
}

#[test]
fn test_typed_api_shares_signature_rules() {
    let mut bus = EventBus::new();
    let publisher = TestPublisher::new("publisher");
    let listener = TestListener::new("listener");

    assert!(TypedChannel::<PairEmitted>::register(&mut bus, false));
    assert!(TypedChannel::<PairEmitted>::add_publisher(&mut bus, &publisher));

    let err = TypedChannel::<PairEmitted>::try_add_listener(
        &mut bus,
        &listener,
        listener_method!(TestListener, on_value),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SignatureMismatch);

    // Compiles, but the method is not exposed for binding
    let err = TypedChannel::<PairEmitted>::try_add_listener(
        &mut bus,
        &listener,
        listener_method!(TestListener, internal_only),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ListenerMethodNotBindable);

    assert!(TypedChannel::<PairEmitted>::add_listener(
        &mut bus,
        &listener,
        listener_method!(TestListener, on_pair)
    ));
}

#[test]
fn test_typed_and_dynamic_views_agree() {
    let mut bus = EventBus::new();
    let publisher = TestPublisher::new("publisher");

    assert!(TypedChannel::<ValueChanged>::register(&mut bus, true));
    assert!(bus.is_channel_registered(&ValueChanged::channel_tag()));
    assert!(!TypedChannel::<ValueChanged>::register(&mut bus, false));

    let err = TypedChannel::<PairEmitted>::try_add_publisher(&mut bus, &publisher).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ChannelNotRegistered);
}

#[test]
fn test_listener_method_name() {
    let method = listener_method!(TestListener, on_value_alt);
    assert_eq!(method.name(), "on_value_alt");
    assert_eq!(method.binding().method_name, "on_value_alt");
}
