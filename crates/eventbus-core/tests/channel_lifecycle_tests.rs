//! Channel registration, publisher removal and teardown behavior

mod test_utils;

use eventbus_core::{ChannelRegistration, ErrorKind, EventBus};
use test_utils::{method, object, signal, tag, TestListener, TestPublisher};

// ----------------------------------------------------------------------------
// Registration
// ----------------------------------------------------------------------------

#[test]
fn test_idempotent_registration() {
    let mut bus = EventBus::new();
    let channel = tag("Game.Combat.Damage");

    assert!(bus.register_channel(&ChannelRegistration::new(channel.clone(), false)));
    assert!(bus.register_channel(&ChannelRegistration::new(channel.clone(), false)));
    assert_eq!(bus.registered_channels(), vec![channel.clone()]);

    let err = bus
        .try_register_channel(&ChannelRegistration::new(channel.clone(), true))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OwnershipPolicyConflict);
    assert!(!bus.register_channel(&ChannelRegistration::new(channel.clone(), true)));

    let info = bus.channel_info(&channel).unwrap();
    assert!(!info.owns_publisher_callbacks);
}

#[test]
fn test_reregistration_keeps_bindings() {
    let mut bus = EventBus::new();
    let channel = tag("Game.Combat.Damage");
    let publisher = TestPublisher::new("publisher");
    let listener = TestListener::new("listener");

    assert!(bus.register_channel(&ChannelRegistration::new(channel.clone(), false)));
    assert!(bus.add_publisher(&channel, &object(&publisher), &signal("on_value_changed")));
    assert!(bus.add_listener(&channel, &object(&listener), &method("on_value")));
    assert!(bus.register_channel(&ChannelRegistration::new(channel.clone(), false)));

    publisher.fire(1.0);
    assert_eq!(listener.value_calls(), 1);
}

#[test]
fn test_operations_on_unregistered_channel_fail() {
    let mut bus = EventBus::new();
    let channel = tag("Game.Unknown");
    let publisher = TestPublisher::new("publisher");
    let listener = TestListener::new("listener");

    let err = bus
        .try_add_publisher(&channel, &object(&publisher), &signal("on_value_changed"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ChannelNotRegistered);

    assert!(!bus.add_listener(&channel, &object(&listener), &method("on_value")));
    assert!(!bus.remove_publisher(&channel, &object(&publisher)));
    assert!(!bus.remove_listener(&channel, &object(&listener), &method("on_value")));
    assert!(!bus.unregister_channel(&channel));
    assert!(!bus.is_channel_registered(&channel));
}

#[test]
fn test_invalid_tag_is_rejected_everywhere() {
    let mut bus = EventBus::new();
    let bad = tag("Game..Combat");
    let publisher = TestPublisher::new("publisher");

    assert!(!bus.register_channel(&ChannelRegistration::new(bad.clone(), false)));
    let err = bus
        .try_add_publisher(&bad, &object(&publisher), &signal("on_value_changed"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidChannel);
}

// ----------------------------------------------------------------------------
// Publisher Removal
// ----------------------------------------------------------------------------

#[test]
fn test_publisher_removal_halts_dispatch() {
    let mut bus = EventBus::new();
    let channel = tag("Game.Combat.Damage");
    let publisher = TestPublisher::new("publisher");
    let listener = TestListener::new("listener");

    assert!(bus.register_channel(&ChannelRegistration::new(channel.clone(), false)));
    assert!(bus.add_publisher(&channel, &object(&publisher), &signal("on_value_changed")));
    assert!(bus.add_listener(&channel, &object(&listener), &method("on_value")));

    assert_eq!(publisher.fire(4.0), 1);
    assert_eq!(listener.value_calls(), 1);

    assert!(bus.remove_publisher(&channel, &object(&publisher)));
    assert_eq!(publisher.fire(5.0), 0);
    assert_eq!(listener.value_calls(), 1);
    assert!(!publisher.on_value_changed.is_bound());

    // Second removal finds nothing
    assert!(!bus.remove_publisher(&channel, &object(&publisher)));
}

#[test]
fn test_removing_last_publisher_clears_signature() {
    let mut bus = EventBus::new();
    let channel = tag("Game.Combat.Damage");
    let publisher = TestPublisher::new("publisher");

    assert!(bus.register_channel(&ChannelRegistration::new(channel.clone(), false)));
    assert!(bus.add_publisher(&channel, &object(&publisher), &signal("on_value_changed")));
    assert!(bus.channel_info(&channel).unwrap().signature.is_some());

    assert!(bus.remove_publisher(&channel, &object(&publisher)));
    let info = bus.channel_info(&channel).unwrap();
    assert_eq!(info.signature, None);
    assert_eq!(info.signal_name, None);

    // A different shape may now take over the channel
    assert!(bus.add_publisher(&channel, &object(&publisher), &signal("on_pair")));
}

// ----------------------------------------------------------------------------
// Teardown
// ----------------------------------------------------------------------------

#[test]
fn test_unregister_leaves_no_callbacks() {
    let mut bus = EventBus::new();
    let channel = tag("Game.Combat.Damage");
    let first = TestPublisher::new("first");
    let second = TestPublisher::new("second");
    let listener = TestListener::new("listener");
    let other = TestListener::new("other");

    assert!(bus.register_channel(&ChannelRegistration::new(channel.clone(), false)));
    assert!(bus.add_publisher(&channel, &object(&first), &signal("on_value_changed")));
    assert!(bus.add_listener(&channel, &object(&listener), &method("on_value")));
    assert!(bus.add_listener(&channel, &object(&listener), &method("on_value_alt")));
    assert!(bus.add_publisher(&channel, &object(&second), &signal("on_value_changed")));
    assert!(bus.add_listener(&channel, &object(&other), &method("on_value")));

    assert_eq!(first.on_value_changed.bound_count(), 3);
    assert_eq!(second.on_value_changed.bound_count(), 3);

    assert!(bus.unregister_channel(&channel));
    assert!(!bus.is_channel_registered(&channel));
    assert_eq!(first.on_value_changed.bound_count(), 0);
    assert_eq!(second.on_value_changed.bound_count(), 0);

    first.fire(1.0);
    second.fire(1.0);
    assert_eq!(listener.value_calls(), 0);
    assert_eq!(other.value_calls(), 0);
}

#[test]
fn test_unregister_preserves_foreign_callbacks() {
    let mut bus = EventBus::new();
    let channel = tag("Game.Combat.Damage");
    let publisher = TestPublisher::new("publisher");
    let routed = TestListener::new("routed");
    let direct = TestListener::new("direct");

    // Subscribed outside the bus before routing starts
    publisher
        .on_value_changed
        .add(eventbus_core::Callback::new(&object(&direct), "on_value"));
    let baseline = publisher.on_value_changed.bound_count();

    assert!(bus.register_channel(&ChannelRegistration::new(channel.clone(), false)));
    assert!(bus.add_publisher(&channel, &object(&publisher), &signal("on_value_changed")));
    assert!(bus.add_listener(&channel, &object(&routed), &method("on_value")));
    assert_eq!(publisher.on_value_changed.bound_count(), baseline + 1);

    assert!(bus.unregister_channel(&channel));
    assert_eq!(publisher.on_value_changed.bound_count(), baseline);

    publisher.fire(2.0);
    assert_eq!(direct.value_calls(), 1);
    assert_eq!(routed.value_calls(), 0);
}

#[test]
fn test_reset_and_drop_unbind_everything() {
    let publisher = TestPublisher::new("publisher");
    let listener = TestListener::new("listener");

    {
        let mut bus = EventBus::new();
        for name in ["Game.A", "Game.B"] {
            let channel = tag(name);
            assert!(bus.register_channel(&ChannelRegistration::new(channel.clone(), false)));
            assert!(bus.add_publisher(&channel, &object(&publisher), &signal("on_value_changed")));
        }
        assert!(bus.add_listener(&tag("Game.A"), &object(&listener), &method("on_value")));
        assert!(bus.add_listener(&tag("Game.B"), &object(&listener), &method("on_value_alt")));
        assert_eq!(publisher.on_value_changed.bound_count(), 2);

        bus.reset();
        assert!(bus.registered_channels().is_empty());
        assert_eq!(publisher.on_value_changed.bound_count(), 0);

        let channel = tag("Game.A");
        assert!(bus.register_channel(&ChannelRegistration::new(channel.clone(), false)));
        assert!(bus.add_publisher(&channel, &object(&publisher), &signal("on_value_changed")));
        assert!(bus.add_listener(&channel, &object(&listener), &method("on_value")));
        assert_eq!(publisher.on_value_changed.bound_count(), 1);
    }

    // Bus dropped at end of scope
    assert_eq!(publisher.on_value_changed.bound_count(), 0);
    publisher.fire(1.0);
    assert_eq!(listener.value_calls(), 0);
}

#[test]
fn test_router_keeps_no_strong_references() {
    let mut bus = EventBus::new();
    let channel = tag("Game.Combat.Damage");
    let publisher = TestPublisher::new("publisher");
    let listener = TestListener::new("listener");

    assert!(bus.register_channel(&ChannelRegistration::new(channel.clone(), false)));
    assert!(bus.add_publisher(&channel, &object(&publisher), &signal("on_value_changed")));
    assert!(bus.add_listener(&channel, &object(&listener), &method("on_value")));

    assert_eq!(std::sync::Arc::strong_count(&publisher), 1);
    assert_eq!(std::sync::Arc::strong_count(&listener), 1);
}
