//! Opportunistic cleanup of dead and garbage-marked objects

mod test_utils;

use eventbus_core::{BusObject, ChannelRegistration, ErrorKind, EventBus};
use test_utils::{method, object, signal, tag, TestListener, TestPublisher};

fn bus_with_channel(name: &str, owns: bool) -> EventBus {
    let mut bus = EventBus::new();
    assert!(bus.register_channel(&ChannelRegistration::new(name, owns)));
    bus
}

#[test]
fn test_dropped_listener_is_purged_on_next_mutation() {
    let channel = tag("Game.Combat.Damage");
    let mut bus = bus_with_channel("Game.Combat.Damage", false);
    let publisher = TestPublisher::new("publisher");
    let listener = TestListener::new("listener");

    assert!(bus.add_publisher(&channel, &object(&publisher), &signal("on_value_changed")));
    assert!(bus.add_listener(&channel, &object(&listener), &method("on_value")));
    assert_eq!(publisher.on_value_changed.bound_count(), 1);

    drop(listener);

    // Dead target is skipped by the signal but not yet purged
    assert_eq!(publisher.fire(1.0), 0);
    assert_eq!(bus.channel_info(&channel).unwrap().listeners, 1);

    assert!(bus.add_publisher(&channel, &object(&publisher), &signal("on_value_changed")));
    assert_eq!(bus.channel_info(&channel).unwrap().listeners, 0);
    assert_eq!(publisher.on_value_changed.bound_count(), 0);
}

#[test]
fn test_garbage_listener_is_purged_and_never_invoked() {
    let channel = tag("Game.Combat.Damage");
    let mut bus = bus_with_channel("Game.Combat.Damage", false);
    let publisher = TestPublisher::new("publisher");
    let listener = TestListener::new("listener");

    assert!(bus.add_publisher(&channel, &object(&publisher), &signal("on_value_changed")));
    assert!(bus.add_listener(&channel, &object(&listener), &method("on_value")));
    publisher.fire(1.0);
    assert_eq!(listener.value_calls(), 1);

    listener.header().mark_as_garbage();
    assert!(bus.add_publisher(&channel, &object(&publisher), &signal("on_value_changed")));

    assert_eq!(bus.channel_info(&channel).unwrap().listeners, 0);
    assert!(!publisher.on_value_changed.is_bound());
    publisher.fire(2.0);
    assert_eq!(listener.value_calls(), 1);
}

#[test]
fn test_garbage_objects_are_rejected() {
    let channel = tag("Game.Combat.Damage");
    let mut bus = bus_with_channel("Game.Combat.Damage", false);
    let publisher = TestPublisher::new("publisher");
    let listener = TestListener::new("listener");
    publisher.header().mark_as_garbage();
    listener.header().mark_as_garbage();

    let err = bus
        .try_add_publisher(&channel, &object(&publisher), &signal("on_value_changed"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidObject);

    let err = bus
        .try_add_listener(&channel, &object(&listener), &method("on_value"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidObject);
}

#[test]
fn test_dead_publisher_is_dropped_and_signature_recomputed() {
    let channel = tag("Game.Combat.Damage");
    let mut bus = bus_with_channel("Game.Combat.Damage", false);
    let publisher = TestPublisher::new("publisher");
    let listener = TestListener::new("listener");

    assert!(bus.add_publisher(&channel, &object(&publisher), &signal("on_value_changed")));
    drop(publisher);

    // With the only publisher gone the channel has no canonical shape
    assert!(bus.add_listener(&channel, &object(&listener), &method("on_no_args")));
    let info = bus.channel_info(&channel).unwrap();
    assert_eq!(info.publishers, 0);
    assert_eq!(info.signature, None);
}

#[test]
fn test_garbage_publisher_is_detached_from_listeners() {
    let channel = tag("Game.Combat.Damage");
    let mut bus = bus_with_channel("Game.Combat.Damage", false);
    let publisher = TestPublisher::new("publisher");
    let listener = TestListener::new("listener");
    let other = TestListener::new("other");

    assert!(bus.add_publisher(&channel, &object(&publisher), &signal("on_value_changed")));
    assert!(bus.add_listener(&channel, &object(&listener), &method("on_value")));

    publisher.header().mark_as_garbage();
    assert!(bus.add_listener(&channel, &object(&other), &method("on_value")));

    assert_eq!(bus.channel_info(&channel).unwrap().publishers, 0);
    assert_eq!(publisher.on_value_changed.bound_count(), 0);
}

#[test]
fn test_stale_entries_do_not_block_new_bindings() {
    let channel = tag("Game.Combat.Damage");
    let mut bus = bus_with_channel("Game.Combat.Damage", true);
    let publisher = TestPublisher::new("publisher");

    // An incompatible listener that dies must stop blocking publishers
    let blocker = TestListener::new("blocker");
    assert!(bus.add_listener(&channel, &object(&blocker), &method("on_no_args")));
    assert!(!bus.add_publisher(&channel, &object(&publisher), &signal("on_value_changed")));
    drop(blocker);

    assert!(bus.add_publisher(&channel, &object(&publisher), &signal("on_value_changed")));
}

#[test]
fn test_cleanup_compacts_dead_callbacks_from_live_signals() {
    let channel = tag("Game.Combat.Damage");
    let mut bus = bus_with_channel("Game.Combat.Damage", false);
    let publisher = TestPublisher::new("publisher");
    let survivor = TestListener::new("survivor");

    {
        let direct = TestListener::new("direct");
        publisher
            .on_value_changed
            .add(eventbus_core::Callback::new(&object(&direct), "on_value"));
    }
    assert_eq!(publisher.on_value_changed.bound_count(), 1);

    assert!(bus.add_publisher(&channel, &object(&publisher), &signal("on_value_changed")));
    assert!(bus.add_listener(&channel, &object(&survivor), &method("on_value")));
    assert_eq!(publisher.on_value_changed.bound_count(), 1);
    assert_eq!(publisher.fire(1.0), 1);
}
