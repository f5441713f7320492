//! Statically typed channel API
//!
//! A [`ChannelDef`] ties a channel tag, a publisher type and one of its
//! signal fields together at compile time, and [`ListenerMethod`] ties a
//! method name to the listener type that declares it. Both forward to the
//! dynamic [`EventBus`] operations and obey exactly the same rules.

use core::marker::PhantomData;
use std::sync::Arc;

use crate::bus::EventBus;
use crate::errors::EventBusResult;
use crate::object::{BusObject, ObjectRef};
use crate::signal::{MulticastSignal, Value};
use crate::types::{ChannelRegistration, ChannelTag, ListenerBinding, PublisherBinding};

// ----------------------------------------------------------------------------
// Channel Definitions
// ----------------------------------------------------------------------------

/// Compile-time description of a channel and the signal that feeds it
pub trait ChannelDef {
    type Publisher: BusObject;

    /// Name of the signal member in the publisher's class table
    const SIGNAL_NAME: &'static str;

    fn channel_tag() -> ChannelTag;

    fn signal(publisher: &Self::Publisher) -> &MulticastSignal;
}

/// Declares a unit struct implementing [`ChannelDef`]
///
/// The signal field must also be registered under the same name in the
/// publisher's class table.
///
/// ```ignore
/// declare_channel!(pub HealthChanged: StatsPublisher => "Toy.Stats.HealthChanged", on_health_changed);
/// ```
#[macro_export]
macro_rules! declare_channel {
    ($(#[$meta:meta])* $vis:vis $name:ident : $publisher:ty => $tag:expr, $signal:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $name;

        impl $crate::typed::ChannelDef for $name {
            type Publisher = $publisher;

            const SIGNAL_NAME: &'static str = stringify!($signal);

            fn channel_tag() -> $crate::types::ChannelTag {
                $crate::types::ChannelTag::new($tag)
            }

            fn signal(publisher: &Self::Publisher) -> &$crate::signal::MulticastSignal {
                &publisher.$signal
            }
        }
    };
}

// ----------------------------------------------------------------------------
// Listener Methods
// ----------------------------------------------------------------------------

/// Method name checked against listener type `L`
pub struct ListenerMethod<L> {
    name: &'static str,
    _listener: PhantomData<fn(&L)>,
}

impl<L> ListenerMethod<L> {
    /// Use [`listener_method!`] instead, which verifies the method exists
    #[doc(hidden)]
    pub const fn new_unchecked(name: &'static str) -> Self {
        Self {
            name,
            _listener: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn binding(&self) -> ListenerBinding {
        ListenerBinding::new(self.name)
    }
}

impl<L> Clone for ListenerMethod<L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L> Copy for ListenerMethod<L> {}

impl<L> core::fmt::Debug for ListenerMethod<L> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("ListenerMethod").field(&self.name).finish()
    }
}

/// Builds a [`ListenerMethod`]; fails to compile when `Type::method` does not exist
#[macro_export]
macro_rules! listener_method {
    ($listener:ty, $method:ident) => {{
        let _ = <$listener>::$method;
        $crate::typed::ListenerMethod::<$listener>::new_unchecked(stringify!($method))
    }};
}

// ----------------------------------------------------------------------------
// Typed Channel
// ----------------------------------------------------------------------------

/// Typed front end for the channel described by `D`
pub struct TypedChannel<D>(PhantomData<D>);

impl<D: ChannelDef> TypedChannel<D> {
    pub fn tag() -> ChannelTag {
        D::channel_tag()
    }

    pub fn register(bus: &mut EventBus, owns_publisher_callbacks: bool) -> bool {
        bus.register_channel(&ChannelRegistration::new(D::channel_tag(), owns_publisher_callbacks))
    }

    pub fn try_add_publisher(bus: &mut EventBus, publisher: &Arc<D::Publisher>) -> EventBusResult<()> {
        let object: ObjectRef = publisher.clone();
        bus.try_add_publisher(&D::channel_tag(), &object, &PublisherBinding::new(D::SIGNAL_NAME))
    }

    pub fn add_publisher(bus: &mut EventBus, publisher: &Arc<D::Publisher>) -> bool {
        let object: ObjectRef = publisher.clone();
        bus.add_publisher(&D::channel_tag(), &object, &PublisherBinding::new(D::SIGNAL_NAME))
    }

    pub fn remove_publisher(bus: &mut EventBus, publisher: &Arc<D::Publisher>) -> bool {
        let object: ObjectRef = publisher.clone();
        bus.remove_publisher(&D::channel_tag(), &object)
    }

    pub fn try_add_listener<L: BusObject>(
        bus: &mut EventBus,
        listener: &Arc<L>,
        method: ListenerMethod<L>,
    ) -> EventBusResult<()> {
        let object: ObjectRef = listener.clone();
        bus.try_add_listener(&D::channel_tag(), &object, &method.binding())
    }

    pub fn add_listener<L: BusObject>(
        bus: &mut EventBus,
        listener: &Arc<L>,
        method: ListenerMethod<L>,
    ) -> bool {
        let object: ObjectRef = listener.clone();
        bus.add_listener(&D::channel_tag(), &object, &method.binding())
    }

    pub fn remove_listener<L: BusObject>(
        bus: &mut EventBus,
        listener: &Arc<L>,
        method: ListenerMethod<L>,
    ) -> bool {
        let object: ObjectRef = listener.clone();
        bus.remove_listener(&D::channel_tag(), &object, &method.binding())
    }

    /// Fires the channel's signal on `publisher`
    pub fn broadcast(publisher: &D::Publisher, args: &[Value]) -> usize {
        D::signal(publisher).broadcast(args)
    }
}
