//! Touch channels fed by the driver's poll.

use log::debug;
use std::fmt;

/// Per-channel threshold pair written to the chip during setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub touch: u8,
    pub release: u8,
}

/// A consumer of one electrode's touch bit.
///
/// The driver keeps no edge state; implementations see the raw bit on every
/// poll and decide for themselves what counts as a transition.
///
/// `setup` and `process` run while the driver holds its channel list.
/// They may use the driver's GPIO helpers, but must not register channels.
pub trait Channel {
    /// Called once during driver setup, before thresholds are written.
    fn setup(&mut self) {}

    /// Receives the current touch bit of this channel.
    fn process(&mut self, touched: bool);

    /// Threshold override for this channel, if any.
    fn thresholds(&self) -> Option<Thresholds> {
        None
    }
}

/// Transition reported by a [`TouchChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEvent {
    Touched,
    Released,
}

/// A binary touch sensor on one electrode.
///
/// Reports a [`TouchEvent`] to its listener whenever the polled bit differs
/// from the last one seen. The first poll always reports.
pub struct TouchChannel {
    name: String,
    thresholds: Option<Thresholds>,
    state: Option<bool>,
    listener: Option<Box<dyn FnMut(TouchEvent)>>,
}

impl TouchChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            thresholds: None,
            state: None,
            listener: None,
        }
    }

    /// Overrides the driver-wide thresholds for this electrode.
    pub fn with_thresholds(mut self, touch: u8, release: u8) -> Self {
        self.thresholds = Some(Thresholds { touch, release });
        self
    }

    /// Installs the callback receiving touch transitions.
    pub fn on_event<F>(mut self, listener: F) -> Self
    where
        F: FnMut(TouchEvent) + 'static,
    {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last polled state, `None` before the first poll.
    pub fn state(&self) -> Option<bool> {
        self.state
    }
}

impl Channel for TouchChannel {
    fn process(&mut self, touched: bool) {
        if self.state == Some(touched) {
            return;
        }
        self.state = Some(touched);
        let event = if touched {
            TouchEvent::Touched
        } else {
            TouchEvent::Released
        };
        debug!("'{}': {:?}", self.name, event);
        if let Some(listener) = self.listener.as_mut() {
            listener(event);
        }
    }

    fn thresholds(&self) -> Option<Thresholds> {
        self.thresholds
    }
}

impl fmt::Debug for TouchChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TouchChannel")
            .field("name", &self.name)
            .field("thresholds", &self.thresholds)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// What sits behind a registered electrode index.
pub(crate) enum ChannelKind {
    Touch(Box<dyn Channel>),
    /// Electrode repurposed as GPIO; its bit lands in the input shadow mask.
    Gpio,
}

pub(crate) struct Registration {
    pub(crate) index: u8,
    pub(crate) kind: ChannelKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn reports_only_transitions() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let mut ch = TouchChannel::new("pad").on_event(move |e| sink.borrow_mut().push(e));

        for bit in [false, false, true, true, true, false] {
            ch.process(bit);
        }

        assert_eq!(
            *events.borrow(),
            vec![TouchEvent::Released, TouchEvent::Touched, TouchEvent::Released]
        );
        assert_eq!(ch.state(), Some(false));
    }

    #[test]
    fn thresholds_default_to_driver_values() {
        assert_eq!(TouchChannel::new("a").thresholds(), None);
        assert_eq!(
            TouchChannel::new("b").with_thresholds(40, 20).thresholds(),
            Some(Thresholds {
                touch: 40,
                release: 20
            })
        );
    }
}
