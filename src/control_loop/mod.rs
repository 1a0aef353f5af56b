//! Fixed-step control loop: a publisher that notifies registered
//! subscribers with the elapsed duration of every tick.
//!
//! Time-based logic (idle-timeout detection, indicator animation) hangs off
//! the publisher instead of owning its own timer. The publisher is driven by
//! a fixed-period task external to this module that accounts for its own
//! execution jitter and calls [`TickPublisher::notify`] once per period
//! (nominally every 10 ms).
use embassy_time::Duration;

use crate::error::AttachError;

/// Receiver of fixed time step update notifications.
pub trait TickSubscriber {
    /// Called once per control-loop tick with the elapsed duration.
    fn update(&mut self, elapsed: Duration);
}

/// Key handed out by [`TickPublisher::attach`], used to detach again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subscription(u32);

struct Entry<'a> {
    key: u32,
    subscriber: &'a mut dyn TickSubscriber,
}

/// Fixed-capacity, insertion-ordered set of tick subscribers.
///
/// Delivery order is attach order. The publisher does not own subscriber
/// lifetime and never invokes a subscriber outside of [`notify`].
///
/// [`notify`]: TickPublisher::notify
pub struct TickPublisher<'a, const N: usize> {
    entries: [Option<Entry<'a>>; N],
    len: usize,
    next_key: u32,
}

impl<'a, const N: usize> Default for TickPublisher<'a, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> TickPublisher<'a, N> {
    /// Publisher with no subscribers attached.
    pub fn new() -> Self {
        Self {
            entries: core::array::from_fn(|_| None),
            len: 0,
            next_key: 0,
        }
    }

    /// Attach a subscriber at the back of the delivery order.
    pub fn attach(
        &mut self,
        subscriber: &'a mut dyn TickSubscriber,
    ) -> Result<Subscription, AttachError> {
        if self.len == N {
            return Err(AttachError::CapacityExhausted);
        }
        let key = self.next_key;
        self.next_key += 1;
        self.entries[self.len] = Some(Entry { key, subscriber });
        self.len += 1;
        Ok(Subscription(key))
    }

    /// Detach a previously attached subscriber, releasing its borrow.
    /// Remaining subscribers keep their relative order. Unknown keys are
    /// ignored.
    pub fn detach(&mut self, subscription: Subscription) {
        let Some(position) = self.entries[..self.len]
            .iter()
            .position(|entry| entry.as_ref().is_some_and(|e| e.key == subscription.0))
        else {
            return;
        };
        self.entries[position] = None;
        // Close the gap, preserving attach order.
        for index in position..self.len - 1 {
            self.entries[index] = self.entries[index + 1].take();
        }
        self.len -= 1;
    }

    /// Notify every attached subscriber, synchronously and in attach order,
    /// on the calling context.
    pub fn notify(&mut self, elapsed: Duration) {
        for entry in self.entries[..self.len].iter_mut().flatten() {
            entry.subscriber.update(elapsed);
        }
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.len
    }
}
