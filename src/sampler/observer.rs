//! Step notifications and the sampler capability interface

use crate::io::sample_buffer::TemporalRingBuffer;

/// Receives a notification after every completed sampling step
///
/// Observers run synchronously, in registration order, after the step's
/// buffer writes are committed. They read the observation through the
/// borrowed buffer; the pipeline itself is still mid-step and must not be
/// reached from inside the callback. Closures
/// `FnMut(usize, bool, &TemporalRingBuffer)` implement this trait directly.
pub trait StepObserver {
    /// Called with the sampled step index, whether it completed the window,
    /// and the buffer holding the step's samples
    fn on_sampling_update(
        &mut self,
        step_index: usize,
        window_complete: bool,
        buffer: &TemporalRingBuffer,
    );
}

impl<F> StepObserver for F
where
    F: FnMut(usize, bool, &TemporalRingBuffer),
{
    fn on_sampling_update(
        &mut self,
        step_index: usize,
        window_complete: bool,
        buffer: &TemporalRingBuffer,
    ) {
        self(step_index, window_complete, buffer)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Ordered list of step observers
#[derive(Default)]
pub struct ObserverList {
    next_id: u64,
    observers: Vec<(ObserverId, Box<dyn StepObserver>)>,
}

impl std::fmt::Debug for ObserverList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverList")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ObserverList {
    /// Empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observer
    pub fn subscribe(&mut self, observer: Box<dyn StepObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Remove an observer; false if `id` was not subscribed
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(other, _)| *other != id);
        self.observers.len() != before
    }

    /// Number of subscribed observers
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether nobody is subscribed
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Notify every observer in registration order
    pub fn notify(
        &mut self,
        step_index: usize,
        window_complete: bool,
        buffer: &TemporalRingBuffer,
    ) {
        for (_, observer) in self.observers.iter_mut() {
            observer.on_sampling_update(step_index, window_complete, buffer);
        }
    }
}

/// Capability shared by the pipeline and any front-end relaying to it
pub trait AudioSampler {
    /// Whether audio is sampled on step ticks
    fn sampling_enabled(&self) -> bool;

    /// Enable or disable sampling
    fn set_sampling_enabled(&mut self, enabled: bool);

    /// Register a step observer
    fn subscribe(&mut self, observer: Box<dyn StepObserver>) -> ObserverId;

    /// Remove a step observer; false if `id` was not subscribed
    fn unsubscribe(&mut self, id: ObserverId) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalType;
    use crate::features::shape::ObservationShape;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn buffer() -> TemporalRingBuffer {
        TemporalRingBuffer::new(ObservationShape::new(4, 1, SignalType::Mono))
    }

    #[test]
    fn test_notify_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut list = ObserverList::new();
        for tag in 0..3 {
            let log = Rc::clone(&log);
            list.subscribe(Box::new(move |step: usize, complete: bool, _: &TemporalRingBuffer| {
                log.borrow_mut().push((tag, step, complete));
            }));
        }

        list.notify(4, true, &buffer());
        assert_eq!(*log.borrow(), vec![(0, 4, true), (1, 4, true), (2, 4, true)]);
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut list = ObserverList::new();
        let counter = Rc::clone(&count);
        let id = list.subscribe(Box::new(move |_: usize, _: bool, _: &TemporalRingBuffer| {
            *counter.borrow_mut() += 1;
        }));

        list.notify(0, false, &buffer());
        assert!(list.unsubscribe(id));
        assert!(!list.unsubscribe(id));
        list.notify(1, false, &buffer());
        assert_eq!(*count.borrow(), 1);
        assert!(list.is_empty());
    }

    #[test]
    fn test_empty_list_notifies_nobody() {
        let mut list = ObserverList::new();
        list.notify(0, true, &buffer());
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn test_observer_reads_committed_samples() {
        let mut buffer = buffer();
        buffer.begin_step(0).unwrap();
        buffer.write_sample(0.75).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut list = ObserverList::new();
        list.subscribe(Box::new(
            move |_: usize, complete: bool, buffer: &TemporalRingBuffer| {
                if complete {
                    sink.borrow_mut().push(buffer.read(0, 0));
                }
            },
        ));

        list.notify(0, false, &buffer);
        list.notify(0, true, &buffer);
        assert_eq!(*seen.borrow(), vec![0.75], "only the completing step is read");
    }
}
