use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

struct SubjectCore<T> {
    listeners: RefCell<Vec<Weak<dyn Fn(&T)>>>,
}

impl<T> SubjectCore<T> {
    fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
        }
    }

    fn add_listener(&self, listener: &Rc<dyn Fn(&T)>) {
        self.listeners.borrow_mut().push(Rc::downgrade(listener));
    }

    /// Collects live listeners in subscription order, pruning dead ones.
    fn live_listeners(&self) -> Vec<Rc<dyn Fn(&T)>> {
        let mut listeners = self.listeners.borrow_mut();
        listeners.retain(|weak| weak.strong_count() > 0);
        listeners.iter().filter_map(Weak::upgrade).collect()
    }
}

/// Synchronous fan-out signal.
///
/// Listeners run in subscription order on the emitting thread, before
/// `emit` returns. A listener stays registered for as long as the
/// [`Subscription`] returned by [`Subject::subscribe`] is alive.
pub struct Subject<T> {
    inner: Rc<SubjectCore<T>>,
}

impl<T: 'static> Subject<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SubjectCore::new()),
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let listener: Rc<dyn Fn(&T)> = Rc::new(listener);
        self.inner.add_listener(&listener);
        Subscription {
            _token: Box::new(listener),
        }
    }

    /// Notify every live listener. Listeners may subscribe or drop their
    /// subscriptions while being notified; the set notified is fixed when
    /// `emit` starts.
    pub fn emit(&self, value: &T) {
        for listener in self.inner.live_listeners() {
            listener(value);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .listeners
            .borrow()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Subject {
            inner: self.inner.clone(),
        }
    }
}

/// Keeps a listener registered. Dropping it unsubscribes.
#[must_use = "dropping a subscription unsubscribes the listener"]
pub struct Subscription {
    _token: Box<dyn Any>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn listeners_run_in_subscription_order() {
        let subject = Subject::<u32>::new();
        let log: Rc<RefCell<Vec<(&'static str, u32)>>> = Rc::new(RefCell::new(Vec::new()));

        let first = {
            let log = log.clone();
            subject.subscribe(move |value| log.borrow_mut().push(("first", *value)))
        };
        let second = {
            let log = log.clone();
            subject.subscribe(move |value| log.borrow_mut().push(("second", *value)))
        };

        subject.emit(&7);

        assert_eq!(log.borrow().as_slice(), &[("first", 7), ("second", 7)]);
        drop((first, second));
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let subject = Subject::<()>::new();
        let hits = Rc::new(Cell::new(0));

        let subscription = {
            let hits = hits.clone();
            subject.subscribe(move |_| hits.set(hits.get() + 1))
        };
        subject.emit(&());
        assert_eq!(subject.subscriber_count(), 1);

        subscription.unsubscribe();
        subject.emit(&());

        assert_eq!(hits.get(), 1);
        assert_eq!(subject.subscriber_count(), 0);
    }

    #[test]
    fn listener_may_subscribe_while_notified() {
        let subject = Subject::<()>::new();
        let late: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));
        let late_hits = Rc::new(Cell::new(0));

        let _outer = {
            let subject_for_listener = subject.clone();
            let late = late.clone();
            let late_hits = late_hits.clone();
            subject.subscribe(move |_| {
                let late_hits = late_hits.clone();
                let sub = subject_for_listener.subscribe(move |_| late_hits.set(late_hits.get() + 1));
                late.borrow_mut().push(sub);
            })
        };

        subject.emit(&());
        assert_eq!(late_hits.get(), 0, "listeners added mid-emit wait for the next emit");

        subject.emit(&());
        assert_eq!(late_hits.get(), 1);
    }
}
