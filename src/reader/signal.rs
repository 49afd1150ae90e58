use std::fmt;

use tokio::sync::watch;

/// Observable value holder.
///
/// Every write notifies subscribers. Receivers see the latest value and
/// never a backlog.
pub struct Signal<T> {
    sender: watch::Sender<T>,
}

impl<T> Signal<T> {
    pub fn new(initial: T) -> Self {
        Self {
            sender: watch::Sender::new(initial),
        }
    }

    /// Read the current value through a closure without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.sender.borrow())
    }

    /// Replace the value.
    pub fn set(&self, value: T) {
        self.sender.send_replace(value);
    }

    /// Mutate the value in place.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.sender.send_modify(f);
    }

    /// Receiver that observes every subsequent write.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }
}

impl<T: Clone> Signal<T> {
    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }
}

impl<T: Default> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal").field(&*self.sender.borrow()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let signal = Signal::new(1);
        signal.set(2);
        assert_eq!(signal.get(), 2);
        signal.update(|v| *v += 3);
        assert_eq!(signal.with(|v| *v), 5);
    }

    #[tokio::test]
    async fn test_subscriber_sees_updates() {
        let signal = Signal::new(Vec::<u32>::new());
        let mut rx = signal.subscribe();

        signal.update(|v| v.push(7));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), vec![7]);
    }

    #[test]
    fn test_subscriber_without_writes_is_unchanged() {
        let signal = Signal::new("idle");
        let rx = signal.subscribe();
        assert!(!rx.has_changed().unwrap());
        assert_eq!(signal.get(), "idle");
    }
}
