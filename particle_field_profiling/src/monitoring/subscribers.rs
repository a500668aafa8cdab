//! 观察者列表
//!
//! 每个回调单独隔离：某个回调 panic 不影响其余回调收到通知。
//! 通知时先复制快照再释放列表锁，回调内部可以安全地退订。

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};

type Callback<T> = Arc<Mutex<Box<dyn FnMut(&T) + Send>>>;

struct Entry<T> {
    id: u64,
    callback: Callback<T>,
}

struct Inner<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
}

/// 观察者列表
pub struct SubscriberList<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T: 'static> SubscriberList<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// 订阅，返回退订句柄
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&T) + Send + 'static,
    {
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.push(Entry {
            id,
            callback: Arc::new(Mutex::new(Box::new(callback))),
        });

        let weak: Weak<Mutex<Inner<T>>> = Arc::downgrade(&self.inner);
        Subscription {
            id,
            remove: Some(Box::new(move |id| {
                if let Some(inner) = weak.upgrade() {
                    let mut inner = match inner.lock() {
                        Ok(inner) => inner,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    inner.entries.retain(|entry| entry.id != id);
                }
            })),
        }
    }

    /// 通知全部订阅者，返回失败（panic）的回调数量
    pub fn notify(&self, value: &T) -> usize {
        let snapshot: Vec<(u64, Callback<T>)> = match self.inner.lock() {
            Ok(inner) => inner.entries.iter().map(|e| (e.id, Arc::clone(&e.callback))).collect(),
            Err(poisoned) => poisoned
                .into_inner()
                .entries
                .iter()
                .map(|e| (e.id, Arc::clone(&e.callback)))
                .collect(),
        };

        let mut failures = 0;
        for (id, callback) in snapshot {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                let mut callback = match callback.lock() {
                    Ok(callback) => callback,
                    Err(poisoned) => poisoned.into_inner(),
                };
                (*callback)(value)
            }));
            if outcome.is_err() {
                failures += 1;
                tracing::warn!(target: "monitor", subscriber = id, "订阅回调失败，已跳过");
            }
        }
        failures
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for SubscriberList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// 退订句柄
///
/// 丢弃句柄不会退订；需要显式调用 [`Subscription::unsubscribe`]。
pub struct Subscription {
    id: u64,
    remove: Option<Box<dyn FnOnce(u64) + Send>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 退订
    pub fn unsubscribe(mut self) {
        if let Some(remove) = self.remove.take() {
            remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_notify_and_unsubscribe() {
        let list = SubscriberList::<u32>::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        let sub = list.subscribe(move |v| {
            counter.fetch_add(*v as usize, Ordering::SeqCst);
        });

        list.notify(&2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        sub.unsubscribe();
        list.notify(&5);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(list.is_empty());
    }

    #[test]
    fn test_panicking_subscriber_is_isolated() {
        let list = SubscriberList::<u32>::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let _bad = list.subscribe(|_| panic!("观察者故障"));
        let counter = Arc::clone(&hits);
        let _good = list.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(list.notify(&1), 1);
        assert_eq!(list.notify(&1), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
