//! 事件订阅表
//!
//! 每种 [`EventKind`] 对应一个按注册顺序排列的回调列表，另有一组通配订阅者
//! 接收所有事件（在种类订阅者之后调用）。
//!
//! 回调在 IO 线程上同步执行，耗时的处理应转发到 channel。
//!
//! ```rust
//! use openglove_driver::hooks::EventRegistry;
//! use openglove_driver::{EventKind, SessionEvent};
//!
//! let mut registry = EventRegistry::new();
//! let id = registry.subscribe(EventKind::Opened, |_: &SessionEvent| println!("opened"));
//! assert_eq!(registry.callbacks_for(EventKind::Opened).len(), 1);
//! assert!(registry.unsubscribe(id));
//! ```

use crate::event::{EventKind, SessionEvent};
use std::collections::HashMap;
use std::sync::Arc;

/// 事件回调
pub trait EventCallback: Send + Sync {
    fn on_event(&self, event: &SessionEvent);
}

impl<F> EventCallback for F
where
    F: Fn(&SessionEvent) + Send + Sync,
{
    fn on_event(&self, event: &SessionEvent) {
        self(event)
    }
}

/// 订阅标识（用于取消订阅）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Entry = (SubscriptionId, Arc<dyn EventCallback>);

/// 订阅表
///
/// 本身不是线程安全的，会话把它放在 `RwLock` 中共享。
#[derive(Default)]
pub struct EventRegistry {
    next_id: u64,
    by_kind: HashMap<EventKind, Vec<Entry>>,
    wildcard: Vec<Entry>,
}

impl EventRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }

    /// 订阅某一种事件
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        callback: impl EventCallback + 'static,
    ) -> SubscriptionId {
        self.subscribe_arc(kind, Arc::new(callback))
    }

    pub fn subscribe_arc(
        &mut self,
        kind: EventKind,
        callback: Arc<dyn EventCallback>,
    ) -> SubscriptionId {
        let id = self.allocate_id();
        self.by_kind.entry(kind).or_default().push((id, callback));
        id
    }

    /// 订阅所有事件
    pub fn subscribe_all(&mut self, callback: impl EventCallback + 'static) -> SubscriptionId {
        let id = self.allocate_id();
        self.wildcard.push((id, Arc::new(callback)));
        id
    }

    /// 取消订阅，返回是否找到
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.wildcard.len();
        self.wildcard.retain(|(entry, _)| *entry != id);
        if self.wildcard.len() != before {
            return true;
        }
        for entries in self.by_kind.values_mut() {
            if let Some(pos) = entries.iter().position(|(entry, _)| *entry == id) {
                entries.remove(pos);
                return true;
            }
        }
        false
    }

    /// 某种事件的回调快照（种类订阅者在前，通配订阅者在后）
    ///
    /// 返回克隆的列表，调用方可以在释放锁之后再执行回调。
    pub fn callbacks_for(&self, kind: EventKind) -> Vec<Arc<dyn EventCallback>> {
        self.by_kind
            .get(&kind)
            .into_iter()
            .flatten()
            .chain(self.wildcard.iter())
            .map(|(_, callback)| callback.clone())
            .collect()
    }

    pub fn clear(&mut self) {
        self.by_kind.clear();
        self.wildcard.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.wildcard.len() + self.by_kind.values().map(Vec::len).sum::<usize>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openglove_protocol::{FlexorSample, GloveEvent};
    use parking_lot::Mutex;

    fn fire(registry: &EventRegistry, event: &SessionEvent) {
        for callback in registry.callbacks_for(event.kind()) {
            callback.on_event(event);
        }
    }

    fn flexor() -> SessionEvent {
        SessionEvent::Glove(GloveEvent::Flexor(FlexorSample {
            region: 1,
            value: 2,
        }))
    }

    #[test]
    fn test_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = EventRegistry::new();

        for name in ["first", "second", "third"] {
            let log = log.clone();
            registry.subscribe(EventKind::Flexor, move |_: &SessionEvent| {
                log.lock().push(name)
            });
        }
        let wildcard_log = log.clone();
        registry.subscribe_all(move |_: &SessionEvent| wildcard_log.lock().push("all"));

        fire(&registry, &flexor());
        assert_eq!(*log.lock(), vec!["first", "second", "third", "all"]);
    }

    #[test]
    fn test_kind_isolation() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = EventRegistry::new();
        let l = log.clone();
        registry.subscribe(EventKind::Gyroscope, move |_: &SessionEvent| {
            l.lock().push("gyro")
        });

        fire(&registry, &flexor());
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_unsubscribe() {
        let mut registry = EventRegistry::new();
        let a = registry.subscribe(EventKind::Opened, |_: &SessionEvent| {});
        let b = registry.subscribe_all(|_: &SessionEvent| {});
        assert_eq!(registry.len(), 2);

        assert!(registry.unsubscribe(a));
        assert!(!registry.unsubscribe(a));
        assert!(registry.unsubscribe(b));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut registry = EventRegistry::new();
        let a = registry.subscribe(EventKind::Opened, |_: &SessionEvent| {});
        let b = registry.subscribe(EventKind::Closed, |_: &SessionEvent| {});
        assert_ne!(a, b);
        registry.clear();
        assert!(registry.callbacks_for(EventKind::Opened).is_empty());
    }
}
