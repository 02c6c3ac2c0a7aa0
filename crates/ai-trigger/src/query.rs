use std::borrow::Cow;
use std::fmt;

use ai_brain::{ErasedKey, MemoryKey, MemoryStatus, MemoryStore};

use crate::{Absent, Present, Registered};

type Eval<T> = Box<dyn Fn(&MemoryStore) -> Option<T>>;

/// A labelled, all-or-nothing read of memory.
///
/// Evaluation yields `None` as soon as one required slot is in the wrong
/// state; composed queries evaluate left to right and stop there.
pub struct Query<T> {
    label: Cow<'static, str>,
    keys: Vec<(ErasedKey, MemoryStatus)>,
    eval: Eval<T>,
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("label", &self.label)
            .field("keys", &self.keys.len())
            .finish()
    }
}

impl<T: 'static> Query<T> {
    pub fn new(
        label: impl Into<Cow<'static, str>>,
        keys: Vec<(ErasedKey, MemoryStatus)>,
        eval: impl Fn(&MemoryStore) -> Option<T> + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            keys,
            eval: Box::new(eval),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Memory slots this query reads, with the state each must be in.
    pub fn keys(&self) -> &[(ErasedKey, MemoryStatus)] {
        &self.keys
    }

    pub fn eval(&self, memory: &MemoryStore) -> Option<T> {
        (self.eval)(memory)
    }

    pub fn with_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }

    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> Query<U> {
        let eval = self.eval;
        Query {
            label: self.label,
            keys: self.keys,
            eval: Box::new(move |memory| eval(memory).map(&f)),
        }
    }

    /// Pairs two queries. `other` is not evaluated when `self` yields `None`.
    pub fn and<U: 'static>(self, other: Query<U>) -> Query<(T, U)> {
        let (left, right) = (self.eval, other.eval);
        let mut keys = self.keys;
        keys.extend(other.keys);
        Query {
            label: Cow::Owned(format!("{}, {}", self.label, other.label)),
            keys,
            eval: Box::new(move |memory| {
                let a = left(memory)?;
                let b = right(memory)?;
                Some((a, b))
            }),
        }
    }

    /// `None` unless `pred` accepts the value.
    pub fn filter(self, pred: impl Fn(&T) -> bool + 'static) -> Query<T> {
        let eval = self.eval;
        Query {
            label: Cow::Owned(format!("{} if ..", self.label)),
            keys: self.keys,
            eval: Box::new(move |memory| eval(memory).filter(|value| pred(value))),
        }
    }
}

/// Requires `key` to hold a value; yields a snapshot of it.
pub fn present<V: Clone + 'static>(key: MemoryKey<V>) -> Query<Present<V>> {
    Query::new(
        format!("present({})", key.name()),
        vec![(key.erased(), MemoryStatus::ValuePresent)],
        move |memory| memory.get(key).cloned().map(|value| Present::new(key, value)),
    )
}

/// Requires `key` to be empty.
pub fn absent<V: 'static>(key: MemoryKey<V>) -> Query<Absent<V>> {
    Query::new(
        format!("absent({})", key.name()),
        vec![(key.erased(), MemoryStatus::ValueAbsent)],
        move |memory| {
            memory
                .has(key, MemoryStatus::ValueAbsent)
                .then(|| Absent::new(key))
        },
    )
}

/// Requires only that `key` is registered; yields its optional value.
pub fn registered<V: Clone + 'static>(key: MemoryKey<V>) -> Query<Registered<V>> {
    Query::new(
        format!("registered({})", key.name()),
        vec![(key.erased(), MemoryStatus::Registered)],
        move |memory| {
            memory
                .is_registered(key)
                .then(|| Registered::new(key, memory.get(key).cloned()))
        },
    )
}

/// Always yields `value`.
pub fn point<T: Clone + 'static>(value: T) -> Query<T> {
    Query::new("point", Vec::new(), move |_| Some(value.clone()))
}

pub fn ap2<A, B, R>(qa: Query<A>, qb: Query<B>, f: impl Fn(A, B) -> R + 'static) -> Query<R>
where
    A: 'static,
    B: 'static,
    R: 'static,
{
    qa.and(qb).map(move |(a, b)| f(a, b))
}

pub fn ap3<A, B, C, R>(
    qa: Query<A>,
    qb: Query<B>,
    qc: Query<C>,
    f: impl Fn(A, B, C) -> R + 'static,
) -> Query<R>
where
    A: 'static,
    B: 'static,
    C: 'static,
    R: 'static,
{
    qa.and(qb).and(qc).map(move |((a, b), c)| f(a, b, c))
}

pub fn ap4<A, B, C, D, R>(
    qa: Query<A>,
    qb: Query<B>,
    qc: Query<C>,
    qd: Query<D>,
    f: impl Fn(A, B, C, D) -> R + 'static,
) -> Query<R>
where
    A: 'static,
    B: 'static,
    C: 'static,
    D: 'static,
    R: 'static,
{
    qa.and(qb)
        .and(qc)
        .and(qd)
        .map(move |(((a, b), c), d)| f(a, b, c, d))
}
