//! Single-assignment asynchronous values with chained continuations.
//!
//! A [`Promise`] is written once (`fulfill` or `reject`) and read many times.
//! Continuations registered with [`then`]/[`chain`]/[`catch`] run on whichever
//! thread settles the source promise, in registration order; registering on an
//! already-settled promise invokes the continuation immediately on the calling
//! thread. Rejections propagate unchanged through links that carry no
//! rejection handler.
//!
//! There is no cancellation: once a chain is started it runs to settlement,
//! and "cancel" is approximated by dropping interest in the result.
//!
//! [`then`]: Promise::then
//! [`chain`]: Promise::chain
//! [`catch`]: Promise::catch

use std::fmt;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

type Continuation<T, E> = Box<dyn FnOnce(Result<T, E>) + Send>;

enum State<T, E> {
    Pending(Vec<Continuation<T, E>>),
    Fulfilled(T),
    Rejected(E),
}

struct Inner<T, E> {
    state: Mutex<State<T, E>>,
    settled: Condvar,
}

/// A single-assignment, write-once, read-many asynchronous value.
///
/// Cloning a promise clones a handle to the same settlement; any handle may
/// settle it and every handle observes the same result.
pub struct Promise<T, E> {
    inner: Arc<Inner<T, E>>,
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Create an unsettled promise.
    pub fn pending() -> Self {
        Self::with_state(State::Pending(Vec::new()))
    }

    /// Create a promise that is already fulfilled.
    pub fn fulfilled(value: T) -> Self {
        Self::with_state(State::Fulfilled(value))
    }

    /// Create a promise that is already rejected.
    pub fn rejected(error: E) -> Self {
        Self::with_state(State::Rejected(error))
    }

    fn with_state(state: State<T, E>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                settled: Condvar::new(),
            }),
        }
    }

    /// Settle the promise with a value.
    ///
    /// Settling an already-settled promise is a no-op; the first settlement
    /// wins.
    pub fn fulfill(&self, value: T) {
        self.settle(Ok(value));
    }

    /// Settle the promise with an error.
    ///
    /// Settling an already-settled promise is a no-op; the first settlement
    /// wins.
    pub fn reject(&self, error: E) {
        self.settle(Err(error));
    }

    fn settle(&self, result: Result<T, E>) {
        let continuations = {
            let mut state = self.inner.state.lock().expect("promise state poisoned");
            match &mut *state {
                State::Pending(continuations) => {
                    let continuations = std::mem::take(continuations);
                    *state = match &result {
                        Ok(value) => State::Fulfilled(value.clone()),
                        Err(error) => State::Rejected(error.clone()),
                    };
                    continuations
                }
                // Write-once: later settlements are discarded.
                _ => return,
            }
        };
        self.inner.settled.notify_all();

        // Run continuations outside the lock, in registration order.
        for continuation in continuations {
            continuation(result.clone());
        }
    }

    /// Register a continuation invoked with the settled result.
    ///
    /// If the promise is already settled the continuation runs immediately on
    /// the calling thread. This is the low-level primitive the combinators
    /// are built on.
    pub fn on_settle(&self, f: impl FnOnce(Result<T, E>) + Send + 'static) {
        let result = {
            let mut state = self.inner.state.lock().expect("promise state poisoned");
            match &mut *state {
                State::Pending(continuations) => {
                    continuations.push(Box::new(f));
                    return;
                }
                State::Fulfilled(value) => Ok(value.clone()),
                State::Rejected(error) => Err(error.clone()),
            }
        };
        f(result);
    }

    /// Chain a fulfillment continuation, returning a promise for its outcome.
    ///
    /// `f` runs when this promise fulfills; its `Ok` fulfills the returned
    /// promise and its `Err` rejects it. A rejection of this promise passes
    /// through to the returned promise unchanged without running `f`.
    pub fn then<U, F>(&self, f: F) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<U, E> + Send + 'static,
    {
        let out = Promise::pending();
        let link = out.clone();
        self.on_settle(move |result| match result {
            Ok(value) => match f(value) {
                Ok(mapped) => link.fulfill(mapped),
                Err(error) => link.reject(error),
            },
            Err(error) => link.reject(error),
        });
        out
    }

    /// Chain a continuation that itself returns a promise, flattening the
    /// result.
    ///
    /// The returned promise settles the way the inner promise settles. A
    /// rejection of this promise passes through without running `f`.
    pub fn chain<U, F>(&self, f: F) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Promise<U, E> + Send + 'static,
    {
        let out = Promise::pending();
        let link = out.clone();
        self.on_settle(move |result| match result {
            Ok(value) => {
                let next = f(value);
                let link = link.clone();
                next.on_settle(move |inner| match inner {
                    Ok(mapped) => link.fulfill(mapped),
                    Err(error) => link.reject(error),
                });
            }
            Err(error) => link.reject(error),
        });
        out
    }

    /// Chain a rejection handler.
    ///
    /// `f` runs only when this promise rejects and may recover (`Ok`) or
    /// re-reject (`Err`). Fulfillment passes through unchanged.
    pub fn catch<F>(&self, f: F) -> Promise<T, E>
    where
        F: FnOnce(E) -> Result<T, E> + Send + 'static,
    {
        let out = Promise::pending();
        let link = out.clone();
        self.on_settle(move |result| match result {
            Ok(value) => link.fulfill(value),
            Err(error) => match f(error) {
                Ok(recovered) => link.fulfill(recovered),
                Err(error) => link.reject(error),
            },
        });
        out
    }

    /// Whether the promise has settled.
    pub fn is_settled(&self) -> bool {
        !matches!(
            &*self.inner.state.lock().expect("promise state poisoned"),
            State::Pending(_)
        )
    }

    /// Clone out the settled result, if any.
    pub fn try_value(&self) -> Option<Result<T, E>> {
        match &*self.inner.state.lock().expect("promise state poisoned") {
            State::Pending(_) => None,
            State::Fulfilled(value) => Some(Ok(value.clone())),
            State::Rejected(error) => Some(Err(error.clone())),
        }
    }

    /// Inspect the settled result by reference, without cloning it.
    pub fn inspect<R>(&self, f: impl FnOnce(Option<Result<&T, &E>>) -> R) -> R {
        let state = self.inner.state.lock().expect("promise state poisoned");
        let view = match &*state {
            State::Pending(_) => None,
            State::Fulfilled(value) => Some(Ok(value)),
            State::Rejected(error) => Some(Err(error)),
        };
        f(view)
    }

    /// Block the calling thread until the promise settles.
    ///
    /// Reserved for shutdown, flush, and test code; the steady-state pipeline
    /// never blocks on a promise.
    pub fn wait(&self) -> Result<T, E> {
        let mut state = self.inner.state.lock().expect("promise state poisoned");
        loop {
            match &*state {
                State::Fulfilled(value) => return Ok(value.clone()),
                State::Rejected(error) => return Err(error.clone()),
                State::Pending(_) => {
                    state = self
                        .inner
                        .settled
                        .wait(state)
                        .expect("promise state poisoned");
                }
            }
        }
    }

    /// Block until the promise settles or the timeout elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T, E>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.state.lock().expect("promise state poisoned");
        loop {
            match &*state {
                State::Fulfilled(value) => return Some(Ok(value.clone())),
                State::Rejected(error) => return Some(Err(error.clone())),
                State::Pending(_) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return None;
                    }
                    let (guard, _timeout) = self
                        .inner
                        .settled
                        .wait_timeout(state, deadline - now)
                        .expect("promise state poisoned");
                    state = guard;
                }
            }
        }
    }
}

impl<T, E> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match &*self.inner.state.lock().expect("promise state poisoned") {
            State::Pending(_) => "pending",
            State::Fulfilled(_) => "fulfilled",
            State::Rejected(_) => "rejected",
        };
        f.debug_tuple("Promise").field(&tag).finish()
    }
}

/// Aggregate two promises into a promise of a pair.
///
/// Fulfilled only when both inputs fulfill; rejected as soon as either input
/// rejects (first rejection wins). The other input keeps running to
/// settlement and its result is discarded; there is no cancellation.
pub fn join2<A, B, E>(a: &Promise<A, E>, b: &Promise<B, E>) -> Promise<(A, B), E>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    let out = Promise::pending();
    let slots = Arc::new(Mutex::new((None::<A>, None::<B>)));

    {
        let out = out.clone();
        let slots = Arc::clone(&slots);
        a.on_settle(move |result| match result {
            Ok(value) => {
                let mut slots = slots.lock().expect("join state poisoned");
                slots.0 = Some(value);
                if slots.0.is_some() && slots.1.is_some() {
                    let pair = (
                        slots.0.take().expect("join slot filled"),
                        slots.1.take().expect("join slot filled"),
                    );
                    drop(slots);
                    out.fulfill(pair);
                }
            }
            Err(error) => out.reject(error),
        });
    }
    {
        let out = out.clone();
        let slots = Arc::clone(&slots);
        b.on_settle(move |result| match result {
            Ok(value) => {
                let mut slots = slots.lock().expect("join state poisoned");
                slots.1 = Some(value);
                if slots.0.is_some() && slots.1.is_some() {
                    let pair = (
                        slots.0.take().expect("join slot filled"),
                        slots.1.take().expect("join slot filled"),
                    );
                    drop(slots);
                    out.fulfill(pair);
                }
            }
            Err(error) => out.reject(error),
        });
    }

    out
}

/// Aggregate three promises into a promise of a triple.
///
/// Same settlement rules as [`join2`].
pub fn join3<A, B, C, E>(
    a: &Promise<A, E>,
    b: &Promise<B, E>,
    c: &Promise<C, E>,
) -> Promise<(A, B, C), E>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    let ab = join2(a, b);
    let abc = join2(&ab, c);
    abc.then(|((a, b), c)| Ok((a, b, c)))
}

/// Aggregate a homogeneous set of promises, preserving input order.
///
/// Fulfilled with every value once all inputs fulfill; rejected with the
/// first rejection. Later inputs keep running and their results are
/// discarded.
pub fn all<T, E>(promises: Vec<Promise<T, E>>) -> Promise<Vec<T>, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    if promises.is_empty() {
        return Promise::fulfilled(Vec::new());
    }

    let out = Promise::pending();
    let count = promises.len();
    let slots = Arc::new(Mutex::new((count, vec![None::<T>; count])));

    for (index, promise) in promises.into_iter().enumerate() {
        let out = out.clone();
        let slots = Arc::clone(&slots);
        promise.on_settle(move |result| match result {
            Ok(value) => {
                let mut slots = slots.lock().expect("join state poisoned");
                slots.1[index] = Some(value);
                slots.0 -= 1;
                if slots.0 == 0 {
                    let values = slots
                        .1
                        .iter_mut()
                        .map(|slot| slot.take().expect("all slots filled"))
                        .collect();
                    drop(slots);
                    out.fulfill(values);
                }
            }
            Err(error) => out.reject(error),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;

    type TestPromise<T> = Promise<T, String>;

    #[test]
    fn test_then_maps_fulfilled_value() {
        let promise: TestPromise<i32> = Promise::pending();
        let mapped = promise.then(|v| Ok(v * 2)).then(|v| Ok(v + 1));

        promise.fulfill(20);
        assert_eq!(mapped.try_value(), Some(Ok(41)));
    }

    #[test]
    fn test_middle_failure_skips_later_handlers() {
        let promise: TestPromise<i32> = Promise::pending();
        let third_ran = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&third_ran);
        let chained = promise
            .then(|v| Ok(v + 1))
            .then(|_| Err::<i32, _>("boom".to_string()))
            .then(move |v| {
                flag.store(true, Ordering::Relaxed);
                Ok(v)
            });

        promise.fulfill(1);
        assert_eq!(chained.try_value(), Some(Err("boom".to_string())));
        assert!(!third_ran.load(Ordering::Relaxed));
    }

    #[test]
    fn test_then_after_settlement_runs_immediately() {
        let promise: TestPromise<&'static str> = Promise::fulfilled("ready");
        let mapped = promise.then(|v| Ok(v.len()));
        assert_eq!(mapped.try_value(), Some(Ok(5)));
    }

    #[test]
    fn test_second_settlement_is_discarded() {
        let promise: TestPromise<i32> = Promise::pending();
        promise.fulfill(1);
        promise.fulfill(2);
        promise.reject("late".to_string());
        assert_eq!(promise.try_value(), Some(Ok(1)));
    }

    #[test]
    fn test_catch_recovers_from_rejection() {
        let promise: TestPromise<i32> = Promise::rejected("gone".to_string());
        let recovered = promise.catch(|error| {
            assert_eq!(error, "gone");
            Ok(7)
        });
        assert_eq!(recovered.try_value(), Some(Ok(7)));
    }

    #[test]
    fn test_chain_flattens_inner_promise() {
        let outer: TestPromise<i32> = Promise::pending();
        let inner: TestPromise<i32> = Promise::pending();

        let inner2 = inner.clone();
        let flattened = outer.chain(move |v| inner2.then(move |w| Ok(v + w)));

        outer.fulfill(10);
        assert!(!flattened.is_settled());
        inner.fulfill(32);
        assert_eq!(flattened.try_value(), Some(Ok(42)));
    }

    #[test]
    fn test_continuations_run_in_registration_order() {
        let promise: TestPromise<i32> = Promise::pending();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..4 {
            let order = Arc::clone(&order);
            promise.on_settle(move |_| order.lock().unwrap().push(i));
        }

        promise.fulfill(0);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_join2_waits_for_both() {
        let a: TestPromise<i32> = Promise::pending();
        let b: TestPromise<&'static str> = Promise::pending();
        let joined = join2(&a, &b);

        a.fulfill(1);
        assert!(!joined.is_settled());
        b.fulfill("two");
        assert_eq!(joined.try_value(), Some(Ok((1, "two"))));
    }

    #[test]
    fn test_join3_fulfills_in_order() {
        let a: TestPromise<i32> = Promise::fulfilled(1);
        let b: TestPromise<i32> = Promise::fulfilled(2);
        let c: TestPromise<i32> = Promise::fulfilled(3);
        assert_eq!(join3(&a, &b, &c).try_value(), Some(Ok((1, 2, 3))));
    }

    #[test]
    fn test_join3_first_rejection_wins() {
        let a: TestPromise<i32> = Promise::pending();
        let b: TestPromise<i32> = Promise::pending();
        let c: TestPromise<i32> = Promise::pending();
        let joined = join3(&a, &b, &c);

        b.reject("missing".to_string());
        assert_eq!(joined.try_value(), Some(Err("missing".to_string())));

        // Siblings may still settle afterwards; the aggregate result stands.
        a.fulfill(1);
        c.fulfill(3);
        assert_eq!(joined.try_value(), Some(Err("missing".to_string())));
    }

    #[test]
    fn test_all_preserves_input_order() {
        let promises: Vec<TestPromise<usize>> =
            (0..5).map(|_| Promise::pending()).collect();
        let aggregate = all(promises.clone());

        // Settle out of order.
        for index in [3, 0, 4, 1, 2] {
            promises[index].fulfill(index * 10);
        }
        assert_eq!(aggregate.try_value(), Some(Ok(vec![0, 10, 20, 30, 40])));
    }

    #[test]
    fn test_all_empty_fulfills_immediately() {
        let aggregate: TestPromise<Vec<i32>> = all(Vec::new());
        assert_eq!(aggregate.try_value(), Some(Ok(Vec::new())));
    }

    #[test]
    fn test_wait_blocks_until_settled() {
        let promise: TestPromise<i32> = Promise::pending();
        let remote = promise.clone();
        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.fulfill(9);
        });

        assert_eq!(promise.wait(), Ok(9));
        producer.join().unwrap();
    }

    #[test]
    fn test_wait_timeout_expires_on_pending() {
        let promise: TestPromise<i32> = Promise::pending();
        assert!(promise.wait_timeout(Duration::from_millis(10)).is_none());
    }
}
