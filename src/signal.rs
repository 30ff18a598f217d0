//! Typed signal handles and the combinator layer.
//!
//! A [`Signal<T>`] is a cheap handle into a [`Runtime`]'s arena. Sources are
//! created with [`Runtime::signal`] or [`Runtime::undefined`]; derivations
//! with [`Runtime::link`] or any of the combinators below, all of which are
//! one `link` call (plus, for some, one auxiliary source) over the core.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use crate::error::Error;
use crate::runtime::{CellId, Core, Production, Runtime};
use crate::value::{SharedFn, Value};

/// A value that changes over time.
///
/// Signals are either *sources* (externally settable) or *derivations*
/// (recomputed from their inputs; writing to one fails with
/// [`Error::ReadOnly`]). A signal may be *undefined*: it holds no value yet,
/// and a derivation stays undefined until every one of its inputs is
/// defined.
///
/// Handles are cheap to clone and compare by identity, so signals can
/// themselves be carried inside other signals.
pub struct Signal<T> {
    rt: Runtime,
    id: CellId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Signal<T> {
        Signal { rt: self.rt.clone(), id: self.id, _marker: PhantomData }
    }
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal").field("id", &self.id).finish()
    }
}

impl<T> PartialEq for Signal<T> {
    fn eq(&self, other: &Signal<T>) -> bool {
        self.id == other.id && Rc::ptr_eq(self.rt.core(), other.rt.core())
    }
}

impl<T> Eq for Signal<T> {}

impl<T> Signal<T> {
    pub(crate) fn wrap(rt: &Runtime, id: CellId) -> Signal<T> {
        Signal { rt: rt.clone(), id, _marker: PhantomData }
    }

    pub(crate) fn id(&self) -> CellId {
        self.id
    }
}

impl Runtime {
    /// Create a source holding `initial`.
    ///
    /// ```
    /// # use syncpoint::Runtime;
    /// let rt = Runtime::new();
    /// let x = rt.signal(3);
    /// assert_eq!(x.sample(), Some(3));
    /// ```
    pub fn signal<T>(&self, initial: T) -> Signal<T>
    where
        T: PartialEq + Clone + 'static,
    {
        let id = self.core().create(Some(Value::new(initial)));
        Signal::wrap(self, id)
    }

    /// Create an undefined source.
    ///
    /// ```
    /// # use syncpoint::Runtime;
    /// let rt = Runtime::new();
    /// let x = rt.undefined::<i32>();
    /// assert_eq!(x.sample(), None);
    /// x.set(1).unwrap();
    /// assert_eq!(x.sample(), Some(1));
    /// ```
    pub fn undefined<T>(&self) -> Signal<T>
    where
        T: PartialEq + Clone + 'static,
    {
        let id = self.core().create(None);
        Signal::wrap(self, id)
    }

    /// Link one or more input signals to an output derivation.
    ///
    /// The production runs once immediately if every input is defined, and
    /// again whenever a propagation changes any input — with the guarantee
    /// that within one propagation it runs at most once, after all of its
    /// inputs have settled.
    ///
    /// ```
    /// # use syncpoint::Runtime;
    /// let rt = Runtime::new();
    /// let a = rt.signal(1);
    /// let b = rt.signal(2);
    /// let sum = rt
    ///     .link(&[a.clone(), b.clone()], |xs: &[i32]| xs.iter().sum::<i32>())
    ///     .unwrap();
    /// assert_eq!(sum.sample(), Some(3));
    /// a.set(10).unwrap();
    /// assert_eq!(sum.sample(), Some(12));
    /// ```
    pub fn link<T, B, F>(&self, inputs: &[Signal<T>], mut f: F) -> Result<Signal<B>, Error>
    where
        T: PartialEq + Clone + 'static,
        B: PartialEq + Clone + 'static,
        F: FnMut(&[T]) -> B + 'static,
    {
        for input in inputs {
            if !Rc::ptr_eq(self.core(), input.rt.core()) {
                return Err(Error::ForeignInput);
            }
        }
        let production: Production = Rc::new(RefCell::new(move |values: &[Value]| {
            let args: Vec<T> = values.iter().filter_map(|v| v.downcast::<T>()).collect();
            if args.len() != values.len() {
                return None;
            }
            Some(Value::new(f(&args)))
        }));
        let ids: Vec<CellId> = inputs.iter().map(|s| s.id).collect();
        let id = self.core().link(production, &ids)?;
        Ok(Signal::wrap(self, id))
    }
}

/// Derivation over a single input; the body may withhold a result.
pub(crate) fn link1<T, B, F>(input: &Signal<T>, mut body: F) -> Signal<B>
where
    T: Clone + 'static,
    B: PartialEq + 'static,
    F: FnMut(T) -> Option<B> + 'static,
{
    let production: Production = Rc::new(RefCell::new(move |values: &[Value]| {
        values[0].downcast::<T>().and_then(&mut body).map(Value::new)
    }));
    let id = input
        .rt
        .core()
        .link(production, &[input.id])
        .expect("link over one input");
    Signal::wrap(&input.rt, id)
}

/// Derivation over two inputs of possibly different types.
pub(crate) fn link2<A, B, C, F>(
    a: &Signal<A>,
    b: &Signal<B>,
    mut body: F,
) -> Result<Signal<C>, Error>
where
    A: Clone + 'static,
    B: Clone + 'static,
    C: PartialEq + 'static,
    F: FnMut(A, B) -> Option<C> + 'static,
{
    if !Rc::ptr_eq(a.rt.core(), b.rt.core()) {
        return Err(Error::ForeignInput);
    }
    let production: Production = Rc::new(RefCell::new(move |values: &[Value]| {
        match (values[0].downcast::<A>(), values[1].downcast::<B>()) {
            (Some(a), Some(b)) => body(a, b).map(Value::new),
            _ => None,
        }
    }));
    let id = a.rt.core().link(production, &[a.id, b.id])?;
    Ok(Signal::wrap(&a.rt, id))
}

/// Derivation over three inputs of possibly different types.
pub(crate) fn link3<A, B, C, D, F>(
    a: &Signal<A>,
    b: &Signal<B>,
    c: &Signal<C>,
    mut body: F,
) -> Result<Signal<D>, Error>
where
    A: Clone + 'static,
    B: Clone + 'static,
    C: Clone + 'static,
    D: PartialEq + 'static,
    F: FnMut(A, B, C) -> Option<D> + 'static,
{
    if !Rc::ptr_eq(a.rt.core(), b.rt.core()) || !Rc::ptr_eq(a.rt.core(), c.rt.core()) {
        return Err(Error::ForeignInput);
    }
    let production: Production = Rc::new(RefCell::new(move |values: &[Value]| {
        match (
            values[0].downcast::<A>(),
            values[1].downcast::<B>(),
            values[2].downcast::<C>(),
        ) {
            (Some(a), Some(b), Some(c)) => body(a, b, c).map(Value::new),
            _ => None,
        }
    }));
    let id = a.rt.core().link(production, &[a.id, b.id, c.id])?;
    Ok(Signal::wrap(&a.rt, id))
}

/// Forward every defined value of `input` verbatim into the source behind
/// `target`/`target_id`. Returns the forwarding link so callers can unlink
/// it again.
fn forward_into<T>(input: &Signal<T>, target: Weak<Core>, target_id: CellId) -> CellId {
    let production: Production = Rc::new(RefCell::new(move |values: &[Value]| {
        if let Some(core) = target.upgrade() {
            core.set(target_id, Some(values[0].clone()));
        }
        None
    }));
    input
        .rt
        .core()
        .link(production, &[input.id])
        .expect("forwarding link")
}

fn forward<T>(input: &Signal<T>, out: &Signal<T>) -> CellId {
    forward_into(input, Rc::downgrade(out.rt.core()), out.id)
}

impl<T: PartialEq + Clone + 'static> Signal<T> {
    /// The current value, or `None` while the signal is undefined.
    ///
    /// Sampling never blocks and never triggers recomputation.
    pub fn sample(&self) -> Option<T> {
        self.rt.core().read(self.id).and_then(|v| v.downcast::<T>())
    }

    /// Whether the signal currently holds a value.
    pub fn is_defined(&self) -> bool {
        self.rt.core().is_defined(self.id)
    }

    /// Write a value into a source and propagate it to all dependents.
    ///
    /// Writing a value equal to the current one is a no-op: dependents are
    /// not recomputed. Writing to a derivation fails with
    /// [`Error::ReadOnly`].
    ///
    /// All propagation caused by the write — including writes performed by
    /// productions while they are being evaluated — completes before `set`
    /// returns. If a production panics, the panic unwinds out of `set` and
    /// the runtime is left in an unspecified state; it must not be used for
    /// further propagation.
    pub fn set(&self, value: T) -> Result<(), Error> {
        self.rt.core().write(self.id, Value::new(value))
    }

    /// Map the signal through a function.
    ///
    /// ```
    /// # use syncpoint::Runtime;
    /// let rt = Runtime::new();
    /// let x = rt.signal(3);
    /// let triple = x.map(|x| 3 * x);
    /// assert_eq!(triple.sample(), Some(9));
    /// x.set(4).unwrap();
    /// assert_eq!(triple.sample(), Some(12));
    /// ```
    pub fn map<B, F>(&self, mut f: F) -> Signal<B>
    where
        B: PartialEq + Clone + 'static,
        F: FnMut(T) -> B + 'static,
    {
        link1(self, move |a| Some(f(a)))
    }

    /// Keep only the values satisfying a predicate.
    ///
    /// ```
    /// # use syncpoint::Runtime;
    /// let rt = Runtime::new();
    /// let x = rt.undefined::<i32>();
    /// let even = x.filter(|x| x % 2 == 0);
    /// x.set(3).unwrap();
    /// assert_eq!(even.sample(), None);
    /// x.set(4).unwrap();
    /// assert_eq!(even.sample(), Some(4));
    /// ```
    pub fn filter<F>(&self, mut predicate: F) -> Signal<T>
    where
        F: FnMut(&T) -> bool + 'static,
    {
        let out = self.rt.undefined::<T>();
        let target = Rc::downgrade(out.rt.core());
        let target_id = out.id;
        link1::<T, T, _>(self, move |a| {
            if predicate(&a) {
                if let Some(core) = target.upgrade() {
                    core.set(target_id, Some(Value::new(a)));
                }
            }
            None
        });
        out
    }

    /// Accumulate values into a running state.
    ///
    /// The result is undefined until the first input value arrives.
    ///
    /// ```
    /// # use syncpoint::Runtime;
    /// let rt = Runtime::new();
    /// let x = rt.undefined::<i32>();
    /// let sum = x.scan(0, |acc, x| acc + x);
    /// for n in 0..10 {
    ///     x.set(n).unwrap();
    /// }
    /// assert_eq!(sum.sample(), Some(45));
    /// ```
    pub fn scan<B, F>(&self, initial: B, mut f: F) -> Signal<B>
    where
        B: PartialEq + Clone + 'static,
        F: FnMut(B, T) -> B + 'static,
    {
        let mut state = initial;
        link1(self, move |a| {
            state = f(state.clone(), a);
            Some(state.clone())
        })
    }

    /// Run a side effect on every value and pass the value through.
    pub fn tap<F>(&self, mut f: F) -> Signal<T>
    where
        F: FnMut(&T) + 'static,
    {
        link1(self, move |a| {
            f(&a);
            Some(a)
        })
    }

    /// The loop combinator: thread a state through `f`, emitting only the
    /// second half of the returned pair.
    ///
    /// ```
    /// # use syncpoint::Runtime;
    /// let rt = Runtime::new();
    /// let x = rt.undefined::<i32>();
    /// // Emit each value's distance to the previous one.
    /// let delta = x.loop_(0, |prev, x| (x, x - prev));
    /// x.set(3).unwrap();
    /// x.set(10).unwrap();
    /// assert_eq!(delta.sample(), Some(7));
    /// ```
    pub fn loop_<B, C, F>(&self, initial: B, mut f: F) -> Signal<C>
    where
        B: Clone + 'static,
        C: PartialEq + Clone + 'static,
        F: FnMut(B, T) -> (B, C) + 'static,
    {
        let mut state = initial;
        link1(self, move |a| {
            let (next, out) = f(state.clone(), a);
            state = next;
            Some(out)
        })
    }

    /// A signal that starts out holding `initial` and then follows `self`.
    ///
    /// If `self` is already defined, its value wins immediately.
    ///
    /// ```
    /// # use syncpoint::Runtime;
    /// let rt = Runtime::new();
    /// let x = rt.undefined::<i32>();
    /// let y = x.start_with(0);
    /// assert_eq!(y.sample(), Some(0));
    /// x.set(1).unwrap();
    /// assert_eq!(y.sample(), Some(1));
    /// ```
    pub fn start_with(&self, initial: T) -> Signal<T> {
        let out = self.rt.signal(initial);
        forward(self, &out);
        out
    }

    /// Merge two signals into one that follows both.
    ///
    /// ```
    /// # use syncpoint::Runtime;
    /// let rt = Runtime::new();
    /// let a = rt.undefined::<i32>();
    /// let b = rt.undefined::<i32>();
    /// let both = a.merge(&b);
    /// a.set(1).unwrap();
    /// assert_eq!(both.sample(), Some(1));
    /// b.set(2).unwrap();
    /// assert_eq!(both.sample(), Some(2));
    /// ```
    pub fn merge(&self, other: &Signal<T>) -> Signal<T> {
        let out = self.rt.undefined::<T>();
        forward(self, &out);
        forward(other, &out);
        out
    }

    /// Drop consecutive repeated values.
    pub fn skip_repeats(&self) -> Signal<T> {
        self.skip_repeats_by(|a, b| a == b)
    }

    /// Drop values that `eq` considers a repeat of the previous one.
    pub fn skip_repeats_by<F>(&self, mut eq: F) -> Signal<T>
    where
        F: FnMut(&T, &T) -> bool + 'static,
    {
        let out = self.rt.undefined::<T>();
        let target = Rc::downgrade(out.rt.core());
        let target_id = out.id;
        let mut last: Option<T> = None;
        link1::<T, T, _>(self, move |a| {
            let repeat = matches!(&last, Some(prev) if eq(prev, &a));
            if !repeat {
                if let Some(core) = target.upgrade() {
                    core.set(target_id, Some(Value::new(a.clone())));
                }
            }
            last = Some(a);
            None
        });
        out
    }

    /// Switch through inner signals chosen by `f`.
    ///
    /// On every value of `self`, the forwarding link into the previous inner
    /// signal is disposed (running that signal's disposer, if any), then `f`
    /// picks the next inner signal — or `None` to switch off. Whatever value
    /// the new inner signal already holds is adopted synchronously.
    ///
    /// ```
    /// # use syncpoint::Runtime;
    /// let rt = Runtime::new();
    /// let pick = rt.undefined::<bool>();
    /// let a = rt.signal(1);
    /// let b = rt.signal(2);
    /// let out = {
    ///     let (a, b) = (a.clone(), b.clone());
    ///     pick.chain(move |p| Some(if p { a.clone() } else { b.clone() }))
    /// };
    /// assert_eq!(out.sample(), None);
    /// pick.set(true).unwrap();
    /// assert_eq!(out.sample(), Some(1));
    /// pick.set(false).unwrap();
    /// assert_eq!(out.sample(), Some(2));
    /// a.set(10).unwrap(); // no longer routed
    /// assert_eq!(out.sample(), Some(2));
    /// ```
    pub fn chain<B, F>(&self, mut f: F) -> Signal<B>
    where
        B: PartialEq + Clone + 'static,
        F: FnMut(T) -> Option<Signal<B>> + 'static,
    {
        let out = self.rt.undefined::<B>();
        let target = Rc::downgrade(out.rt.core());
        let target_id = out.id;
        let mut active: Option<(Weak<Core>, CellId, CellId)> = None;
        link1::<T, B, _>(self, move |a| {
            if let Some((core, producer, link)) = active.take() {
                if let Some(core) = core.upgrade() {
                    core.unlink(producer, link);
                }
            }
            if let Some(inner) = f(a) {
                let link = forward_into(&inner, target.clone(), target_id);
                active = Some((Rc::downgrade(inner.rt.core()), inner.id, link));
            }
            None
        });
        out
    }

    /// Run `f` on every defined value, returning a handle that detaches the
    /// effect again.
    pub fn on<F>(&self, mut f: F) -> Unlink
    where
        F: FnMut(T) + 'static,
    {
        let effect = link1::<T, T, _>(self, move |a| {
            f(a);
            None
        });
        Unlink {
            core: Rc::downgrade(self.rt.core()),
            producer: self.id,
            dependent: effect.id,
        }
    }
}

impl<A, B> Signal<SharedFn<A, B>>
where
    A: PartialEq + Clone + 'static,
    B: PartialEq + Clone + 'static,
{
    /// Apply a signal of functions to a signal of arguments.
    ///
    /// ```
    /// # use syncpoint::{Runtime, SharedFn};
    /// let rt = Runtime::new();
    /// let f = rt.signal(SharedFn::new(|x: i32| x + 1));
    /// let x = rt.signal(1);
    /// let y = f.apply(&x).unwrap();
    /// assert_eq!(y.sample(), Some(2));
    /// f.set(SharedFn::new(|x: i32| x * 3)).unwrap();
    /// assert_eq!(y.sample(), Some(3));
    /// ```
    pub fn apply(&self, input: &Signal<A>) -> Result<Signal<B>, Error> {
        link2(self, input, |f, a| Some(f.call(a)))
    }
}

/// Detaches an effect registered with [`Signal::on`].
#[must_use = "dropping the handle keeps the effect attached"]
pub struct Unlink {
    core: Weak<Core>,
    producer: CellId,
    dependent: CellId,
}

impl Unlink {
    /// Remove the effect from its input's dependents and run the input's
    /// disposer, if any.
    pub fn unlink(self) {
        if let Some(core) = self.core.upgrade() {
            core.unlink(self.producer, self.dependent);
        }
    }
}

/// Whether every signal in the slice is currently defined.
pub fn all_defined<T: PartialEq + Clone + 'static>(signals: &[Signal<T>]) -> bool {
    signals.iter().all(Signal::is_defined)
}

#[cfg(test)]
mod test {
    use std::cell::Cell;
    use std::rc::Rc;

    use quickcheck::quickcheck;

    use super::*;
    use crate::testing::Trace;

    fn counter() -> (Rc<Cell<usize>>, impl FnMut(&[i32]) -> usize) {
        let count = Rc::new(Cell::new(0));
        let probe = count.clone();
        (count, move |_: &[i32]| {
            probe.set(probe.get() + 1);
            probe.get()
        })
    }

    #[test]
    fn sample_and_set() {
        let rt = Runtime::new();
        let s = rt.undefined::<i32>();
        assert!(!s.is_defined());
        s.set(23).unwrap();
        assert_eq!(s.sample(), Some(23));
        s.set(3).unwrap();
        assert_eq!(s.sample(), Some(3));
    }

    #[test]
    fn read_only() {
        let rt = Runtime::new();
        let x = rt.signal(1);
        let y = x.map(|x| x + 1);
        assert_eq!(y.set(3), Err(Error::ReadOnly));
        assert_eq!(y.sample(), Some(2));
    }

    #[test]
    fn link_empty_inputs() {
        let rt = Runtime::new();
        let err = rt.link::<i32, i32, _>(&[], |_| 0).unwrap_err();
        assert_eq!(err, Error::EmptyInputs);
    }

    #[test]
    fn link_foreign_input() {
        let rt = Runtime::new();
        let other = Runtime::new();
        let a = rt.signal(1);
        let b = other.signal(2);
        let err = crate::lift2(|a: i32, b: i32| a + b, &a, &b).unwrap_err();
        assert_eq!(err, Error::ForeignInput);
    }

    #[test]
    fn gating_waits_for_all_inputs() {
        let rt = Runtime::new();
        let (count, body) = counter();
        let a = rt.undefined::<i32>();
        let b = rt.undefined::<i32>();
        rt.link(&[a.clone(), b.clone()], body).unwrap();
        assert_eq!(count.get(), 0);
        a.set(1).unwrap();
        assert_eq!(count.get(), 0);
        b.set(2).unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn immediate_evaluation_on_link() {
        let rt = Runtime::new();
        let (count, body) = counter();
        let a = rt.signal(1);
        rt.link(&[a], body).unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn repeated_write_is_a_noop() {
        let rt = Runtime::new();
        let (count, body) = counter();
        let a = rt.signal(1);
        rt.link(&[a.clone()], body).unwrap();
        a.set(1).unwrap();
        assert_eq!(count.get(), 1);
        a.set(2).unwrap();
        a.set(2).unwrap();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn diamond_evaluates_once() {
        let rt = Runtime::new();
        let (count, mut body) = counter();
        let a = rt.signal(1);
        let b = a.map(|a| a + 1);
        let c = a.map(|a| a + 2);
        let d = link2(&b, &c, move |b, c| {
            body(&[b, c]);
            Some(b + c)
        })
        .unwrap();
        assert_eq!(count.get(), 1);
        a.set(2).unwrap();
        assert_eq!(count.get(), 2);
        assert_eq!(d.sample(), Some(7));
    }

    #[test]
    fn indirect_unchanged_input_does_not_reevaluate() {
        let rt = Runtime::new();
        let (count, body) = counter();
        let a = rt.undefined::<i32>();
        let b = a.map(|a| (a + 1) / 2);
        rt.link(&[b], body).unwrap();
        for n in 1..7 {
            a.set(n).unwrap();
        }
        // b takes the values 1, 1, 2, 2, 3, 3.
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn two_ary_unchanged_result_does_not_cascade() {
        let rt = Runtime::new();
        let (count, body) = counter();
        let a = rt.signal(2);
        let b = rt.signal(5);
        let c = crate::lift2(|a: i32, b: i32| a.abs() + b.abs(), &a, &b).unwrap();
        rt.link(&[c], body).unwrap();
        a.set(-2).unwrap();
        b.set(-5).unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn evaluation_order_is_definition_order() {
        let rt = Runtime::new();
        let trace = Trace::new();
        let x = rt.signal(1);
        for label in ["A", "B", "C"] {
            let trace = trace.clone();
            let _ = x.on(move |v| trace.push(format!("{label}:{v}")));
        }
        x.set(2).unwrap();
        assert_eq!(trace.entries(), ["A:1", "B:1", "C:1", "A:2", "B:2", "C:2"]);
    }

    #[test]
    fn map_chains() {
        let rt = Runtime::new();
        let a = rt.signal(1).map(|x| x * 2).map(|x| x + 1);
        assert_eq!(a.sample(), Some(3));
    }

    #[test]
    fn filter_sequence() {
        let rt = Runtime::new();
        let a = rt.undefined::<i32>();
        let b = a.filter(|x| x % 2 == 0);
        let seen = Rc::new(RefCell::new(vec![]));
        let _ = {
            let seen = seen.clone();
            b.on(move |x| seen.borrow_mut().push(x))
        };
        for n in [2, 3, 4] {
            a.set(n).unwrap();
        }
        assert_eq!(*seen.borrow(), [2, 4]);
    }

    #[test]
    fn scan_is_undefined_until_first_value() {
        let rt = Runtime::new();
        let a = rt.undefined::<i32>();
        let sum = a.scan(0, |acc, x| acc + x);
        assert_eq!(sum.sample(), None);
        a.set(5).unwrap();
        assert_eq!(sum.sample(), Some(5));
    }

    #[test]
    fn tap_passes_through() {
        let rt = Runtime::new();
        let total = Rc::new(Cell::new(0));
        let a = rt.undefined::<i32>();
        let b = {
            let total = total.clone();
            a.tap(move |x| total.set(total.get() + x))
        };
        for n in 0..10 {
            a.set(n).unwrap();
        }
        assert_eq!(total.get(), 45);
        assert_eq!(b.sample(), Some(9));
    }

    #[test]
    fn loop_windowed_average() {
        let rt = Runtime::new();
        let a = rt.undefined::<i32>();
        let avg = a.loop_(Vec::new(), |mut window: Vec<i32>, x| {
            window.push(x);
            let start = window.len().saturating_sub(10);
            let window = window.split_off(start);
            let mean = window.iter().sum::<i32>() as f64 / window.len() as f64;
            (window, mean)
        });
        for n in 0..20 {
            a.set(n).unwrap();
        }
        assert_eq!(avg.sample(), Some(14.5));
    }

    #[test]
    fn start_with_defined_input_wins() {
        let rt = Runtime::new();
        let a = rt.signal(1);
        let b = a.start_with(0);
        assert_eq!(b.sample(), Some(1));
        a.set(2).unwrap();
        assert_eq!(b.sample(), Some(2));
    }

    #[test]
    fn start_with_linked_input() {
        let rt = Runtime::new();
        let a = rt.undefined::<i32>();
        let b = a.map(|a| a + 1);
        let c = b.start_with(0);
        assert_eq!(c.sample(), Some(0));
        a.set(1).unwrap();
        assert_eq!(c.sample(), Some(2));
    }

    #[test]
    fn merge_interleaves() {
        let rt = Runtime::new();
        let a = rt.undefined::<i32>();
        let b = rt.undefined::<i32>();
        let out = a.merge(&b);
        let seen = Rc::new(RefCell::new(vec![]));
        let _ = {
            let seen = seen.clone();
            out.on(move |x| seen.borrow_mut().push(x))
        };
        a.set(12).unwrap();
        b.set(9).unwrap();
        assert_eq!(*seen.borrow(), [12, 9]);
    }

    #[test]
    fn skip_repeats_by_custom_eq() {
        let rt = Runtime::new();
        let a = rt.undefined::<String>();
        let out = a.skip_repeats_by(|x: &String, y: &String| x.eq_ignore_ascii_case(y));
        let seen = Rc::new(RefCell::new(vec![]));
        let _ = {
            let seen = seen.clone();
            out.on(move |x| seen.borrow_mut().push(x))
        };
        for word in ["a", "A", "b", "B", "a"] {
            a.set(word.to_string()).unwrap();
        }
        assert_eq!(*seen.borrow(), ["a", "b", "a"]);
    }

    #[test]
    fn apply_follows_both_sides() {
        let rt = Runtime::new();
        let a = rt.undefined::<i32>();
        let f = rt.signal(SharedFn::new(|x: i32| x + 1));
        let b = f.apply(&a).unwrap();
        assert_eq!(b.sample(), None);
        a.set(1).unwrap();
        assert_eq!(b.sample(), Some(2));
        f.set(SharedFn::new(|x: i32| x * 3)).unwrap();
        assert_eq!(b.sample(), Some(3));
        a.set(2).unwrap();
        assert_eq!(b.sample(), Some(6));
    }

    #[test]
    fn on_unlink_detaches() {
        let rt = Runtime::new();
        let a = rt.undefined::<i32>();
        let seen = Rc::new(RefCell::new(vec![]));
        let handle = {
            let seen = seen.clone();
            a.on(move |x| seen.borrow_mut().push(x))
        };
        a.set(1).unwrap();
        handle.unlink();
        a.set(2).unwrap();
        assert_eq!(*seen.borrow(), [1]);
    }

    #[test]
    fn signals_as_values() {
        let rt = Runtime::new();
        let a = rt.undefined::<i32>();
        let b = rt.undefined::<i32>();
        let input = rt.undefined::<Signal<i32>>();
        let out = input.chain(Some);
        input.set(a.clone()).unwrap();
        a.set(1).unwrap();
        input.set(b.clone()).unwrap();
        b.set(2).unwrap();
        a.set(3).unwrap(); // detached
        assert_eq!(out.sample(), Some(2));
    }

    #[test]
    fn functor_identity() {
        fn check(input: Vec<i32>) -> bool {
            let rt = Runtime::new();
            let a = rt.undefined::<i32>();
            let b = a.map(|x| x);
            for &x in &input {
                a.set(x).unwrap();
            }
            a.sample() == b.sample()
        }
        quickcheck(check as fn(Vec<i32>) -> bool);
    }

    #[test]
    fn functor_composition() {
        fn f(n: i32) -> i64 {
            (n + 3) as i64
        }
        fn g(n: i64) -> f64 {
            n as f64 / 2.5
        }
        fn check(input: Vec<i32>) -> bool {
            let rt = Runtime::new();
            let a = rt.undefined::<i32>();
            let lhs = a.map(f).map(g);
            let rhs = a.map(|n| g(f(n)));
            for &x in &input {
                a.set(x).unwrap();
            }
            lhs.sample() == rhs.sample()
        }
        quickcheck(check as fn(Vec<i32>) -> bool);
    }

    #[test]
    fn scan_folds_changes() {
        fn check(input: Vec<i32>) -> bool {
            let rt = Runtime::new();
            let a = rt.undefined::<i32>();
            let sum = a.scan(0i64, |acc, x| acc + x as i64);
            let mut expected = None;
            let mut last = None;
            for &x in &input {
                a.set(x).unwrap();
                // Writes equal to the current value do not propagate.
                if last != Some(x) {
                    expected = Some(expected.unwrap_or(0) + x as i64);
                    last = Some(x);
                }
            }
            sum.sample() == expected
        }
        quickcheck(check as fn(Vec<i32>) -> bool);
    }
}
