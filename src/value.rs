//! Type-erased cell values.
//!
//! A signal graph is heterogeneous: a derivation over an `i32` source may
//! feed a `String` derivation. The scheduler therefore stores every cell
//! value behind [`Value`], which erases the concrete type but keeps its
//! `PartialEq` implementation around, so idempotent writes can be detected
//! without the scheduler knowing what it is holding.

use std::any::{type_name, Any};
use std::fmt;
use std::rc::Rc;

/// A cell value with its concrete type erased.
///
/// Two values are [`same`](Value::same) exactly when they hold the same
/// concrete type and that type's `PartialEq` considers them equal. This is
/// the strict-equality test the write path uses to turn redundant writes
/// into no-ops.
#[derive(Clone)]
pub struct Value {
    data: Rc<dyn Any>,
    name: &'static str,
    eq: fn(&dyn Any, &dyn Any) -> bool,
}

impl Value {
    /// Erase `value`.
    pub fn new<T: PartialEq + 'static>(value: T) -> Value {
        Value {
            data: Rc::new(value),
            name: type_name::<T>(),
            eq: strict_eq::<T>,
        }
    }

    /// Recover a clone of the payload, if it is a `T`.
    pub fn downcast<T: Clone + 'static>(&self) -> Option<T> {
        self.data.downcast_ref::<T>().cloned()
    }

    /// Strict equality against another erased value.
    pub fn same(&self, other: &Value) -> bool {
        (self.eq)(self.data.as_ref(), other.data.as_ref())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Value<{}>", self.name)
    }
}

fn strict_eq<T: PartialEq + 'static>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// A reference-counted function value.
///
/// Functions carried inside signals (see
/// [`Signal::apply`](crate::Signal::apply)) need an equality notion so the
/// scheduler can apply its no-op rule to them. `SharedFn` compares by
/// identity, like the original runtime compares function objects: two
/// handles are equal when they point at the same closure.
///
/// ```
/// use syncpoint::SharedFn;
///
/// let double = SharedFn::new(|x: i32| x * 2);
/// assert_eq!(double.call(21), 42);
/// assert_eq!(double, double.clone());
/// assert_ne!(double, SharedFn::new(|x: i32| x * 2));
/// ```
pub struct SharedFn<A, B> {
    f: Rc<dyn Fn(A) -> B>,
}

impl<A: 'static, B: 'static> SharedFn<A, B> {
    /// Wrap a function.
    pub fn new<F: Fn(A) -> B + 'static>(f: F) -> SharedFn<A, B> {
        SharedFn { f: Rc::new(f) }
    }

    /// Apply the wrapped function.
    pub fn call(&self, a: A) -> B {
        (self.f)(a)
    }
}

impl<A, B> Clone for SharedFn<A, B> {
    fn clone(&self) -> SharedFn<A, B> {
        SharedFn { f: self.f.clone() }
    }
}

impl<A, B> PartialEq for SharedFn<A, B> {
    fn eq(&self, other: &SharedFn<A, B>) -> bool {
        Rc::ptr_eq(&self.f, &other.f)
    }
}

impl<A, B> Eq for SharedFn<A, B> {}

impl<A, B> fmt::Debug for SharedFn<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SharedFn({:p})", Rc::as_ptr(&self.f))
    }
}
