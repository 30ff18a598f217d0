//! Lifting n-ary functions over heterogeneously typed signals.
//!
//! [`Runtime::link`](crate::Runtime::link) covers the homogeneous case; the
//! functions here cover derivations whose inputs have different types, with
//! the same contract otherwise.

use crate::error::Error;
use crate::signal::{link2, link3, Signal};

/// Lift a binary function over two signals.
///
/// ```
/// # use syncpoint::{lift2, Runtime};
/// let rt = Runtime::new();
/// let x = rt.signal(2);
/// let label = rt.signal("x".to_string());
/// let tagged = lift2(|n: i32, l: String| format!("{l}={n}"), &x, &label).unwrap();
/// assert_eq!(tagged.sample(), Some("x=2".to_string()));
/// x.set(5).unwrap();
/// assert_eq!(tagged.sample(), Some("x=5".to_string()));
/// ```
pub fn lift2<A, B, C, F>(mut f: F, a: &Signal<A>, b: &Signal<B>) -> Result<Signal<C>, Error>
where
    A: PartialEq + Clone + 'static,
    B: PartialEq + Clone + 'static,
    C: PartialEq + Clone + 'static,
    F: FnMut(A, B) -> C + 'static,
{
    link2(a, b, move |a, b| Some(f(a, b)))
}

/// Lift a ternary function over three signals.
pub fn lift3<A, B, C, D, F>(
    mut f: F,
    a: &Signal<A>,
    b: &Signal<B>,
    c: &Signal<C>,
) -> Result<Signal<D>, Error>
where
    A: PartialEq + Clone + 'static,
    B: PartialEq + Clone + 'static,
    C: PartialEq + Clone + 'static,
    D: PartialEq + Clone + 'static,
    F: FnMut(A, B, C) -> D + 'static,
{
    link3(a, b, c, move |a, b, c| Some(f(a, b, c)))
}

#[cfg(test)]
mod test {
    use crate::Runtime;

    use super::*;

    #[test]
    fn lift2_waits_for_both() {
        let rt = Runtime::new();
        let a = rt.undefined::<i32>();
        let b = rt.undefined::<f64>();
        let prod = lift2(|a: i32, b: f64| a as f64 * b, &a, &b).unwrap();
        a.set(3).unwrap();
        assert_eq!(prod.sample(), None);
        b.set(0.5).unwrap();
        assert_eq!(prod.sample(), Some(1.5));
    }

    #[test]
    fn lift3_follows_each_input() {
        let rt = Runtime::new();
        let a = rt.signal(1);
        let b = rt.signal(2);
        let c = rt.signal(3);
        let sum = lift3(|a: i32, b: i32, c: i32| a + b + c, &a, &b, &c).unwrap();
        assert_eq!(sum.sample(), Some(6));
        b.set(20).unwrap();
        assert_eq!(sum.sample(), Some(24));
    }
}
