//! Macros.

/// Logs something, gated by the verbosity level.
///
/// Levels are `@info` (`-v`), `@verb` (`-vv`) and `@debug` (`-vvv`), or a raw integer. Each line
/// of the message is prefixed with `; `. Inactive in bench mode.
///
/// ```rust
/// # #[macro_use] extern crate lagro;
/// # use lagro::common::*;
/// # fn main() {
/// let round = 3;
/// log! { @info "starting round {}", round }
/// log! { @debug "nothing to see here" }
/// # }
/// ```
#[macro_export]
#[cfg(not(feature = "bench"))]
macro_rules! log {
    (@info $($tail:tt)*) => (
        $crate::log! { @1 $($tail)* }
    );
    (@verb $($tail:tt)*) => (
        $crate::log! { @2 $($tail)* }
    );
    (@debug $($tail:tt)*) => (
        $crate::log! { @3 $($tail)* }
    );
    (@$lvl:tt $($tail:tt)*) => (
        if $crate::common::conf.verb >= $lvl {
            for line in format!($($tail)*).lines() {
                println!("; {}", line)
            }
        }
    );
}
#[macro_export]
#[cfg(feature = "bench")]
macro_rules! log {
    ($($tt:tt)*) => {
        ()
    };
}

/// Runs some code only if the verbosity is at least some level. Inactive in bench mode.
#[macro_export]
#[cfg(not(feature = "bench"))]
macro_rules! if_log {
    (@info $($tail:tt)*) => (
        $crate::if_log! { @1 $($tail)* }
    );
    (@verb $($tail:tt)*) => (
        $crate::if_log! { @2 $($tail)* }
    );
    (@debug $($tail:tt)*) => (
        $crate::if_log! { @3 $($tail)* }
    );
    (@$lvl:tt $($tail:tt)*) => (
        if $crate::common::conf.verb >= $lvl {
            $($tail)*
        }
    );
}
#[macro_export]
#[cfg(feature = "bench")]
macro_rules! if_log {
    ($($tt:tt)*) => {
        ()
    };
}

/// Profiling macro.
///
/// If passed `self`, assumes `self` has a `_profiler` field.
#[macro_export]
#[cfg(not(feature = "bench"))]
macro_rules! profile {
    ( | $prof:ident | $stat:expr => add $e:expr ) => (
        $prof.stat_do($stat, |val| val + $e)
    );
    ( | $prof:ident | $meth:ident $( $scope:expr ),+ $(,)* ) => (
        $prof.$meth(vec![ $($scope),+ ])
    );
    ( $slf:ident $stat:expr => add $e:expr ) => ({
        let prof = &$slf._profiler;
        $crate::profile! { |prof| $stat => add $e }
    });
    ( $slf:ident $meth:ident $( $scope:expr ),+ $(,)* ) => ({
        let prof = &$slf._profiler;
        $crate::profile! { |prof| $meth $($scope),+ }
    });
}
#[macro_export]
#[cfg(feature = "bench")]
macro_rules! profile {
    ( $($tt:tt)* ) => {
        ()
    };
}
