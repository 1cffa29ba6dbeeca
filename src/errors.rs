//! Error types.
//!
//! Search dead ends (exhausted tolerance, no matching instance, ...) are **not** errors, the
//! binding search simply yields nothing for them. Errors fall in three categories:
//!
//! - programming invariant violations, *e.g.* [`ErrorKind::ArityMismatch`] or
//!   [`ErrorKind::Rebind`];
//! - unsupported program shapes, rejected before grounding starts, *e.g.*
//!   [`ErrorKind::UnsafeRule`] or [`ErrorKind::Unsupported`];
//! - internal consistency check failures ([`ErrorKind::Internal`]), only raised when the debug
//!   checks are active.

use crate::common::*;

error_chain! {
    types {
        Error, ErrorKind, ResultExt, Res;
    }

    foreign_links {
        Io(::std::io::Error) #[doc = "IO error."];
    }

    errors {
        #[doc = "An atom or instance does not have the arity of its predicate."]
        ArityMismatch(pred: String, expected: usize, got: usize) {
            description("arity mismatch")
            display(
                "arity mismatch on predicate `{}`: expected {}, got {}", pred, expected, got
            )
        }
        #[doc = "Trying to rebind a variable to a different term."]
        Rebind(var: String, old: String, new: String) {
            description("illegal variable rebinding")
            display("trying to rebind `{}` to `{}`, already bound to `{}`", var, new, old)
        }
        #[doc = "Trying to bind a variable to a non-ground term."]
        NonGroundBinding(var: String, term: String) {
            description("non-ground binding")
            display("trying to bind `{}` to non-ground term `{}`", var, term)
        }
        #[doc = "A rule for which no grounding order exists."]
        UnsafeRule(rule: String) {
            description("unsafe rule")
            display("unsafe rule `{}`", rule)
        }
        #[doc = "Unsupported program shape."]
        Unsupported(msg: String) {
            description("unsupported program")
            display("unsupported: {}", msg)
        }
        #[doc = "A term nested deeper than the maximum depth allowed."]
        TermTooDeep(term: String, max: usize) {
            description("term too deep")
            display("term `{}` is nested deeper than the maximum depth {}", term, max)
        }
        #[doc = "Position beyond the arity of a predicate."]
        PositionOutOfRange(pred: String, pos: usize) {
            description("position out of range")
            display("position {} is out of range for `{}`", pos, pred)
        }
        #[doc = "Removing instances while the delta of a storage has not been consumed."]
        Pending(pred: String) {
            description("pending delta")
            display(
                "cannot remove instances from `{}`, recently added instances are pending", pred
            )
        }
        #[doc = "Failure of an internal consistency check."]
        Internal(msg: String) {
            description("internal check failure")
            display("[bug] {}", msg)
        }
    }
}

impl Error {
    /// True if the error is a programming invariant violation.
    pub fn is_invariant(&self) -> bool {
        matches!(
            *self.kind(),
            ErrorKind::ArityMismatch(..)
                | ErrorKind::Rebind(..)
                | ErrorKind::NonGroundBinding(..)
                | ErrorKind::PositionOutOfRange(..)
                | ErrorKind::Pending(..)
        )
    }

    /// True if the error is caused by an unsupported program.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            *self.kind(),
            ErrorKind::UnsafeRule(..) | ErrorKind::Unsupported(..) | ErrorKind::TermTooDeep(..)
        )
    }

    /// True if the error comes from an internal consistency check.
    pub fn is_internal(&self) -> bool {
        matches!(*self.kind(), ErrorKind::Internal(_))
    }
}

/// Prints an error.
pub fn print_err(errs: &Error) {
    println!("({} \"", conf.bad("error"));
    for err in errs.iter() {
        for line in format!("{}", err).lines() {
            println!("  {}", line)
        }
    }
    println!("\")")
}
