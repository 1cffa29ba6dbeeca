//! Entry point for the binary.

extern crate lagro;

use lagro::common::*;

fn main() {
    // Work and report error if any.
    if let Err(errs) = ::lagro::work() {
        print_err(&errs);
        ::std::process::exit(2)
    } else {
        ::std::process::exit(0)
    }
}
