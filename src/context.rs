//! Per thread secp256k1 context.
//!
//! Building a context is expensive so every thread lazily creates one on
//! first use and keeps it. Nothing is shared across threads.
use secp256k1::{All, Secp256k1};
use std::cell::RefCell;

thread_local! {
    pub(crate) static SECP256K1: RefCell<Secp256k1<All>> = RefCell::new(Secp256k1::new());
}
