//! Models masked by this crate's build script.
//!
//! The generated impls are included at the bottom of each module.

use masking::{Model, Sensitive};

#[derive(Clone, Debug, Default, PartialEq, Model)]
pub struct Inner {
    #[sensitive]
    pub value: String,
}

/// Clears `a1` directly and `c1` two levels down; `d1` is untouched.
#[derive(Clone, Debug, PartialEq, Model)]
pub struct A1 {
    #[sensitive]
    pub a1: String,
    pub b1: B1,
    pub d1: D1,
}

#[derive(Clone, Debug, PartialEq)]
pub struct B1 {
    pub b1: String,
    pub c1: C1,
}

#[derive(Clone, Debug, PartialEq, Sensitive)]
pub struct C1 {
    #[sensitive]
    pub c1: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct D1 {
    pub d1: String,
}

/// A model with nothing to mask gets no impl.
#[derive(Clone, Debug, PartialEq, Model)]
pub struct NoMaskedProperty {
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Model)]
pub struct A2 {
    pub value: String,
    pub b: B2,
}

#[derive(Clone, Debug, PartialEq, Sensitive)]
pub struct B2 {
    #[sensitive]
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Model)]
pub struct Deep {
    pub name: String,
    pub level: Level1,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Level1 {
    pub tag: u8,
    pub next: Level2,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Level2 {
    pub label: String,
    pub next: Level3,
}

#[derive(Clone, Debug, PartialEq, Sensitive)]
pub struct Level3 {
    #[sensitive]
    pub secret: u64,
    pub visible: u64,
}

/// Delegates `inner` to `Inner`'s own mask.
#[derive(Clone, Debug, PartialEq, Model)]
pub struct Outer {
    pub label: String,
    pub inner: Inner,
}

/// `inner` is cleared as a whole, not delegated.
#[derive(Clone, Debug, PartialEq, Model)]
pub struct Holder {
    #[sensitive]
    pub inner: Inner,
}

#[derive(Clone, Debug, PartialEq, Model)]
pub struct Account {
    #[sensitive]
    pub pin: u32,
    #[sensitive]
    pub recovery_codes: Vec<String>,
    pub owner: String,
    pub nickname: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Model)]
pub struct Token(#[sensitive] pub String, pub u64);

#[derive(Clone, Debug, PartialEq, Sensitive)]
pub struct Ledger {
    #[sensitive]
    pub iban: String,
    pub bank: String,
}

impl Model for Ledger {}

pub type Wallet = B2;

/// `wallet` is reached through an alias and rebuilt inline.
#[derive(Clone, Debug, PartialEq, Model)]
pub struct Purse {
    pub owner: String,
    pub wallet: Wallet,
}

/// Borrowed fields keep the struct's lifetime in the generated impl.
#[derive(Clone, Debug, PartialEq, Model)]
pub struct View<'a> {
    #[sensitive]
    pub label: &'a str,
    pub owner: String,
}

pub mod billing {
    use masking::Model;

    use super::Inner;

    #[derive(Clone, Debug, PartialEq, Model)]
    pub struct Invoice {
        pub number: String,
        #[sensitive]
        pub card: String,
        pub customer: Inner,
    }

    include!(concat!(env!("OUT_DIR"), "/masking/models/billing/masks.rs"));
}

pub mod support {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Model)]
    pub struct Ticket {
        pub subject: String,
        pub card: C1,
    }

    include!(concat!(env!("OUT_DIR"), "/masking/models/support/masks.rs"));
}

include!(concat!(env!("OUT_DIR"), "/masking/models/masks.rs"));
