use std::marker::PhantomData;

use masking::Model;

// Sensitive fields of a generic type are not checked for `Default` by the
// derive, so `T` needs no bound here.
#[derive(Model)]
pub struct Envelope<T> {
    #[sensitive]
    pub payload: T,
    pub kind: PhantomData<T>,
}

fn assert_model<T: masking::Model>() {}

fn main() {
    assert_model::<Envelope<std::fs::File>>();
}
