use masking::Model;

#[derive(Model)]
pub struct Token(#[sensitive] pub String, pub u64);

#[derive(Model)]
pub struct Empty;

fn assert_model<T: masking::Model>() {}

fn main() {
    assert_model::<Token>();
    assert_model::<Empty>();
}
