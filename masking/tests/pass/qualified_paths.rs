// The derives resolve through the `masking` crate even when only the derive
// macro paths are imported.
#[derive(masking::Model)]
pub struct Profile {
    #[sensitive]
    pub email: String,
    pub display_name: String,
}

struct Manual;

impl masking::Model for Manual {}

fn assert_model<T: masking::Model>() {}

fn main() {
    assert_model::<Profile>();
    assert_model::<Manual>();
}
