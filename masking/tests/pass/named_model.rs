use masking::{Model, Sensitive};

#[derive(Clone, Debug, Default, Model)]
pub struct Account {
    #[sensitive]
    pub pin: u32,
    #[sensitive]
    pub note: Option<String>,
    pub owner: String,
    pub card: Card,
}

#[derive(Clone, Debug, Default, Sensitive)]
pub struct Card {
    #[sensitive]
    pub number: String,
    pub brand: String,
}

fn assert_model<T: masking::Model>() {}

fn main() {
    assert_model::<Account>();
}
