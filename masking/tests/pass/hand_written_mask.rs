use masking::{Mask, Model};

#[derive(Clone, Debug, PartialEq, Model)]
pub struct Session {
    #[sensitive]
    pub token: String,
    pub user: String,
}

impl Mask for Session {
    fn mask(self) -> Self {
        let Self { token: _, user } = self;
        Self {
            token: Default::default(),
            user,
        }
    }
}

fn main() {
    let session = Session {
        token: "abc".into(),
        user: "ada".into(),
    };
    let masked = session.masked();
    assert_eq!(masked.token, "");
    assert_eq!(session.mask().user, "ada");
}
