use std::borrow::Cow;

use vizport_core::model::Model;

pub(crate) fn map_model(model: &Model) -> Option<Cow<'static, str>> {
    match model {
        Model::C1(known) => Some(known.as_str().into()),
        Model::Custom(custom) if custom.trim().is_empty() => None,
        Model::Custom(custom) => Some(custom.clone().into()),
    }
}
