/// Options that steer how a scene is turned into document entities.
///
/// `double_sided` comes from the user. `force_samplers_to_nearest` is decided per
/// file by [`crate::resources::sampler::needs_nearest_sampler`] and overwritten
/// before every import.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportOptions {
    pub double_sided: bool,
    pub force_samplers_to_nearest: bool,
}

impl ImportOptions {
    pub fn new(double_sided: bool) -> Self {
        Self {
            double_sided,
            ..Default::default()
        }
    }
}
