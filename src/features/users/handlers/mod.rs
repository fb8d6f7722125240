pub mod profile_handler;

pub use profile_handler::{
    __path_add_profile_image, __path_get_profile, __path_remove_profile_image,
    __path_update_profile, add_profile_image, get_profile, remove_profile_image, update_profile,
};
