pub mod incident_handler;

pub use incident_handler::{
    __path_attach_images, __path_create_incident, __path_delete_incident, __path_detach_images,
    __path_get_incident, __path_incident_stats, __path_list_category_incidents,
    __path_list_incidents, __path_list_my_incidents, __path_update_incident, attach_images,
    create_incident, delete_incident, detach_images, get_incident, incident_stats,
    list_category_incidents, list_incidents, list_my_incidents, update_incident,
};
