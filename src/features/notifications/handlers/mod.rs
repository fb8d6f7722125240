pub mod notification_handler;

pub use notification_handler::{
    __path_delete_notification, __path_list_notifications, __path_list_unread_notifications,
    __path_mark_all_notifications_read, __path_mark_notification_read, delete_notification,
    list_notifications, list_unread_notifications, mark_all_notifications_read,
    mark_notification_read,
};
