//! Domain models
//!
//! Wire shapes of the rental backend's resources, normalized on ingress
//! (string ids, URL-only images).

pub mod department;
pub mod image;
pub mod notification;
pub mod reservation;
pub mod review;
pub mod role;

pub use department::{Department, DepartmentCreate, DepartmentUpdate};
pub use image::{normalize_image, normalize_images};
pub use notification::{Notification, NotificationKind, UnreadCount, count_unread};
pub use reservation::{
    Reservation, ReservationCreate, ReservationGuest, ReservationStatus, ReservationUpdate,
    StatusUpdate,
};
pub use review::{Review, ReviewCreate};
pub use role::{Role, RoleUpdate, UnknownRole};
