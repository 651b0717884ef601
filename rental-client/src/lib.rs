//! Rental Client - client-side core for the property-rental backend
//!
//! Session Store, Permission Matrix checks, Remote Resource Cache with its
//! Mutation Gateway, Notification Poller and Snackbar, composed by
//! [`RentalClient`].

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod logger;
pub mod payload;
pub mod poller;
pub mod response;
pub mod session;
pub mod snackbar;
pub mod storage;

pub use cache::{Identified, ResourceCache};
pub use client::{RentalClient, RentalClientBuilder};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use gateway::{Caches, Gateway};
pub use http::{ApiReply, ApiRequest, HttpClient, NetworkHttpClient};
pub use poller::{ChangeKind, NotificationPoller, ReservationChange, diff_reservations};
pub use response::Outcome;
pub use session::{Session, SessionState, SessionStore};
pub use snackbar::{Snackbar, SnackbarState};
pub use storage::{FileStore, KeyValueStore, MemoryStore};

// Re-export shared types for convenience
pub use shared::models::{
    Department, DepartmentCreate, DepartmentUpdate, Notification, NotificationKind, Reservation,
    ReservationCreate, ReservationStatus, ReservationUpdate, Review, ReviewCreate, Role,
};
pub use shared::{Capability, EntityId, Identity, LoginRequest, ProfileUpdate, RegisterRequest};
