//! Client-side engagement state with optimistic updates.

pub mod client;
pub mod error;
pub mod reconcile;
pub mod transport;
pub mod views;

pub use client::EngagementClient;
pub use error::ClientError;
pub use reconcile::{Reconciled, Ticket};
pub use transport::{HttpTransport, Transport};
pub use views::{BallotView, SavedView, VoteView};
