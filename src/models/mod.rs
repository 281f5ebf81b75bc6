pub mod profile;
pub mod remote;

pub use profile::{MatchStatus, PendingAction, ProfileCard, ProfileRecord};
pub use remote::{ProfilesResponse, RemoteProfile};
